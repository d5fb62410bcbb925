//! Health calculators and guided exercises

use super::profile::{ActivityLevel, Gender};
use serde::Serialize;

/// Water goal: 35 ml per kg of body weight
const WATER_LITERS_PER_KG: f64 = 0.035;

/// 4-7-8 breathing, repeated three times
const BREATHING_CYCLES: u8 = 3;
const INHALE_SECS: u8 = 4;
const HOLD_SECS: u8 = 7;
const EXHALE_SECS: u8 = 8;

pub const SLEEP_HYGIENE_CHECKLIST: [&str; 5] = [
    "🛌 Go to bed at the same time every night",
    "☕ Avoid caffeine and heavy meals before bed",
    "🌙 Keep your bedroom dark, quiet, and cool",
    "📵 Avoid screens before bedtime",
    "📚 Relax before bed with a book or music",
];

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Body mass index, `None` when height or weight is zero
pub fn bmi(height_cm: f64, weight_kg: f64) -> Option<f64> {
    if height_cm <= 0.0 || weight_kg <= 0.0 {
        return None;
    }
    let meters = height_cm / 100.0;
    Some(round2(weight_kg / (meters * meters)))
}

/// Basal metabolic rate (Mifflin-St Jeor)
pub fn bmr(weight_kg: f64, height_cm: f64, age: u8, gender: Gender) -> f64 {
    let offset = if gender == Gender::Male { 5.0 } else { -161.0 };
    10.0 * weight_kg + 6.25 * height_cm - 5.0 * f64::from(age) + offset
}

/// Daily caloric needs, truncated toward zero
#[allow(clippy::cast_possible_truncation)] // Bounded by realistic body measurements
pub fn daily_calories(
    weight_kg: f64,
    height_cm: f64,
    age: u8,
    gender: Gender,
    activity: ActivityLevel,
) -> i64 {
    (bmr(weight_kg, height_cm, age, gender) * activity.factor()).trunc() as i64
}

pub fn water_intake_liters(weight_kg: f64) -> f64 {
    round2(weight_kg * WATER_LITERS_PER_KG)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreathingStep {
    pub cycle: u8,
    pub instruction: &'static str,
    pub seconds: u8,
}

/// Guided 4-7-8 schedule for the UI to play back
pub fn breathing_schedule() -> Vec<BreathingStep> {
    (1..=BREATHING_CYCLES)
        .flat_map(|cycle| {
            [
                ("🫁 Inhale", INHALE_SECS),
                ("✋ Hold", HOLD_SECS),
                ("🫁 Exhale", EXHALE_SECS),
            ]
            .into_iter()
            .map(move |(instruction, seconds)| BreathingStep {
                cycle,
                instruction,
                seconds,
            })
        })
        .collect()
}
