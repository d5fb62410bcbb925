//! Daily wellness tips

use chrono::NaiveDate;
use serde::Serialize;

const TIPS: [(&str, &str); 7] = [
    (
        "🥗 Nutrition",
        "Add more fiber to your meals by including fruits, vegetables, and whole grains.",
    ),
    (
        "🏃 Fitness",
        "Stretch for 5 minutes every hour to keep your body flexible.",
    ),
    (
        "🧠 Mental Health",
        "Take 10 deep breaths whenever you feel overwhelmed or stressed.",
    ),
    (
        "🛌 Sleep",
        "Try to maintain a regular bedtime and avoid screens before sleep.",
    ),
    (
        "💧 Hydration",
        "Drink at least 8 glasses of water daily to stay hydrated.",
    ),
    (
        "🧘 Mindfulness",
        "Spend 5 minutes each day practicing mindfulness or meditation.",
    ),
    (
        "🪑 Posture",
        "Check your posture while sitting; keep your back straight and shoulders relaxed.",
    ),
];

#[derive(Debug, Clone, Serialize)]
pub struct Tip {
    pub category: &'static str,
    pub text: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct DailyTips {
    pub date: NaiveDate,
    pub tips: Vec<Tip>,
}

pub fn daily_tips(date: NaiveDate) -> DailyTips {
    DailyTips {
        date,
        tips: TIPS
            .iter()
            .map(|&(category, text)| Tip { category, text })
            .collect(),
    }
}
