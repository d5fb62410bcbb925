//! User profile and goals

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_AGE: u8 = 120;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    #[default]
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityLevel {
    #[default]
    Sedentary,
    Light,
    Moderate,
    Active,
    #[serde(rename = "Very Active")]
    VeryActive,
}

impl ActivityLevel {
    /// Multiplier applied to BMR for daily energy expenditure
    pub fn factor(self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Active => 1.725,
            ActivityLevel::VeryActive => 1.9,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthGoal {
    #[serde(rename = "Lose weight")]
    LoseWeight,
    #[serde(rename = "Gain weight")]
    GainWeight,
    #[default]
    #[serde(rename = "Maintain weight")]
    MaintainWeight,
    #[serde(rename = "Build muscle")]
    BuildMuscle,
    #[serde(rename = "Improve fitness")]
    ImproveFitness,
    #[serde(rename = "Enhance mental health")]
    EnhanceMentalHealth,
}

/// Profile form contents, held per session in memory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub name: String,
    pub age: u8,
    pub gender: Gender,
    pub weight_kg: f64,
    pub height_cm: u16,
    pub activity: ActivityLevel,
    pub goal: HealthGoal,
}

#[derive(Debug, Error, PartialEq)]
pub enum ProfileError {
    #[error("Age must be between 0 and {MAX_AGE}, got {0}")]
    AgeOutOfRange(u8),
    #[error("Weight must be a non-negative number, got {0}")]
    InvalidWeight(f64),
    #[error("Height must be a non-negative number, got {0}")]
    InvalidHeight(f64),
}

pub fn check_age(age: u8) -> Result<(), ProfileError> {
    if age > MAX_AGE {
        return Err(ProfileError::AgeOutOfRange(age));
    }
    Ok(())
}

pub fn check_weight(weight_kg: f64) -> Result<(), ProfileError> {
    if !weight_kg.is_finite() || weight_kg < 0.0 {
        return Err(ProfileError::InvalidWeight(weight_kg));
    }
    Ok(())
}

pub fn check_height(height_cm: f64) -> Result<(), ProfileError> {
    if !height_cm.is_finite() || height_cm < 0.0 {
        return Err(ProfileError::InvalidHeight(height_cm));
    }
    Ok(())
}

impl Profile {
    pub fn validate(&self) -> Result<(), ProfileError> {
        check_age(self.age)?;
        check_weight(self.weight_kg)
    }
}
