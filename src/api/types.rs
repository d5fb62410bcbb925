//! API request and response types

use crate::wellness::{
    check_age, check_height, check_weight, ActivityLevel, BreathingStep, Gender, ProfileError,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Request to send a chat message
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub queued: bool,
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub ok: bool,
    /// Whether a reply was actually in flight
    pub cancelled: bool,
}

/// Public runtime settings for the UI
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub model: String,
    pub token_budget: usize,
    pub thread_id: String,
}

#[derive(Debug, Deserialize)]
pub struct TipsQuery {
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct BmiRequest {
    pub height_cm: f64,
    pub weight_kg: f64,
}

impl BmiRequest {
    pub fn validate(&self) -> Result<(), ProfileError> {
        check_height(self.height_cm)?;
        check_weight(self.weight_kg)
    }
}

#[derive(Debug, Serialize)]
pub struct BmiResponse {
    /// Absent when height or weight is zero
    pub bmi: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CaloriesRequest {
    pub weight_kg: f64,
    pub height_cm: f64,
    pub age: u8,
    pub gender: Gender,
    pub activity: ActivityLevel,
}

impl CaloriesRequest {
    pub fn validate(&self) -> Result<(), ProfileError> {
        check_age(self.age)?;
        check_height(self.height_cm)?;
        check_weight(self.weight_kg)
    }
}

#[derive(Debug, Serialize)]
pub struct CaloriesResponse {
    pub bmr: f64,
    pub calories: i64,
}

#[derive(Debug, Deserialize)]
pub struct WaterRequest {
    pub weight_kg: f64,
}

impl WaterRequest {
    pub fn validate(&self) -> Result<(), ProfileError> {
        check_weight(self.weight_kg)
    }
}

#[derive(Debug, Serialize)]
pub struct WaterResponse {
    pub liters_per_day: f64,
}

#[derive(Debug, Serialize)]
pub struct BreathingResponse {
    pub pattern: &'static str,
    pub steps: Vec<BreathingStep>,
}

#[derive(Debug, Serialize)]
pub struct SleepHygieneResponse {
    pub items: Vec<&'static str>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
