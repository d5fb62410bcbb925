//! Static wellness panels: daily tips, profile, calculators
//!
//! None of this touches the chat core.

pub mod calculators;
pub mod followups;
pub mod profile;
pub mod tips;

pub use calculators::{
    bmi, bmr, breathing_schedule, daily_calories, water_intake_liters, BreathingStep,
    SLEEP_HYGIENE_CHECKLIST,
};
pub use followups::random_followup;
pub use profile::{
    check_age, check_height, check_weight, ActivityLevel, Gender, Profile, ProfileError,
};
pub use tips::{daily_tips, DailyTips};
