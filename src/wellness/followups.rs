//! Suggestions shown under each assistant reply

use rand::seq::SliceRandom;

pub const FOLLOWUPS: [&str; 5] = [
    "🍏 Would you like some personalized meal plans?",
    "🏋️ Shall I suggest a workout routine based on your goals?",
    "💧 Would you like to set a hydration reminder?",
    "🛌 Shall I share some sleep hygiene tips?",
    "🧘 Would you like to know more about mindfulness practices?",
];

pub fn random_followup() -> &'static str {
    FOLLOWUPS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(FOLLOWUPS[0])
}
