//! Context trimming policy
//!
//! Keeps the longest trailing run of turns whose estimated cost, together
//! with the system instruction, fits the budget.

use crate::conversation::{Role, Turn};
use crate::llm::ChatMessage;

pub const DEFAULT_TOKEN_BUDGET: usize = 200;

/// Approximate token count: four characters per unit, rounded up
pub fn cost(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// "Keep the last N units" trimming policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimPolicy {
    pub budget: usize,
}

impl Default for TrimPolicy {
    fn default() -> Self {
        Self {
            budget: DEFAULT_TOKEN_BUDGET,
        }
    }
}

impl TrimPolicy {
    pub fn new(budget: usize) -> Self {
        Self { budget }
    }

    /// Select the model-facing window over `turns`.
    ///
    /// Turns are considered newest first and the walk stops at the first turn
    /// that would overflow the budget, so the result is always a contiguous
    /// suffix. The most recent turn is kept even when it alone overflows.
    pub fn select<'a>(&self, system: &'a str, turns: &'a [Turn]) -> TrimmedContext<'a> {
        let mut total = cost(system);
        let mut start = turns.len();

        for (index, turn) in turns.iter().enumerate().rev() {
            let turn_cost = cost(turn.content());
            if total + turn_cost > self.budget {
                break;
            }
            total += turn_cost;
            start = index;
        }

        if start == turns.len() && !turns.is_empty() {
            start = turns.len() - 1;
            total += cost(turns[start].content());
        }

        TrimmedContext {
            system,
            turns: &turns[start..],
            cost: total,
        }
    }
}

/// Borrowed view of what will be sent to the model
#[derive(Debug, Clone, Copy)]
pub struct TrimmedContext<'a> {
    pub system: &'a str,
    pub turns: &'a [Turn],
    /// Total cost including the system instruction
    pub cost: usize,
}

impl TrimmedContext<'_> {
    /// Whether the window exceeds the budget it was selected under
    pub fn is_over_budget(&self, policy: TrimPolicy) -> bool {
        self.cost > policy.budget
    }

    /// Ordered prompt: system instruction first, then the retained turns
    pub fn to_messages(&self) -> Vec<ChatMessage> {
        std::iter::once(ChatMessage::system(self.system))
            .chain(self.turns.iter().map(|turn| match turn.role() {
                Role::Human => ChatMessage::human(turn.content()),
                Role::Assistant => ChatMessage::assistant(turn.content()),
            }))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ChatRole;

    fn text_of_cost(units: usize) -> String {
        "x".repeat(units * 4)
    }

    #[test]
    fn test_cost_rounds_up() {
        assert_eq!(cost(""), 0);
        assert_eq!(cost("hi"), 1);
        assert_eq!(cost("abcd"), 1);
        assert_eq!(cost("abcde"), 2);
        // Characters, not bytes
        assert_eq!(cost("héllo"), 2);
    }

    #[test]
    fn test_single_short_turn_is_kept() {
        let turns = vec![Turn::human("hi")];
        let window = TrimPolicy::default().select("sys", &turns);
        assert_eq!(window.turns.len(), 1);
        assert_eq!(window.cost, 2);

        let messages = window.to_messages();
        assert_eq!(messages[0], ChatMessage::system("sys"));
        assert_eq!(messages[1], ChatMessage::human("hi"));
    }

    #[test]
    fn test_drops_oldest_first() {
        let turns = vec![
            Turn::human(text_of_cost(5)),
            Turn::assistant(text_of_cost(5)),
            Turn::human(text_of_cost(5)),
        ];
        // system (1) + 5 + 5 = 11 fits, + 5 more does not
        let window = TrimPolicy::new(11).select("sys", &turns);
        assert_eq!(window.turns.len(), 2);
        assert_eq!(window.turns[0].role(), Role::Assistant);
        assert_eq!(window.cost, 11);
    }

    #[test]
    fn test_stops_at_first_overflow_even_if_older_turns_fit() {
        let turns = vec![
            Turn::human("a"),
            Turn::assistant(text_of_cost(50)),
            Turn::human("b"),
        ];
        let window = TrimPolicy::new(10).select("", &turns);
        assert_eq!(window.turns.len(), 1);
        assert_eq!(window.turns[0].content(), "b");
    }

    #[test]
    fn test_oversized_last_turn_is_still_kept() {
        let turns = vec![Turn::human("short"), Turn::human(text_of_cost(300))];
        let policy = TrimPolicy::default();
        let window = policy.select("sys", &turns);
        assert_eq!(window.turns.len(), 1);
        assert_eq!(window.turns[0].content().len(), 1200);
        assert!(window.is_over_budget(policy));
    }

    #[test]
    fn test_oversized_system_prompt_keeps_last_turn() {
        let system = text_of_cost(500);
        let turns = vec![Turn::human("one"), Turn::human("two")];
        let window = TrimPolicy::default().select(&system, &turns);
        assert_eq!(window.turns.len(), 1);
        assert_eq!(window.turns[0].content(), "two");
        assert_eq!(window.to_messages()[0].role, ChatRole::System);
    }

    #[test]
    fn test_empty_history_yields_system_only() {
        let window = TrimPolicy::default().select("sys", &[]);
        assert!(window.turns.is_empty());
        assert_eq!(window.to_messages().len(), 1);
    }

    #[test]
    fn test_budget_boundary_is_inclusive() {
        let turns = vec![Turn::human(text_of_cost(9))];
        let window = TrimPolicy::new(10).select("abcd", &turns);
        assert_eq!(window.cost, 10);
        assert!(!window.is_over_budget(TrimPolicy::new(10)));
    }
}
