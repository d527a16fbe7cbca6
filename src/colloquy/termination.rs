//! Termination policy for conversation runs.
//!
//! Pure functions over already-validated transcript state; evaluated by the
//! orchestrator after every appended message. Rules apply in priority order,
//! first match wins:
//!
//! 1. the turn budget is exhausted;
//! 2. the most recent message contains a completion keyword.
//!
//! The keyword rule is a deliberately crude lexical heuristic — a
//! case-insensitive substring match against a fixed closure vocabulary. A
//! message that merely *mentions* "no agreement possible" still stops the run;
//! that false positive is specified behavior, not a bug.

/// Deal/agreement vocabulary that marks a conversation as concluded.
pub const COMPLETION_KEYWORDS: [&str; 8] = [
    "deal",
    "agreed",
    "agreement",
    "signed",
    "approved",
    "contract",
    "goodbye",
    "thank you for your time",
];

/// Return the first completion keyword contained in `text`, if any.
///
/// Matching is case-insensitive and positional — plain substring containment,
/// no word boundaries, no negation handling.
pub fn completion_keyword(text: &str) -> Option<&'static str> {
    let lowered = text.to_lowercase();
    COMPLETION_KEYWORDS
        .iter()
        .find(|keyword| lowered.contains(*keyword))
        .copied()
}

/// Decide whether the run should stop after the latest message.
///
/// `turns_taken` is the number of generated messages so far and
/// `last_message` is the text of the most recent one.
pub fn should_stop(turns_taken: usize, max_turns: usize, last_message: &str) -> bool {
    if turns_taken >= max_turns {
        return true;
    }
    completion_keyword(last_message).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_exhaustion_wins_first() {
        assert!(should_stop(30, 30, "still talking"));
        assert!(should_stop(31, 30, "still talking"));
        assert!(!should_stop(29, 30, "still talking"));
    }

    #[test]
    fn keyword_match_is_case_insensitive() {
        assert!(should_stop(2, 30, "We have reached an AGREEMENT"));
        assert!(should_stop(1, 30, "Consider it Signed."));
        assert_eq!(
            completion_keyword("the Contract is ready"),
            Some("contract")
        );
    }

    #[test]
    fn substring_false_positives_are_accepted() {
        assert!(should_stop(3, 30, "There is no agreement possible here"));
        // "agreed" embedded inside "disagreed" still matches
        assert!(should_stop(3, 30, "We disagreed strongly"));
    }

    #[test]
    fn neutral_text_continues() {
        assert!(!should_stop(3, 30, "Tell me more about the pricing tiers"));
        assert_eq!(completion_keyword("pricing tiers"), None);
    }

    #[test]
    fn closing_phrases_match() {
        assert!(should_stop(5, 30, "Goodbye, and thanks!"));
        assert!(should_stop(5, 30, "Thank You For Your Time."));
    }
}
