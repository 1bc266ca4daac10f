use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Score below which an attempt counts as weak and the term enters the
/// caller's vocabulary set.
pub const MASTERY_THRESHOLD: i32 = 70;

/// How a graded attempt touches the vocabulary set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReinforcementAction {
    /// Weak attempt: create the row (review_count = 1) or, if the term is
    /// already tracked, increment its counter and overwrite last_score.
    Upsert,
    /// Strong attempt: only an already-tracked term gets its counter
    /// incremented and last_score overwritten; otherwise nothing changes.
    TouchExisting,
}

/// Decide what a score does to the vocabulary set. Tracking continues for
/// terms already in the set regardless of the new score: review_count is a
/// practice-frequency counter, not a "still weak" flag.
pub fn reinforcement_action(score: i32) -> ReinforcementAction {
    if score < MASTERY_THRESHOLD {
        ReinforcementAction::Upsert
    } else {
        ReinforcementAction::TouchExisting
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuizQuestion {
    pub term_id: Uuid,
    /// Prompt shown to the user, e.g. "Explain Kubernetes"
    pub term: String,
    pub category: String,
    pub difficulty: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct QuizAnswerRequest {
    pub term_id: Uuid,
    pub user_answer: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct QuizResult {
    pub term: String,
    pub score: i32,
    pub feedback: String,
    pub correct_answer: String,
    pub your_answer: String,
    /// True only when this attempt created a new vocabulary row.
    pub saved_to_vocabulary: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weak_scores_upsert() {
        assert_eq!(reinforcement_action(0), ReinforcementAction::Upsert);
        assert_eq!(reinforcement_action(45), ReinforcementAction::Upsert);
        assert_eq!(reinforcement_action(69), ReinforcementAction::Upsert);
    }

    #[test]
    fn threshold_and_above_only_touch_existing_rows() {
        assert_eq!(
            reinforcement_action(MASTERY_THRESHOLD),
            ReinforcementAction::TouchExisting
        );
        assert_eq!(
            reinforcement_action(100),
            ReinforcementAction::TouchExisting
        );
    }
}
