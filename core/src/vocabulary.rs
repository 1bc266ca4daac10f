use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

/// One saved term in a user's vocabulary set, joined with its catalog entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct VocabularyItemResponse {
    pub id: Uuid,
    pub term_id: Uuid,
    pub term: String,
    pub category: String,
    pub saved_at: DateTime<Utc>,
    /// Number of quiz attempts since the term entered the set.
    pub review_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_score: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VocabularyListResponse {
    pub items: Vec<VocabularyItemResponse>,
    pub total: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VocabularySavedResponse {
    pub message: String,
    pub term_id: Uuid,
}
