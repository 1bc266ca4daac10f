use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use stacktutor_core::vocabulary::{
    VocabularyItemResponse, VocabularyListResponse, VocabularySavedResponse,
};

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/vocabulary/", get(list_vocabulary))
        .route("/api/v1/vocabulary/{term_id}", post(save_term))
}

#[derive(sqlx::FromRow)]
struct VocabularyRow {
    id: Uuid,
    term_id: Uuid,
    term: String,
    category: String,
    saved_at: DateTime<Utc>,
    review_count: i32,
    last_score: Option<i32>,
}

#[utoipa::path(
    get,
    path = "/api/v1/vocabulary/",
    responses(
        (status = 200, description = "The caller's saved terms", body = VocabularyListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "vocabulary"
)]
pub async fn list_vocabulary(
    user: AuthenticatedUser,
    State(state): State<AppState>,
) -> Result<Json<VocabularyListResponse>, AppError> {
    let rows: Vec<VocabularyRow> = sqlx::query_as(
        "SELECT v.id, v.term_id, t.term, t.category, v.saved_at, v.review_count, v.last_score \
         FROM vocabulary_items v \
         JOIN terms t ON t.id = v.term_id \
         WHERE v.user_id = $1 \
         ORDER BY v.saved_at DESC",
    )
    .bind(user.user_id)
    .fetch_all(&state.db)
    .await?;

    let items: Vec<VocabularyItemResponse> = rows
        .into_iter()
        .map(|row| VocabularyItemResponse {
            id: row.id,
            term_id: row.term_id,
            term: row.term,
            category: row.category,
            saved_at: row.saved_at,
            review_count: row.review_count,
            last_score: row.last_score,
        })
        .collect();

    let total = items.len();
    Ok(Json(VocabularyListResponse { items, total }))
}

/// Save a term directly, bypassing the quiz score threshold. Saving a term
/// that is already in the set is a no-op, not an error.
#[utoipa::path(
    post,
    path = "/api/v1/vocabulary/{term_id}",
    params(("term_id" = Uuid, Path, description = "Catalog term to save")),
    responses(
        (status = 200, description = "Term saved", body = VocabularySavedResponse),
        (status = 404, description = "Unknown term", body = stacktutor_core::error::ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "vocabulary"
)]
pub async fn save_term(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Path(term_id): Path<Uuid>,
) -> Result<Json<VocabularySavedResponse>, AppError> {
    let term: Option<String> = sqlx::query_scalar("SELECT term FROM terms WHERE id = $1")
        .bind(term_id)
        .fetch_optional(&state.db)
        .await?;

    let term = term.ok_or_else(|| AppError::NotFound {
        resource: format!("Term {term_id}"),
    })?;

    sqlx::query(
        "INSERT INTO vocabulary_items (id, user_id, term_id, review_count, last_score) \
         VALUES ($1, $2, $3, 1, NULL) \
         ON CONFLICT (user_id, term_id) DO NOTHING",
    )
    .bind(Uuid::now_v7())
    .bind(user.user_id)
    .bind(term_id)
    .execute(&state.db)
    .await?;

    Ok(Json(VocabularySavedResponse {
        message: format!("Term '{term}' saved to vocabulary"),
        term_id,
    }))
}
