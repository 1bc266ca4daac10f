use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stacktutor_core::terms::{TermDetail, TermListResponse, TermRequest, find_normalized_duplicate};

use crate::ai::duplicate_context;
use crate::auth::AuthenticatedUser;
use crate::error::{AppError, on_unique_violation};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/terms/", post(explain_term))
        .route("/api/v1/terms/all", get(list_terms))
}

pub fn suggest_router() -> Router<AppState> {
    Router::new().route("/api/v1/terms/suggest", post(suggest_term))
}

#[derive(sqlx::FromRow)]
struct TermRow {
    id: Uuid,
    term: String,
    category: String,
    difficulty: i32,
    formal_definition: String,
    simple_definition: String,
    example: Option<String>,
    why_it_matters: Option<String>,
}

impl TermRow {
    fn into_detail(self) -> TermDetail {
        TermDetail {
            term_id: self.id,
            term: self.term,
            category: self.category,
            difficulty: self.difficulty,
            formal_definition: self.formal_definition,
            simple_definition: self.simple_definition,
            examples: self.example.into_iter().collect(),
            why_it_matters: self
                .why_it_matters
                .unwrap_or_else(|| "No information available".to_string()),
            timestamp: Utc::now(),
        }
    }
}

const TERM_COLUMNS: &str = "id, term, category, difficulty, formal_definition, \
                            simple_definition, example, why_it_matters";

// ──────────────────────────────────────────────
// POST /api/v1/terms/
// ──────────────────────────────────────────────

#[utoipa::path(
    post,
    path = "/api/v1/terms/",
    request_body = TermRequest,
    responses(
        (status = 200, description = "Term explanation", body = TermDetail),
        (status = 404, description = "Term not in catalog", body = stacktutor_core::error::ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "terms"
)]
pub async fn explain_term(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(req): Json<TermRequest>,
) -> Result<Json<TermDetail>, AppError> {
    validate_term_text(&req.term)?;

    let row: Option<TermRow> = sqlx::query_as(&format!(
        "SELECT {TERM_COLUMNS} FROM terms WHERE lower(term) = lower($1)"
    ))
    .bind(&req.term)
    .fetch_optional(&state.db)
    .await?;

    let row = row.ok_or_else(|| AppError::NotFound {
        resource: format!("Term '{}'", req.term),
    })?;

    Ok(Json(row.into_detail()))
}

// ──────────────────────────────────────────────
// GET /api/v1/terms/all
// ──────────────────────────────────────────────

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListTermsParams {
    /// Restrict the listing to one category
    pub category: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/terms/all",
    params(ListTermsParams),
    responses(
        (status = 200, description = "All catalog terms", body = TermListResponse)
    ),
    security(("bearer_auth" = [])),
    tag = "terms"
)]
pub async fn list_terms(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(params): Query<ListTermsParams>,
) -> Result<Json<TermListResponse>, AppError> {
    let rows: Vec<TermRow> = sqlx::query_as(&format!(
        "SELECT {TERM_COLUMNS} FROM terms \
         WHERE ($1::text IS NULL OR category = $1) \
         ORDER BY term"
    ))
    .bind(&params.category)
    .fetch_all(&state.db)
    .await?;

    let terms: Vec<TermDetail> = rows.into_iter().map(TermRow::into_detail).collect();
    let total = terms.len();
    Ok(Json(TermListResponse { terms, total }))
}

// ──────────────────────────────────────────────
// POST /api/v1/terms/suggest
// ──────────────────────────────────────────────

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct SuggestResponse {
    pub approved: bool,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub term: Option<TermDetail>,
}

/// Suggest a new catalog term. Exact-normalized dedup runs first and
/// short-circuits without a collaborator call; synonyms and rewordings are
/// left to the collaborator's judgment.
#[utoipa::path(
    post,
    path = "/api/v1/terms/suggest",
    request_body = TermRequest,
    responses(
        (status = 200, description = "Suggestion verdict, with the new term when approved", body = SuggestResponse),
        (status = 400, description = "Validation error or duplicate insert", body = stacktutor_core::error::ApiError),
        (status = 500, description = "Validation collaborator failure", body = stacktutor_core::error::ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "terms"
)]
pub async fn suggest_term(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(req): Json<TermRequest>,
) -> Result<Json<SuggestResponse>, AppError> {
    validate_term_text(&req.term)?;

    let existing: Vec<String> =
        sqlx::query_scalar("SELECT term FROM terms ORDER BY created_at")
            .fetch_all(&state.db)
            .await?;

    if let Some(original) =
        find_normalized_duplicate(&req.term, existing.iter().map(String::as_str))
    {
        tracing::info!(candidate = %req.term, existing = %original, "Suggestion rejected by exact-match dedup");
        return Ok(Json(SuggestResponse {
            approved: false,
            reason: format!("already exists as '{original}'"),
            term: None,
        }));
    }

    let context = duplicate_context(&existing, state.suggest_context_terms);
    let verdict = state.ai.validate_term(&req.term, context).await?;

    if !verdict.approved {
        tracing::info!(candidate = %req.term, reason = %verdict.reason, "Suggestion rejected by collaborator");
        return Ok(Json(SuggestResponse {
            approved: false,
            reason: verdict.reason,
            term: None,
        }));
    }

    let (reason, generated) = verdict.into_generated()?;
    let term_id = Uuid::now_v7();

    let row: TermRow = sqlx::query_as(&format!(
        "INSERT INTO terms (id, term, category, difficulty, formal_definition, \
                            simple_definition, example, why_it_matters) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING {TERM_COLUMNS}"
    ))
    .bind(term_id)
    .bind(&req.term)
    .bind(&generated.category)
    .bind(generated.difficulty)
    .bind(&generated.formal_definition)
    .bind(&generated.simple_definition)
    .bind(&generated.example)
    .bind(&generated.why_it_matters)
    .fetch_one(&state.db)
    .await
    .map_err(|e| {
        on_unique_violation(
            e,
            AppError::Conflict {
                message: format!("Term '{}' already exists", req.term),
                field: Some("term".to_string()),
                docs_hint: None,
            },
        )
    })?;

    tracing::info!(user_id = %user.user_id, term_id = %term_id, term = %req.term, "Suggested term approved and added");

    Ok(Json(SuggestResponse {
        approved: true,
        reason,
        term: Some(row.into_detail()),
    }))
}

fn validate_term_text(term: &str) -> Result<(), AppError> {
    if term.trim().is_empty() {
        return Err(AppError::Validation {
            message: "term must not be empty".to_string(),
            field: Some("term".to_string()),
            received: None,
            docs_hint: None,
        });
    }
    if term.len() > 100 {
        return Err(AppError::Validation {
            message: "term must be at most 100 characters".to_string(),
            field: Some("term".to_string()),
            received: Some(serde_json::Value::String(term.to_string())),
            docs_hint: None,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::validate_term_text;

    #[test]
    fn empty_and_oversized_terms_are_rejected() {
        assert!(validate_term_text("").is_err());
        assert!(validate_term_text("   ").is_err());
        assert!(validate_term_text(&"x".repeat(101)).is_err());
        assert!(validate_term_text("Docker").is_ok());
    }
}
