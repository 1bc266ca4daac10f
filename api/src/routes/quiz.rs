use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use stacktutor_core::quiz::{
    QuizAnswerRequest, QuizQuestion, QuizResult, ReinforcementAction, reinforcement_action,
};

use crate::auth::AuthenticatedUser;
use crate::error::AppError;
use crate::state::AppState;

/// Answers shorter than this carry too little signal to grade.
const MIN_ANSWER_LEN: usize = 10;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/v1/quiz/random", get(random_question))
}

pub fn answer_router() -> Router<AppState> {
    Router::new().route("/api/v1/quiz/answer", post(submit_answer))
}

// ──────────────────────────────────────────────
// GET /api/v1/quiz/random
// ──────────────────────────────────────────────

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct RandomQuizParams {
    pub category: Option<String>,
    pub difficulty: Option<i32>,
}

#[utoipa::path(
    get,
    path = "/api/v1/quiz/random",
    params(RandomQuizParams),
    responses(
        (status = 200, description = "A random question", body = QuizQuestion),
        (status = 404, description = "No term matches the filters", body = stacktutor_core::error::ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "quiz"
)]
pub async fn random_question(
    _user: AuthenticatedUser,
    State(state): State<AppState>,
    Query(params): Query<RandomQuizParams>,
) -> Result<Json<QuizQuestion>, AppError> {
    let row: Option<(Uuid, String, String, i32)> = sqlx::query_as(
        "SELECT id, term, category, difficulty FROM terms \
         WHERE ($1::text IS NULL OR category = $1) \
           AND ($2::int IS NULL OR difficulty = $2) \
         ORDER BY random() LIMIT 1",
    )
    .bind(&params.category)
    .bind(params.difficulty)
    .fetch_optional(&state.db)
    .await?;

    let (term_id, term, category, difficulty) = row.ok_or_else(|| AppError::NotFound {
        resource: "A quiz term matching the requested filters".to_string(),
    })?;

    Ok(Json(QuizQuestion {
        term_id,
        term: format!("Explain {term}"),
        category,
        difficulty,
    }))
}

// ──────────────────────────────────────────────
// POST /api/v1/quiz/answer
// ──────────────────────────────────────────────

/// Grade an answer and record the attempt. The collaborator call happens
/// before any write, so a grading failure leaves no half-written attempt;
/// the attempt insert and the vocabulary update commit together.
#[utoipa::path(
    post,
    path = "/api/v1/quiz/answer",
    request_body = QuizAnswerRequest,
    responses(
        (status = 200, description = "Graded result", body = QuizResult),
        (status = 404, description = "Unknown term", body = stacktutor_core::error::ApiError),
        (status = 500, description = "Grading collaborator failure", body = stacktutor_core::error::ApiError)
    ),
    security(("bearer_auth" = [])),
    tag = "quiz"
)]
pub async fn submit_answer(
    user: AuthenticatedUser,
    State(state): State<AppState>,
    Json(req): Json<QuizAnswerRequest>,
) -> Result<Json<QuizResult>, AppError> {
    if req.user_answer.trim().len() < MIN_ANSWER_LEN {
        return Err(AppError::Validation {
            message: format!("user_answer must be at least {MIN_ANSWER_LEN} characters"),
            field: Some("user_answer".to_string()),
            received: None,
            docs_hint: Some("Write a short explanation in your own words.".to_string()),
        });
    }

    let term: Option<(String, String)> =
        sqlx::query_as("SELECT term, simple_definition FROM terms WHERE id = $1")
            .bind(req.term_id)
            .fetch_optional(&state.db)
            .await?;

    let (term_name, simple_definition) = term.ok_or_else(|| AppError::NotFound {
        resource: format!("Term {}", req.term_id),
    })?;

    let grade = state
        .ai
        .grade_answer(&term_name, &simple_definition, &req.user_answer)
        .await?;

    let mut tx = state.db.begin().await?;

    sqlx::query(
        "INSERT INTO quiz_attempts (id, user_id, term_id, user_answer, score, ai_feedback, correct_answer) \
         VALUES ($1, $2, $3, $4, $5, $6, $7)",
    )
    .bind(Uuid::now_v7())
    .bind(user.user_id)
    .bind(req.term_id)
    .bind(&req.user_answer)
    .bind(grade.score)
    .bind(&grade.feedback)
    .bind(&simple_definition)
    .execute(&mut *tx)
    .await?;

    // The unique (user_id, term_id) constraint makes both branches safe
    // against concurrent submissions for the same pair.
    let saved_to_vocabulary = match reinforcement_action(grade.score) {
        ReinforcementAction::Upsert => {
            let review_count: i32 = sqlx::query_scalar(
                "INSERT INTO vocabulary_items (id, user_id, term_id, review_count, last_score) \
                 VALUES ($1, $2, $3, 1, $4) \
                 ON CONFLICT (user_id, term_id) DO UPDATE \
                 SET review_count = vocabulary_items.review_count + 1, \
                     last_score = EXCLUDED.last_score \
                 RETURNING review_count",
            )
            .bind(Uuid::now_v7())
            .bind(user.user_id)
            .bind(req.term_id)
            .bind(grade.score)
            .fetch_one(&mut *tx)
            .await?;
            review_count == 1
        }
        ReinforcementAction::TouchExisting => {
            sqlx::query(
                "UPDATE vocabulary_items \
                 SET review_count = review_count + 1, last_score = $3 \
                 WHERE user_id = $1 AND term_id = $2",
            )
            .bind(user.user_id)
            .bind(req.term_id)
            .bind(grade.score)
            .execute(&mut *tx)
            .await?;
            false
        }
    };

    tx.commit().await?;

    tracing::info!(
        user_id = %user.user_id,
        term_id = %req.term_id,
        score = grade.score,
        saved_to_vocabulary,
        "Quiz answer graded"
    );

    Ok(Json(QuizResult {
        term: term_name,
        score: grade.score,
        feedback: grade.feedback,
        correct_answer: simple_definition,
        your_answer: req.user_answer,
        saved_to_vocabulary,
    }))
}
