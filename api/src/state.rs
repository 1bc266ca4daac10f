use sqlx::PgPool;

use crate::ai::AiClient;
use crate::auth::TokenSigner;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub ai: AiClient,
    pub tokens: TokenSigner,
    /// Cap on the duplicate-detection context sent to the validation
    /// collaborator (see Config::suggest_context_terms).
    pub suggest_context_terms: usize,
}
