use std::time::Duration;

/// Process configuration, read once from the environment at startup.
#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub secret_key: String,
    pub token_ttl_minutes: i64,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub ai_timeout: Duration,
    /// How many existing terms are sent to the validation collaborator as
    /// duplicate-detection context. A catalog larger than this may slip a
    /// fuzzy duplicate past the collaborator; the exact-normalized-match
    /// pre-check is unaffected.
    pub suggest_context_terms: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env_parsed("PORT", 3000),
            secret_key: std::env::var("SECRET_KEY").expect("SECRET_KEY must be set"),
            token_ttl_minutes: env_parsed("TOKEN_TTL_MINUTES", 30),
            gemini_api_key: std::env::var("GEMINI_API_KEY").expect("GEMINI_API_KEY must be set"),
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-2.5-flash".to_string()),
            ai_timeout: Duration::from_secs(env_parsed("AI_TIMEOUT_SECS", 30)),
            suggest_context_terms: env_parsed("SUGGEST_CONTEXT_TERMS", 50),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
