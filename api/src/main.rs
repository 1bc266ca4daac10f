use std::net::SocketAddr;

use axum::Router;
use serde::Serialize;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod ai;
mod auth;
mod config;
mod error;
mod middleware;
mod routes;
mod state;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "StackTutor API",
        version = "0.1.0",
        description = "Learn technical vocabulary: AI-graded quizzes, term explanations, and a personal list of weak terms."
    ),
    paths(
        routes::health::health_check,
        routes::auth::register,
        routes::auth::login,
        routes::terms::explain_term,
        routes::terms::list_terms,
        routes::terms::suggest_term,
        routes::quiz::random_question,
        routes::quiz::submit_answer,
        routes::vocabulary::list_vocabulary,
        routes::vocabulary::save_term,
    ),
    components(schemas(
        HealthResponse,
        routes::auth::RegisterRequest,
        routes::auth::LoginRequest,
        routes::auth::TokenResponse,
        routes::terms::SuggestResponse,
        stacktutor_core::error::ApiError,
        stacktutor_core::terms::TermRequest,
        stacktutor_core::terms::TermDetail,
        stacktutor_core::terms::TermListResponse,
        stacktutor_core::quiz::QuizQuestion,
        stacktutor_core::quiz::QuizAnswerRequest,
        stacktutor_core::quiz::QuizResult,
        stacktutor_core::vocabulary::VocabularyItemResponse,
        stacktutor_core::vocabulary::VocabularyListResponse,
        stacktutor_core::vocabulary::VocabularySavedResponse,
    )),
    modifiers(&SecurityAddon)
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            utoipa::openapi::security::SecurityScheme::Http(
                utoipa::openapi::security::Http::new(
                    utoipa::openapi::security::HttpAuthScheme::Bearer,
                ),
            ),
        );
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stacktutor_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = config::Config::from_env();

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run migrations
    sqlx::migrate!("../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    // AI collaborator client, constructed once and injected through state
    let ai = ai::AiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.ai_timeout,
    );

    let tokens = auth::TokenSigner::new(&config.secret_key, config.token_ttl_minutes);

    let app_state = state::AppState {
        db: pool,
        ai,
        tokens,
        suggest_context_terms: config.suggest_context_terms,
    };

    // CORS
    let cors_layer = middleware::cors::build_cors_layer();

    // Router with per-endpoint rate limiting; the expensive AI-backed
    // endpoints get the tightest budgets.
    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(routes::health::router())
        .merge(routes::auth::register_router().layer(middleware::rate_limit::register_layer()))
        .merge(routes::auth::login_router().layer(middleware::rate_limit::login_layer()))
        .merge(routes::terms::router().layer(middleware::rate_limit::read_layer()))
        .merge(routes::terms::suggest_router().layer(middleware::rate_limit::suggest_layer()))
        .merge(routes::quiz::router().layer(middleware::rate_limit::read_layer()))
        .merge(routes::quiz::answer_router().layer(middleware::rate_limit::answer_layer()))
        .merge(routes::vocabulary::router().layer(middleware::rate_limit::read_layer()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer),
        )
        .with_state(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("StackTutor API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .unwrap();
}
