use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{QuizError, QuizResult};
pub use services::AppState;

pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/metrics", get(handlers::metrics_handler))
        .nest("/api/v1/quizzes", quiz_routes())
        .route(
            "/api/v1/content-events",
            post(handlers::quizzes::content_changed),
        )
        .route(
            "/api/v1/quizgen/template/reload",
            post(handlers::quizgen::reload_template),
        )
        .with_state(app_state)
        .layer(middleware::from_fn(
            middlewares::trace::trace_context_middleware,
        ))
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn quiz_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(handlers::quizzes::create_quiz))
        .route("/lookup", post(handlers::quizzes::lookup_quizzes))
        .route(
            "/{id}",
            get(handlers::quizzes::get_quiz).delete(handlers::quizzes::delete_quiz),
        )
        // Pool edits
        .route("/{id}/questions", post(handlers::quizzes::add_question))
        .route(
            "/{id}/questions/switch",
            post(handlers::quizzes::switch_questions),
        )
        // PUT addresses a question by id, DELETE by number
        .route(
            "/{id}/questions/{question}",
            put(handlers::quizzes::update_question).delete(handlers::quizzes::remove_question),
        )
        // Settings
        .route(
            "/{id}/required-correct-answers",
            put(handlers::quizzes::set_required_correct_answers),
        )
        .route(
            "/{id}/pooling-mode",
            put(handlers::quizzes::set_pooling_mode),
        )
        .route(
            "/{id}/random-sample-size",
            put(handlers::quizzes::set_random_sample_size),
        )
        .route("/{id}/session", get(handlers::quizzes::session_questions))
        .route("/{id}/generate", post(handlers::quizzes::generate_questions))
        .route("/{id}/completions", post(handlers::quizzes::log_completion))
}
