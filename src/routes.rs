// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, questions, quiz, results},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, questions, quiz, results).
/// * Protects everything but sign-in and the question fetch with `auth_middleware`.
/// * Applies global middleware (Trace, CORS) and injects the shared state.
pub fn create_router(state: AppState) -> Router {
    let origin = state.config.app_base_url.origin().ascii_serialization();
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);
    let cors = match HeaderValue::from_str(&origin) {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => cors,
    };

    let require_auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/magic-link", post(auth::request_magic_link))
        .route("/verify", post(auth::verify_magic_link))
        .merge(
            Router::new()
                .route("/me", get(auth::me))
                .layer(require_auth.clone()),
        );

    let question_routes = Router::new().route("/", get(questions::list_questions));

    let quiz_routes = Router::new()
        .route("/sessions", post(quiz::create_session))
        .route("/sessions/{session_id}/answers", post(quiz::submit_answer))
        .layer(require_auth.clone());

    let result_routes = Router::new()
        .route("/", get(results::list_results))
        .route("/{session_id}", get(results::get_result))
        .layer(require_auth);

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/questions", question_routes)
        .nest("/api/quiz", quiz_routes)
        .nest("/api/results", result_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
