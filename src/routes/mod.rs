pub mod admin;
pub mod health;
pub mod quiz;

use axum::{
    routing::{get, post},
    Router,
};

use crate::middleware::{
    auth::require_admin,
    rate_limit::{rps_middleware, RateLimiter},
};
use crate::AppState;

/// Every route of the service. Tracing and CORS layers are added by the binary.
pub fn router(state: AppState) -> Router {
    let base_routes = Router::new().route("/health", get(health::health));

    let public_api = Router::new()
        .route("/api/quiz/:code/start", post(quiz::start_quiz))
        .route("/api/quiz/:code/question", get(quiz::next_question))
        .route("/api/quiz/:code/answer", post(quiz::submit_answer))
        .route("/api/quiz/:code/reset", post(quiz::reset_quiz))
        .route("/api/quiz/:code/report", post(quiz::generate_report))
        .route("/api/quiz/:code/upload", post(quiz::upload_results))
        .route("/api/admin/login", post(admin::login))
        .layer(axum::middleware::from_fn_with_state(
            RateLimiter::new(state.config.public_rps),
            rps_middleware,
        ));

    let admin_api = Router::new()
        .route(
            "/api/admin/candidates",
            get(admin::list_candidates).post(admin::register_candidate),
        )
        .route(
            "/api/admin/candidates/:code",
            get(admin::get_candidate).delete(admin::delete_candidate),
        )
        .route(
            "/api/admin/candidates/:code/reopen",
            post(admin::reopen_candidate),
        )
        .route("/api/admin/sessions/:code", get(admin::get_session))
        .route("/api/admin/questions/levels", get(admin::question_levels))
        .route("/api/admin/questions/backup", post(admin::backup_question_file))
        .route("/api/admin/export.xlsx", get(admin::export_results))
        .route("/api/admin/archive", get(admin::list_archive))
        .route("/api/admin/archive/sync", post(admin::sync_archive))
        .route("/api/admin/reports/:code", post(admin::upload_report))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_admin,
        ));

    base_routes
        .merge(public_api)
        .merge(admin_api)
        .with_state(state)
}
