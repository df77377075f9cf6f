pub mod protocol;
pub mod rest;
pub mod state;
pub mod sync_task;
pub mod ws_handler;

use axum::{
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;

// Re-export what the binaries need to build the web server router.
pub use rest::ApiDoc;
pub use state::AppState;
pub use ws_handler::ws_handler;

/// Every API route, bound to the shared state. Layers (CORS, docs) are added by the binary.
pub fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/sessions", post(rest::create_session_handler))
        .route("/sessions/teacher", post(rest::create_teacher_session_handler))
        .route("/sessions/{id}", delete(rest::close_session_handler))
        .route("/sessions/{id}/dashboard", get(rest::dashboard_handler))
        .route("/sessions/{id}/stats", get(rest::stats_handler))
        .route("/sessions/{id}/complaints", post(rest::submit_complaint_handler))
        .route(
            "/sessions/{id}/complaints/{case_id}",
            delete(rest::delete_complaint_handler),
        )
        .route(
            "/sessions/{id}/complaints/{case_id}/resolve",
            post(rest::resolve_complaint_handler),
        )
        .route("/sessions/{id}/export", get(rest::export_handler))
        .route("/sessions/{id}/ws", get(ws_handler))
        .route(
            "/profile",
            get(rest::get_profile_handler)
                .put(rest::put_profile_handler)
                .delete(rest::reset_profile_handler),
        )
        .route(
            "/activities",
            get(rest::list_activities_handler).put(rest::put_activities_handler),
        )
        .route("/theme", get(rest::get_theme_handler).put(rest::put_theme_handler))
        .route(
            "/teacher/cases",
            get(rest::list_teacher_cases_handler).post(rest::add_teacher_case_handler),
        )
        .route(
            "/teacher/cases/{index}",
            put(rest::edit_teacher_case_handler).delete(rest::delete_teacher_case_handler),
        )
        .route("/teacher/push", post(rest::push_case_handler))
        .with_state(app_state)
}
