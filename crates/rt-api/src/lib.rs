//! # rt-api
//!
//! The web routing and orchestration layer for RocketTalk.

pub mod extract;
pub mod flash;
pub mod handlers;
pub mod middleware;
pub mod session;
pub mod state;

pub use flash::{Flash, FlashKey};
pub use state::AppState;

use axum::routing::get;
use axum::Router;
use std::path::Path;
use tower_http::services::ServeDir;

/// Builds the application router.
///
/// Static files under `assets_dir` are served at `/assets/`; everything
/// else goes through the guarded handlers.
pub fn router(state: AppState, assets_dir: impl AsRef<Path>) -> Router {
    Router::new()
        .route("/", get(handlers::list_messages))
        .route(
            "/compose/",
            get(handlers::show_compose_form).post(handlers::send_message),
        )
        .route(
            "/view/{id}/",
            get(handlers::view_message).post(handlers::view_message),
        )
        .route(
            "/delete/{id}/",
            get(handlers::show_delete_form).post(handlers::delete_message),
        )
        .route(
            "/shred/",
            get(handlers::show_shred_form).post(handlers::shred_messages),
        )
        .route("/login/", get(handlers::show_login_form).post(handlers::login))
        .route("/logout/", get(handlers::logout))
        .nest_service("/assets", ServeDir::new(assets_dir.as_ref()))
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(middleware::trace_layer())
        .with_state(state)
}
