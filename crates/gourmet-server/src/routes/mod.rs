// Export route modules
pub mod chat;
pub mod health;

use axum::Router;
use std::path::Path;
use tower_http::services::ServeDir;

use crate::state::AppState;

// Function to configure all routes
pub fn configure(state: AppState, static_dir: Option<&Path>) -> Router {
    let router = Router::new()
        .merge(chat::routes(state))
        .merge(health::routes());

    match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    }
}
