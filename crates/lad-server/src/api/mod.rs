//! API routes for the landing-site server.

mod routes;
pub mod sessions;

use axum::Router;

pub fn routes() -> Router<std::sync::Arc<crate::state::AppState>> {
    routes::create_router()
}
