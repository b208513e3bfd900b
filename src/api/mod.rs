pub mod handlers;
pub mod models;

use axum::{routing::get, Router};
use tower_http::{trace::TraceLayer, validate_request::ValidateRequestHeaderLayer};

use crate::{config::AuthConfig, state::AppState};

/// Build the API router. With `credentials`, every route sits behind HTTP
/// Basic auth and unauthenticated requests are answered with a 401 challenge
/// before any handler runs.
pub fn router(state: AppState, credentials: Option<&AuthConfig>) -> Router {
    let router = Router::new()
        .route(
            "/api/led",
            get(handlers::handle_get_led).post(handlers::handle_set_led),
        )
        .route("/health", get(handlers::handle_health))
        .with_state(state);

    let router = match credentials {
        Some(auth) => {
            tracing::info!("Basic auth enabled for user {}", auth.username);
            router.layer(ValidateRequestHeaderLayer::basic(&auth.username, &auth.password))
        }
        None => {
            tracing::warn!("Basic auth disabled, API is open");
            router
        }
    };

    router.layer(TraceLayer::new_for_http())
}
