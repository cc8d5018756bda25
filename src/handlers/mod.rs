pub mod auth;
pub mod bookings;
pub mod health;
pub mod payments;

use std::sync::Arc;

use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, patch, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health::health))
        .route("/api/bookings", post(bookings::create_booking))
        .route("/api/bookings/my", get(bookings::my_bookings))
        .route("/api/bookings/all", get(bookings::all_bookings))
        .route("/api/bookings/:id/cancel", patch(bookings::cancel_booking))
        .route("/api/payments/create-order", post(payments::create_order))
        .route("/api/payments/confirm", post(payments::confirm_payment))
        .route("/api/payments/webhook", post(payments::payment_webhook))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
