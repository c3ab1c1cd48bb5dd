mod error;
pub mod location;
pub mod sos;
pub mod users;
pub mod verify;

pub use error::ApiError;

use crate::state::AppState;
use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health))
        .route("/api/sos", post(sos::create_sos).get(sos::list_sos))
        .route("/api/sos/location", post(sos::update_sos_location))
        .route("/api/sos/live-location", post(location::post_live_location))
        .route("/api/sos/:sos_id", get(sos::get_sos))
        .route(
            "/api/sos/:sos_id/latest-location",
            get(location::latest_location),
        )
        .route("/api/sos/:sos_id/live", get(location::live_updates))
        .route("/api/location/update", post(location::record_location))
        .route("/api/users", post(users::create_user))
        .route("/api/users/:user_id", get(users::get_user))
        .route("/api/verify/send-code", post(verify::send_code))
        .route("/api/verify/verify-code", post(verify::verify_code))
        .with_state(state)
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "transport": state.dispatcher.transport_name(),
        "verification": state.verifier.is_some(),
    }))
}
