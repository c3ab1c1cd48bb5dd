use crate::api::ApiError;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};
use setu_core::domain::{Coordinates, LiveLocation};
use setu_core::time::now_utc;
use setu_core::CoreError;
use setu_store::repo::LocationUpdateNew;
use tracing::debug;

pub const LOCATION_UPDATE_EVENT: &str = "location-update";

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveLocationBody {
    pub sos_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Store the sender's newest position and push it to everyone watching.
pub async fn post_live_location(
    State(state): State<AppState>,
    payload: Result<Json<LiveLocationBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;
    let sos_id = body
        .sos_id
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    let (Some(sos_id), Some(latitude), Some(longitude)) = (sos_id, body.latitude, body.longitude)
    else {
        return Err(ApiError::Validation(
            "Missing required fields: sosId, latitude, longitude".to_string(),
        ));
    };
    Coordinates::new(latitude, longitude).ok_or(CoreError::InvalidCoordinates)?;

    let location = LiveLocation {
        latitude,
        longitude,
        updated_at: now_utc(),
    };
    {
        let store = state.lock_store()?;
        store.live_locations().put(&sos_id, &location)?;
    }
    let watchers = state.hub.publish(&sos_id, location);
    debug!(sos_id = %sos_id, watchers, "live location published");

    Ok(Json(json!({ "status": "success", "data": location })))
}

/// Polling fallback for clients that cannot hold a stream open.
pub async fn latest_location(
    State(state): State<AppState>,
    Path(sos_id): Path<String>,
) -> Result<Json<Option<LiveLocation>>, ApiError> {
    let store = state.lock_store()?;
    Ok(Json(store.live_locations().get(sos_id.trim())?))
}

pub async fn live_updates(
    State(state): State<AppState>,
    Path(sos_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    debug!(sos_id = %sos_id, "live-location subscriber joined");
    let stream = state.hub.subscribe(sos_id.trim()).map(|location| {
        Event::default()
            .event(LOCATION_UPDATE_EVENT)
            .json_data(location)
    });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationHistoryBody {
    pub user_id: Option<String>,
    #[serde(alias = "latitude")]
    pub lat: Option<f64>,
    #[serde(alias = "longitude")]
    pub lng: Option<f64>,
}

pub async fn record_location(
    State(state): State<AppState>,
    payload: Result<Json<LocationHistoryBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;
    let user_id = body
        .user_id
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    let (Some(user_id), Some(lat), Some(lng)) = (user_id, body.lat, body.lng) else {
        return Err(ApiError::Validation(
            "userId, lat and lng required".to_string(),
        ));
    };
    Coordinates::new(lat, lng).ok_or(CoreError::InvalidCoordinates)?;

    let store = state.lock_store()?;
    let update = store.locations().record(LocationUpdateNew {
        user_id,
        lat,
        lng,
        recorded_at: now_utc(),
    })?;

    Ok(Json(json!({
        "success": true,
        "message": "Location updated",
        "location": {
            "id": update.id,
            "userId": update.user_id,
            "lat": update.lat,
            "lng": update.lng,
            "recordedAt": update.recorded_at,
        },
    })))
}
