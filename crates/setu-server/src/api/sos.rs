use crate::api::ApiError;
use crate::service::trigger_sos;
use crate::state::AppState;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use setu_core::domain::{Coordinates, SosId};
use setu_core::dto::{NotificationDto, SosRecordDto, SosRequestDto, SosResponseDto};
use setu_core::time::now_utc;
use setu_core::CoreError;
use std::str::FromStr;
use tracing::debug;

pub const DEFAULT_LIST_LIMIT: i64 = 50;

pub async fn create_sos(
    State(state): State<AppState>,
    payload: Result<Json<SosRequestDto>, JsonRejection>,
) -> Result<(StatusCode, Json<SosResponseDto>), ApiError> {
    let Json(request) = payload?;
    let outcome = trigger_sos(&state, request).await?;
    Ok((StatusCode::CREATED, Json(outcome.to_response())))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub user_id: Option<String>,
    pub limit: Option<i64>,
}

pub async fn list_sos(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<SosRecordDto>>, ApiError> {
    let Query(query) = query?;
    let requester = query
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty());
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);

    let store = state.lock_store()?;
    let records = store.sos().list(requester, limit)?;
    Ok(Json(records.iter().map(SosRecordDto::from).collect()))
}

#[derive(Debug, Clone, Serialize)]
pub struct SosDetailDto {
    pub sos: SosRecordDto,
    pub notifications: Vec<NotificationDto>,
}

pub async fn get_sos(
    State(state): State<AppState>,
    Path(sos_id): Path<String>,
) -> Result<Json<SosDetailDto>, ApiError> {
    let id = parse_sos_id(&sos_id)?;
    let store = state.lock_store()?;
    let record = store
        .sos()
        .get(id)?
        .ok_or_else(|| ApiError::NotFound(format!("sos {id}")))?;
    let notifications = store.sos().notifications_for(id)?;
    Ok(Json(SosDetailDto {
        sos: SosRecordDto::from(&record),
        notifications: notifications.iter().map(NotificationDto::from).collect(),
    }))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SosLocationBody {
    pub user_id: Option<String>,
    #[serde(alias = "latitude")]
    pub lat: Option<f64>,
    #[serde(alias = "longitude")]
    pub lng: Option<f64>,
}

/// Move the requester's most recent SOS to a new position.
pub async fn update_sos_location(
    State(state): State<AppState>,
    payload: Result<Json<SosLocationBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;
    let user_id = body
        .user_id
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .ok_or(CoreError::MissingUserId)?;
    let (Some(lat), Some(lng)) = (body.lat, body.lng) else {
        return Err(CoreError::MissingCoordinates.into());
    };
    let coordinates = Coordinates::new(lat, lng).ok_or(CoreError::InvalidCoordinates)?;

    let store = state.lock_store()?;
    match store.sos().latest_for_requester(&user_id)? {
        Some(record) => store
            .sos()
            .update_location(record.id, coordinates, now_utc())?,
        None => debug!(user_id = %user_id, "no sos to update"),
    }
    Ok(Json(json!({ "message": "Location updated" })))
}

pub(crate) fn parse_sos_id(raw: &str) -> Result<SosId, ApiError> {
    SosId::from_str(raw).map_err(|_| ApiError::Validation(format!("invalid sos id: {raw}")))
}
