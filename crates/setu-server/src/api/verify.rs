use crate::api::ApiError;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use setu_dispatch::PhoneVerifier;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendCodeBody {
    pub phone_number: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCodeBody {
    pub phone_number: Option<String>,
    pub code: Option<String>,
    pub service_id: Option<String>,
}

pub async fn send_code(
    State(state): State<AppState>,
    payload: Result<Json<SendCodeBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;
    let phone = required(body.phone_number)
        .ok_or_else(|| ApiError::Validation("Phone number is required".to_string()))?;
    let verifier = verifier(&state)?;

    let started = verifier.send_code(&phone).await?;
    info!(status = %started.status, "verification code sent");
    Ok(Json(json!({
        "success": true,
        "status": started.status,
        "serviceId": started.service_id,
    })))
}

pub async fn verify_code(
    State(state): State<AppState>,
    payload: Result<Json<VerifyCodeBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(body) = payload?;
    let (Some(phone), Some(code), Some(service_id)) = (
        required(body.phone_number),
        required(body.code),
        required(body.service_id),
    ) else {
        return Err(ApiError::Validation(
            "Phone number, code and serviceId are required".to_string(),
        ));
    };
    let verifier = verifier(&state)?;

    let checked = verifier.check_code(&phone, &code, &service_id).await?;
    info!(verified = checked.verified, status = %checked.status, "verification checked");
    Ok(Json(json!({
        "success": true,
        "verified": checked.verified,
        "status": checked.status,
    })))
}

fn verifier(state: &AppState) -> Result<Arc<dyn PhoneVerifier>, ApiError> {
    state
        .verifier
        .clone()
        .ok_or_else(|| ApiError::Unavailable("phone verification is disabled".to_string()))
}

fn required(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
