use crate::api::ApiError;
use crate::state::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use setu_core::domain::{User, UserId};
use setu_core::time::now_utc;
use setu_store::repo::UserNew;
use std::str::FromStr;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDto {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: i64,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            phone: user.phone,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateUserBody {
    #[serde(default, alias = "name")]
    pub username: String,
    #[serde(default)]
    pub phone: Option<String>,
}

pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserBody>, JsonRejection>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let Json(body) = payload?;
    let store = state.lock_store()?;
    let user = store.users().create(
        now_utc(),
        UserNew {
            username: body.username,
            phone: body.phone,
        },
    )?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserDto>, ApiError> {
    let id = UserId::from_str(&user_id)
        .map_err(|_| ApiError::Validation(format!("invalid user id: {user_id}")))?;
    let store = state.lock_store()?;
    let user = store
        .users()
        .get(id)?
        .ok_or_else(|| ApiError::NotFound(format!("user {id}")))?;
    Ok(Json(user.into()))
}
