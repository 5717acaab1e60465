//! Staff login, logout and identity endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiJson, StaffContext};
use crate::auth::{self, IssuedSession};
use crate::models::StaffUser;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// `POST /api/auth/login`: exchange credentials for a bearer token.
pub async fn login(
    State(ctx): State<ApiContext>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<IssuedSession>, ApiError> {
    let mut missing = Vec::new();
    let username = body.username.filter(|u| !u.trim().is_empty());
    let password = body.password.filter(|p| !p.is_empty());
    if username.is_none() {
        missing.push("username");
    }
    if password.is_none() {
        missing.push("password");
    }
    let (Some(username), Some(password)) = (username, password) else {
        return Err(ApiError::Validation(format!(
            "Missing required field(s): {}",
            missing.join(", ")
        )));
    };

    let conn = ctx.open_db()?;
    let session = auth::login(&conn, &username, &password, ctx.core.settings.session_ttl_hours)?;
    Ok(Json(session))
}

/// `POST /api/auth/logout`: revoke the token used for this request.
pub async fn logout(
    State(ctx): State<ApiContext>,
    Extension(staff): Extension<StaffContext>,
) -> Result<StatusCode, ApiError> {
    let conn = ctx.open_db()?;
    auth::revoke_session(&conn, &staff.token)?;
    tracing::info!(user_id = staff.user.id, "staff logout");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct MeResponse {
    pub user: StaffUser,
}

/// `GET /api/auth/me`: the staff member behind the token.
pub async fn me(Extension(staff): Extension<StaffContext>) -> Json<MeResponse> {
    Json(MeResponse { user: staff.user })
}
