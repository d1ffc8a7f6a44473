//! Login endpoint

use axum::{extract::State, Json};

use super::{ApiJson, Envelope};
use crate::{
    error::AppResult,
    models::user::{LoginRequest, UserProfile},
    AppState,
};

/// Check a username and password
#[utoipa::path(
    post,
    path = "/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Credentials accepted", body = UserProfile),
        (status = 400, description = "Missing username or password", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> AppResult<Json<Envelope<UserProfile>>> {
    let user = state.services.users.authenticate(request).await?;
    Ok(Json(Envelope::data(user).message("Login successful")))
}
