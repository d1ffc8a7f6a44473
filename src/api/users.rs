//! User management endpoints

use axum::{extract::State, http::StatusCode, Json};

use super::{ApiJson, ApiQuery, Envelope};
use crate::{
    error::AppResult,
    models::user::{CreateUser, DeleteUserParams, UpdateUser, UserProfile},
    AppState,
};

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    responses(
        (status = 200, description = "Users ordered by id, without passwords", body = Vec<UserProfile>)
    )
)]
pub async fn list_users(State(state): State<AppState>) -> AppResult<Json<Envelope<Vec<UserProfile>>>> {
    let users = state.services.users.list().await?;
    let total = users.len() as i64;
    Ok(Json(Envelope::data(users).total(total)))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserProfile),
        (status = 400, description = "Missing credentials or username taken", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    ApiJson(user): ApiJson<CreateUser>,
) -> AppResult<(StatusCode, Json<Envelope<UserProfile>>)> {
    let created = state.services.users.create(user).await?;
    Ok((StatusCode::CREATED, Json(Envelope::data(created))))
}

/// Update a user selected by `id`
#[utoipa::path(
    put,
    path = "/users",
    tag = "users",
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = UserProfile),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    ApiJson(user): ApiJson<UpdateUser>,
) -> AppResult<Json<Envelope<UserProfile>>> {
    let updated = state.services.users.update(user).await?;
    Ok(Json(Envelope::data(updated)))
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users",
    tag = "users",
    params(
        ("id" = i32, Query, description = "User id")
    ),
    responses(
        (status = 200, description = "User deleted", body = UserProfile),
        (status = 400, description = "Missing or non-numeric id", body = crate::error::ErrorResponse),
        (status = 404, description = "User not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_user(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<DeleteUserParams>,
) -> AppResult<Json<Envelope<UserProfile>>> {
    let deleted = state.services.users.delete(params.user_id()?).await?;
    Ok(Json(
        Envelope::data(deleted).message("User deleted successfully"),
    ))
}
