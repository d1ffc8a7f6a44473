//! Author endpoints

use axum::{extract::State, http::StatusCode, Json};

use super::{ApiJson, ApiQuery, Envelope};
use crate::{
    error::AppResult,
    models::author::{
        Author, AuthorFilter, AuthorQuery, AuthorSelector, CreateAuthor, DeleteAuthorParams,
        UpdateAuthor,
    },
    AppState,
};

/// List authors ordered by authorId
#[utoipa::path(
    get,
    path = "/authors",
    tag = "authors",
    params(
        ("name" = Option<String>, Query, description = "Case-insensitive substring"),
        ("nationality" = Option<String>, Query, description = "Case-insensitive substring"),
        ("isActive" = Option<String>, Query, description = "\"true\" for active authors, anything else for inactive")
    ),
    responses(
        (status = 200, description = "Matching authors", body = Vec<Author>)
    )
)]
pub async fn list_authors(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<AuthorQuery>,
) -> AppResult<Json<Envelope<Vec<Author>>>> {
    let authors = state
        .services
        .authors
        .list(&AuthorFilter::from(query))
        .await?;
    let total = authors.len() as i64;
    Ok(Json(Envelope::data(authors).total(total)))
}

/// Create an author
#[utoipa::path(
    post,
    path = "/authors",
    tag = "authors",
    request_body = CreateAuthor,
    responses(
        (status = 201, description = "Author created", body = Author),
        (status = 400, description = "Missing name or duplicate authorId", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_author(
    State(state): State<AppState>,
    ApiJson(author): ApiJson<CreateAuthor>,
) -> AppResult<(StatusCode, Json<Envelope<Author>>)> {
    let created = state.services.authors.create(author).await?;
    Ok((StatusCode::CREATED, Json(Envelope::data(created))))
}

/// Update an author selected by `_id` or `authorId`
#[utoipa::path(
    put,
    path = "/authors",
    tag = "authors",
    request_body = UpdateAuthor,
    responses(
        (status = 200, description = "Author updated", body = Author),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_author(
    State(state): State<AppState>,
    ApiJson(author): ApiJson<UpdateAuthor>,
) -> AppResult<Json<Envelope<Author>>> {
    let updated = state.services.authors.update(author).await?;
    Ok(Json(Envelope::data(updated)))
}

/// Delete an author; referencing books are kept
#[utoipa::path(
    delete,
    path = "/authors",
    tag = "authors",
    params(
        ("_id" = Option<String>, Query, description = "Internal identifier"),
        ("authorId" = Option<i32>, Query, description = "Author key")
    ),
    responses(
        (status = 200, description = "Author deleted", body = Author),
        (status = 400, description = "Missing or malformed selector", body = crate::error::ErrorResponse),
        (status = 404, description = "Author not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_author(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<DeleteAuthorParams>,
) -> AppResult<Json<Envelope<Author>>> {
    let selector = AuthorSelector::from_params(params.id, params.author_id)?;
    let deleted = state.services.authors.delete(&selector).await?;
    Ok(Json(
        Envelope::data(deleted).message("Author deleted successfully"),
    ))
}
