//! Book catalog endpoints
//!
//! Every response is wrapped in the `{ ok, data, ... }` envelope; the bodies
//! documented below are the `data` member.

use axum::{extract::State, http::StatusCode, Json};

use super::{ApiJson, ApiQuery, Envelope};
use crate::{
    error::AppResult,
    models::book::{
        Book, BookListOptions, BookQuery, BookSelector, CreateBook, DeleteBookParams, UpdateBook,
    },
    AppState,
};

/// List books with filters, sorting and optional pagination
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    params(
        ("authorId" = Option<i32>, Query, description = "Exact author key"),
        ("category" = Option<String>, Query, description = "Case-insensitive substring"),
        ("title" = Option<String>, Query, description = "Case-insensitive substring"),
        ("publishedYear" = Option<i32>, Query, description = "Exact year"),
        ("availableCopies" = Option<i32>, Query, description = "Minimum available copies"),
        ("idBook" = Option<String>, Query, description = "Exact book key"),
        ("sort" = Option<String>, Query, description = "Sort field (default createdAt)"),
        ("order" = Option<String>, Query, description = "asc or desc (default desc)"),
        ("page" = Option<i64>, Query, description = "Page number, enables paging"),
        ("limit" = Option<i64>, Query, description = "Page size, enables paging")
    ),
    responses(
        (status = 200, description = "Matching books with total (and paging members when paged)", body = Vec<Book>),
        (status = 400, description = "Invalid query parameter", body = crate::error::ErrorResponse)
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<BookQuery>,
) -> AppResult<Json<Envelope<Vec<Book>>>> {
    let options = BookListOptions::try_from(query)?;
    let (books, total) = state.services.books.list(&options).await?;

    let envelope = match options.page {
        Some(page) => Envelope::data(books).paged(page, total),
        None => Envelope::data(books).total(total),
    };
    Ok(Json(envelope))
}

/// Create a book
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Missing field, duplicate idBook or unknown authorId", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    ApiJson(book): ApiJson<CreateBook>,
) -> AppResult<(StatusCode, Json<Envelope<Book>>)> {
    let created = state.services.books.create(book).await?;
    Ok((StatusCode::CREATED, Json(Envelope::data(created))))
}

/// Update a book selected by `_id` or `idBook`
#[utoipa::path(
    put,
    path = "/books",
    tag = "books",
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 400, description = "Invalid input", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    ApiJson(book): ApiJson<UpdateBook>,
) -> AppResult<Json<Envelope<Book>>> {
    let updated = state.services.books.update(book).await?;
    Ok(Json(Envelope::data(updated)))
}

/// Delete a book selected by `_id` or `idBook`
#[utoipa::path(
    delete,
    path = "/books",
    tag = "books",
    params(
        ("_id" = Option<String>, Query, description = "Internal identifier"),
        ("idBook" = Option<String>, Query, description = "Book key")
    ),
    responses(
        (status = 200, description = "Book deleted", body = Book),
        (status = 400, description = "Missing selector", body = crate::error::ErrorResponse),
        (status = 404, description = "Book not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<DeleteBookParams>,
) -> AppResult<Json<Envelope<Book>>> {
    let selector = BookSelector::from_params(params.id, params.id_book)?;
    let deleted = state.services.books.delete(&selector).await?;
    Ok(Json(
        Envelope::data(deleted).message("Book deleted successfully"),
    ))
}
