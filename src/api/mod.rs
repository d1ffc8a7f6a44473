//! API handlers for the catalog REST endpoints

pub mod auth;
pub mod authors;
pub mod books;
pub mod health;
pub mod openapi;
pub mod users;

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{request::Parts, Method},
    routing::{get, post},
    Json, Router,
};
use serde::{de::DeserializeOwned, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::AppError, models::Page, AppState};

/// Methods served by every collection route
pub const COLLECTION_METHODS: &str = "GET, POST, PUT, DELETE";

/// Methods served by the login route
pub const LOGIN_METHODS: &str = "POST";

/// Success envelope. Absent members are left out of the JSON.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<i64>,
}

impl<T> Envelope<T> {
    pub fn data(data: T) -> Self {
        Self {
            ok: true,
            data: Some(data),
            message: None,
            total: None,
            page: None,
            limit: None,
            total_pages: None,
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn total(mut self, total: i64) -> Self {
        self.total = Some(total);
        self
    }

    /// Total plus the paging members
    pub fn paged(self, page: Page, total: i64) -> Self {
        Self {
            page: Some(page.page),
            limit: Some(page.limit),
            total_pages: Some(page.total_pages(total)),
            ..self.total(total)
        }
    }
}

/// JSON body extractor whose rejections use the error envelope
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        Ok(ApiJson(value))
    }
}

/// Query string extractor whose rejections use the error envelope
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        Ok(ApiQuery(value))
    }
}

async fn collection_method_not_allowed(method: Method) -> AppError {
    AppError::MethodNotAllowed {
        method,
        allowed: COLLECTION_METHODS,
    }
}

async fn login_method_not_allowed(method: Method) -> AppError {
    AppError::MethodNotAllowed {
        method,
        allowed: LOGIN_METHODS,
    }
}

/// Create the application router with all routes
pub fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        // Health check
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        // Authentication
        .route(
            "/login",
            post(auth::login).fallback(login_method_not_allowed),
        )
        // Authors
        .route(
            "/authors",
            get(authors::list_authors)
                .post(authors::create_author)
                .put(authors::update_author)
                .delete(authors::delete_author)
                .fallback(collection_method_not_allowed),
        )
        // Books
        .route(
            "/books",
            get(books::list_books)
                .post(books::create_book)
                .put(books::update_book)
                .delete(books::delete_book)
                .fallback(collection_method_not_allowed),
        )
        // Users
        .route(
            "/users",
            get(users::list_users)
                .post(users::create_user)
                .put(users::update_user)
                .delete(users::delete_user)
                .fallback(collection_method_not_allowed),
        )
        .with_state(state);

    Router::new()
        .nest("/api", api)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
