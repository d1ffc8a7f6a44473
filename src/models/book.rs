//! Book model, write payloads and the typed listing filter

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgRow, FromRow, Row};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::{
    author::Author,
    params::{non_empty, parse_number, parse_uuid, present},
};
use crate::error::{AppError, AppResult};

/// Cover image URLs must look like `http(s)://host.tld/...`
static IMG_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^https?://.+\..+").expect("valid image URL pattern")
});

pub fn is_valid_img_url(url: &str) -> bool {
    IMG_URL.is_match(url)
}

/// Book with its author joined on `authorId`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Internal identifier
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// Application-level unique key
    pub id_book: String,
    pub title: String,
    /// Soft reference to `Author::author_id`
    pub author_id: i32,
    pub category: Option<String>,
    pub published_year: Option<i32>,
    pub available_copies: i32,
    pub img: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Populated at read time, never stored. `None` when the author was
    /// deleted after the book was written.
    pub author: Option<Author>,
}

// Author columns come from a LEFT JOIN and are aliased `a_<column>`.
impl<'r> FromRow<'r, PgRow> for Book {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let author = match row.try_get::<Option<Uuid>, _>("a_id")? {
            Some(id) => Some(Author {
                id,
                author_id: row.try_get("a_author_id")?,
                name: row.try_get("a_name")?,
                nationality: row.try_get("a_nationality")?,
                birth_year: row.try_get("a_birth_year")?,
                is_active: row.try_get("a_is_active")?,
                created_at: row.try_get("a_created_at")?,
            }),
            None => None,
        };

        Ok(Book {
            id: row.try_get("id")?,
            id_book: row.try_get("id_book")?,
            title: row.try_get("title")?,
            author_id: row.try_get("author_id")?,
            category: row.try_get("category")?,
            published_year: row.try_get("published_year")?,
            available_copies: row.try_get("available_copies")?,
            img: row.try_get("img")?,
            created_at: row.try_get("created_at")?,
            author,
        })
    }
}

/// Create book request. Every field is required; they are optional here so
/// a missing one is reported by name instead of as a JSON error.
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBook {
    pub id_book: Option<String>,
    pub title: Option<String>,
    pub author_id: Option<i32>,
    pub category: Option<String>,
    pub published_year: Option<i32>,
    pub available_copies: Option<i32>,
    pub img: Option<String>,
}

/// Book ready for insertion, after field validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub id_book: String,
    pub title: String,
    pub author_id: i32,
    pub category: String,
    pub published_year: i32,
    pub available_copies: i32,
    pub img: String,
}

fn required<T>(value: Option<T>, name: &str) -> AppResult<T> {
    value.ok_or_else(|| AppError::Validation(format!("{} is required", name)))
}

/// Blank text counts as missing; present text is kept as sent
fn required_text(value: Option<String>, name: &str) -> AppResult<String> {
    required(present(value), name)
}

impl TryFrom<CreateBook> for NewBook {
    type Error = AppError;

    fn try_from(data: CreateBook) -> AppResult<Self> {
        let id_book = required_text(data.id_book, "idBook")?;
        let title = required_text(data.title, "title")?;
        let author_id = required(data.author_id, "authorId")?;
        let category = required_text(data.category, "category")?;
        let published_year = required(data.published_year, "publishedYear")?;
        let available_copies = required(data.available_copies, "availableCopies")?;
        let img = required_text(data.img, "img")?;

        if published_year <= 0 {
            return Err(AppError::Validation(
                "publishedYear must be greater than 0".to_string(),
            ));
        }
        if available_copies < 0 {
            return Err(AppError::Validation(
                "availableCopies cannot be negative".to_string(),
            ));
        }
        if !is_valid_img_url(&img) {
            return Err(AppError::Validation("img must be a valid URL".to_string()));
        }

        Ok(Self {
            id_book,
            title,
            author_id,
            category,
            published_year,
            available_copies,
            img,
        })
    }
}

/// Update book request; `_id` or `idBook` selects the record
#[derive(Debug, Default, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBook {
    #[serde(rename = "_id")]
    pub id: Option<Uuid>,
    pub id_book: Option<String>,
    pub title: Option<String>,
    pub author_id: Option<i32>,
    pub category: Option<String>,
    #[validate(range(min = 1, message = "publishedYear must be greater than 0"))]
    pub published_year: Option<i32>,
    #[validate(range(min = 0, message = "availableCopies cannot be negative"))]
    pub available_copies: Option<i32>,
    pub img: Option<String>,
}

impl UpdateBook {
    pub fn selector(&self) -> AppResult<BookSelector> {
        if let Some(id) = self.id {
            return Ok(BookSelector::Id(id));
        }
        present(self.id_book.clone())
            .map(BookSelector::IdBook)
            .ok_or_else(|| AppError::Validation("_id or idBook is required".to_string()))
    }

    /// Field checks for the values present in the payload
    pub fn check(&self) -> AppResult<()> {
        self.validate()?;
        if let Some(ref img) = self.img {
            if !img.is_empty() && !is_valid_img_url(img) {
                return Err(AppError::Validation("img must be a valid URL".to_string()));
            }
        }
        if let Some(ref title) = self.title {
            if title.trim().is_empty() {
                return Err(AppError::Validation("title cannot be empty".to_string()));
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author_id.is_none()
            && self.category.is_none()
            && self.published_year.is_none()
            && self.available_copies.is_none()
            && self.img.is_none()
    }
}

/// How an update or delete locates its book
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookSelector {
    Id(Uuid),
    IdBook(String),
}

impl BookSelector {
    /// Build from the `_id` / `idBook` query parameters; `_id` wins
    pub fn from_params(id: Option<String>, id_book: Option<String>) -> AppResult<Self> {
        if let Some(id) = parse_uuid(id)? {
            return Ok(BookSelector::Id(id));
        }
        present(id_book)
            .map(BookSelector::IdBook)
            .ok_or_else(|| AppError::Validation("_id or idBook is required".to_string()))
    }
}

impl std::fmt::Display for BookSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BookSelector::Id(id) => write!(f, "_id {}", id),
            BookSelector::IdBook(id_book) => write!(f, "idBook {}", id_book),
        }
    }
}

/// Delete book query parameters
#[derive(Debug, Default, Deserialize)]
pub struct DeleteBookParams {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    #[serde(rename = "idBook")]
    pub id_book: Option<String>,
}

// =========================================================================
// LISTING
// =========================================================================

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;

/// Raw book list query string. Everything arrives as text so that presence
/// and parsing are checked explicitly.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookQuery {
    pub author_id: Option<String>,
    pub category: Option<String>,
    pub title: Option<String>,
    pub published_year: Option<String>,
    pub available_copies: Option<String>,
    pub id_book: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

/// Storage-independent book predicate. Present fields are ANDed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    /// Exact match
    pub author_id: Option<i32>,
    /// Case-insensitive substring
    pub category: Option<String>,
    /// Case-insensitive substring
    pub title: Option<String>,
    /// Exact match
    pub published_year: Option<i32>,
    /// At least this many copies
    pub min_available_copies: Option<i32>,
    /// Exact match
    pub id_book: Option<String>,
}

/// Sortable book fields, named as they appear in JSON
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortField {
    Id,
    IdBook,
    Title,
    AuthorId,
    Category,
    PublishedYear,
    AvailableCopies,
    Img,
    #[default]
    CreatedAt,
}

impl SortField {
    /// Unknown names fall back to the creation timestamp
    pub fn from_param(name: &str) -> Self {
        match name {
            "_id" => SortField::Id,
            "idBook" => SortField::IdBook,
            "title" => SortField::Title,
            "authorId" => SortField::AuthorId,
            "category" => SortField::Category,
            "publishedYear" => SortField::PublishedYear,
            "availableCopies" => SortField::AvailableCopies,
            "img" => SortField::Img,
            _ => SortField::CreatedAt,
        }
    }

    pub fn column(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::IdBook => "id_book",
            SortField::Title => "title",
            SortField::AuthorId => "author_id",
            SortField::Category => "category",
            SortField::PublishedYear => "published_year",
            SortField::AvailableCopies => "available_copies",
            SortField::Img => "img",
            SortField::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn from_param(order: Option<&str>) -> Self {
        match order {
            Some(o) if o.eq_ignore_ascii_case("asc") => SortOrder::Asc,
            _ => SortOrder::Desc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// One page of results; both values are at least 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub limit: i64,
}

impl Page {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    /// `ceil(total / limit)`
    pub fn total_pages(&self, total: i64) -> i64 {
        if total <= 0 {
            0
        } else {
            (total - 1) / self.limit + 1
        }
    }
}

/// Everything the book listing needs: filter, ordering and optional paging
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookListOptions {
    pub filter: BookFilter,
    pub sort: SortField,
    pub order: SortOrder,
    /// `None` returns every matching book
    pub page: Option<Page>,
}

impl TryFrom<BookQuery> for BookListOptions {
    type Error = AppError;

    fn try_from(query: BookQuery) -> AppResult<Self> {
        let filter = BookFilter {
            author_id: parse_number("authorId", query.author_id)?,
            category: non_empty(query.category),
            title: non_empty(query.title),
            published_year: parse_number("publishedYear", query.published_year)?,
            min_available_copies: parse_number("availableCopies", query.available_copies)?,
            id_book: present(query.id_book),
        };

        let sort = non_empty(query.sort)
            .map(|s| SortField::from_param(&s))
            .unwrap_or_default();
        let order = SortOrder::from_param(non_empty(query.order).as_deref());

        let page_num = parse_number::<i64>("page", query.page)?;
        let limit = parse_number::<i64>("limit", query.limit)?;
        let page = match (page_num, limit) {
            (None, None) => None,
            (p, l) => Some(Page::new(
                p.unwrap_or(DEFAULT_PAGE),
                l.unwrap_or(DEFAULT_LIMIT),
            )),
        };

        Ok(Self {
            filter,
            sort,
            order,
            page,
        })
    }
}
