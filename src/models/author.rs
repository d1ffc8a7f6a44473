//! Author model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::params::{non_empty, nullable, parse_number, parse_uuid};
use crate::error::{AppError, AppResult};

/// Full author model from database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    /// Internal identifier
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// Application-level unique key, referenced by books
    pub author_id: i32,
    pub name: String,
    pub nationality: Option<String>,
    pub birth_year: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Create author request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAuthor {
    /// Assigned as max(authorId) + 1 when omitted
    #[validate(range(min = 1, message = "authorId must be a positive number"))]
    pub author_id: Option<i32>,
    pub name: Option<String>,
    pub nationality: Option<String>,
    pub birth_year: Option<i32>,
    pub is_active: Option<bool>,
}

/// Author ready for insertion, after validation
#[derive(Debug, Clone, PartialEq)]
pub struct NewAuthor {
    pub author_id: Option<i32>,
    pub name: String,
    pub nationality: Option<String>,
    pub birth_year: Option<i32>,
    pub is_active: bool,
}

impl TryFrom<CreateAuthor> for NewAuthor {
    type Error = AppError;

    fn try_from(data: CreateAuthor) -> AppResult<Self> {
        data.validate()?;
        let name = non_empty(data.name)
            .ok_or_else(|| AppError::Validation("name is required".to_string()))?;

        Ok(Self {
            author_id: data.author_id,
            name,
            nationality: data.nationality.as_deref().and_then(nullable),
            birth_year: data.birth_year,
            is_active: data.is_active.unwrap_or(true),
        })
    }
}

/// Update author request; `_id` or `authorId` selects the record
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAuthor {
    #[serde(rename = "_id")]
    pub id: Option<Uuid>,
    pub author_id: Option<i32>,
    pub name: Option<String>,
    pub nationality: Option<String>,
    pub birth_year: Option<i32>,
    pub is_active: Option<bool>,
}

impl UpdateAuthor {
    pub fn selector(&self) -> AppResult<AuthorSelector> {
        match (self.id, self.author_id) {
            (Some(id), _) => Ok(AuthorSelector::Id(id)),
            (None, Some(author_id)) => Ok(AuthorSelector::AuthorId(author_id)),
            (None, None) => Err(AppError::Validation(
                "_id or authorId is required".to_string(),
            )),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.nationality.is_none()
            && self.birth_year.is_none()
            && self.is_active.is_none()
    }
}

/// How an update or delete locates its author
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorSelector {
    Id(Uuid),
    AuthorId(i32),
}

impl AuthorSelector {
    /// Build from the `_id` / `authorId` query parameters; `_id` wins
    pub fn from_params(id: Option<String>, author_id: Option<String>) -> AppResult<Self> {
        if let Some(id) = parse_uuid(id)? {
            return Ok(AuthorSelector::Id(id));
        }
        parse_number::<i32>("authorId", author_id)?
            .map(AuthorSelector::AuthorId)
            .ok_or_else(|| AppError::Validation("_id or authorId is required".to_string()))
    }
}

impl std::fmt::Display for AuthorSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthorSelector::Id(id) => write!(f, "_id {}", id),
            AuthorSelector::AuthorId(author_id) => write!(f, "authorId {}", author_id),
        }
    }
}

/// Author list query parameters
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorQuery {
    pub name: Option<String>,
    pub nationality: Option<String>,
    pub is_active: Option<String>,
}

/// Typed author list filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorFilter {
    /// Case-insensitive substring
    pub name: Option<String>,
    /// Case-insensitive substring
    pub nationality: Option<String>,
    pub is_active: Option<bool>,
}

impl From<AuthorQuery> for AuthorFilter {
    fn from(query: AuthorQuery) -> Self {
        Self {
            name: non_empty(query.name),
            nationality: non_empty(query.nationality),
            // Any value other than "true", the empty one included, means inactive
            is_active: query.is_active.map(|v| v == "true"),
        }
    }
}

/// Delete author query parameters
#[derive(Debug, Default, Deserialize)]
pub struct DeleteAuthorParams {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    #[serde(rename = "authorId")]
    pub author_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_requires_name() {
        let err = NewAuthor::try_from(CreateAuthor {
            name: Some("  ".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "name is required");
    }

    #[test]
    fn create_defaults_to_active() {
        let author = NewAuthor::try_from(CreateAuthor {
            name: Some("Stephen King".into()),
            nationality: Some("American".into()),
            birth_year: Some(1947),
            ..Default::default()
        })
        .unwrap();
        assert!(author.is_active);
        assert_eq!(author.author_id, None);
    }

    #[test]
    fn create_rejects_non_positive_author_id() {
        let err = NewAuthor::try_from(CreateAuthor {
            author_id: Some(0),
            name: Some("Ursula K. Le Guin".into()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.to_string(), "authorId must be a positive number");
    }

    #[test]
    fn is_active_filter_only_matches_literal_true() {
        let filter = AuthorFilter::from(AuthorQuery {
            is_active: Some("true".into()),
            ..Default::default()
        });
        assert_eq!(filter.is_active, Some(true));

        let filter = AuthorFilter::from(AuthorQuery {
            is_active: Some("yes".into()),
            ..Default::default()
        });
        assert_eq!(filter.is_active, Some(false));

        let filter = AuthorFilter::from(AuthorQuery {
            is_active: Some("".into()),
            ..Default::default()
        });
        assert_eq!(filter.is_active, Some(false));

        let filter = AuthorFilter::from(AuthorQuery::default());
        assert_eq!(filter.is_active, None);
    }

    #[test]
    fn selector_prefers_internal_id() {
        let id = Uuid::new_v4();
        let selector = AuthorSelector::from_params(Some(id.to_string()), Some("3".into())).unwrap();
        assert_eq!(selector, AuthorSelector::Id(id));

        let selector = AuthorSelector::from_params(None, Some("3".into())).unwrap();
        assert_eq!(selector, AuthorSelector::AuthorId(3));
    }

    #[test]
    fn selector_requires_a_key() {
        let err = AuthorSelector::from_params(None, Some("".into())).unwrap_err();
        assert_eq!(err.to_string(), "_id or authorId is required");

        let err = AuthorSelector::from_params(None, Some("one".into())).unwrap_err();
        assert_eq!(err.to_string(), "authorId must be a valid number");
    }

    #[test]
    fn update_payload_uses_camel_case() {
        let update: UpdateAuthor =
            serde_json::from_str(r#"{"authorId": 4, "isActive": false}"#).unwrap();
        assert_eq!(update.selector().unwrap(), AuthorSelector::AuthorId(4));
        assert_eq!(update.is_active, Some(false));
        assert!(!update.is_empty());
    }
}
