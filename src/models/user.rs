//! User model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use super::params::{non_empty, parse_number};
use crate::error::{AppError, AppResult};

/// Full user row. Never serialized: it carries the password hash.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    pub id: Uuid,
    /// Application-level numeric id
    pub user_id: i32,
    pub username: String,
    /// Argon2 PHC string
    pub password: String,
    pub created_at: DateTime<Utc>,
}

/// Public user projection, without the password
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i32,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.user_id,
            username: user.username,
            created_at: user.created_at,
        }
    }
}

/// Create user request
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    /// Assigned as max(id) + 1 when omitted
    #[validate(range(min = 1, message = "id must be a positive number"))]
    pub id: Option<i32>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl CreateUser {
    /// Validated `(id, username, password)`
    pub fn into_parts(self) -> AppResult<(Option<i32>, String, String)> {
        self.validate()?;
        let (username, password) = credentials(self.username, self.password)
            .ok_or_else(|| AppError::Validation("username and password are required".to_string()))?;
        Ok((self.id, username, password))
    }
}

/// Username is trimmed; the password is taken verbatim
fn credentials(username: Option<String>, password: Option<String>) -> Option<(String, String)> {
    let username = non_empty(username)?;
    let password = password.filter(|p| !p.is_empty())?;
    Some((username, password))
}

/// User with an already hashed password, ready for insertion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub user_id: Option<i32>,
    pub username: String,
    pub password_hash: String,
}

/// Update user request; `id` selects the record
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUser {
    pub id: Option<i32>,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Changes to apply to a user, password already hashed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub username: Option<String>,
    pub password_hash: Option<String>,
}

/// Delete user query parameters
#[derive(Debug, Default, Deserialize)]
pub struct DeleteUserParams {
    pub id: Option<String>,
}

impl DeleteUserParams {
    pub fn user_id(self) -> AppResult<i32> {
        parse_number::<i32>("id", self.id)?
            .ok_or_else(|| AppError::Validation("id is required".to_string()))
    }
}

/// Login request
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    pub fn into_credentials(self) -> AppResult<(String, String)> {
        credentials(self.username, self.password)
            .ok_or_else(|| AppError::Validation("Username and password are required".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profile_drops_password() {
        let user = User {
            id: Uuid::new_v4(),
            user_id: 3,
            username: "librarian".into(),
            password: "$argon2id$v=19$...".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(UserProfile::from(user)).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["username"], "librarian");
        assert!(json.get("password").is_none());
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn create_requires_credentials() {
        let err = CreateUser {
            username: Some("admin".into()),
            ..Default::default()
        }
        .into_parts()
        .unwrap_err();
        assert_eq!(err.to_string(), "username and password are required");
    }

    #[test]
    fn login_requires_both_fields() {
        let err = LoginRequest {
            username: Some("".into()),
            password: Some("secret".into()),
        }
        .into_credentials()
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn delete_needs_numeric_id() {
        let err = DeleteUserParams { id: Some("x".into()) }.user_id().unwrap_err();
        assert_eq!(err.to_string(), "id must be a valid number");

        let err = DeleteUserParams::default().user_id().unwrap_err();
        assert_eq!(err.to_string(), "id is required");

        assert_eq!(DeleteUserParams { id: Some("12".into()) }.user_id().unwrap(), 12);
    }
}
