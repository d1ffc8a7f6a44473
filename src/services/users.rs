//! Authentication and user management service

use std::sync::Arc;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{
    error::{AppError, AppResult},
    models::{
        user::{CreateUser, LoginRequest, UpdateUser},
        NewUser, UserChanges, UserProfile,
    },
    repository::UserStore,
};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Hash a password using Argon2
pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC hash
pub fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[derive(Clone)]
pub struct UsersService {
    users: Arc<dyn UserStore>,
}

impl UsersService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Check credentials; the same error covers unknown users and bad passwords
    pub async fn authenticate(&self, request: LoginRequest) -> AppResult<UserProfile> {
        let (username, password) = request.into_credentials()?;

        let user = self
            .users
            .get_by_username(&username)
            .await?
            .ok_or_else(|| AppError::Authentication(INVALID_CREDENTIALS.to_string()))?;

        if !verify_password(&user.password, &password)? {
            tracing::debug!("Failed login for {}", username);
            return Err(AppError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        tracing::info!("User {} logged in", user.username);
        Ok(user.into())
    }

    pub async fn list(&self) -> AppResult<Vec<UserProfile>> {
        let users = self.users.list().await?;
        Ok(users.into_iter().map(UserProfile::from).collect())
    }

    pub async fn create(&self, data: CreateUser) -> AppResult<UserProfile> {
        let (user_id, username, password) = data.into_parts()?;

        if self.users.username_exists(&username, None).await? {
            return Err(AppError::Conflict("Username already exists".to_string()));
        }

        let user = NewUser {
            user_id,
            username,
            password_hash: hash_password(&password)?,
        };
        let created = self.users.create(&user).await?;
        tracing::info!("Created user {} ({})", created.user_id, created.username);
        Ok(created.into())
    }

    pub async fn update(&self, data: UpdateUser) -> AppResult<UserProfile> {
        let user_id = data
            .id
            .ok_or_else(|| AppError::Validation("id is required".to_string()))?;

        let username = match data.username {
            Some(username) => {
                let username = username.trim().to_string();
                if username.is_empty() {
                    return Err(AppError::Validation("username cannot be empty".to_string()));
                }
                if self.users.username_exists(&username, Some(user_id)).await? {
                    return Err(AppError::Conflict("Username already exists".to_string()));
                }
                Some(username)
            }
            None => None,
        };

        let password_hash = match data.password {
            Some(password) if password.is_empty() => {
                return Err(AppError::Validation("password cannot be empty".to_string()))
            }
            Some(password) => Some(hash_password(&password)?),
            None => None,
        };

        let changes = UserChanges {
            username,
            password_hash,
        };
        let updated = self
            .users
            .update(user_id, &changes)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?;
        tracing::info!("Updated user {}", updated.user_id);
        Ok(updated.into())
    }

    pub async fn delete(&self, user_id: i32) -> AppResult<UserProfile> {
        let deleted = self
            .users
            .delete(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", user_id)))?;
        tracing::info!("Deleted user {}", deleted.user_id);
        Ok(deleted.into())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use mockall::predicate::eq;
    use uuid::Uuid;

    use super::*;
    use crate::{models::User, repository::MockUserStore};

    fn stored_user(user_id: i32, username: &str, password: &str) -> User {
        User {
            id: Uuid::new_v4(),
            user_id,
            username: username.to_string(),
            password: hash_password(password).unwrap(),
            created_at: Utc::now(),
        }
    }

    fn login(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: Some(username.into()),
            password: Some(password.into()),
        }
    }

    #[test]
    fn hash_roundtrip() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "s3cret").unwrap());
        assert!(!verify_password(&hash, "S3cret").unwrap());
    }

    #[tokio::test]
    async fn login_with_valid_credentials() {
        let mut store = MockUserStore::new();
        store
            .expect_get_by_username()
            .withf(|username: &str| username == "admin")
            .returning(|_| Ok(Some(stored_user(1, "admin", "admin123"))));

        let profile = UsersService::new(Arc::new(store))
            .authenticate(login("admin", "admin123"))
            .await
            .unwrap();
        assert_eq!(profile.id, 1);
        assert_eq!(profile.username, "admin");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_user_look_the_same() {
        let mut store = MockUserStore::new();
        store
            .expect_get_by_username()
            .returning(|username| match username {
                "admin" => Ok(Some(stored_user(1, "admin", "admin123"))),
                _ => Ok(None),
            });
        let service = UsersService::new(Arc::new(store));

        let wrong = service.authenticate(login("admin", "nope")).await.unwrap_err();
        let unknown = service.authenticate(login("ghost", "admin123")).await.unwrap_err();
        assert!(matches!(wrong, AppError::Authentication(_)));
        assert_eq!(wrong.to_string(), unknown.to_string());
    }

    #[tokio::test]
    async fn create_stores_a_hash_not_the_password() {
        let mut store = MockUserStore::new();
        store.expect_username_exists().returning(|_, _| Ok(false));
        store
            .expect_create()
            .withf(|user: &NewUser| {
                user.username == "librarian"
                    && user.password_hash != "pa55"
                    && verify_password(&user.password_hash, "pa55").unwrap()
            })
            .times(1)
            .returning(|user| {
                Ok(User {
                    id: Uuid::new_v4(),
                    user_id: 2,
                    username: user.username.clone(),
                    password: user.password_hash.clone(),
                    created_at: Utc::now(),
                })
            });

        let profile = UsersService::new(Arc::new(store))
            .create(CreateUser {
                id: None,
                username: Some("librarian".into()),
                password: Some("pa55".into()),
            })
            .await
            .unwrap();
        assert_eq!(profile.id, 2);
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let mut store = MockUserStore::new();
        store.expect_username_exists().returning(|_, _| Ok(true));
        store.expect_create().never();

        let err = UsersService::new(Arc::new(store))
            .create(CreateUser {
                id: None,
                username: Some("admin".into()),
                password: Some("x".into()),
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Username already exists");
    }

    #[tokio::test]
    async fn update_excludes_self_from_uniqueness_check() {
        let mut store = MockUserStore::new();
        store
            .expect_username_exists()
            .withf(|username: &str, exclude: &Option<i32>| {
                username == "admin" && *exclude == Some(1)
            })
            .returning(|_, _| Ok(false));
        store
            .expect_update()
            .with(eq(1), mockall::predicate::always())
            .returning(|_, changes| {
                Ok(Some(User {
                    id: Uuid::new_v4(),
                    user_id: 1,
                    username: changes.username.clone().unwrap_or_default(),
                    password: "$argon2id$".into(),
                    created_at: Utc::now(),
                }))
            });

        let profile = UsersService::new(Arc::new(store))
            .update(UpdateUser {
                id: Some(1),
                username: Some(" admin ".into()),
                password: None,
            })
            .await
            .unwrap();
        assert_eq!(profile.username, "admin");
    }

    #[tokio::test]
    async fn update_requires_id() {
        let err = UsersService::new(Arc::new(MockUserStore::new()))
            .update(UpdateUser::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "id is required");
    }

    #[tokio::test]
    async fn delete_of_unknown_user_is_not_found() {
        let mut store = MockUserStore::new();
        store.expect_delete().with(eq(5)).returning(|_| Ok(None));

        let err = UsersService::new(Arc::new(store)).delete(5).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
