//! Users repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{lock_sequence, next_sequential_id, UserStore};
use crate::{
    error::AppResult,
    models::{NewUser, User, UserChanges},
};

const USER_COLUMNS: &str = "id, user_id, username, password, created_at";

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// `UPDATE` touching only the fields present in `changes`
pub fn update_query(user_id: i32, changes: &UserChanges) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE users SET ");
    {
        let mut sets = qb.separated(", ");
        if let Some(ref username) = changes.username {
            sets.push("username = ").push_bind_unseparated(username.clone());
        }
        if let Some(ref password_hash) = changes.password_hash {
            sets.push("password = ")
                .push_bind_unseparated(password_hash.clone());
        }
    }
    qb.push(" WHERE user_id = ").push_bind(user_id);
    qb.push(format!(" RETURNING {}", USER_COLUMNS));
    qb
}

#[async_trait]
impl UserStore for UsersRepository {
    async fn list(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY user_id",
            USER_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn username_exists(
        &self,
        username: &str,
        exclude_user_id: Option<i32>,
    ) -> AppResult<bool> {
        let exists: bool = if let Some(user_id) = exclude_user_id {
            sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 AND user_id != $2)",
            )
            .bind(username)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?
        } else {
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?
        };
        Ok(exists)
    }

    async fn create(&self, user: &NewUser) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;
        lock_sequence(&mut tx, "users.user_id").await?;

        let user_id = match user.user_id {
            Some(user_id) => user_id,
            None => {
                let max: Option<i32> = sqlx::query_scalar("SELECT MAX(user_id) FROM users")
                    .fetch_one(&mut *tx)
                    .await?;
                next_sequential_id("id", max)?
            }
        };

        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, user_id, username, password)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn update(&self, user_id: i32, changes: &UserChanges) -> AppResult<Option<User>> {
        if changes.username.is_none() && changes.password_hash.is_none() {
            let user = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE user_id = $1",
                USER_COLUMNS
            ))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
            return Ok(user);
        }

        let user = update_query(user_id, changes)
            .build_query_as::<User>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn delete(&self, user_id: i32) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "DELETE FROM users WHERE user_id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_only_update() {
        let qb = update_query(
            7,
            &UserChanges {
                username: None,
                password_hash: Some("$argon2id$...".into()),
            },
        );
        assert_eq!(
            qb.sql(),
            format!(
                "UPDATE users SET password = $1 WHERE user_id = $2 RETURNING {}",
                USER_COLUMNS
            )
        );
    }
}
