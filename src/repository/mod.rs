//! Repository layer for database operations
//!
//! Each collection is reached through a store trait so services can be
//! exercised against mocks; the Postgres repositories below implement them.

pub mod authors;
pub mod books;
pub mod users;

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::{
        author::UpdateAuthor,
        book::UpdateBook,
        Author, AuthorFilter, AuthorSelector, Book, BookListOptions, BookSelector, NewAuthor,
        NewBook, NewUser, User, UserChanges,
    },
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthorStore: Send + Sync {
    async fn list(&self, filter: &AuthorFilter) -> AppResult<Vec<Author>>;

    async fn exists(&self, author_id: i32) -> AppResult<bool>;

    /// Insert, assigning `max(authorId) + 1` when no authorId is given
    async fn create(&self, author: &NewAuthor) -> AppResult<Author>;

    /// `None` when no author matches the selector
    async fn update(
        &self,
        selector: &AuthorSelector,
        changes: &UpdateAuthor,
    ) -> AppResult<Option<Author>>;

    async fn delete(&self, selector: &AuthorSelector) -> AppResult<Option<Author>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Matching books (one page of them when paging is requested) and the
    /// total number of matches
    async fn list(&self, options: &BookListOptions) -> AppResult<(Vec<Book>, i64)>;

    async fn id_book_exists(&self, id_book: &str) -> AppResult<bool>;

    async fn create(&self, book: &NewBook) -> AppResult<Book>;

    async fn update(&self, selector: &BookSelector, changes: &UpdateBook)
        -> AppResult<Option<Book>>;

    async fn delete(&self, selector: &BookSelector) -> AppResult<Option<Book>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn list(&self) -> AppResult<Vec<User>>;

    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>>;

    async fn username_exists(&self, username: &str, exclude_user_id: Option<i32>)
        -> AppResult<bool>;

    /// Insert, assigning `max(id) + 1` when no id is given
    async fn create(&self, user: &NewUser) -> AppResult<User>;

    async fn update(&self, user_id: i32, changes: &UserChanges) -> AppResult<Option<User>>;

    async fn delete(&self, user_id: i32) -> AppResult<Option<User>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// Round-trip to the backing store
    async fn ping(&self) -> AppResult<()>;
}

/// Main repository struct holding database connection pool
#[derive(Clone)]
pub struct Repository {
    pub pool: Pool<Postgres>,
    pub authors: authors::AuthorsRepository,
    pub books: books::BooksRepository,
    pub users: users::UsersRepository,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            authors: authors::AuthorsRepository::new(pool.clone()),
            books: books::BooksRepository::new(pool.clone()),
            users: users::UsersRepository::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl HealthProbe for Repository {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Next application id after the current maximum (1 for an empty collection).
/// Fails once the maximum is `i32::MAX`; an explicit id is then required.
pub fn next_sequential_id(name: &str, current_max: Option<i32>) -> AppResult<i32> {
    match current_max {
        None => Ok(1),
        Some(max) => max.checked_add(1).ok_or_else(|| {
            AppError::Conflict(format!("No {} left to assign; provide one explicitly", name))
        }),
    }
}

/// Serialize "max + 1" id assignment for one sequence until the transaction
/// ends. Concurrent creates queue here instead of computing the same id.
pub(crate) async fn lock_sequence(
    tx: &mut Transaction<'_, Postgres>,
    sequence: &str,
) -> AppResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(sequence)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

/// `%value%` with LIKE wildcards in the value matched literally
pub fn contains_pattern(value: &str) -> String {
    let mut pattern = String::with_capacity(value.len() + 2);
    pattern.push('%');
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_id_is_one() {
        assert_eq!(next_sequential_id("authorId", None).unwrap(), 1);
        assert_eq!(next_sequential_id("authorId", Some(41)).unwrap(), 42);
    }

    #[test]
    fn exhausted_sequence_is_a_conflict() {
        let err = next_sequential_id("authorId", Some(i32::MAX)).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(
            err.to_string(),
            "No authorId left to assign; provide one explicitly"
        );
    }

    #[test]
    fn contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("hor"), "%hor%");
        assert_eq!(contains_pattern("100%_pure"), "%100\\%\\_pure%");
        assert_eq!(contains_pattern("a\\b"), "%a\\\\b%");
    }
}
