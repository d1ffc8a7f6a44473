//! Authors repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{contains_pattern, lock_sequence, next_sequential_id, AuthorStore};
use crate::{
    error::AppResult,
    models::{
        author::UpdateAuthor, params::nullable, Author, AuthorFilter, AuthorSelector, NewAuthor,
    },
};

const AUTHOR_COLUMNS: &str =
    "id, author_id, name, nationality, birth_year, is_active, created_at";

#[derive(Clone)]
pub struct AuthorsRepository {
    pool: Pool<Postgres>,
}

impl AuthorsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn push_selector(qb: &mut QueryBuilder<'_, Postgres>, selector: &AuthorSelector) {
    match selector {
        AuthorSelector::Id(id) => qb.push(" WHERE id = ").push_bind(*id),
        AuthorSelector::AuthorId(author_id) => {
            qb.push(" WHERE author_id = ").push_bind(*author_id)
        }
    };
}

/// `SELECT` for the author list, filters bound as parameters
pub fn list_query(filter: &AuthorFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {} FROM authors WHERE 1=1", AUTHOR_COLUMNS));

    if let Some(ref name) = filter.name {
        qb.push(" AND name ILIKE ").push_bind(contains_pattern(name));
    }
    if let Some(ref nationality) = filter.nationality {
        qb.push(" AND nationality ILIKE ")
            .push_bind(contains_pattern(nationality));
    }
    if let Some(is_active) = filter.is_active {
        qb.push(" AND is_active = ").push_bind(is_active);
    }

    qb.push(" ORDER BY author_id");
    qb
}

/// `UPDATE` touching only the fields present in `changes`
pub fn update_query(
    selector: &AuthorSelector,
    changes: &UpdateAuthor,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("UPDATE authors SET ");
    {
        let mut sets = qb.separated(", ");
        if let Some(ref name) = changes.name {
            sets.push("name = ").push_bind_unseparated(name.trim().to_string());
        }
        if let Some(ref nationality) = changes.nationality {
            sets.push("nationality = ")
                .push_bind_unseparated(nullable(nationality));
        }
        if let Some(birth_year) = changes.birth_year {
            sets.push("birth_year = ").push_bind_unseparated(birth_year);
        }
        if let Some(is_active) = changes.is_active {
            sets.push("is_active = ").push_bind_unseparated(is_active);
        }
    }
    push_selector(&mut qb, selector);
    qb.push(format!(" RETURNING {}", AUTHOR_COLUMNS));
    qb
}

#[async_trait]
impl AuthorStore for AuthorsRepository {
    async fn list(&self, filter: &AuthorFilter) -> AppResult<Vec<Author>> {
        let authors = list_query(filter)
            .build_query_as::<Author>()
            .fetch_all(&self.pool)
            .await?;
        Ok(authors)
    }

    async fn exists(&self, author_id: i32) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM authors WHERE author_id = $1)")
                .bind(author_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn create(&self, author: &NewAuthor) -> AppResult<Author> {
        let mut tx = self.pool.begin().await?;
        lock_sequence(&mut tx, "authors.author_id").await?;

        let author_id = match author.author_id {
            Some(author_id) => author_id,
            None => {
                let max: Option<i32> = sqlx::query_scalar("SELECT MAX(author_id) FROM authors")
                    .fetch_one(&mut *tx)
                    .await?;
                next_sequential_id("authorId", max)?
            }
        };

        let created = sqlx::query_as::<_, Author>(&format!(
            r#"
            INSERT INTO authors (id, author_id, name, nationality, birth_year, is_active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            AUTHOR_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(author_id)
        .bind(&author.name)
        .bind(&author.nationality)
        .bind(author.birth_year)
        .bind(author.is_active)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    async fn update(
        &self,
        selector: &AuthorSelector,
        changes: &UpdateAuthor,
    ) -> AppResult<Option<Author>> {
        if changes.is_empty() {
            let mut qb = QueryBuilder::new(format!("SELECT {} FROM authors", AUTHOR_COLUMNS));
            push_selector(&mut qb, selector);
            let author = qb
                .build_query_as::<Author>()
                .fetch_optional(&self.pool)
                .await?;
            return Ok(author);
        }

        let author = update_query(selector, changes)
            .build_query_as::<Author>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(author)
    }

    async fn delete(&self, selector: &AuthorSelector) -> AppResult<Option<Author>> {
        let mut qb = QueryBuilder::new("DELETE FROM authors");
        push_selector(&mut qb, selector);
        qb.push(format!(" RETURNING {}", AUTHOR_COLUMNS));

        let author = qb
            .build_query_as::<Author>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(author)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unfiltered_list_orders_by_author_id() {
        let qb = list_query(&AuthorFilter::default());
        assert_eq!(
            qb.sql(),
            format!("SELECT {} FROM authors WHERE 1=1 ORDER BY author_id", AUTHOR_COLUMNS)
        );
    }

    #[test]
    fn filters_are_bound_in_order() {
        let qb = list_query(&AuthorFilter {
            name: Some("king".into()),
            nationality: None,
            is_active: Some(true),
        });
        assert!(qb
            .sql()
            .ends_with("WHERE 1=1 AND name ILIKE $1 AND is_active = $2 ORDER BY author_id"));
    }

    #[test]
    fn blank_nationality_is_still_written() {
        let qb = update_query(
            &AuthorSelector::AuthorId(1),
            &UpdateAuthor {
                author_id: Some(1),
                nationality: Some(String::new()),
                ..Default::default()
            },
        );
        assert!(qb
            .sql()
            .starts_with("UPDATE authors SET nationality = $1 WHERE author_id = $2"));
        assert_eq!(nullable(""), None);
    }

    #[test]
    fn update_sets_only_present_fields() {
        let qb = update_query(
            &AuthorSelector::AuthorId(1),
            &UpdateAuthor {
                author_id: Some(1),
                nationality: Some("British".into()),
                is_active: Some(false),
                ..Default::default()
            },
        );
        assert_eq!(
            qb.sql(),
            format!(
                "UPDATE authors SET nationality = $1, is_active = $2 WHERE author_id = $3 RETURNING {}",
                AUTHOR_COLUMNS
            )
        );
    }
}
