//! Authors service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        author::{CreateAuthor, UpdateAuthor},
        Author, AuthorFilter, AuthorSelector, NewAuthor,
    },
    repository::AuthorStore,
};

#[derive(Clone)]
pub struct AuthorsService {
    authors: Arc<dyn AuthorStore>,
}

impl AuthorsService {
    pub fn new(authors: Arc<dyn AuthorStore>) -> Self {
        Self { authors }
    }

    pub async fn list(&self, filter: &AuthorFilter) -> AppResult<Vec<Author>> {
        self.authors.list(filter).await
    }

    /// Create an author, assigning the next authorId when none is given
    pub async fn create(&self, data: CreateAuthor) -> AppResult<Author> {
        let author = NewAuthor::try_from(data)?;

        if let Some(author_id) = author.author_id {
            if self.authors.exists(author_id).await? {
                return Err(AppError::Conflict(format!(
                    "authorId {} already exists",
                    author_id
                )));
            }
        }

        let created = self.authors.create(&author).await?;
        tracing::info!("Created author {} ({})", created.author_id, created.name);
        Ok(created)
    }

    pub async fn update(&self, data: UpdateAuthor) -> AppResult<Author> {
        let selector = data.selector()?;
        if let Some(ref name) = data.name {
            if name.trim().is_empty() {
                return Err(AppError::Validation("name cannot be empty".to_string()));
            }
        }

        let updated = self
            .authors
            .update(&selector, &data)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author with {} not found", selector)))?;
        tracing::info!("Updated author {}", updated.author_id);
        Ok(updated)
    }

    /// Delete an author. Books referencing it are left in place and read
    /// back with no author.
    pub async fn delete(&self, selector: &AuthorSelector) -> AppResult<Author> {
        let deleted = self
            .authors
            .delete(selector)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Author with {} not found", selector)))?;
        tracing::info!("Deleted author {}", deleted.author_id);
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use mockall::predicate::eq;

    use super::*;
    use crate::{repository::MockAuthorStore, services::fixtures};

    fn king() -> CreateAuthor {
        CreateAuthor {
            name: Some("Stephen King".into()),
            nationality: Some("American".into()),
            birth_year: Some(1947),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn create_without_author_id_lets_the_store_assign_it() {
        let mut store = MockAuthorStore::new();
        store.expect_exists().never();
        store
            .expect_create()
            .withf(|author: &NewAuthor| author.author_id.is_none() && author.is_active)
            .times(1)
            .returning(|author| Ok(fixtures::author(1, &author.name)));

        let created = AuthorsService::new(Arc::new(store))
            .create(king())
            .await
            .unwrap();
        assert_eq!(created.author_id, 1);
        assert_eq!(created.name, "Stephen King");
    }

    #[tokio::test]
    async fn explicit_author_id_must_be_free() {
        let mut store = MockAuthorStore::new();
        store.expect_exists().with(eq(1)).returning(|_| Ok(true));
        store.expect_create().never();

        let err = AuthorsService::new(Arc::new(store))
            .create(CreateAuthor {
                author_id: Some(1),
                ..king()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.to_string(), "authorId 1 already exists");
    }

    #[tokio::test]
    async fn create_without_name_is_rejected() {
        let err = AuthorsService::new(Arc::new(MockAuthorStore::new()))
            .create(CreateAuthor::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "name is required");
    }

    #[tokio::test]
    async fn update_rejects_blank_name() {
        let mut store = MockAuthorStore::new();
        store.expect_update().never();

        let err = AuthorsService::new(Arc::new(store))
            .update(UpdateAuthor {
                author_id: Some(1),
                name: Some("   ".into()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn update_of_unknown_author_is_not_found() {
        let mut store = MockAuthorStore::new();
        store
            .expect_update()
            .withf(|selector: &AuthorSelector, _| *selector == AuthorSelector::AuthorId(9))
            .returning(|_, _| Ok(None));

        let err = AuthorsService::new(Arc::new(store))
            .update(UpdateAuthor {
                author_id: Some(9),
                is_active: Some(false),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Author with authorId 9 not found");
    }

    #[tokio::test]
    async fn delete_returns_the_removed_author() {
        let mut store = MockAuthorStore::new();
        store
            .expect_delete()
            .times(1)
            .returning(|_| Ok(Some(fixtures::author(1, "Stephen King"))));

        let deleted = AuthorsService::new(Arc::new(store))
            .delete(&AuthorSelector::AuthorId(1))
            .await
            .unwrap();
        assert_eq!(deleted.author_id, 1);
    }
}
