//! Book catalog service

use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{CreateBook, UpdateBook},
        Book, BookListOptions, BookSelector, NewBook,
    },
    repository::{AuthorStore, BookStore},
};

#[derive(Clone)]
pub struct BooksService {
    books: Arc<dyn BookStore>,
    authors: Arc<dyn AuthorStore>,
}

impl BooksService {
    pub fn new(books: Arc<dyn BookStore>, authors: Arc<dyn AuthorStore>) -> Self {
        Self { books, authors }
    }

    /// List books with filters; `total` counts every match, not just the page
    pub async fn list(&self, options: &BookListOptions) -> AppResult<(Vec<Book>, i64)> {
        self.books.list(options).await
    }

    /// Create a book after field, uniqueness and author checks
    pub async fn create(&self, data: CreateBook) -> AppResult<Book> {
        let book = NewBook::try_from(data)?;

        if self.books.id_book_exists(&book.id_book).await? {
            tracing::debug!("Rejected book create: idBook {} exists", book.id_book);
            return Err(AppError::Conflict(format!(
                "idBook {} already exists",
                book.id_book
            )));
        }

        self.ensure_author(book.author_id).await?;

        let created = self.books.create(&book).await?;
        tracing::info!("Created book {} ({})", created.id_book, created.id);
        Ok(created)
    }

    /// Partial update; constraints apply to the fields present
    pub async fn update(&self, data: UpdateBook) -> AppResult<Book> {
        let selector = data.selector()?;
        data.check()?;

        if let Some(author_id) = data.author_id {
            self.ensure_author(author_id).await?;
        }

        let updated = self
            .books
            .update(&selector, &data)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with {} not found", selector)))?;
        tracing::info!("Updated book {}", updated.id_book);
        Ok(updated)
    }

    /// Delete a book, returning what was removed
    pub async fn delete(&self, selector: &BookSelector) -> AppResult<Book> {
        let deleted = self
            .books
            .delete(selector)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with {} not found", selector)))?;
        tracing::info!("Deleted book {}", deleted.id_book);
        Ok(deleted)
    }

    async fn ensure_author(&self, author_id: i32) -> AppResult<()> {
        if !self.authors.exists(author_id).await? {
            tracing::debug!("Rejected book write: authorId {} missing", author_id);
            return Err(AppError::Reference(format!(
                "authorId {} does not exist",
                author_id
            )));
        }
        Ok(())
    }
}
