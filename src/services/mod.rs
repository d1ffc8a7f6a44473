//! Business logic services

pub mod authors;
pub mod books;
pub mod users;

use std::sync::Arc;

use crate::repository::{AuthorStore, BookStore, HealthProbe, Repository, UserStore};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub authors: authors::AuthorsService,
    pub books: books::BooksService,
    pub users: users::UsersService,
    pub health: Arc<dyn HealthProbe>,
}

impl Services {
    /// Create all services backed by the Postgres repository
    pub fn new(repository: Repository) -> Self {
        Self::from_stores(
            Arc::new(repository.authors.clone()),
            Arc::new(repository.books.clone()),
            Arc::new(repository.users.clone()),
            Arc::new(repository),
        )
    }

    /// Create all services over arbitrary stores
    pub fn from_stores(
        authors: Arc<dyn AuthorStore>,
        books: Arc<dyn BookStore>,
        users: Arc<dyn UserStore>,
        health: Arc<dyn HealthProbe>,
    ) -> Self {
        Self {
            authors: authors::AuthorsService::new(authors.clone()),
            books: books::BooksService::new(books, authors),
            users: users::UsersService::new(users),
            health,
        }
    }
}
