//! Data models for the catalog

pub mod author;
pub mod book;
pub mod params;
pub mod user;

// Re-export commonly used types
pub use author::{Author, AuthorFilter, AuthorSelector, NewAuthor};
pub use book::{Book, BookFilter, BookListOptions, BookSelector, NewBook, Page};
pub use user::{NewUser, User, UserChanges, UserProfile};
