//! Books repository: the listing query builder and book writes.
//!
//! `author` is never stored. Every read joins `authors` on the application
//! key (`books.author_id = authors.author_id`). The key is unique on the
//! authors side, so the join yields at most one author per book; a book whose
//! author was deleted comes back with `author = None`.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{contains_pattern, BookStore};
use crate::{
    error::AppResult,
    models::{
        book::{SortOrder, UpdateBook},
        params::nullable,
        Book, BookFilter, BookListOptions, BookSelector, NewBook,
    },
};

/// Book columns plus the joined author's columns, aliased `a_<column>`
const BOOK_COLUMNS: &str = "b.id, b.id_book, b.title, b.author_id, b.category, \
     b.published_year, b.available_copies, b.img, b.created_at, \
     a.id AS a_id, a.author_id AS a_author_id, a.name AS a_name, \
     a.nationality AS a_nationality, a.birth_year AS a_birth_year, \
     a.is_active AS a_is_active, a.created_at AS a_created_at";

const AUTHOR_JOIN: &str = "LEFT JOIN authors a ON a.author_id = b.author_id";

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

/// Append the `WHERE` clause for `filter`; every value is a bound parameter
pub fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &BookFilter) {
    qb.push(" WHERE 1=1");

    if let Some(author_id) = filter.author_id {
        qb.push(" AND b.author_id = ").push_bind(author_id);
    }
    if let Some(ref category) = filter.category {
        qb.push(" AND b.category ILIKE ")
            .push_bind(contains_pattern(category));
    }
    if let Some(ref title) = filter.title {
        qb.push(" AND b.title ILIKE ").push_bind(contains_pattern(title));
    }
    if let Some(published_year) = filter.published_year {
        qb.push(" AND b.published_year = ").push_bind(published_year);
    }
    if let Some(min_copies) = filter.min_available_copies {
        qb.push(" AND b.available_copies >= ").push_bind(min_copies);
    }
    if let Some(ref id_book) = filter.id_book {
        qb.push(" AND b.id_book = ").push_bind(id_book.clone());
    }
}

/// Page (or full list) of matching books, author joined
pub fn list_query(options: &BookListOptions) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {} FROM books b {}",
        BOOK_COLUMNS, AUTHOR_JOIN
    ));
    push_filter(&mut qb, &options.filter);

    // Missing values sort lowest, whichever the direction
    let (direction, nulls) = match options.order {
        SortOrder::Asc => ("ASC", "NULLS FIRST"),
        SortOrder::Desc => ("DESC", "NULLS LAST"),
    };
    qb.push(format!(
        " ORDER BY b.{} {} {}, b.id {}",
        options.sort.column(),
        direction,
        nulls,
        direction
    ));

    if let Some(page) = options.page {
        qb.push(" LIMIT ").push_bind(page.limit);
        qb.push(" OFFSET ").push_bind(page.offset());
    }
    qb
}

/// Number of books matching `filter`, ignoring paging
pub fn count_query(filter: &BookFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM books b");
    push_filter(&mut qb, filter);
    qb
}

fn push_selector(qb: &mut QueryBuilder<'_, Postgres>, selector: &BookSelector) {
    match selector {
        BookSelector::Id(id) => qb.push(" WHERE id = ").push_bind(*id),
        BookSelector::IdBook(id_book) => qb.push(" WHERE id_book = ").push_bind(id_book.clone()),
    };
}

/// Wrap a data-modifying statement so the affected row comes back joined
fn push_joined_result(qb: &mut QueryBuilder<'_, Postgres>) {
    qb.push(format!(
        " RETURNING *) SELECT {} FROM b {}",
        BOOK_COLUMNS, AUTHOR_JOIN
    ));
}

/// `UPDATE` touching only the fields present in `changes`. The selector key
/// itself is never rewritten.
pub fn update_query(
    selector: &BookSelector,
    changes: &UpdateBook,
) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new("WITH b AS (UPDATE books SET ");
    {
        let mut sets = qb.separated(", ");
        if let Some(ref title) = changes.title {
            sets.push("title = ").push_bind_unseparated(title.clone());
        }
        if let Some(author_id) = changes.author_id {
            sets.push("author_id = ").push_bind_unseparated(author_id);
        }
        if let Some(ref category) = changes.category {
            sets.push("category = ")
                .push_bind_unseparated(nullable(category));
        }
        if let Some(published_year) = changes.published_year {
            sets.push("published_year = ")
                .push_bind_unseparated(published_year);
        }
        if let Some(available_copies) = changes.available_copies {
            sets.push("available_copies = ")
                .push_bind_unseparated(available_copies);
        }
        if let Some(ref img) = changes.img {
            sets.push("img = ")
                .push_bind_unseparated(nullable(img));
        }
    }
    push_selector(&mut qb, selector);
    push_joined_result(&mut qb);
    qb
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn list(&self, options: &BookListOptions) -> AppResult<(Vec<Book>, i64)> {
        let total: i64 = count_query(&options.filter)
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let books = list_query(options)
            .build_query_as::<Book>()
            .fetch_all(&self.pool)
            .await?;

        Ok((books, total))
    }

    async fn id_book_exists(&self, id_book: &str) -> AppResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE id_book = $1)")
                .bind(id_book)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn create(&self, book: &NewBook) -> AppResult<Book> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "WITH b AS (INSERT INTO books \
             (id, id_book, title, author_id, category, published_year, available_copies, img) ",
        );
        qb.push_values(std::iter::once(book), |mut row, book| {
            row.push_bind(Uuid::new_v4())
                .push_bind(book.id_book.clone())
                .push_bind(book.title.clone())
                .push_bind(book.author_id)
                .push_bind(book.category.clone())
                .push_bind(book.published_year)
                .push_bind(book.available_copies)
                .push_bind(book.img.clone());
        });
        push_joined_result(&mut qb);

        let created = qb.build_query_as::<Book>().fetch_one(&self.pool).await?;
        Ok(created)
    }

    async fn update(
        &self,
        selector: &BookSelector,
        changes: &UpdateBook,
    ) -> AppResult<Option<Book>> {
        if changes.is_empty() {
            let mut qb = QueryBuilder::new(format!(
                "SELECT {} FROM books b {}",
                BOOK_COLUMNS, AUTHOR_JOIN
            ));
            match selector {
                BookSelector::Id(id) => qb.push(" WHERE b.id = ").push_bind(*id),
                BookSelector::IdBook(id_book) => {
                    qb.push(" WHERE b.id_book = ").push_bind(id_book.clone())
                }
            };
            let book = qb.build_query_as::<Book>().fetch_optional(&self.pool).await?;
            return Ok(book);
        }

        let book = update_query(selector, changes)
            .build_query_as::<Book>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn delete(&self, selector: &BookSelector) -> AppResult<Option<Book>> {
        let mut qb = QueryBuilder::new("WITH b AS (DELETE FROM books");
        push_selector(&mut qb, selector);
        push_joined_result(&mut qb);

        let book = qb.build_query_as::<Book>().fetch_optional(&self.pool).await?;
        Ok(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        book::{SortField, SortOrder},
        Page,
    };

    fn where_clause(sql: &str) -> &str {
        let start = sql.find(" WHERE ").expect("where clause");
        let end = sql.find(" ORDER BY ").unwrap_or(sql.len());
        &sql[start..end]
    }

    #[test]
    fn empty_filter_matches_everything() {
        let qb = count_query(&BookFilter::default());
        assert_eq!(qb.sql(), "SELECT COUNT(*) FROM books b WHERE 1=1");
    }

    #[test]
    fn every_filter_field_becomes_a_bound_predicate() {
        let filter = BookFilter {
            author_id: Some(1),
            category: Some("horror".into()),
            title: Some("shin".into()),
            published_year: Some(1977),
            min_available_copies: Some(2),
            id_book: Some("book-1".into()),
        };
        let qb = count_query(&filter);
        assert_eq!(
            where_clause(qb.sql()),
            " WHERE 1=1 AND b.author_id = $1 AND b.category ILIKE $2 AND b.title ILIKE $3 \
             AND b.published_year = $4 AND b.available_copies >= $5 AND b.id_book = $6"
        );
    }

    #[test]
    fn count_and_list_share_the_predicate() {
        let options = BookListOptions {
            filter: BookFilter {
                category: Some("Horror".into()),
                min_available_copies: Some(1),
                ..Default::default()
            },
            page: Some(Page::new(2, 5)),
            ..Default::default()
        };
        let list = list_query(&options);
        let count = count_query(&options.filter);
        assert_eq!(where_clause(list.sql()), where_clause(count.sql()));
    }

    #[test]
    fn default_listing_is_newest_first_without_limit() {
        let qb = list_query(&BookListOptions::default());
        let sql = qb.sql();
        assert!(sql.contains(AUTHOR_JOIN));
        assert!(sql.ends_with(" ORDER BY b.created_at DESC NULLS LAST, b.id DESC"));
        assert!(!sql.contains("LIMIT"));
    }

    #[test]
    fn paging_adds_limit_and_offset_after_order() {
        let options = BookListOptions {
            filter: BookFilter {
                author_id: Some(1),
                ..Default::default()
            },
            sort: SortField::Title,
            order: SortOrder::Asc,
            page: Some(Page::new(3, 10)),
        };
        let qb = list_query(&options);
        assert!(qb
            .sql()
            .ends_with(" ORDER BY b.title ASC NULLS FIRST, b.id ASC LIMIT $2 OFFSET $3"));
    }

    #[test]
    fn update_never_rewrites_the_selector_key() {
        let qb = update_query(
            &BookSelector::IdBook("book-1".into()),
            &UpdateBook {
                id_book: Some("book-1".into()),
                available_copies: Some(4),
                ..Default::default()
            },
        );
        let sql = qb.sql();
        assert!(sql.starts_with(
            "WITH b AS (UPDATE books SET available_copies = $1 WHERE id_book = $2 RETURNING *)"
        ));
        assert!(!sql.contains("id_book = $1"));
        assert!(sql.ends_with(AUTHOR_JOIN));
    }
}
