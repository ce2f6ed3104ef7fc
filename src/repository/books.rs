//! Books repository

use std::collections::HashMap;

use sqlx::{Pool, Postgres, Row, Transaction};

use super::contains_filter;
use crate::{
    error::{AppError, AppResult},
    models::{book::CreateBook, Book, BookShort, Genre, Page},
};

const BOOK_COLUMNS: &str = "id, title, summary, isbn, author_id, language_id";

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// List books ordered by title, optionally filtered on title
    pub async fn list(&self, title: Option<&str>, page: Page) -> AppResult<(Vec<BookShort>, i64)> {
        let where_clause = contains_filter("b.title", 1);

        let total: i64 =
            sqlx::query_scalar(&format!("SELECT COUNT(*) FROM books b WHERE {}", where_clause))
                .bind(title)
                .fetch_one(&self.pool)
                .await?;

        let mut books = sqlx::query_as::<_, BookShort>(&format!(
            r#"
            SELECT b.id, b.title, b.isbn,
                   CASE WHEN a.id IS NULL THEN NULL
                        ELSE a.last_name || ', ' || a.first_name END AS author
            FROM books b
            LEFT JOIN authors a ON a.id = b.author_id
            WHERE {}
            ORDER BY b.title, b.id
            LIMIT $2 OFFSET $3
            "#,
            where_clause
        ))
        .bind(title)
        .bind(page.per_page)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<i32> = books.iter().map(|b| b.id).collect();
        let mut genres = self.get_genres_for(&ids).await?;
        for book in &mut books {
            let book_genres = genres.remove(&book.id).unwrap_or_default();
            book.genre = crate::models::genre::genre_display(&book_genres);
        }

        Ok((books, total))
    }

    /// Get a book with its genres in stored order
    pub async fn get_by_id(&self, id: i32) -> AppResult<Book> {
        let mut book = sqlx::query_as::<_, Book>(&format!("SELECT {} FROM books WHERE id = $1", BOOK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book {} not found", id)))?;

        book.genres = self.get_genres_for(&[id]).await?.remove(&id).unwrap_or_default();
        Ok(book)
    }

    /// Genres of several books at once, keyed by book id
    async fn get_genres_for(&self, book_ids: &[i32]) -> AppResult<HashMap<i32, Vec<Genre>>> {
        if book_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query(
            r#"
            SELECT bg.book_id, g.id, g.name
            FROM book_genres bg
            JOIN genres g ON g.id = bg.genre_id
            WHERE bg.book_id = ANY($1)
            ORDER BY bg.book_id, bg.position
            "#,
        )
        .bind(book_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut genres: HashMap<i32, Vec<Genre>> = HashMap::new();
        for row in rows {
            genres.entry(row.get("book_id")).or_default().push(Genre {
                id: row.get("id"),
                name: row.get("name"),
            });
        }
        Ok(genres)
    }

    pub async fn create(&self, data: &CreateBook, genre_ids: &[i32]) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO books (title, summary, isbn, author_id, language_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            BOOK_COLUMNS
        ))
        .bind(&data.title)
        .bind(&data.summary)
        .bind(&data.isbn)
        .bind(data.author_id)
        .bind(data.language_id)
        .fetch_one(&mut *tx)
        .await?;

        Self::replace_genres(&mut tx, book.id, genre_ids).await?;
        tx.commit().await?;

        self.get_by_id(book.id).await
    }

    /// Write every scalar field of an already merged book, and its genres when given
    pub async fn update(&self, book: &Book, genre_ids: Option<&[i32]>) -> AppResult<Book> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE books
            SET title = $2, summary = $3, isbn = $4, author_id = $5, language_id = $6
            WHERE id = $1
            "#,
        )
        .bind(book.id)
        .bind(&book.title)
        .bind(&book.summary)
        .bind(&book.isbn)
        .bind(book.author_id)
        .bind(book.language_id)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book {} not found", book.id)));
        }

        if let Some(genre_ids) = genre_ids {
            Self::replace_genres(&mut tx, book.id, genre_ids).await?;
        }
        tx.commit().await?;

        self.get_by_id(book.id).await
    }

    async fn replace_genres(
        tx: &mut Transaction<'_, Postgres>,
        book_id: i32,
        genre_ids: &[i32],
    ) -> AppResult<()> {
        sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
            .bind(book_id)
            .execute(&mut **tx)
            .await?;

        for (position, genre_id) in genre_ids.iter().enumerate() {
            let position = i32::try_from(position)
                .map_err(|_| AppError::Validation("Too many genres for one book".to_string()))?;
            sqlx::query("INSERT INTO book_genres (book_id, genre_id, position) VALUES ($1, $2, $3)")
                .bind(book_id)
                .bind(genre_id)
                .bind(position)
                .execute(&mut **tx)
                .await?;
        }
        Ok(())
    }

    /// Delete a book. Its copies are kept with no book. Returns the number of detached copies.
    pub async fn delete(&self, id: i32) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        let detached = sqlx::query("UPDATE book_instances SET book_id = NULL WHERE book_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book {} not found", id)));
        }

        tx.commit().await?;
        Ok(detached)
    }

    pub async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Count books whose title contains `term`, ignoring case
    pub async fn count_title_containing(&self, term: &str) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM books WHERE {}",
            contains_filter("title", 1)
        ))
        .bind(term)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}
