//! Catalog management service: genres, languages, authors, books

use validator::Validate;

use crate::{
    config::PaginationConfig,
    error::{AppError, AppResult},
    models::{
        author::{check_lifespan, AuthorDetails, AuthorQuery, CreateAuthor, UpdateAuthor},
        book::{dedup_genre_ids, BookQuery, CreateBook, UpdateBook},
        genre::NameInput,
        Author, BookDetails, BookShort, CatalogSummary, Genre, Language, LoanStatus, Page, PageQuery,
    },
    repository::Repository,
};

use super::not_found_as_validation;

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
    pagination: PaginationConfig,
    summary_title_term: String,
}

impl CatalogService {
    pub fn new(repository: Repository, pagination: PaginationConfig, summary_title_term: String) -> Self {
        Self {
            repository,
            pagination,
            summary_title_term,
        }
    }

    // =========================================================================
    // GENRES & LANGUAGES
    // =========================================================================

    pub async fn list_genres(&self) -> AppResult<Vec<Genre>> {
        self.repository.genres.list().await
    }

    pub async fn get_genre(&self, id: i32) -> AppResult<Genre> {
        self.repository.genres.get_by_id(id).await
    }

    pub async fn create_genre(&self, data: &NameInput) -> AppResult<Genre> {
        data.validate()?;
        let genre = self.repository.genres.create(&data.name).await?;
        tracing::info!(genre_id = genre.id, "Genre created");
        Ok(genre)
    }

    pub async fn update_genre(&self, id: i32, data: &NameInput) -> AppResult<Genre> {
        data.validate()?;
        self.repository.genres.update(id, &data.name).await
    }

    pub async fn delete_genre(&self, id: i32) -> AppResult<()> {
        self.repository.genres.delete(id).await?;
        tracing::info!(genre_id = id, "Genre deleted");
        Ok(())
    }

    pub async fn list_languages(&self) -> AppResult<Vec<Language>> {
        self.repository.languages.list().await
    }

    pub async fn get_language(&self, id: i32) -> AppResult<Language> {
        self.repository.languages.get_by_id(id).await
    }

    pub async fn create_language(&self, data: &NameInput) -> AppResult<Language> {
        data.validate()?;
        let language = self.repository.languages.create(&data.name).await?;
        tracing::info!(language_id = language.id, "Language created");
        Ok(language)
    }

    pub async fn update_language(&self, id: i32, data: &NameInput) -> AppResult<Language> {
        data.validate()?;
        self.repository.languages.update(id, &data.name).await
    }

    pub async fn delete_language(&self, id: i32) -> AppResult<()> {
        let detached = self.repository.languages.delete(id).await?;
        tracing::info!(language_id = id, detached_books = detached, "Language deleted");
        Ok(())
    }

    // =========================================================================
    // AUTHORS
    // =========================================================================

    pub async fn list_authors(&self, query: &AuthorQuery) -> AppResult<(Vec<Author>, Page, i64)> {
        let page = PageQuery {
            page: query.page,
            per_page: query.per_page,
        }
        .resolve(self.pagination.authors);

        let (authors, total) = self
            .repository
            .authors
            .list(query.last_name.as_deref(), page)
            .await?;
        Ok((authors, page, total))
    }

    /// Author with their books
    pub async fn get_author(&self, id: i32) -> AppResult<AuthorDetails> {
        let author = self.repository.authors.get_by_id(id).await?;
        let books = self.repository.authors.get_books(id).await?;
        Ok(AuthorDetails {
            label: author.to_string(),
            author,
            books,
        })
    }

    pub async fn create_author(&self, data: &CreateAuthor) -> AppResult<Author> {
        data.validate()?;
        check_lifespan(data.date_of_birth, data.date_of_death)?;

        let author = self.repository.authors.create(data).await?;
        tracing::info!(author_id = author.id, "Author created");
        Ok(author)
    }

    pub async fn update_author(&self, id: i32, data: &UpdateAuthor) -> AppResult<Author> {
        data.validate()?;

        let mut author = self.repository.authors.get_by_id(id).await?;
        data.apply_to(&mut author);
        check_lifespan(author.date_of_birth, author.date_of_death)?;

        self.repository.authors.update(&author).await
    }

    /// Delete an author; their books remain with no author
    pub async fn delete_author(&self, id: i32) -> AppResult<()> {
        let detached = self.repository.authors.delete(id).await?;
        tracing::info!(author_id = id, detached_books = detached, "Author deleted");
        Ok(())
    }

    // =========================================================================
    // BOOKS
    // =========================================================================

    pub async fn list_books(&self, query: &BookQuery) -> AppResult<(Vec<BookShort>, Page, i64)> {
        let page = PageQuery {
            page: query.page,
            per_page: query.per_page,
        }
        .resolve(self.pagination.books);

        let (books, total) = self.repository.books.list(query.title.as_deref(), page).await?;
        Ok((books, page, total))
    }

    /// Book with author, language, genres and copies
    pub async fn get_book(&self, id: i32) -> AppResult<BookDetails> {
        let book = self.repository.books.get_by_id(id).await?;

        let author = match book.author_id {
            Some(author_id) => Some(self.repository.authors.get_by_id(author_id).await?),
            None => None,
        };
        let language = match book.language_id {
            Some(language_id) => Some(self.repository.languages.get_by_id(language_id).await?),
            None => None,
        };

        let today = super::today();
        let instances = self
            .repository
            .book_instances
            .list_for_book(id)
            .await?
            .into_iter()
            .map(|instance| instance.with_overdue(today))
            .collect();

        Ok(BookDetails::new(book, author, language, instances))
    }

    pub async fn create_book(&self, data: &CreateBook) -> AppResult<BookDetails> {
        data.validate()?;
        let genre_ids = dedup_genre_ids(&data.genre_ids);
        self.check_references(data.author_id, data.language_id, &genre_ids)
            .await?;

        let book = self.repository.books.create(data, &genre_ids).await?;
        tracing::info!(book_id = book.id, "Book created");
        self.get_book(book.id).await
    }

    pub async fn update_book(&self, id: i32, data: &UpdateBook) -> AppResult<BookDetails> {
        data.validate()?;

        let mut book = self.repository.books.get_by_id(id).await?;
        data.apply_to(&mut book);

        let genre_ids = data.genre_ids.as_deref().map(dedup_genre_ids);
        self.check_references(
            book.author_id,
            book.language_id,
            genre_ids.as_deref().unwrap_or(&[]),
        )
        .await?;

        self.repository.books.update(&book, genre_ids.as_deref()).await?;
        self.get_book(id).await
    }

    /// Delete a book; its copies remain with no book
    pub async fn delete_book(&self, id: i32) -> AppResult<()> {
        let detached = self.repository.books.delete(id).await?;
        tracing::info!(book_id = id, detached_instances = detached, "Book deleted");
        Ok(())
    }

    /// Referenced records must exist; a dangling id is a bad field value
    async fn check_references(
        &self,
        author_id: Option<i32>,
        language_id: Option<i32>,
        genre_ids: &[i32],
    ) -> AppResult<()> {
        if let Some(author_id) = author_id {
            self.repository
                .authors
                .get_by_id(author_id)
                .await
                .map_err(not_found_as_validation)?;
        }
        if let Some(language_id) = language_id {
            self.repository
                .languages
                .get_by_id(language_id)
                .await
                .map_err(not_found_as_validation)?;
        }
        if !genre_ids.is_empty() {
            let missing = self.repository.genres.missing_ids(genre_ids).await?;
            if !missing.is_empty() {
                return Err(AppError::Validation(format!("Unknown genre ids: {:?}", missing)));
            }
        }
        Ok(())
    }

    // =========================================================================
    // SUMMARY
    // =========================================================================

    /// Home page figures
    pub async fn summary(&self, title_term: Option<&str>) -> AppResult<CatalogSummary> {
        let title_term = title_term.unwrap_or(&self.summary_title_term).to_string();

        Ok(CatalogSummary {
            num_books: self.repository.books.count().await?,
            num_instances: self.repository.book_instances.count(None).await?,
            num_instances_available: self
                .repository
                .book_instances
                .count(Some(LoanStatus::Available))
                .await?,
            num_authors: self.repository.authors.count().await?,
            num_genres: self.repository.genres.count().await?,
            num_books_with_term: self.repository.books.count_title_containing(&title_term).await?,
            title_term,
        })
    }
}
