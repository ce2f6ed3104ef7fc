//! Book (catalog title) model and related types

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use super::{
    author::Author,
    book_instance::BookInstance,
    genre::{genre_display, Genre, Language},
};

/// Book row from database. Genres are loaded separately, in stored order.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author_id: Option<i32>,
    pub language_id: Option<i32>,
    #[sqlx(skip)]
    #[serde(default)]
    pub genres: Vec<Genre>,
}

impl Book {
    /// First three genre names, comma-joined
    pub fn display_genre(&self) -> String {
        genre_display(&self.genres)
    }
}

impl std::fmt::Display for Book {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title)
    }
}

/// Short book representation for lists
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookShort {
    pub id: i32,
    pub title: String,
    pub isbn: String,
    /// Author label ("last, first"), if any
    pub author: Option<String>,
    #[sqlx(skip)]
    #[serde(default)]
    pub genre: String,
}

/// Book with resolved references and its copies, for the detail view
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BookDetails {
    pub id: i32,
    pub title: String,
    pub summary: String,
    pub isbn: String,
    pub author: Option<Author>,
    pub language: Option<Language>,
    pub genres: Vec<Genre>,
    pub genre: String,
    pub instances: Vec<BookInstance>,
}

impl BookDetails {
    pub fn new(
        book: Book,
        author: Option<Author>,
        language: Option<Language>,
        instances: Vec<BookInstance>,
    ) -> Self {
        let genre = book.display_genre();
        Self {
            id: book.id,
            title: book.title,
            summary: book.summary,
            isbn: book.isbn,
            author,
            language,
            genres: book.genres,
            genre,
            instances,
        }
    }
}

/// Book list filters (`title` matches as a case-insensitive substring)
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    pub title: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create book request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 1000, message = "Summary must be 1 to 1000 characters"))]
    pub summary: String,
    #[validate(length(equal = 13, message = "ISBN must be exactly 13 characters"))]
    pub isbn: String,
    pub author_id: Option<i32>,
    pub language_id: Option<i32>,
    /// Genre ids, in display order
    #[serde(default)]
    #[validate(length(max = 100, message = "At most 100 genres per book"))]
    pub genre_ids: Vec<i32>,
}

/// Update book request. References may be cleared with an explicit `null`.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 200, message = "Title must be 1 to 200 characters"))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 1000, message = "Summary must be 1 to 1000 characters"))]
    pub summary: Option<String>,
    #[validate(length(equal = 13, message = "ISBN must be exactly 13 characters"))]
    pub isbn: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i32>)]
    pub author_id: Option<Option<i32>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i32>)]
    pub language_id: Option<Option<i32>>,
    /// Replaces the genre list when present
    #[validate(length(max = 100, message = "At most 100 genres per book"))]
    pub genre_ids: Option<Vec<i32>>,
}

impl UpdateBook {
    /// Apply the scalar fields and references onto a stored book
    pub fn apply_to(&self, book: &mut Book) {
        if let Some(ref title) = self.title {
            book.title = title.clone();
        }
        if let Some(ref summary) = self.summary {
            book.summary = summary.clone();
        }
        if let Some(ref isbn) = self.isbn {
            book.isbn = isbn.clone();
        }
        if let Some(author_id) = self.author_id {
            book.author_id = author_id;
        }
        if let Some(language_id) = self.language_id {
            book.language_id = language_id;
        }
    }
}

/// Drop repeated genre ids, keeping the first occurrence
pub fn dedup_genre_ids(ids: &[i32]) -> Vec<i32> {
    let mut seen = std::collections::HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_with_genres(names: &[&str]) -> Book {
        Book {
            id: 1,
            title: "La sombra del viento".to_string(),
            summary: "Barcelona, 1945.".to_string(),
            isbn: "9788408043645".to_string(),
            author_id: Some(1),
            language_id: Some(1),
            genres: names
                .iter()
                .enumerate()
                .map(|(i, name)| Genre {
                    id: i as i32 + 1,
                    name: name.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_display_genre_first_three_in_order() {
        let book = book_with_genres(&["Mystery", "Drama", "Historical", "Romance"]);
        assert_eq!(book.display_genre(), "Mystery, Drama, Historical");
    }

    #[test]
    fn test_label_is_title() {
        assert_eq!(book_with_genres(&[]).to_string(), "La sombra del viento");
    }

    #[test]
    fn test_isbn_length() {
        let mut create = CreateBook {
            title: "Dune".to_string(),
            summary: "Arrakis.".to_string(),
            isbn: "978044117271".to_string(),
            author_id: None,
            language_id: None,
            genre_ids: vec![],
        };
        assert!(create.validate().is_err());

        create.isbn = "9780441172719".to_string();
        assert!(create.validate().is_ok());
    }

    #[test]
    fn test_genre_list_is_bounded() {
        let mut create = CreateBook {
            title: "Dune".to_string(),
            summary: "Arrakis.".to_string(),
            isbn: "9780441172719".to_string(),
            author_id: None,
            language_id: None,
            genre_ids: (1..=100).collect(),
        };
        assert!(create.validate().is_ok());

        create.genre_ids = (1..=40_000).collect();
        assert!(create.validate().is_err());

        let update = UpdateBook {
            genre_ids: Some((1..=101).collect()),
            ..Default::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_update_can_clear_author() {
        let update: UpdateBook = serde_json::from_str(r#"{"author_id": null}"#).unwrap();
        let mut book = book_with_genres(&[]);
        update.apply_to(&mut book);

        assert_eq!(book.author_id, None);
        assert_eq!(book.language_id, Some(1));
    }

    #[test]
    fn test_dedup_genre_ids_keeps_order() {
        assert_eq!(dedup_genre_ids(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
    }
}
