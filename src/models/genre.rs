//! Genre and language reference data

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Book genre (e.g. Science Fiction, Poetry)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Genre {
    pub id: i32,
    pub name: String,
}

/// Natural language a book is written in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Language {
    pub id: i32,
    pub name: String,
}

/// Create or rename a genre or a language
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct NameInput {
    #[validate(length(min = 1, max = 200, message = "Name must be 1 to 200 characters"))]
    pub name: String,
}

impl std::fmt::Display for Genre {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// First three genre names in stored order, comma-joined
pub fn genre_display(genres: &[Genre]) -> String {
    genres
        .iter()
        .take(3)
        .map(|g| g.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn genre(id: i32, name: &str) -> Genre {
        Genre {
            id,
            name: name.to_string(),
        }
    }

    #[test]
    fn test_genre_display_keeps_first_three() {
        let genres = vec![
            genre(4, "Fantasy"),
            genre(1, "Adventure"),
            genre(9, "Poetry"),
            genre(2, "Horror"),
        ];
        assert_eq!(genre_display(&genres), "Fantasy, Adventure, Poetry");
    }

    #[test]
    fn test_genre_display_short_lists() {
        assert_eq!(genre_display(&[]), "");
        assert_eq!(genre_display(&[genre(1, "Drama")]), "Drama");
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let input = NameInput { name: String::new() };
        assert!(input.validate().is_err());

        let input = NameInput {
            name: "Spanish".to_string(),
        };
        assert!(input.validate().is_ok());
    }
}
