//! Author model and related types

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Full author model from database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Author {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

impl std::fmt::Display for Author {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}, {}", self.last_name, self.first_name)
    }
}

/// Author with the titles they own, for the detail view
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthorDetails {
    pub author: Author,
    pub label: String,
    pub books: Vec<AuthorBook>,
}

/// Book row shown on an author's page
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct AuthorBook {
    pub id: i32,
    pub title: String,
    pub isbn: String,
}

/// Author list filters (`last_name` matches as a case-insensitive substring)
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AuthorQuery {
    pub last_name: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create author request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAuthor {
    #[validate(length(min = 1, max = 100, message = "First name must be 1 to 100 characters"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "Last name must be 1 to 100 characters"))]
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

/// Update author request. Dates may be cleared with an explicit `null`.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateAuthor {
    #[validate(length(min = 1, max = 100, message = "First name must be 1 to 100 characters"))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Last name must be 1 to 100 characters"))]
    pub last_name: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>, format = Date)]
    pub date_of_birth: Option<Option<NaiveDate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>, format = Date)]
    pub date_of_death: Option<Option<NaiveDate>>,
}

impl UpdateAuthor {
    /// Apply the provided fields onto a stored author
    pub fn apply_to(&self, author: &mut Author) {
        if let Some(ref first_name) = self.first_name {
            author.first_name = first_name.clone();
        }
        if let Some(ref last_name) = self.last_name {
            author.last_name = last_name.clone();
        }
        if let Some(date_of_birth) = self.date_of_birth {
            author.date_of_birth = date_of_birth;
        }
        if let Some(date_of_death) = self.date_of_death {
            author.date_of_death = date_of_death;
        }
    }
}

/// A date of death, when both dates are known, may not precede the date of birth
pub fn check_lifespan(
    date_of_birth: Option<NaiveDate>,
    date_of_death: Option<NaiveDate>,
) -> AppResult<()> {
    match (date_of_birth, date_of_death) {
        (Some(birth), Some(death)) if death < birth => Err(AppError::Validation(format!(
            "date_of_death ({}) precedes date_of_birth ({})",
            death, birth
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn tolkien() -> Author {
        Author {
            id: 1,
            first_name: "John Ronald Reuel".to_string(),
            last_name: "Tolkien".to_string(),
            date_of_birth: Some(date(1892, 1, 3)),
            date_of_death: Some(date(1973, 9, 2)),
        }
    }

    #[test]
    fn test_label_is_last_name_first() {
        assert_eq!(tolkien().to_string(), "Tolkien, John Ronald Reuel");
    }

    #[test]
    fn test_lifespan() {
        assert!(check_lifespan(Some(date(1892, 1, 3)), Some(date(1973, 9, 2))).is_ok());
        assert!(check_lifespan(Some(date(1900, 1, 1)), Some(date(1900, 1, 1))).is_ok());
        assert!(check_lifespan(None, Some(date(1800, 1, 1))).is_ok());
        assert!(check_lifespan(Some(date(1800, 1, 1)), None).is_ok());
        assert!(matches!(
            check_lifespan(Some(date(1973, 9, 2)), Some(date(1892, 1, 3))),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let update: UpdateAuthor =
            serde_json::from_str(r#"{"last_name": "Lewis", "date_of_death": null}"#).unwrap();
        let mut author = tolkien();
        update.apply_to(&mut author);

        assert_eq!(author.last_name, "Lewis");
        assert_eq!(author.first_name, "John Ronald Reuel");
        assert_eq!(author.date_of_birth, Some(date(1892, 1, 3)));
        assert_eq!(author.date_of_death, None);
    }

    #[test]
    fn test_create_validation() {
        let create = CreateAuthor {
            first_name: String::new(),
            last_name: "Austen".to_string(),
            date_of_birth: None,
            date_of_death: None,
        };
        assert!(create.validate().is_err());
    }
}
