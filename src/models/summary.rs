//! Catalog summary figures shown on the home page

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct CatalogSummary {
    pub num_books: i64,
    pub num_instances: i64,
    /// Copies with status `available`
    pub num_instances_available: i64,
    pub num_authors: i64,
    pub num_genres: i64,
    /// Term matched against titles (case-insensitive)
    pub title_term: String,
    pub num_books_with_term: i64,
}
