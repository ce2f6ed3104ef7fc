//! Data models for the library catalog

pub mod author;
pub mod book;
pub mod book_instance;
pub mod genre;
pub mod pagination;
pub mod summary;
pub mod user;

// Re-export commonly used types
pub use author::Author;
pub use book::{Book, BookDetails, BookShort};
pub use book_instance::{BookInstance, LoanStatus};
pub use genre::{Genre, Language};
pub use pagination::{Page, PageQuery};
pub use summary::CatalogSummary;
pub use user::{User, UserClaims};
