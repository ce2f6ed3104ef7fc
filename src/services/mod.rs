//! Business logic services

pub mod book_instances;
pub mod catalog;
pub mod loans;
pub mod users;

use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub catalog: catalog::CatalogService,
    pub book_instances: book_instances::BookInstancesService,
    pub loans: loans::LoansService,
    pub users: users::UsersService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        Self {
            catalog: catalog::CatalogService::new(
                repository.clone(),
                config.pagination.clone(),
                config.catalog.summary_title_term.clone(),
            ),
            book_instances: book_instances::BookInstancesService::new(
                repository.clone(),
                config.pagination.instances,
            ),
            loans: loans::LoansService::new(
                Arc::new(repository.book_instances.clone()),
                loans::RenewalPolicy::new(&config.loans),
                config.pagination.clone(),
            ),
            users: users::UsersService::new(repository.clone(), config.auth.clone()),
            repository,
        }
    }

    /// Check database connectivity
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.ping().await
    }
}

/// Current date used for overdue and renewal checks
pub fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// A reference to a missing record in a payload is a bad field value
pub(crate) fn not_found_as_validation(error: AppError) -> AppError {
    match error {
        AppError::NotFound(msg) => AppError::Validation(msg),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dangling_reference_is_a_validation_error() {
        let error = not_found_as_validation(AppError::NotFound("Author 9 not found".into()));
        assert!(matches!(error, AppError::Validation(msg) if msg == "Author 9 not found"));

        let error = not_found_as_validation(AppError::Internal("boom".into()));
        assert!(matches!(error, AppError::Internal(_)));
    }
}
