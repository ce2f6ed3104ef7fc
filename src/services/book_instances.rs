//! Book instance (copy) management service

use uuid::Uuid;
use validator::Validate;

use crate::{
    error::AppResult,
    models::{
        book_instance::{BookInstanceQuery, CreateBookInstance, UpdateBookInstance},
        BookInstance, Page, PageQuery,
    },
    repository::{book_instances::InstanceFilter, Repository},
};

use super::not_found_as_validation;

#[derive(Clone)]
pub struct BookInstancesService {
    repository: Repository,
    default_per_page: i64,
}

impl BookInstancesService {
    pub fn new(repository: Repository, default_per_page: i64) -> Self {
        Self {
            repository,
            default_per_page,
        }
    }

    pub async fn list(&self, query: &BookInstanceQuery) -> AppResult<(Vec<BookInstance>, Page, i64)> {
        let page = PageQuery {
            page: query.page,
            per_page: query.per_page,
        }
        .resolve(self.default_per_page);
        let filter = InstanceFilter {
            status: query.status,
            book_id: query.book_id,
            borrower_id: None,
        };

        let today = super::today();
        let (instances, total) = self.repository.book_instances.list(filter, page).await?;
        let instances = instances.into_iter().map(|i| i.with_overdue(today)).collect();
        Ok((instances, page, total))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<BookInstance> {
        let instance = self.repository.book_instances.get_by_id(id).await?;
        Ok(instance.with_overdue(super::today()))
    }

    /// Create a copy of an existing book
    pub async fn create(&self, data: &CreateBookInstance) -> AppResult<BookInstance> {
        data.validate()?;
        self.check_references(Some(data.book_id), data.borrower_id).await?;

        let instance = self.repository.book_instances.create(data).await?;
        tracing::info!(instance_id = %instance.id, book_id = data.book_id, "Book instance created");
        Ok(instance.with_overdue(super::today()))
    }

    /// Staff edit: any field, any status
    pub async fn update(&self, id: Uuid, data: &UpdateBookInstance) -> AppResult<BookInstance> {
        data.validate()?;

        let mut instance = self.repository.book_instances.get_by_id(id).await?;
        let previous_status = instance.status;
        data.apply_to(&mut instance);
        self.check_references(instance.book_id, instance.borrower_id).await?;

        let instance = self.repository.book_instances.update(&instance).await?;
        if instance.status != previous_status {
            tracing::info!(
                instance_id = %id,
                from = %previous_status,
                to = %instance.status,
                "Book instance status changed"
            );
        }
        Ok(instance.with_overdue(super::today()))
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        self.repository.book_instances.delete(id).await?;
        tracing::info!(instance_id = %id, "Book instance deleted");
        Ok(())
    }

    async fn check_references(&self, book_id: Option<i32>, borrower_id: Option<i32>) -> AppResult<()> {
        if let Some(book_id) = book_id {
            self.repository
                .books
                .get_by_id(book_id)
                .await
                .map_err(not_found_as_validation)?;
        }
        if let Some(borrower_id) = borrower_id {
            self.repository
                .users
                .get_by_id(borrower_id)
                .await
                .map_err(not_found_as_validation)?;
        }
        Ok(())
    }
}
