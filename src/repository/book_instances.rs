//! Book instances repository and the storage seam of the loan workflow

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{book_instance::CreateBookInstance, BookInstance, LoanStatus, Page},
};

const INSTANCE_SELECT: &str = r#"
    SELECT bi.id, bi.book_id, b.title AS book_title, bi.imprint,
           bi.due_back, bi.borrower_id, bi.status
    FROM book_instances bi
    LEFT JOIN books b ON b.id = bi.book_id
"#;

/// Due date ascending (copies without one last), then insertion order
const LOAN_ORDER: &str = "bi.due_back ASC NULLS LAST, bi.seq ASC";

/// Storage operations the loan workflow relies on
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LoanStore: Send + Sync {
    async fn get_instance(&self, id: Uuid) -> AppResult<BookInstance>;

    /// Overwrite only the due date of one copy
    async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<BookInstance>;

    /// Copies on loan, optionally restricted to one borrower, in due order
    async fn list_on_loan(
        &self,
        borrower_id: Option<i32>,
        page: Page,
    ) -> AppResult<(Vec<BookInstance>, i64)>;
}

/// Equality filters over book instances
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstanceFilter {
    pub status: Option<LoanStatus>,
    pub book_id: Option<i32>,
    pub borrower_id: Option<i32>,
}

impl InstanceFilter {
    /// WHERE clause with one placeholder per set filter, bound in field order
    pub fn where_clause(&self) -> String {
        let mut conditions = vec!["1=1".to_string()];
        let mut idx = 1;

        macro_rules! add_condition {
            ($field:expr, $column:expr) => {
                if $field.is_some() {
                    conditions.push(format!("{} = ${}", $column, idx));
                    idx += 1;
                }
            };
        }

        add_condition!(self.status, "bi.status");
        add_condition!(self.book_id, "bi.book_id");
        add_condition!(self.borrower_id, "bi.borrower_id");

        conditions.join(" AND ")
    }

    /// Number of placeholders used by `where_clause`
    pub fn bind_count(&self) -> usize {
        [
            self.status.is_some(),
            self.book_id.is_some(),
            self.borrower_id.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count()
    }
}

#[derive(Clone)]
pub struct BookInstancesRepository {
    pool: Pool<Postgres>,
}

impl BookInstancesRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Filtered page of copies in due order
    pub async fn list(&self, filter: InstanceFilter, page: Page) -> AppResult<(Vec<BookInstance>, i64)> {
        let where_clause = filter.where_clause();
        let next = filter.bind_count() + 1;

        let count_query = format!("SELECT COUNT(*) FROM book_instances bi WHERE {}", where_clause);
        let select_query = format!(
            "{} WHERE {} ORDER BY {} LIMIT ${} OFFSET ${}",
            INSTANCE_SELECT,
            where_clause,
            LOAN_ORDER,
            next,
            next + 1
        );

        let mut count_builder = sqlx::query_scalar::<_, i64>(&count_query);
        let mut builder = sqlx::query_as::<_, BookInstance>(&select_query);

        macro_rules! bind_field {
            ($field:expr) => {
                if let Some(val) = $field {
                    count_builder = count_builder.bind(val);
                    builder = builder.bind(val);
                }
            };
        }

        bind_field!(filter.status);
        bind_field!(filter.book_id);
        bind_field!(filter.borrower_id);

        let total = count_builder.fetch_one(&self.pool).await?;
        let instances = builder
            .bind(page.per_page)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        Ok((instances, total))
    }

    /// Every copy of a book, in due order
    pub async fn list_for_book(&self, book_id: i32) -> AppResult<Vec<BookInstance>> {
        let instances = sqlx::query_as::<_, BookInstance>(&format!(
            "{} WHERE bi.book_id = $1 ORDER BY {}",
            INSTANCE_SELECT, LOAN_ORDER
        ))
        .bind(book_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(instances)
    }

    pub async fn get_by_id(&self, id: Uuid) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>(&format!("{} WHERE bi.id = $1", INSTANCE_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    pub async fn create(&self, data: &CreateBookInstance) -> AppResult<BookInstance> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO book_instances (id, book_id, imprint, due_back, borrower_id, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(data.book_id)
        .bind(&data.imprint)
        .bind(data.due_back)
        .bind(data.borrower_id)
        .bind(data.status)
        .execute(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    /// Write every field of an already merged copy
    pub async fn update(&self, instance: &BookInstance) -> AppResult<BookInstance> {
        let result = sqlx::query(
            r#"
            UPDATE book_instances
            SET book_id = $2, imprint = $3, due_back = $4, borrower_id = $5, status = $6
            WHERE id = $1
            "#,
        )
        .bind(instance.id)
        .bind(instance.book_id)
        .bind(&instance.imprint)
        .bind(instance.due_back)
        .bind(instance.borrower_id)
        .bind(instance.status)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance {} not found", instance.id)));
        }

        self.get_by_id(instance.id).await
    }

    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM book_instances WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Book instance {} not found", id)));
        }
        Ok(())
    }

    /// Count copies, optionally only those in one status
    pub async fn count(&self, status: Option<LoanStatus>) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM book_instances WHERE $1::text IS NULL OR status = $1",
        )
        .bind(status)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }
}

#[async_trait]
impl LoanStore for BookInstancesRepository {
    async fn get_instance(&self, id: Uuid) -> AppResult<BookInstance> {
        self.get_by_id(id).await
    }

    async fn set_due_back(&self, id: Uuid, due_back: NaiveDate) -> AppResult<BookInstance> {
        sqlx::query_as::<_, BookInstance>(
            r#"
            WITH bi AS (
                UPDATE book_instances SET due_back = $2 WHERE id = $1
                RETURNING id, book_id, imprint, due_back, borrower_id, status
            )
            SELECT bi.id, bi.book_id, b.title AS book_title, bi.imprint,
                   bi.due_back, bi.borrower_id, bi.status
            FROM bi
            LEFT JOIN books b ON b.id = bi.book_id
            "#,
        )
        .bind(id)
        .bind(due_back)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book instance {} not found", id)))
    }

    async fn list_on_loan(
        &self,
        borrower_id: Option<i32>,
        page: Page,
    ) -> AppResult<(Vec<BookInstance>, i64)> {
        let filter = InstanceFilter {
            status: Some(LoanStatus::OnLoan),
            book_id: None,
            borrower_id,
        };
        self.list(filter, page).await
    }
}
