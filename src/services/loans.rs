//! Loan workflow: renewal and on-loan listings

use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use uuid::Uuid;

use crate::{
    config::{LoansConfig, PaginationConfig},
    error::{AppError, AppResult},
    models::{
        book_instance::RenewalProposal, BookInstance, Page, PageQuery, UserClaims,
    },
    repository::book_instances::LoanStore,
};

/// Allowed window for a new due date, relative to today
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenewalPolicy {
    max_ahead: Duration,
    proposal: Duration,
}

impl RenewalPolicy {
    pub fn new(config: &LoansConfig) -> Self {
        Self {
            max_ahead: Duration::weeks(config.max_renewal_weeks),
            proposal: Duration::weeks(config.proposed_renewal_weeks),
        }
    }

    /// Default date offered on the renewal form
    pub fn proposed_date(&self, today: NaiveDate) -> NaiveDate {
        today + self.proposal
    }

    pub fn latest_date(&self, today: NaiveDate) -> NaiveDate {
        today + self.max_ahead
    }

    /// Reject dates in the past or beyond the window
    pub fn check(&self, proposed: NaiveDate, today: NaiveDate) -> AppResult<()> {
        if proposed < today {
            return Err(AppError::Validation(format!(
                "Invalid date - renewal in past ({})",
                proposed
            )));
        }
        let latest = self.latest_date(today);
        if proposed > latest {
            return Err(AppError::Validation(format!(
                "Invalid date - renewal more than {} weeks ahead (latest {})",
                self.max_ahead.num_weeks(),
                latest
            )));
        }
        Ok(())
    }
}

impl Default for RenewalPolicy {
    fn default() -> Self {
        Self::new(&LoansConfig::default())
    }
}

#[derive(Clone)]
pub struct LoansService {
    store: Arc<dyn LoanStore>,
    policy: RenewalPolicy,
    pagination: PaginationConfig,
}

impl LoansService {
    pub fn new(store: Arc<dyn LoanStore>, policy: RenewalPolicy, pagination: PaginationConfig) -> Self {
        Self {
            store,
            policy,
            pagination,
        }
    }

    /// Renewal form defaults for a copy
    pub async fn renewal_proposal(&self, id: Uuid, actor: &UserClaims) -> AppResult<RenewalProposal> {
        self.renewal_proposal_on(id, actor, super::today()).await
    }

    pub async fn renewal_proposal_on(
        &self,
        id: Uuid,
        actor: &UserClaims,
        today: NaiveDate,
    ) -> AppResult<RenewalProposal> {
        actor.require_mark_returned()?;
        let instance = self.store.get_instance(id).await?;

        Ok(RenewalProposal {
            instance: instance.with_overdue(today),
            proposed_renewal_date: self.policy.proposed_date(today),
            latest_renewal_date: self.policy.latest_date(today),
        })
    }

    /// Set a new due date for a copy, leaving status and borrower untouched
    pub async fn renew(&self, id: Uuid, proposed: NaiveDate, actor: &UserClaims) -> AppResult<BookInstance> {
        self.renew_on(id, proposed, actor, super::today()).await
    }

    /// Renewal evaluated against an explicit `today`
    pub async fn renew_on(
        &self,
        id: Uuid,
        proposed: NaiveDate,
        actor: &UserClaims,
        today: NaiveDate,
    ) -> AppResult<BookInstance> {
        actor.require_mark_returned()?;
        let instance = self.store.get_instance(id).await?;
        self.policy.check(proposed, today)?;

        let renewed = self.store.set_due_back(id, proposed).await?;
        tracing::info!(
            instance_id = %id,
            user_id = actor.user_id,
            previous_due_back = ?instance.due_back,
            due_back = %proposed,
            "Book instance renewed"
        );
        Ok(renewed.with_overdue(today))
    }

    /// Copies on loan to `user_id`, earliest due first
    pub async fn list_loans_for_user(
        &self,
        user_id: i32,
        query: &PageQuery,
    ) -> AppResult<(Vec<BookInstance>, Page, i64)> {
        let page = query.resolve(self.pagination.my_loans);
        let (instances, total) = self.store.list_on_loan(Some(user_id), page).await?;
        Ok((with_overdue(instances), page, total))
    }

    /// Every copy on loan, earliest due first
    pub async fn list_all_active_loans(
        &self,
        actor: &UserClaims,
        query: &PageQuery,
    ) -> AppResult<(Vec<BookInstance>, Page, i64)> {
        actor.require_mark_returned()?;
        let page = query.resolve(self.pagination.all_loans);
        let (instances, total) = self.store.list_on_loan(None, page).await?;
        Ok((with_overdue(instances), page, total))
    }
}

fn with_overdue(instances: Vec<BookInstance>) -> Vec<BookInstance> {
    let today = super::today();
    instances.into_iter().map(|i| i.with_overdue(today)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{user::UserPermissions, LoanStatus},
        repository::book_instances::MockLoanStore,
    };
    use mockall::predicate::eq;
    use tokio_test::assert_err;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn instance_id() -> Uuid {
        Uuid::parse_str("4a7e1b3c-2f6d-4e8a-9b1c-5d3f7a2e6c90").unwrap()
    }

    fn on_loan(due_back: NaiveDate) -> BookInstance {
        BookInstance {
            id: instance_id(),
            book_id: Some(1),
            book_title: Some("Cien años de soledad".to_string()),
            imprint: "Sudamericana, 1967".to_string(),
            due_back: Some(due_back),
            borrower_id: Some(42),
            status: LoanStatus::OnLoan,
            is_overdue: false,
        }
    }

    fn actor(can_mark_returned: bool) -> UserClaims {
        UserClaims {
            sub: "librarian".to_string(),
            user_id: 1,
            permissions: UserPermissions {
                is_staff: false,
                can_mark_returned,
            },
            exp: 0,
            iat: 0,
        }
    }

    fn service(store: MockLoanStore) -> LoansService {
        LoansService::new(
            Arc::new(store),
            RenewalPolicy::default(),
            PaginationConfig::default(),
        )
    }

    #[test]
    fn test_policy_window_bounds() {
        let policy = RenewalPolicy::default();
        assert!(policy.check(today(), today()).is_ok());
        assert!(policy.check(today() + Duration::days(28), today()).is_ok());
        assert!(policy.check(today() - Duration::days(1), today()).is_err());
        assert!(policy.check(today() + Duration::days(29), today()).is_err());
        assert_eq!(policy.proposed_date(today()), today() + Duration::days(21));
    }

    #[tokio::test]
    async fn test_renew_three_weeks_sets_due_back_only() {
        let proposed = today() + Duration::days(21);
        let mut store = MockLoanStore::new();
        store
            .expect_get_instance()
            .with(eq(instance_id()))
            .returning(|_| Ok(on_loan(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())));
        store
            .expect_set_due_back()
            .with(eq(instance_id()), eq(proposed))
            .times(1)
            .returning(|_, due_back| Ok(on_loan(due_back)));

        let renewed = service(store)
            .renew_on(instance_id(), proposed, &actor(true), today())
            .await
            .unwrap();

        assert_eq!(renewed.due_back, Some(proposed));
        assert_eq!(renewed.status, LoanStatus::OnLoan);
        assert_eq!(renewed.borrower_id, Some(42));
        assert!(!renewed.is_overdue);
    }

    #[tokio::test]
    async fn test_renew_in_past_writes_nothing() {
        let mut store = MockLoanStore::new();
        store
            .expect_get_instance()
            .returning(|_| Ok(on_loan(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())));
        store.expect_set_due_back().never();

        let result = service(store)
            .renew_on(instance_id(), today() - Duration::days(1), &actor(true), today())
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_renew_beyond_four_weeks_writes_nothing() {
        let mut store = MockLoanStore::new();
        store
            .expect_get_instance()
            .returning(|_| Ok(on_loan(NaiveDate::from_ymd_opt(2024, 3, 10).unwrap())));
        store.expect_set_due_back().never();

        let result = service(store)
            .renew_on(instance_id(), today() + Duration::days(29), &actor(true), today())
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_renew_requires_capability_before_lookup() {
        let mut store = MockLoanStore::new();
        store.expect_get_instance().never();
        store.expect_set_due_back().never();

        let result = service(store)
            .renew_on(instance_id(), today(), &actor(false), today())
            .await;

        assert!(matches!(result, Err(AppError::Authorization(_))));
    }

    #[tokio::test]
    async fn test_renew_unknown_instance() {
        let mut store = MockLoanStore::new();
        store
            .expect_get_instance()
            .returning(|id| Err(AppError::NotFound(format!("Book instance {} not found", id))));
        store.expect_set_due_back().never();

        let result = service(store)
            .renew_on(instance_id(), today(), &actor(true), today())
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_proposal_is_three_weeks_out() {
        let mut store = MockLoanStore::new();
        store
            .expect_get_instance()
            .returning(|_| Ok(on_loan(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())));

        let proposal = service(store)
            .renewal_proposal_on(instance_id(), &actor(true), today())
            .await
            .unwrap();

        assert_eq!(proposal.proposed_renewal_date, today() + Duration::days(21));
        assert_eq!(proposal.latest_renewal_date, today() + Duration::days(28));
        assert!(proposal.instance.is_overdue);
    }

    #[tokio::test]
    async fn test_user_loans_use_own_id_and_page_size() {
        let mut store = MockLoanStore::new();
        store
            .expect_list_on_loan()
            .with(eq(Some(42)), eq(Page { page: 1, per_page: 10 }))
            .times(1)
            .returning(|_, _| Ok((vec![on_loan(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap())], 1)));

        let (loans, page, total) = service(store)
            .list_loans_for_user(42, &PageQuery::default())
            .await
            .unwrap();

        assert_eq!(total, 1);
        assert_eq!(page.per_page, 10);
        assert!(loans[0].is_overdue);
    }

    #[tokio::test]
    async fn test_all_loans_require_capability() {
        let mut store = MockLoanStore::new();
        store.expect_list_on_loan().never();

        assert_err!(
            service(store)
                .list_all_active_loans(&actor(false), &PageQuery::default())
                .await
        );
    }

    #[tokio::test]
    async fn test_all_loans_page_size() {
        let mut store = MockLoanStore::new();
        store
            .expect_list_on_loan()
            .with(eq(None::<i32>), eq(Page { page: 2, per_page: 4 }))
            .times(1)
            .returning(|_, _| Ok((vec![], 5)));

        let query = PageQuery {
            page: Some(2),
            per_page: None,
        };
        let (loans, _, total) = service(store)
            .list_all_active_loans(&actor(true), &query)
            .await
            .unwrap();

        assert!(loans.is_empty());
        assert_eq!(total, 5);
    }
}
