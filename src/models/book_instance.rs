//! Book instance (loanable copy) model and loan status

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Loan status of a copy. Stored as a one-letter code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    #[default]
    Maintenance,
    OnLoan,
    Available,
    Reserved,
}

impl LoanStatus {
    pub const ALL: [LoanStatus; 4] = [
        LoanStatus::Maintenance,
        LoanStatus::OnLoan,
        LoanStatus::Available,
        LoanStatus::Reserved,
    ];

    pub fn as_code(&self) -> &'static str {
        match self {
            LoanStatus::Maintenance => "m",
            LoanStatus::OnLoan => "o",
            LoanStatus::Available => "a",
            LoanStatus::Reserved => "r",
        }
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            LoanStatus::Maintenance => "Maintenance",
            LoanStatus::OnLoan => "On loan",
            LoanStatus::Available => "Available",
            LoanStatus::Reserved => "Reserved",
        };
        write!(f, "{}", label)
    }
}

impl std::str::FromStr for LoanStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "m" => Ok(LoanStatus::Maintenance),
            "o" => Ok(LoanStatus::OnLoan),
            "a" => Ok(LoanStatus::Available),
            "r" => Ok(LoanStatus::Reserved),
            _ => Err(format!("Invalid loan status code: {}", s)),
        }
    }
}

// SQLx conversion for LoanStatus
impl sqlx::Type<Postgres> for LoanStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for LoanStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as Decode<Postgres>>::decode(value)?;
        s.trim().parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LoanStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_code(), buf)
    }
}

/// Book instance from database, joined with its book title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookInstance {
    pub id: Uuid,
    pub book_id: Option<i32>,
    #[sqlx(default)]
    #[serde(default)]
    pub book_title: Option<String>,
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
    pub status: LoanStatus,
    /// Derived on read, never stored
    #[sqlx(skip)]
    #[serde(default)]
    pub is_overdue: bool,
}

impl BookInstance {
    /// A copy is overdue when its due date is strictly before `today`
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        matches!(self.due_back, Some(due_back) if due_back < today)
    }

    /// Fill the derived overdue flag for responses
    pub fn with_overdue(mut self, today: NaiveDate) -> Self {
        self.is_overdue = self.is_overdue(today);
        self
    }
}

impl std::fmt::Display for BookInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.book_title {
            Some(ref title) => write!(f, "{} ({})", self.id, title),
            None => write!(f, "{}", self.id),
        }
    }
}

/// Staff listing filters
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookInstanceQuery {
    pub status: Option<LoanStatus>,
    pub book_id: Option<i32>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Create book instance request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateBookInstance {
    pub book_id: i32,
    #[validate(length(min = 1, max = 200, message = "Imprint must be 1 to 200 characters"))]
    pub imprint: String,
    pub due_back: Option<NaiveDate>,
    pub borrower_id: Option<i32>,
    #[serde(default)]
    pub status: LoanStatus,
}

/// Update book instance request. Every field is freely settable by staff,
/// including any status regardless of the current one.
#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBookInstance {
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i32>)]
    pub book_id: Option<Option<i32>>,
    #[validate(length(min = 1, max = 200, message = "Imprint must be 1 to 200 characters"))]
    pub imprint: Option<String>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<String>, format = Date)]
    pub due_back: Option<Option<NaiveDate>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    #[schema(value_type = Option<i32>)]
    pub borrower_id: Option<Option<i32>>,
    pub status: Option<LoanStatus>,
}

impl UpdateBookInstance {
    pub fn apply_to(&self, instance: &mut BookInstance) {
        if let Some(book_id) = self.book_id {
            instance.book_id = book_id;
        }
        if let Some(ref imprint) = self.imprint {
            instance.imprint = imprint.clone();
        }
        if let Some(due_back) = self.due_back {
            instance.due_back = due_back;
        }
        if let Some(borrower_id) = self.borrower_id {
            instance.borrower_id = borrower_id;
        }
        if let Some(status) = self.status {
            instance.status = status;
        }
    }
}

/// Renewal request
#[derive(Debug, Deserialize, ToSchema)]
pub struct RenewBookInstance {
    /// New due date
    pub renewal_date: NaiveDate,
}

/// Renewal form defaults for a copy
#[derive(Debug, Serialize, ToSchema)]
pub struct RenewalProposal {
    pub instance: BookInstance,
    pub proposed_renewal_date: NaiveDate,
    pub latest_renewal_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn instance(due_back: Option<NaiveDate>, status: LoanStatus) -> BookInstance {
        BookInstance {
            id: Uuid::nil(),
            book_id: Some(1),
            book_title: Some("Dune".to_string()),
            imprint: "Ace, 1990".to_string(),
            due_back,
            borrower_id: None,
            status,
            is_overdue: false,
        }
    }

    #[test]
    fn test_status_codes_round_trip() {
        for status in LoanStatus::ALL {
            assert_eq!(status.as_code().parse::<LoanStatus>(), Ok(status));
        }
        assert!("x".parse::<LoanStatus>().is_err());
    }

    #[test]
    fn test_default_status_is_maintenance() {
        assert_eq!(LoanStatus::default(), LoanStatus::Maintenance);

        let create: CreateBookInstance =
            serde_json::from_str(r#"{"book_id": 1, "imprint": "Ace, 1990"}"#).unwrap();
        assert_eq!(create.status, LoanStatus::Maintenance);
    }

    #[test]
    fn test_status_json_names() {
        assert_eq!(serde_json::to_string(&LoanStatus::OnLoan).unwrap(), "\"on_loan\"");
        assert!(serde_json::from_str::<LoanStatus>("\"lost\"").is_err());
    }

    #[test]
    fn test_overdue_strictly_before_today() {
        let today = date(2024, 3, 15);
        assert!(instance(Some(date(2024, 3, 14)), LoanStatus::OnLoan).is_overdue(today));
        assert!(!instance(Some(date(2024, 3, 15)), LoanStatus::OnLoan).is_overdue(today));
        assert!(!instance(Some(date(2024, 4, 1)), LoanStatus::OnLoan).is_overdue(today));
    }

    #[test]
    fn test_no_due_date_is_never_overdue() {
        let copy = instance(None, LoanStatus::Maintenance);
        assert!(!copy.is_overdue(date(2100, 1, 1)));
        assert!(!copy.with_overdue(date(2100, 1, 1)).is_overdue);
    }

    #[test]
    fn test_label() {
        let mut copy = instance(None, LoanStatus::Available);
        assert_eq!(
            copy.to_string(),
            "00000000-0000-0000-0000-000000000000 (Dune)"
        );
        copy.book_title = None;
        assert_eq!(copy.to_string(), "00000000-0000-0000-0000-000000000000");
    }

    #[test]
    fn test_update_sets_any_status() {
        let mut copy = instance(None, LoanStatus::Maintenance);
        let update = UpdateBookInstance {
            status: Some(LoanStatus::Reserved),
            ..Default::default()
        };
        update.apply_to(&mut copy);
        assert_eq!(copy.status, LoanStatus::Reserved);
        assert_eq!(copy.imprint, "Ace, 1990");
    }
}
