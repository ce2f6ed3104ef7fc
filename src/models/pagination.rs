//! Page selection for list endpoints

use serde::Deserialize;
use utoipa::IntoParams;

const MAX_PER_PAGE: i64 = 100;

/// Page query parameters (1-based page number)
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// A resolved page: always at least page 1 with a bounded size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: i64,
    pub per_page: i64,
}

impl PageQuery {
    /// Resolve against the listing's default page size
    pub fn resolve(&self, default_per_page: i64) -> Page {
        Page {
            page: self.page.unwrap_or(1).max(1),
            per_page: self
                .per_page
                .unwrap_or(default_per_page)
                .clamp(1, MAX_PER_PAGE),
        }
    }
}

impl Page {
    /// Rows to skip; saturates so an absurd page number yields an empty page
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}
