//! Catalog summary endpoint

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::{error::AppResult, models::CatalogSummary};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SummaryQuery {
    /// Term counted in book titles, case-insensitively
    pub title_term: Option<String>,
}

/// Record counts for the home page
#[utoipa::path(
    get,
    path = "/catalog/summary",
    tag = "catalog",
    params(SummaryQuery),
    responses(
        (status = 200, description = "Catalog figures", body = CatalogSummary)
    )
)]
pub async fn get_summary(
    State(state): State<crate::AppState>,
    Query(query): Query<SummaryQuery>,
) -> AppResult<Json<CatalogSummary>> {
    let summary = state
        .services
        .catalog
        .summary(query.title_term.as_deref())
        .await?;
    Ok(Json(summary))
}
