//! On-loan listings

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{BookInstance, PageQuery},
};

use super::{AuthenticatedUser, PaginatedResponse};

/// Copies borrowed by the current user, earliest due first
#[utoipa::path(
    get,
    path = "/loans/mine",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "Own loans", body = PaginatedResponse<BookInstance>),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_my_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<BookInstance>>> {
    let (loans, page, total) = state
        .services
        .loans
        .list_loans_for_user(claims.user_id, &query)
        .await?;
    Ok(Json(PaginatedResponse::new(loans, page, total)))
}

/// Every copy on loan (librarians)
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    security(("bearer_auth" = [])),
    params(PageQuery),
    responses(
        (status = 200, description = "All active loans", body = PaginatedResponse<BookInstance>),
        (status = 403, description = "Missing can_mark_returned")
    )
)]
pub async fn list_all_loans(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<PaginatedResponse<BookInstance>>> {
    let (loans, page, total) = state
        .services
        .loans
        .list_all_active_loans(&claims, &query)
        .await?;
    Ok(Json(PaginatedResponse::new(loans, page, total)))
}
