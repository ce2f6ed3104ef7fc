//! Book instance (physical copy) endpoints, including renewal

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        book_instance::{
            BookInstanceQuery, CreateBookInstance, RenewBookInstance, RenewalProposal,
            UpdateBookInstance,
        },
        BookInstance,
    },
};

use super::{AuthenticatedUser, PaginatedResponse};

/// List copies, optionally by status or book (staff)
#[utoipa::path(
    get,
    path = "/book-instances",
    tag = "book-instances",
    security(("bearer_auth" = [])),
    params(BookInstanceQuery),
    responses(
        (status = 200, description = "Page of copies", body = PaginatedResponse<BookInstance>),
        (status = 403, description = "Staff only")
    )
)]
pub async fn list_book_instances(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Query(query): Query<BookInstanceQuery>,
) -> AppResult<Json<PaginatedResponse<BookInstance>>> {
    claims.require_staff()?;

    let (instances, page, total) = state.services.book_instances.list(&query).await?;
    Ok(Json(PaginatedResponse::new(instances, page, total)))
}

#[utoipa::path(
    get,
    path = "/book-instances/{id}",
    tag = "book-instances",
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 200, description = "Copy details", body = BookInstance),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn get_book_instance(
    State(state): State<crate::AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<BookInstance>> {
    let instance = state.services.book_instances.get(id).await?;
    Ok(Json(instance))
}

#[utoipa::path(
    post,
    path = "/book-instances",
    tag = "book-instances",
    security(("bearer_auth" = [])),
    request_body = CreateBookInstance,
    responses(
        (status = 201, description = "Copy created", body = BookInstance),
        (status = 400, description = "Invalid input or unknown book/borrower"),
        (status = 403, description = "Staff only")
    )
)]
pub async fn create_book_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateBookInstance>,
) -> AppResult<(StatusCode, Json<BookInstance>)> {
    claims.require_staff()?;

    let instance = state.services.book_instances.create(&data).await?;
    Ok((StatusCode::CREATED, Json(instance)))
}

/// Edit any field of a copy, status included
#[utoipa::path(
    put,
    path = "/book-instances/{id}",
    tag = "book-instances",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    request_body = UpdateBookInstance,
    responses(
        (status = 200, description = "Copy updated", body = BookInstance),
        (status = 400, description = "Invalid input or unknown book/borrower"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn update_book_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateBookInstance>,
) -> AppResult<Json<BookInstance>> {
    claims.require_staff()?;

    let instance = state.services.book_instances.update(id, &data).await?;
    Ok(Json(instance))
}

#[utoipa::path(
    delete,
    path = "/book-instances/{id}",
    tag = "book-instances",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 204, description = "Copy deleted"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn delete_book_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    claims.require_staff()?;

    state.services.book_instances.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Renewal form defaults: proposed date three weeks out
#[utoipa::path(
    get,
    path = "/book-instances/{id}/renew",
    tag = "book-instances",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    responses(
        (status = 200, description = "Renewal proposal", body = RenewalProposal),
        (status = 403, description = "Missing can_mark_returned"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn get_renewal_proposal(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<RenewalProposal>> {
    let proposal = state.services.loans.renewal_proposal(id, &claims).await?;
    Ok(Json(proposal))
}

/// Set a new due date, at most four weeks ahead
#[utoipa::path(
    post,
    path = "/book-instances/{id}/renew",
    tag = "book-instances",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book instance ID")),
    request_body = RenewBookInstance,
    responses(
        (status = 200, description = "Copy renewed", body = BookInstance),
        (status = 400, description = "Date in the past or too far ahead"),
        (status = 403, description = "Missing can_mark_returned"),
        (status = 404, description = "Book instance not found")
    )
)]
pub async fn renew_book_instance(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(request): Json<RenewBookInstance>,
) -> AppResult<Json<BookInstance>> {
    let instance = state
        .services
        .loans
        .renew(id, request.renewal_date, &claims)
        .await?;
    Ok(Json(instance))
}
