//! Loan management endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header::LOCATION, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::{AppError, AppResult},
    models::loan::{CreateLoanRequest, Loan},
    AppState,
};

/// Return response with loan details
#[derive(Serialize, ToSchema)]
pub struct ReturnResponse {
    /// Return status
    pub status: String,
    /// Loan details
    pub loan: Loan,
}

/// List all loans
#[utoipa::path(
    get,
    path = "/loans",
    tag = "loans",
    responses(
        (status = 200, description = "All loans", body = Vec<Loan>)
    )
)]
pub async fn list_loans(State(state): State<AppState>) -> AppResult<Json<Vec<Loan>>> {
    let loans = state.services.loans.list_loans().await?;
    Ok(Json(loans))
}

/// Get loans for a borrower
#[utoipa::path(
    get,
    path = "/loans/{username}",
    tag = "loans",
    params(
        ("username" = String, Path, description = "Borrower name, matched exactly")
    ),
    responses(
        (status = 200, description = "Borrower's loans, returned or not", body = Vec<Loan>)
    )
)]
pub async fn get_user_loans(
    State(state): State<AppState>,
    Path(user_name): Path<String>,
) -> AppResult<Json<Vec<Loan>>> {
    let loans = state.services.loans.get_user_loans(&user_name).await?;
    Ok(Json(loans))
}

/// Create a new loan (borrow a book)
#[utoipa::path(
    post,
    path = "/loans",
    tag = "loans",
    request_body = CreateLoanRequest,
    responses(
        (status = 201, description = "Loan created", body = Loan,
            headers(("Location" = String, description = "URI of the new loan"))),
        (status = 400, description = "Missing field or borrowing rule violated",
            body = crate::error::ValidationProblem)
    )
)]
pub async fn create_loan(
    State(state): State<AppState>,
    payload: Result<Json<CreateLoanRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(request) = payload.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    let loan = state.services.loans.create_loan(request).await?;
    let location = format!("/loans/{}", loan.id);

    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(loan)))
}

/// Return a borrowed book
#[utoipa::path(
    put,
    path = "/loans/{id}/return",
    tag = "loans",
    params(
        ("id" = i64, Path, description = "Loan ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = ReturnResponse),
        (status = 404, description = "Loan not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn return_loan(
    State(state): State<AppState>,
    Path(loan_id): Path<i64>,
) -> AppResult<Json<ReturnResponse>> {
    let loan = state.services.loans.return_loan(loan_id).await?;

    Ok(Json(ReturnResponse {
        status: "returned".to_string(),
        loan,
    }))
}
