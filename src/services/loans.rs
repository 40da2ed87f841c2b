//! Loan management service

use std::sync::Arc;

use tokio::sync::Mutex;
use validator::Validate;

use crate::{
    error::{AppError, AppResult, FieldErrors, ENTITY_GROUP},
    models::loan::{CreateLoanRequest, Loan, NewLoan},
    repository::Repository,
    services::{
        bestsellers::{RankProvider, NOT_A_BESTSELLER},
        clock::Clock,
        policy::{LoanCandidate, LoanPolicy},
    },
};

#[derive(Clone)]
pub struct LoansService {
    repository: Repository,
    clock: Arc<dyn Clock>,
    ranks: Arc<dyn RankProvider>,
    policy: LoanPolicy,
    /// Held from the policy check until the insert, so concurrent requests
    /// cannot both pass the same check
    creation: Arc<Mutex<()>>,
}

impl LoansService {
    pub fn new(
        repository: Repository,
        clock: Arc<dyn Clock>,
        ranks: Arc<dyn RankProvider>,
        policy: LoanPolicy,
    ) -> Self {
        Self {
            repository,
            clock,
            ranks,
            policy,
            creation: Arc::new(Mutex::new(())),
        }
    }

    /// List every loan
    pub async fn list_loans(&self) -> AppResult<Vec<Loan>> {
        self.repository.loans.list_all().await
    }

    /// Loans of one borrower
    pub async fn get_user_loans(&self, user_name: &str) -> AppResult<Vec<Loan>> {
        self.repository.loans.list_by_borrower(user_name).await
    }

    /// Create a new loan once the request and the borrowing rules accept it
    pub async fn create_loan(&self, request: CreateLoanRequest) -> AppResult<Loan> {
        let request = request.trimmed();
        request
            .validate()
            .map_err(|e| AppError::Validation(FieldErrors::from(e)))?;

        let candidate = LoanCandidate {
            user_name: &request.user_name,
            isbn: &request.isbn,
        };

        let _guard = self.creation.lock().await;

        let borrower_loans = self.repository.loans.list_by_borrower(candidate.user_name).await?;
        let book_loans = self.repository.loans.list_by_isbn(candidate.isbn).await?;

        let rank = if self.policy.needs_rank(&candidate, &borrower_loans) {
            self.ranks.rank_of(candidate.isbn).await
        } else {
            NOT_A_BESTSELLER
        };

        let now = self.clock.now();
        let verdict = self
            .policy
            .validate(&candidate, &borrower_loans, &book_loans, now, rank);
        if let Err(violations) = verdict {
            let messages: Vec<String> = violations.iter().map(ToString::to_string).collect();
            tracing::info!(
                user = candidate.user_name,
                isbn = candidate.isbn,
                reasons = ?messages,
                "Loan refused"
            );
            return Err(AppError::Validation(FieldErrors::group(ENTITY_GROUP, messages)));
        }

        let loan = self
            .repository
            .loans
            .create(&NewLoan::issue(
                candidate.user_name,
                candidate.isbn,
                now,
                self.policy.loan_duration_days(),
            ))
            .await?;

        tracing::info!(
            loan_id = loan.id,
            user = %loan.user_name,
            isbn = %loan.isbn,
            due_date = %loan.due_date,
            "Loan created"
        );

        Ok(loan)
    }

    /// Mark a loan as returned; returning it again is a no-op
    pub async fn return_loan(&self, loan_id: i64) -> AppResult<Loan> {
        let mut loan = self.repository.loans.get_by_id(loan_id).await?;

        if loan.returned {
            tracing::debug!(loan_id, "Loan already returned");
            return Ok(loan);
        }

        loan.returned = true;
        self.repository.loans.update(&loan).await?;
        tracing::info!(loan_id, user = %loan.user_name, isbn = %loan.isbn, "Loan returned");

        Ok(loan)
    }
}
