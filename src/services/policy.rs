//! Borrowing rules checked before a loan is created
//!
//! Rules run in a fixed order and every violation is collected, so a refused
//! request reports all the reasons at once:
//!
//! 1. the borrower already holds the maximum number of unreturned books;
//! 2. the borrower has an unreturned book past its due date;
//! 3. the requested book is currently out with anyone;
//! 4. the book is a bestseller and the borrower has already had it the
//!    maximum number of times, returned or not.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{config::PolicyConfig, models::Loan};

/// A borrowing rule refusing the loan; `Display` is the client message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PolicyViolation {
    #[error("User has reached the maximum number of books")]
    MaxLoansReached,
    #[error("User has overdue books")]
    OverdueLoans,
    #[error("Book is already loaned")]
    BookAlreadyLoaned,
    #[error("Top {threshold} Bestseller books cannot be loaned more than {max_loans} times")]
    BestsellerLimitReached { threshold: i32, max_loans: usize },
}

/// Loan being requested
#[derive(Debug, Clone, Copy)]
pub struct LoanCandidate<'a> {
    pub user_name: &'a str,
    pub isbn: &'a str,
}

/// Loan policy parameterised by the configured limits
#[derive(Debug, Clone, Copy, Default)]
pub struct LoanPolicy {
    config: PolicyConfig,
}

impl LoanPolicy {
    pub fn new(config: PolicyConfig) -> Self {
        Self { config }
    }

    pub fn loan_duration_days(&self) -> i64 {
        self.config.loan_duration_days
    }

    pub fn is_bestseller(&self, rank: i32) -> bool {
        rank <= self.config.bestseller_threshold
    }

    /// Past loans of the candidate's book by the candidate's borrower
    pub fn previous_loans_of_book(&self, candidate: &LoanCandidate<'_>, borrower_loans: &[Loan]) -> usize {
        borrower_loans
            .iter()
            .filter(|loan| loan.user_name == candidate.user_name && loan.isbn == candidate.isbn)
            .count()
    }

    /// Whether the bestseller rule could refuse this candidate, so the rank is
    /// worth looking up
    pub fn needs_rank(&self, candidate: &LoanCandidate<'_>, borrower_loans: &[Loan]) -> bool {
        self.previous_loans_of_book(candidate, borrower_loans) >= self.config.max_bestseller_loans
    }

    /// Check every rule; `borrower_loans` holds the borrower's loans and
    /// `book_loans` every loan of the requested book
    pub fn validate(
        &self,
        candidate: &LoanCandidate<'_>,
        borrower_loans: &[Loan],
        book_loans: &[Loan],
        now: DateTime<Utc>,
        rank: i32,
    ) -> Result<(), Vec<PolicyViolation>> {
        let mut violations = Vec::new();

        let own_loans = || {
            borrower_loans
                .iter()
                .filter(|loan| loan.user_name == candidate.user_name)
        };

        let active = own_loans().filter(|loan| loan.is_active()).count();
        if active >= self.config.max_active_loans {
            violations.push(PolicyViolation::MaxLoansReached);
        }

        if own_loans().any(|loan| loan.is_overdue(now)) {
            violations.push(PolicyViolation::OverdueLoans);
        }

        if book_loans
            .iter()
            .any(|loan| loan.isbn == candidate.isbn && loan.is_active())
        {
            violations.push(PolicyViolation::BookAlreadyLoaned);
        }

        if self.is_bestseller(rank)
            && self.previous_loans_of_book(candidate, borrower_loans) >= self.config.max_bestseller_loans
        {
            violations.push(PolicyViolation::BestsellerLimitReached {
                threshold: self.config.bestseller_threshold,
                max_loans: self.config.max_bestseller_loans,
            });
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}
