//! Data models for the loans server

pub mod loan;

pub use loan::{CreateLoanRequest, Loan, NewLoan};
