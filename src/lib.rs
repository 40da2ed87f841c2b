//! Library Loans Server
//!
//! A REST JSON API recording book loans and returns, and enforcing the
//! borrowing policy: a cap on books held at once, no new loans while a book
//! is overdue, one borrower per book, and a limit on repeat loans of
//! bestsellers.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<services::Services>,
}
