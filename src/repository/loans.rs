//! Loans repository for database operations

use sqlx::SqlitePool;

use crate::{
    error::{AppError, AppResult},
    models::loan::{Loan, NewLoan},
};

#[derive(Clone)]
pub struct LoansRepository {
    pool: SqlitePool,
}

impl LoansRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// List every loan
    pub async fn list_all(&self) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>("SELECT * FROM loans ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(loans)
    }

    /// Loans of one borrower, any return status
    pub async fn list_by_borrower(&self, user_name: &str) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE user_name = ? ORDER BY id")
            .bind(user_name)
            .fetch_all(&self.pool)
            .await?;
        Ok(loans)
    }

    /// Loans of one book across all borrowers, any return status
    pub async fn list_by_isbn(&self, isbn: &str) -> AppResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE isbn = ? ORDER BY id")
            .bind(isbn)
            .fetch_all(&self.pool)
            .await?;
        Ok(loans)
    }

    /// Get loan by ID
    pub async fn get_by_id(&self, id: i64) -> AppResult<Loan> {
        sqlx::query_as::<_, Loan>("SELECT * FROM loans WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Loan with id {} not found", id)))
    }

    /// Insert a loan and return it with its assigned id
    pub async fn create(&self, loan: &NewLoan) -> AppResult<Loan> {
        let created = sqlx::query_as::<_, Loan>(
            r#"
            INSERT INTO loans (user_name, isbn, loan_date, due_date, returned)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&loan.user_name)
        .bind(&loan.isbn)
        .bind(loan.loan_date)
        .bind(loan.due_date)
        .bind(loan.returned)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    /// Persist the mutable state of an existing loan
    pub async fn update(&self, loan: &Loan) -> AppResult<()> {
        let result = sqlx::query("UPDATE loans SET returned = ? WHERE id = ?")
            .bind(loan.returned)
            .bind(loan.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Loan with id {} not found", loan.id)));
        }

        Ok(())
    }
}
