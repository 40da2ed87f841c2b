//! Loan model and related types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Loan model from database
///
/// Serialized as `{id, user, isbn, date, dueDate, return}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: i64,
    /// Borrower name
    #[serde(rename = "user")]
    pub user_name: String,
    pub isbn: String,
    #[serde(rename = "date")]
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    #[serde(rename = "return")]
    pub returned: bool,
}

impl Loan {
    /// Still out with the borrower
    pub fn is_active(&self) -> bool {
        !self.returned
    }

    /// Unreturned and past its due date
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && self.due_date < now
    }
}

/// Loan about to be inserted; the database assigns the id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub user_name: String,
    pub isbn: String,
    pub loan_date: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned: bool,
}

impl NewLoan {
    /// Loan starting at `now`, due `duration_days` later
    pub fn issue(
        user_name: impl Into<String>,
        isbn: impl Into<String>,
        now: DateTime<Utc>,
        duration_days: i64,
    ) -> Self {
        Self {
            user_name: user_name.into(),
            isbn: isbn.into(),
            loan_date: now,
            due_date: now + Duration::days(duration_days),
            returned: false,
        }
    }
}

/// Create loan request
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLoanRequest {
    /// Borrower name
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(length(min = 1, message = "User name is required"))]
    pub user_name: String,
    /// Book ISBN (format is not checked)
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(length(min = 1, message = "ISBN is required"))]
    pub isbn: String,
}

/// `null` counts as a missing value, so it fails the same `length` check
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl CreateLoanRequest {
    pub fn new(user_name: impl Into<String>, isbn: impl Into<String>) -> Self {
        Self {
            user_name: user_name.into(),
            isbn: isbn.into(),
        }
    }

    /// Strip surrounding whitespace so blank values fail validation
    pub fn trimmed(self) -> Self {
        Self {
            user_name: self.user_name.trim().to_string(),
            isbn: self.isbn.trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_issue_sets_due_date() {
        let loan = NewLoan::issue("ana", "9780000000001", at(1), 14);
        assert_eq!(loan.loan_date, at(1));
        assert_eq!(loan.due_date, at(15));
        assert!(!loan.returned);
    }

    #[test]
    fn test_overdue_only_when_unreturned() {
        let mut loan = Loan {
            id: 1,
            user_name: "ana".to_string(),
            isbn: "1".to_string(),
            loan_date: at(1),
            due_date: at(15),
            returned: false,
        };
        assert!(!loan.is_overdue(at(15)));
        assert!(loan.is_overdue(at(16)));

        loan.returned = true;
        assert!(!loan.is_overdue(at(16)));
    }

    #[test]
    fn test_blank_request_fails_validation() {
        let request = CreateLoanRequest::new("  ", "9780000000001").trimmed();
        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("user_name"));
        assert!(!errors.field_errors().contains_key("isbn"));
    }

    #[test]
    fn test_request_uses_camel_case() {
        let request: CreateLoanRequest =
            serde_json::from_str(r#"{"userName":"ana","isbn":"42"}"#).unwrap();
        assert_eq!(request.user_name, "ana");
        assert_eq!(request.isbn, "42");

        let missing: CreateLoanRequest = serde_json::from_str("{}").unwrap();
        assert!(missing.validate().is_err());
    }

    #[test]
    fn test_null_field_is_empty() {
        let request: CreateLoanRequest =
            serde_json::from_str(r#"{"userName":null,"isbn":"42"}"#).unwrap();
        assert_eq!(request.user_name, "");

        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("user_name"));
        assert!(!errors.field_errors().contains_key("isbn"));
    }

    #[test]
    fn test_loan_wire_names() {
        let loan = Loan {
            id: 3,
            user_name: "ana".to_string(),
            isbn: "42".to_string(),
            loan_date: at(1),
            due_date: at(15),
            returned: false,
        };
        let value = serde_json::to_value(&loan).unwrap();

        let mut keys: Vec<&str> = value.as_object().unwrap().keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(keys, vec!["date", "dueDate", "id", "isbn", "return", "user"]);
        assert_eq!(value["user"], "ana");

        let back: Loan = serde_json::from_value(value).unwrap();
        assert_eq!(back, loan);
    }
}
