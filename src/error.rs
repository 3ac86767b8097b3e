//! Error types for the lending engine.

use crate::model::CustomerId;
use thiserror::Error;

/// Result type alias for lending transactions
pub type Result<T> = std::result::Result<T, LendingError>;

/// Reasons a lend or renewal transaction is refused or aborted.
#[derive(Error, Debug)]
pub enum LendingError {
    /// Identifier too short, or absent from both the primary store and the legacy archive
    #[error("Book not found")]
    BookNotFound,

    /// Book is on loan to another customer
    #[error("Book is currently lent to customer {holder}")]
    BookUnavailable { holder: CustomerId },

    #[error("Customer not found: {0}")]
    CustomerLookupFailed(#[source] CollaboratorError),

    #[error("Customer account is locked")]
    CustomerLocked,

    #[error("Cannot retrieve current loans: {0}")]
    LoanQueryFailed(#[source] CollaboratorError),

    #[error("Customer already has {0} loaned books, 3 is the limit")]
    LendingLimitExceeded(usize),

    #[error(
        "Cannot renew when more than 3 other books are loaned, customer already has {0} loaned books"
    )]
    RenewalLimitExceeded(usize),

    /// Payment for overdue loans is not allowed by law; carries the overdue count
    #[error("Cannot collect payment for {0} books, customer is younger than 13")]
    PaymentAgeRestricted(usize),

    #[error("Payment failed: {0}")]
    PaymentFailed(#[source] CollaboratorError),

    /// Payment went through but some extended deadlines were not stored.
    /// Needs manual reconciliation.
    #[error(
        "Saving extended deadline failed, manually register extension for customer {customer} on books {}",
        .books.join(", ")
    )]
    ExtensionPersistFailed {
        customer: CustomerId,
        books: Vec<String>,
    },

    #[error("Renewal failed: {0}")]
    RenewalFailed(#[source] CollaboratorError),

    #[error("Lend failed: {0}")]
    LendFailed(#[source] CollaboratorError),
}

/// Failures reported by a library collaborator (store, directory, payment processor).
#[derive(Error, Debug)]
pub enum CollaboratorError {
    #[error("{0} does not exist")]
    NotFound(String),

    /// Collaborator could not serve the request
    #[error("{0} is unavailable")]
    Unavailable(String),

    /// Payment processor refused the charge
    #[error("payment declined: {0}")]
    Declined(String),

    #[error("invalid record in {file}: {message}")]
    InvalidRecord { file: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Errors that stop the CLI as a whole.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    /// Data directory could not be opened
    #[error("Cannot open library data: {0}")]
    Store(#[from] CollaboratorError),

    #[error("Missing arguments. Usage: lending-engine <data-dir> <requests.csv>")]
    MissingArgument,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_wrapped_errors_keep_cause_in_message() {
        let err = LendingError::CustomerLookupFailed(CollaboratorError::Unavailable(
            "customer directory".to_string(),
        ));
        assert_eq!(
            err.to_string(),
            "Customer not found: customer directory is unavailable"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_extension_failure_lists_books() {
        let err = LendingError::ExtensionPersistFailed {
            customer: 42,
            books: vec!["AB-1001".to_string(), "AB-1002".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Saving extended deadline failed, manually register extension for customer 42 on books AB-1001, AB-1002"
        );
    }

    #[test]
    fn test_limit_messages_carry_count() {
        assert_eq!(
            LendingError::LendingLimitExceeded(3).to_string(),
            "Customer already has 3 loaned books, 3 is the limit"
        );
        assert_eq!(
            LendingError::PaymentAgeRestricted(1).to_string(),
            "Cannot collect payment for 1 books, customer is younger than 13"
        );
    }
}
