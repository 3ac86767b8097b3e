//! Book, loan and customer models.
//!
//! These records are owned by the library collaborators. The engine works on
//! copies, mutates the loan field of a book and hands it back for persistence.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Customer identifier as assigned by the customer directory.
pub type CustomerId = u64;

/// A book's active loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub book_id: String,

    pub customer_id: CustomerId,

    /// Latest point in time the book may be returned without penalty.
    pub deadline: DateTime<Utc>,
}

impl Loan {
    pub fn new(book_id: impl Into<String>, customer_id: CustomerId, deadline: DateTime<Utc>) -> Self {
        Loan {
            book_id: book_id.into(),
            customer_id,
            deadline,
        }
    }

    /// Returns `true` if the deadline lies strictly before `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.deadline < now
    }
}

/// A unique book in the library.
///
/// # Invariants
///
/// - At most one active loan at a time; `None` means the book is available
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: String,

    pub loan: Option<Loan>,

    /// Late penalty per started day, in currency minor units.
    pub day_penalty: u64,
}

impl Book {
    /// Creates an available book.
    pub fn new(id: impl Into<String>, day_penalty: u64) -> Self {
        Book {
            id: id.into(),
            loan: None,
            day_penalty,
        }
    }

    /// Builder-style helper attaching a loan for `customer_id`.
    pub fn lent_to(mut self, customer_id: CustomerId, deadline: DateTime<Utc>) -> Self {
        self.loan = Some(Loan::new(self.id.clone(), customer_id, deadline));
        self
    }

    pub fn is_available(&self) -> bool {
        self.loan.is_none()
    }

    /// Customer currently holding the book, if any.
    pub fn holder(&self) -> Option<CustomerId> {
        self.loan.as_ref().map(|l| l.customer_id)
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.loan.as_ref().is_some_and(|l| l.is_overdue(now))
    }
}

/// A library customer. Never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,

    /// Locked accounts may not lend or renew.
    pub locked: bool,

    /// Age in whole years.
    pub age: u32,
}

impl Customer {
    pub fn new(id: CustomerId, age: u32) -> Self {
        Customer {
            id,
            locked: false,
            age,
        }
    }

    pub fn locked(mut self) -> Self {
        self.locked = true;
        self
    }
}
