//! Core lending transaction.
//!
//! Decides whether a book may be lent or renewed to a customer, settles any
//! overdue loans the customer holds, and persists the outcome through the
//! `LibraryService`. The engine keeps no state of its own.

use crate::clock::{Clock, SystemClock};
use crate::error::{LendingError, Result};
use crate::library::LibraryService;
use crate::model::{Book, Customer, CustomerId, Loan};
use crate::penalty;
use crate::policy;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};

/// Whether a transaction created a loan or extended one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LendKind {
    Lend,
    Renewal,
}

/// Outcome of a successful transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LendReceipt {
    pub book_id: String,

    pub customer_id: CustomerId,

    pub kind: LendKind,

    /// New deadline of the lent or renewed book.
    pub deadline: DateTime<Utc>,

    /// Amount collected for overdue loans, after any discount. Zero if
    /// nothing was collected.
    pub penalty_paid: u64,

    /// Overdue books whose deadline was extended after payment.
    pub extended_books: Vec<String>,
}

/// Overdue loans settled during a transaction.
#[derive(Debug, Default)]
struct Settlement {
    paid: u64,
    extended: Vec<String>,
}

/// The lending transaction orchestrator.
///
/// All collaborator calls are made sequentially; a failing call aborts the
/// transaction with a stage-specific error and nothing is retried.
pub struct LendingEngine<L, C = SystemClock> {
    library: L,
    clock: C,
}

impl<L: LibraryService> LendingEngine<L> {
    /// Creates an engine running on wall clock time.
    pub fn with_system_clock(library: L) -> Self {
        LendingEngine::new(library, SystemClock)
    }
}

impl<L: LibraryService, C: Clock> LendingEngine<L, C> {
    pub fn new(library: L, clock: C) -> Self {
        LendingEngine { library, clock }
    }

    /// Lends `book_id` to `customer_id`, or renews it if the customer already
    /// holds it.
    ///
    /// Overdue loans held by the customer are paid for and extended first.
    /// If the payment succeeds but some extensions cannot be stored, the
    /// transaction fails with `ExtensionPersistFailed` and the requested book
    /// is left untouched.
    pub fn lend_book(&self, book_id: &str, customer_id: CustomerId) -> Result<LendReceipt> {
        let mut book = self.resolve_book(book_id)?;
        let renewal = classify(&book, customer_id)?;

        let customer = self.resolve_customer(customer_id)?;

        let loans = self
            .library
            .get_customer_loans(customer_id)
            .map_err(LendingError::LoanQueryFailed)?;
        policy::check_loan_limit(loans.len(), renewal)?;

        let now = self.clock.now();
        let settlement = self.settle_overdue(&customer, loans, now)?;

        let deadline = policy::loan_deadline(now);
        let kind = if renewal {
            if let Some(loan) = book.loan.as_mut() {
                loan.deadline = deadline;
            }
            self.library
                .save_book(&book)
                .map_err(LendingError::RenewalFailed)?;
            LendKind::Renewal
        } else {
            book.loan = Some(Loan::new(book_id, customer_id, deadline));
            self.library
                .save_book(&book)
                .map_err(LendingError::LendFailed)?;
            LendKind::Lend
        };

        info!(
            "{:?} of book {} to customer {} until {}",
            kind, book_id, customer_id, deadline
        );

        Ok(LendReceipt {
            book_id: book.id,
            customer_id,
            kind,
            deadline,
            penalty_paid: settlement.paid,
            extended_books: settlement.extended,
        })
    }

    /// Finds the book in the primary store, falling back to the legacy archive.
    fn resolve_book(&self, book_id: &str) -> Result<Book> {
        if book_id.chars().count() < policy::MIN_BOOK_ID_LEN {
            debug!("Book id {:?} is too short to be lendable", book_id);
            return Err(LendingError::BookNotFound);
        }

        if let Some(book) = self.library.get_book(book_id) {
            return Ok(book);
        }

        debug!("Book {} not in primary store, searching legacy archive", book_id);
        self.library
            .get_legacy_books()
            .into_iter()
            .find(|b| b.id == book_id)
            .ok_or(LendingError::BookNotFound)
    }

    fn resolve_customer(&self, customer_id: CustomerId) -> Result<Customer> {
        let customer = self
            .library
            .get_customer(customer_id)
            .map_err(LendingError::CustomerLookupFailed)?;

        if customer.locked {
            debug!("Customer {} is locked", customer_id);
            return Err(LendingError::CustomerLocked);
        }

        Ok(customer)
    }

    /// Collects payment for overdue loans and extends them.
    ///
    /// Nothing is collected or extended when the total penalty is zero.
    fn settle_overdue(
        &self,
        customer: &Customer,
        loans: Vec<Book>,
        now: DateTime<Utc>,
    ) -> Result<Settlement> {
        let mut overdue: Vec<Book> = loans.into_iter().filter(|b| b.is_overdue(now)).collect();
        if overdue.is_empty() {
            return Ok(Settlement::default());
        }

        if !policy::may_collect_payment(customer.age) {
            debug!(
                "Customer {} has {} overdue books but is {} years old",
                customer.id,
                overdue.len(),
                customer.age
            );
            return Err(LendingError::PaymentAgeRestricted(overdue.len()));
        }

        let total = penalty::overdue_penalty(&overdue, now);
        if total == 0 {
            debug!(
                "Customer {} has {} overdue books without penalty",
                customer.id,
                overdue.len()
            );
            return Ok(Settlement::default());
        }

        let amount = policy::youth_discount(total, customer.age);
        self.library
            .collect_payment(customer.id, amount)
            .map_err(LendingError::PaymentFailed)?;
        info!(
            "Collected {} from customer {} for {} overdue books",
            amount,
            customer.id,
            overdue.len()
        );

        let deadline = policy::loan_deadline(now);
        let mut failed = Vec::new();
        for book in overdue.iter_mut() {
            if let Some(loan) = book.loan.as_mut() {
                loan.deadline = deadline;
            }
            if let Err(e) = self.library.save_book(book) {
                warn!(
                    "Extension of book {} for customer {} not saved: {}",
                    book.id, customer.id, e
                );
                failed.push(book.id.clone());
            }
        }

        if !failed.is_empty() {
            return Err(LendingError::ExtensionPersistFailed {
                customer: customer.id,
                books: failed,
            });
        }

        Ok(Settlement {
            paid: amount,
            extended: overdue.into_iter().map(|b| b.id).collect(),
        })
    }
}

/// Returns `true` if the request renews a loan the customer already holds.
fn classify(book: &Book, customer_id: CustomerId) -> Result<bool> {
    match book.holder() {
        Some(holder) if holder != customer_id => {
            debug!("Book {} is lent to customer {}", book.id, holder);
            Err(LendingError::BookUnavailable { holder })
        }
        Some(_) => Ok(true),
        None => Ok(false),
    }
}
