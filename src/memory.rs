//! In-memory `LibraryService` for tests.
//!
//! Holds books, legacy books and customers in memory, records every call made
//! against it, and can be told to fail individual operations.

use crate::error::CollaboratorError;
use crate::library::{LibraryCall, LibraryService};
use crate::model::{Book, Customer, CustomerId};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct State {
    books: HashMap<String, Book>,
    legacy: Vec<Book>,
    customers: HashMap<CustomerId, Customer>,
    payments: Vec<(CustomerId, u64)>,
    saved: Vec<Book>,
    calls: Vec<LibraryCall>,
}

#[derive(Debug, Default)]
struct Failures {
    customer_lookup: HashSet<CustomerId>,
    loan_query: HashSet<CustomerId>,
    payment: HashSet<CustomerId>,
    save: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct InMemoryLibrary {
    state: Mutex<State>,
    failures: Failures,
}

impl InMemoryLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a book to the primary store.
    pub fn with_book(self, book: Book) -> Self {
        self.lock().books.insert(book.id.clone(), book);
        self
    }

    /// Adds a book to the legacy archive.
    pub fn with_legacy_book(self, book: Book) -> Self {
        self.lock().legacy.push(book);
        self
    }

    pub fn with_customer(self, customer: Customer) -> Self {
        self.lock().customers.insert(customer.id, customer);
        self
    }

    pub fn failing_customer_lookup(mut self, customer_id: CustomerId) -> Self {
        self.failures.customer_lookup.insert(customer_id);
        self
    }

    pub fn failing_loan_query(mut self, customer_id: CustomerId) -> Self {
        self.failures.loan_query.insert(customer_id);
        self
    }

    pub fn failing_payment(mut self, customer_id: CustomerId) -> Self {
        self.failures.payment.insert(customer_id);
        self
    }

    /// Makes every `save_book` for `book_id` fail.
    pub fn failing_save(mut self, book_id: impl Into<String>) -> Self {
        self.failures.save.insert(book_id.into());
        self
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<LibraryCall> {
        self.lock().calls.clone()
    }

    /// Payments collected so far as `(customer, amount)`.
    pub fn payments(&self) -> Vec<(CustomerId, u64)> {
        self.lock().payments.clone()
    }

    /// Books successfully saved so far, in save order.
    pub fn saved_books(&self) -> Vec<Book> {
        self.lock().saved.clone()
    }

    /// Current primary store entry for `book_id`.
    pub fn book(&self, book_id: &str) -> Option<Book> {
        self.lock().books.get(book_id).cloned()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, call: LibraryCall) -> MutexGuard<'_, State> {
        let mut state = self.lock();
        state.calls.push(call);
        state
    }
}

impl LibraryService for InMemoryLibrary {
    fn get_book(&self, book_id: &str) -> Option<Book> {
        let state = self.record(LibraryCall::GetBook(book_id.to_string()));
        state.books.get(book_id).cloned()
    }

    fn get_legacy_books(&self) -> Vec<Book> {
        self.record(LibraryCall::GetLegacyBooks).legacy.clone()
    }

    fn get_customer(&self, customer_id: CustomerId) -> Result<Customer, CollaboratorError> {
        let state = self.record(LibraryCall::GetCustomer(customer_id));
        if self.failures.customer_lookup.contains(&customer_id) {
            return Err(CollaboratorError::Unavailable("customer directory".to_string()));
        }
        state
            .customers
            .get(&customer_id)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound(format!("customer {}", customer_id)))
    }

    fn get_customer_loans(&self, customer_id: CustomerId) -> Result<Vec<Book>, CollaboratorError> {
        let state = self.record(LibraryCall::GetCustomerLoans(customer_id));
        if self.failures.loan_query.contains(&customer_id) {
            return Err(CollaboratorError::Unavailable("loan registry".to_string()));
        }

        let shadowed = |b: &Book| state.books.contains_key(&b.id);
        let mut loans: Vec<Book> = state
            .books
            .values()
            .chain(state.legacy.iter().filter(|b| !shadowed(*b)))
            .filter(|b| b.holder() == Some(customer_id))
            .cloned()
            .collect();
        loans.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(loans)
    }

    fn collect_payment(&self, customer_id: CustomerId, amount: u64) -> Result<(), CollaboratorError> {
        let mut state = self.record(LibraryCall::CollectPayment {
            customer: customer_id,
            amount,
        });
        if self.failures.payment.contains(&customer_id) {
            return Err(CollaboratorError::Declined(format!(
                "card on file for customer {}",
                customer_id
            )));
        }
        state.payments.push((customer_id, amount));
        Ok(())
    }

    fn save_book(&self, book: &Book) -> Result<(), CollaboratorError> {
        let mut state = self.record(LibraryCall::SaveBook(book.id.clone()));
        if self.failures.save.contains(&book.id) {
            return Err(CollaboratorError::Unavailable("book store".to_string()));
        }
        state.books.insert(book.id.clone(), book.clone());
        state.saved.push(book.clone());
        Ok(())
    }
}
