//! The capability boundary between the engine and the library's systems.
//!
//! Books, customers and payments all live behind `LibraryService`. The engine
//! never owns that state; it reads copies and writes them back through
//! `save_book`.

use crate::error::CollaboratorError;
use crate::model::{Book, Customer, CustomerId};

pub trait LibraryService {
    /// Looks up a book in the primary store.
    fn get_book(&self, book_id: &str) -> Option<Book>;

    /// Returns the full contents of the legacy archive.
    fn get_legacy_books(&self) -> Vec<Book>;

    fn get_customer(&self, customer_id: CustomerId) -> Result<Customer, CollaboratorError>;

    /// Books currently on loan to the customer.
    fn get_customer_loans(&self, customer_id: CustomerId) -> Result<Vec<Book>, CollaboratorError>;

    /// Charges `amount` minor units to the customer.
    fn collect_payment(&self, customer_id: CustomerId, amount: u64) -> Result<(), CollaboratorError>;

    /// Persists the book, including its loan state.
    fn save_book(&self, book: &Book) -> Result<(), CollaboratorError>;
}

impl<L: LibraryService + ?Sized> LibraryService for &L {
    fn get_book(&self, book_id: &str) -> Option<Book> {
        (**self).get_book(book_id)
    }

    fn get_legacy_books(&self) -> Vec<Book> {
        (**self).get_legacy_books()
    }

    fn get_customer(&self, customer_id: CustomerId) -> Result<Customer, CollaboratorError> {
        (**self).get_customer(customer_id)
    }

    fn get_customer_loans(&self, customer_id: CustomerId) -> Result<Vec<Book>, CollaboratorError> {
        (**self).get_customer_loans(customer_id)
    }

    fn collect_payment(&self, customer_id: CustomerId, amount: u64) -> Result<(), CollaboratorError> {
        (**self).collect_payment(customer_id, amount)
    }

    fn save_book(&self, book: &Book) -> Result<(), CollaboratorError> {
        (**self).save_book(book)
    }
}

/// A single call made against a `LibraryService`, as recorded by test doubles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LibraryCall {
    GetBook(String),
    GetLegacyBooks,
    GetCustomer(CustomerId),
    GetCustomerLoans(CustomerId),
    CollectPayment { customer: CustomerId, amount: u64 },
    SaveBook(String),
}
