//! # Lending Engine
//!
//! A transactional rule engine that decides whether a library book may be
//! lent or renewed to a customer, and what side effects follow: collecting
//! payment for overdue loans, extending their deadlines and persisting the
//! new loan.
//!
//! ## Design Principles
//!
//! - **Capability boundary**: all state lives behind [`LibraryService`]
//! - **Injected time**: the current instant comes from a [`Clock`]
//! - **Fail fast**: collaborator errors are wrapped per stage and returned,
//!   never retried
//! - **Exact lateness**: hours late are measured with `rust_decimal`
//!
//! ## Example
//!
//! ```
//! use lending_engine::{Book, Customer, FixedClock, InMemoryLibrary, LendingEngine};
//! use chrono::{TimeZone, Utc};
//!
//! let library = InMemoryLibrary::new()
//!     .with_book(Book::new("AB-1001", 10))
//!     .with_customer(Customer::new(7, 30));
//! let now = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
//! let engine = LendingEngine::new(&library, FixedClock(now));
//!
//! let receipt = engine.lend_book("AB-1001", 7).unwrap();
//! assert_eq!(library.book("AB-1001").unwrap().holder(), Some(7));
//! assert_eq!(receipt.penalty_paid, 0);
//! ```

pub mod clock;
pub mod csv_store;
pub mod engine;
pub mod error;
pub mod library;
pub mod memory;
pub mod model;
pub mod penalty;
pub mod policy;
pub mod request;

pub use clock::{Clock, FixedClock, SystemClock};
pub use csv_store::CsvLibrary;
pub use engine::{LendKind, LendReceipt, LendingEngine};
pub use error::{AppError, CollaboratorError, LendingError, Result};
pub use library::{LibraryCall, LibraryService};
pub use memory::InMemoryLibrary;
pub use model::{Book, Customer, CustomerId, Loan};
pub use request::{process_requests, BatchSummary, RequestRecord, RequestStatus, ResultRecord};
