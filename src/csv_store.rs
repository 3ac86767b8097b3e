//! CSV-file backed `LibraryService`.
//!
//! A data directory holds:
//!
//! - `books.csv`: the primary book store, `id,day_penalty,customer,deadline`
//! - `legacy_books.csv`: the legacy archive, same columns (optional)
//! - `customers.csv`: the customer directory, `id,locked,age`
//! - `payments.csv`: collected payments, `customer,amount` (appended)
//!
//! The loan columns are empty for available books; deadlines are RFC 3339.
//! Everything except payments is loaded when the library is opened, and
//! `books.csv` is rewritten on every save.

use crate::error::CollaboratorError;
use crate::library::LibraryService;
use crate::model::{Book, Customer, CustomerId, Loan};
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, Trim, WriterBuilder};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const BOOKS_FILE: &str = "books.csv";
pub const LEGACY_BOOKS_FILE: &str = "legacy_books.csv";
pub const CUSTOMERS_FILE: &str = "customers.csv";
pub const PAYMENTS_FILE: &str = "payments.csv";

/// One row of a book file.
#[derive(Debug, Serialize, Deserialize)]
struct BookRecord {
    id: String,
    day_penalty: u64,
    customer: Option<CustomerId>,
    deadline: Option<DateTime<Utc>>,
}

impl BookRecord {
    fn into_book(self, file: &str) -> Result<Book, CollaboratorError> {
        let loan = match (self.customer, self.deadline) {
            (Some(customer), Some(deadline)) => Some(Loan::new(self.id.clone(), customer, deadline)),
            (None, None) => None,
            _ => {
                return Err(CollaboratorError::InvalidRecord {
                    file: file.to_string(),
                    message: format!("book {} needs both customer and deadline, or neither", self.id),
                })
            }
        };
        Ok(Book {
            id: self.id,
            loan,
            day_penalty: self.day_penalty,
        })
    }
}

impl From<&Book> for BookRecord {
    fn from(book: &Book) -> Self {
        BookRecord {
            id: book.id.clone(),
            day_penalty: book.day_penalty,
            customer: book.holder(),
            deadline: book.loan.as_ref().map(|l| l.deadline),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CustomerRecord {
    id: CustomerId,
    locked: bool,
    age: u32,
}

#[derive(Debug, Serialize)]
struct PaymentRecord {
    customer: CustomerId,
    amount: u64,
}

pub struct CsvLibrary {
    dir: PathBuf,
    books: Mutex<BTreeMap<String, Book>>,
    legacy: Vec<Book>,
    customers: HashMap<CustomerId, Customer>,
}

impl CsvLibrary {
    /// Loads the library stored in `dir`.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, CollaboratorError> {
        let dir = dir.as_ref().to_path_buf();

        let books = read_books(&dir.join(BOOKS_FILE))?
            .into_iter()
            .map(|b| (b.id.clone(), b))
            .collect::<BTreeMap<_, _>>();

        let legacy_path = dir.join(LEGACY_BOOKS_FILE);
        let legacy = if legacy_path.exists() {
            read_books(&legacy_path)?
        } else {
            Vec::new()
        };

        let customers = read_customers(&dir.join(CUSTOMERS_FILE))?;

        info!(
            "Opened library at {}: {} books, {} legacy books, {} customers",
            dir.display(),
            books.len(),
            legacy.len(),
            customers.len()
        );

        Ok(CsvLibrary {
            dir,
            books: Mutex::new(books),
            legacy,
            customers,
        })
    }

    fn books(&self) -> MutexGuard<'_, BTreeMap<String, Book>> {
        self.books.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Rewrites `books.csv` through a temporary file so a failed write never
    /// truncates the store.
    fn write_books(&self, books: &BTreeMap<String, Book>) -> Result<(), CollaboratorError> {
        let path = self.dir.join(BOOKS_FILE);
        let tmp = self.dir.join(format!("{}.tmp", BOOKS_FILE));

        let mut writer = csv::Writer::from_path(&tmp)?;
        for book in books.values() {
            writer.serialize(BookRecord::from(book))?;
        }
        writer.flush()?;
        drop(writer);

        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

fn reader_for(path: &Path) -> Result<csv::Reader<File>, CollaboratorError> {
    Ok(ReaderBuilder::new().trim(Trim::All).from_path(path)?)
}

fn read_books(path: &Path) -> Result<Vec<Book>, CollaboratorError> {
    let file = path.display().to_string();
    let mut books = Vec::new();
    for record in reader_for(path)?.deserialize::<BookRecord>() {
        books.push(record?.into_book(&file)?);
    }
    Ok(books)
}

fn read_customers(path: &Path) -> Result<HashMap<CustomerId, Customer>, CollaboratorError> {
    let mut customers = HashMap::new();
    for record in reader_for(path)?.deserialize::<CustomerRecord>() {
        let record = record?;
        customers.insert(
            record.id,
            Customer {
                id: record.id,
                locked: record.locked,
                age: record.age,
            },
        );
    }
    Ok(customers)
}

impl LibraryService for CsvLibrary {
    fn get_book(&self, book_id: &str) -> Option<Book> {
        self.books().get(book_id).cloned()
    }

    fn get_legacy_books(&self) -> Vec<Book> {
        self.legacy.clone()
    }

    fn get_customer(&self, customer_id: CustomerId) -> Result<Customer, CollaboratorError> {
        self.customers
            .get(&customer_id)
            .cloned()
            .ok_or_else(|| CollaboratorError::NotFound(format!("customer {}", customer_id)))
    }

    fn get_customer_loans(&self, customer_id: CustomerId) -> Result<Vec<Book>, CollaboratorError> {
        let books = self.books();
        let mut loans: Vec<Book> = books
            .values()
            .chain(self.legacy.iter().filter(|b| !books.contains_key(&b.id)))
            .filter(|b| b.holder() == Some(customer_id))
            .cloned()
            .collect();
        loans.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(loans)
    }

    fn collect_payment(&self, customer_id: CustomerId, amount: u64) -> Result<(), CollaboratorError> {
        let path = self.dir.join(PAYMENTS_FILE);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let is_new = file.metadata()?.len() == 0;

        let mut writer = WriterBuilder::new().has_headers(is_new).from_writer(file);
        writer.serialize(PaymentRecord {
            customer: customer_id,
            amount,
        })?;
        writer.flush()?;

        debug!("Recorded payment of {} from customer {}", amount, customer_id);
        Ok(())
    }

    fn save_book(&self, book: &Book) -> Result<(), CollaboratorError> {
        let mut books = self.books();
        let mut next = books.clone();
        next.insert(book.id.clone(), book.clone());
        self.write_books(&next)?;
        *books = next;

        debug!("Saved book {}", book.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn library_dir(books: &str, customers: &str) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(BOOKS_FILE), books).unwrap();
        fs::write(dir.path().join(CUSTOMERS_FILE), customers).unwrap();
        dir
    }

    #[test]
    fn test_open_reads_books_and_customers() {
        let dir = library_dir(
            "id,day_penalty,customer,deadline\n\
             AB-1001,10,,\n\
             AB-1002,5,7,2024-03-01T12:00:00Z\n",
            "id,locked,age\n7,false,30\n8,true,12\n",
        );
        let library = CsvLibrary::open(dir.path()).unwrap();

        assert!(library.get_book("AB-1001").unwrap().is_available());
        let lent = library.get_book("AB-1002").unwrap();
        assert_eq!(lent.holder(), Some(7));
        assert_eq!(
            lent.loan.unwrap().deadline,
            Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
        );
        assert!(library.get_customer(8).unwrap().locked);
        assert!(library.get_legacy_books().is_empty());
    }

    #[test]
    fn test_half_loan_row_is_rejected() {
        let dir = library_dir(
            "id,day_penalty,customer,deadline\nAB-1001,10,7,\n",
            "id,locked,age\n",
        );
        assert!(matches!(
            CsvLibrary::open(dir.path()),
            Err(CollaboratorError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn test_save_book_rewrites_store() {
        let dir = library_dir(
            "id,day_penalty,customer,deadline\nAB-1001,10,,\n",
            "id,locked,age\n7,false,30\n",
        );
        let library = CsvLibrary::open(dir.path()).unwrap();
        let due = Utc.with_ymd_and_hms(2024, 3, 8, 12, 0, 0).unwrap();
        library
            .save_book(&Book::new("AB-1001", 10).lent_to(7, due))
            .unwrap();

        let reopened = CsvLibrary::open(dir.path()).unwrap();
        assert_eq!(reopened.get_book("AB-1001").unwrap().holder(), Some(7));
        assert_eq!(reopened.get_customer_loans(7).unwrap().len(), 1);
    }

    #[test]
    fn test_payments_are_appended() {
        let dir = library_dir("id,day_penalty,customer,deadline\n", "id,locked,age\n");
        let library = CsvLibrary::open(dir.path()).unwrap();
        library.collect_payment(7, 20).unwrap();
        library.collect_payment(8, 5).unwrap();

        let ledger = fs::read_to_string(dir.path().join(PAYMENTS_FILE)).unwrap();
        assert_eq!(ledger, "customer,amount\n7,20\n8,5\n");
    }

    #[test]
    fn test_legacy_books_count_as_loans_until_saved() {
        let dir = library_dir(
            "id,day_penalty,customer,deadline\n",
            "id,locked,age\n7,false,30\n",
        );
        fs::write(
            dir.path().join(LEGACY_BOOKS_FILE),
            "id,day_penalty,customer,deadline\nOLD-001,2,7,2024-03-01T12:00:00Z\n",
        )
        .unwrap();
        let library = CsvLibrary::open(dir.path()).unwrap();
        assert_eq!(library.get_customer_loans(7).unwrap().len(), 1);

        library.save_book(&Book::new("OLD-001", 2)).unwrap();
        assert!(library.get_customer_loans(7).unwrap().is_empty());
    }

    #[test]
    fn test_unknown_customer_is_not_found() {
        let dir = library_dir("id,day_penalty,customer,deadline\n", "id,locked,age\n");
        let library = CsvLibrary::open(dir.path()).unwrap();
        assert!(matches!(
            library.get_customer(1),
            Err(CollaboratorError::NotFound(_))
        ));
    }
}
