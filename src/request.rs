//! Batch processing of lend requests read from CSV.
//!
//! Input has a `book,customer` header. Each valid row is run through the
//! engine in order and produces one result row:
//! `book,customer,status,deadline,penalty_paid,detail`.

use crate::clock::Clock;
use crate::engine::{LendKind, LendReceipt, LendingEngine};
use crate::error::{AppError, LendingError};
use crate::library::LibraryService;
use crate::model::CustomerId;
use chrono::{DateTime, Utc};
use csv::{ReaderBuilder, Trim};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Raw request row.
#[derive(Debug, Deserialize)]
pub struct RequestRecord {
    pub book: String,

    pub customer: CustomerId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Lent,
    Renewed,
    Refused,
}

/// Result row written for every processed request.
#[derive(Debug, Serialize)]
pub struct ResultRecord {
    pub book: String,
    pub customer: CustomerId,
    pub status: RequestStatus,
    pub deadline: Option<DateTime<Utc>>,
    pub penalty_paid: Option<u64>,
    /// Refusal reason; empty on success.
    pub detail: String,
}

impl ResultRecord {
    pub fn from_outcome(
        request: &RequestRecord,
        outcome: &std::result::Result<LendReceipt, LendingError>,
    ) -> Self {
        match outcome {
            Ok(receipt) => ResultRecord {
                book: request.book.clone(),
                customer: request.customer,
                status: match receipt.kind {
                    LendKind::Lend => RequestStatus::Lent,
                    LendKind::Renewal => RequestStatus::Renewed,
                },
                deadline: Some(receipt.deadline),
                penalty_paid: Some(receipt.penalty_paid),
                detail: String::new(),
            },
            Err(e) => ResultRecord {
                book: request.book.clone(),
                customer: request.customer,
                status: RequestStatus::Refused,
                deadline: None,
                penalty_paid: None,
                detail: e.to_string(),
            },
        }
    }
}

/// Counts of processed requests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BatchSummary {
    pub lent: usize,
    pub renewed: usize,
    pub refused: usize,
    /// Rows that could not be parsed.
    pub skipped: usize,
}

/// Runs every request from `reader` through `engine`, writing results to
/// `writer` in input order.
///
/// Malformed rows are logged at warn level and skipped; refused transactions
/// are reported in the output rather than returned as errors.
pub fn process_requests<L, C, R, W>(
    engine: &LendingEngine<L, C>,
    reader: R,
    writer: W,
) -> Result<BatchSummary, AppError>
where
    L: LibraryService,
    C: Clock,
    R: Read,
    W: Write,
{
    let mut csv_reader = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut summary = BatchSummary::default();

    for (row_idx, result) in csv_reader.deserialize::<RequestRecord>().enumerate() {
        let row_num = row_idx + 2; // 1-indexed, accounting for header row

        let request = match result {
            Ok(request) => request,
            Err(e) => {
                warn!("Row {}: CSV parse error: {}", row_num, e);
                summary.skipped += 1;
                continue;
            }
        };

        let outcome = engine.lend_book(&request.book, request.customer);
        let record = ResultRecord::from_outcome(&request, &outcome);
        match record.status {
            RequestStatus::Lent => summary.lent += 1,
            RequestStatus::Renewed => summary.renewed += 1,
            RequestStatus::Refused => {
                info!("Row {}: {}", row_num, record.detail);
                summary.refused += 1;
            }
        }
        csv_writer.serialize(record)?;
    }

    csv_writer.flush()?;
    Ok(summary)
}
