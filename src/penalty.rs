//! Late return penalty arithmetic.
//!
//! Lateness is measured in fractional hours with `rust_decimal` so that the
//! day boundary is exact: 24 hours late is one day, anything beyond starts
//! a second one.

use crate::model::Book;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

const HOURS_PER_DAY: i64 = 24;
const MICROS_PER_HOUR: i64 = 3_600_000_000;
const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Number of started days in `hours`: `ceil(hours / 24)`, never negative.
pub fn days_late_from_hours(hours: Decimal) -> u64 {
    if hours <= Decimal::ZERO {
        return 0;
    }
    (hours / Decimal::from(HOURS_PER_DAY))
        .ceil()
        .to_u64()
        .unwrap_or(u64::MAX)
}

/// Hours elapsed between `deadline` and `now`; negative if not yet reached.
pub fn hours_since(deadline: DateTime<Utc>, now: DateTime<Utc>) -> Decimal {
    let elapsed = now - deadline;
    match elapsed.num_microseconds() {
        Some(micros) => Decimal::from(micros) / Decimal::from(MICROS_PER_HOUR),
        // Spans too large for microseconds
        None => Decimal::from(elapsed.num_milliseconds()) / Decimal::from(MILLIS_PER_HOUR),
    }
}

/// Started days between `deadline` and `now`.
pub fn days_late(deadline: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    days_late_from_hours(hours_since(deadline, now))
}

/// Penalty owed for one book at `now`. Available books owe nothing.
pub fn book_penalty(book: &Book, now: DateTime<Utc>) -> u64 {
    match &book.loan {
        Some(loan) => days_late(loan.deadline, now).saturating_mul(book.day_penalty),
        None => 0,
    }
}

/// Sum of penalties over `books`, each charged at its own day rate.
pub fn overdue_penalty<'a, I>(books: I, now: DateTime<Utc>) -> u64
where
    I: IntoIterator<Item = &'a Book>,
{
    books
        .into_iter()
        .map(|b| book_penalty(b, now))
        .fold(0u64, u64::saturating_add)
}
