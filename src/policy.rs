//! Lending rules.
//!
//! One canonical rule set: new loans stop at 3 held books, renewals at 4,
//! and the youth discount rounds up.

use crate::error::{LendingError, Result};
use chrono::{DateTime, Duration, Utc};

/// Identifiers shorter than this are never lendable.
pub const MIN_BOOK_ID_LEN: usize = 5;

/// Length of a loan or an extension.
pub const LOAN_PERIOD_DAYS: i64 = 7;

/// A new loan is refused once the customer holds this many loans.
pub const LENDING_LIMIT: usize = 3;

/// A renewal is refused once the customer holds this many loans.
pub const RENEWAL_LIMIT: usize = 4;

/// No payment may be collected from customers younger than this.
pub const MIN_PAYMENT_AGE: u32 = 13;

/// Customers younger than this pay half.
pub const ADULT_AGE: u32 = 18;

/// Deadline for a loan created or extended at `now`.
pub fn loan_deadline(now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(LOAN_PERIOD_DAYS)
}

/// Checks the number of loans a customer already holds.
///
/// For renewals the renewed book is itself part of `held`.
pub fn check_loan_limit(held: usize, renewal: bool) -> Result<()> {
    if renewal {
        if held >= RENEWAL_LIMIT {
            return Err(LendingError::RenewalLimitExceeded(held));
        }
    } else if held >= LENDING_LIMIT {
        return Err(LendingError::LendingLimitExceeded(held));
    }
    Ok(())
}

pub fn may_collect_payment(age: u32) -> bool {
    age >= MIN_PAYMENT_AGE
}

/// Applies the 50% youth discount, rounding up to a whole minor unit.
pub fn youth_discount(total: u64, age: u32) -> u64 {
    if age < ADULT_AGE {
        total.div_ceil(2)
    } else {
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_new_lend_limit() {
        assert!(check_loan_limit(0, false).is_ok());
        assert!(check_loan_limit(2, false).is_ok());
        assert!(matches!(
            check_loan_limit(3, false),
            Err(LendingError::LendingLimitExceeded(3))
        ));
        assert!(matches!(
            check_loan_limit(5, false),
            Err(LendingError::LendingLimitExceeded(5))
        ));
    }

    #[test]
    fn test_renewal_limit_allows_three() {
        assert!(check_loan_limit(3, true).is_ok());
        assert!(matches!(
            check_loan_limit(4, true),
            Err(LendingError::RenewalLimitExceeded(4))
        ));
    }

    #[test]
    fn test_youth_discount_rounds_up() {
        assert_eq!(youth_discount(15, 17), 8);
        assert_eq!(youth_discount(14, 13), 7);
        assert_eq!(youth_discount(1, 16), 1);
        assert_eq!(youth_discount(15, 18), 15);
        assert_eq!(youth_discount(15, 70), 15);
    }

    #[test]
    fn test_payment_age_boundary() {
        assert!(!may_collect_payment(0));
        assert!(!may_collect_payment(12));
        assert!(may_collect_payment(13));
    }

    #[test]
    fn test_loan_deadline_is_one_week_out() {
        let now = Utc.with_ymd_and_hms(2024, 2, 26, 8, 30, 0).unwrap();
        assert_eq!(
            loan_deadline(now),
            Utc.with_ymd_and_hms(2024, 3, 4, 8, 30, 0).unwrap()
        );
    }
}
