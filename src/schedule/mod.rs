pub mod generator;
pub mod installment;
pub mod interest;

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;

use crate::decimal::Money;

pub use generator::{
    AppliedPrepayment, GeneratedSchedule, PrepaymentCursor, ScheduleGenerator, ScheduleRequest,
    StopReason, WindowOutcome,
};
pub use installment::{initially_settled_months, installment};
pub use interest::{total_interest, ScheduleTotals};

/// date `months` calendar months after `start`, clamped to the end of shorter months
pub fn add_months(start: NaiveDate, months: u32) -> NaiveDate {
    start
        .checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

/// closure date of a schedule: date of the entry that brought the balance to zero
pub fn closure_date(entries: &[crate::types::ScheduleEntry], epsilon: Money) -> Option<NaiveDate> {
    entries
        .last()
        .filter(|last| last.remaining_balance <= epsilon)
        .map(|last| last.payment_date)
}

/// interest/principal split of one installment against an outstanding balance
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MonthSplit {
    pub interest: Money,
    pub principal: Money,
    pub payment: Money,
    pub remaining: Money,
}

/// one month of amortization shared by the generator and both simulators
///
/// Returns `None` when the installment does not cover the month's interest.
/// A principal component within `epsilon` of the balance retires it and the
/// payment shrinks to principal + interest.
pub(crate) fn split_month(
    balance: Money,
    monthly_rate: Decimal,
    installment: Money,
    epsilon: Money,
) -> Option<MonthSplit> {
    let interest = (balance * monthly_rate).round_currency();
    let mut principal = installment - interest;

    if !principal.is_positive() {
        return None;
    }

    if principal >= balance - epsilon {
        principal = balance;
    }

    Some(MonthSplit {
        interest,
        principal,
        payment: principal + interest,
        remaining: balance - principal,
    })
}
