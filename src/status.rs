use chrono::NaiveDate;

use crate::decimal::Money;
use crate::schedule::{closure_date, AppliedPrepayment};
use crate::types::{LoanStatus, ScheduleEntry, StatusMode};

/// derives a loan's status from a generated schedule
pub trait StatusEvaluator {
    fn evaluate(&self, schedule: &[ScheduleEntry], original_principal: Money) -> LoanStatus;

    fn mode(&self) -> StatusMode;
}

/// status from a schedule that already carries every recorded prepayment
#[derive(Debug, Clone, Copy, Default)]
pub struct ItemizedStatus {
    /// prepayments made by the as-of date but not yet inside a settled entry
    pub pending_prepaid: Money,
}

impl ItemizedStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// status that also counts prepayments made since the last settled entry
    pub fn as_of(schedule: &[ScheduleEntry], applied: &[AppliedPrepayment], as_of: NaiveDate) -> Self {
        let last_settled = schedule.iter().rev().find(|e| e.settled).map(|e| e.payment_date);
        let pending_prepaid = applied
            .iter()
            .filter(|a| a.date <= as_of && last_settled.map_or(true, |settled| a.date > settled))
            .map(|a| a.applied)
            .sum();
        Self { pending_prepaid }
    }
}

impl StatusEvaluator for ItemizedStatus {
    fn evaluate(&self, schedule: &[ScheduleEntry], original_principal: Money) -> LoanStatus {
        let original_principal = original_principal.max(Money::ZERO);
        // settled entries form a prefix: dates are non-decreasing
        let last_settled = schedule.iter().rposition(|e| e.settled);

        let (settled_balance, interest_paid, settled_count) = match last_settled {
            Some(index) => (
                schedule[index].remaining_balance,
                schedule[..=index].iter().map(|e| e.interest).sum(),
                index as u32 + 1,
            ),
            // before the first payment: the opening balance the schedule started from
            None => match schedule.first() {
                Some(first) if first.month == 1 => (first.beginning_balance + first.prepaid, Money::ZERO, 0),
                _ => (original_principal, Money::ZERO, 0),
            },
        };
        let current_balance = (settled_balance - self.pending_prepaid).max(Money::ZERO);

        let principal_paid = (original_principal - current_balance)
            .max(Money::ZERO)
            .min(original_principal);

        LoanStatus {
            mode: StatusMode::Itemized,
            current_balance,
            principal_paid,
            interest_paid,
            next_due_date: if current_balance.is_zero() {
                None
            } else {
                schedule.iter().find(|e| !e.settled).map(|e| e.payment_date)
            },
            settled_count,
            remaining_count: schedule.len() as u32 - settled_count,
            completion_percent: principal_paid.percent_of(original_principal),
            closure_date: closure_date(schedule, Money::ZERO),
        }
    }

    fn mode(&self) -> StatusMode {
        StatusMode::Itemized
    }
}

/// status from a prepayment-free schedule corrected by a cached prepayment total
///
/// Cheaper than an itemized schedule per loan, but ignores the interest each
/// prepayment would have saved and when it was made.
#[derive(Debug, Clone, Copy)]
pub struct ApproximateStatus {
    pub cached_prepayment_total: Money,
}

impl ApproximateStatus {
    pub fn new(cached_prepayment_total: Money) -> Self {
        Self {
            cached_prepayment_total: cached_prepayment_total.max(Money::ZERO),
        }
    }
}

impl StatusEvaluator for ApproximateStatus {
    fn evaluate(&self, schedule: &[ScheduleEntry], original_principal: Money) -> LoanStatus {
        let base = ItemizedStatus::new().evaluate(schedule, original_principal);
        let original_principal = original_principal.max(Money::ZERO);

        let current_balance = (base.current_balance - self.cached_prepayment_total).max(Money::ZERO);
        let principal_paid = (base.principal_paid + self.cached_prepayment_total).min(original_principal);

        LoanStatus {
            mode: StatusMode::Approximate,
            current_balance,
            principal_paid,
            next_due_date: if current_balance.is_zero() {
                None
            } else {
                base.next_due_date
            },
            completion_percent: principal_paid.percent_of(original_principal),
            ..base
        }
    }

    fn mode(&self) -> StatusMode {
        StatusMode::Approximate
    }
}
