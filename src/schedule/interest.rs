use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::ScheduleEntry;

/// total interest across any schedule, zero for an empty one
pub fn total_interest(entries: &[ScheduleEntry]) -> Money {
    entries.iter().map(|e| e.interest).sum()
}

/// aggregate figures of a schedule
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScheduleTotals {
    pub total_interest: Money,
    pub total_principal: Money,
    pub total_prepaid: Money,
    pub total_paid: Money,
    pub months: u32,
}

impl ScheduleTotals {
    pub fn of(entries: &[ScheduleEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut totals, entry| {
            totals.total_interest += entry.interest;
            totals.total_principal += entry.principal;
            totals.total_prepaid += entry.prepaid;
            totals.total_paid += entry.payment + entry.prepaid;
            totals.months += 1;
            totals
        })
    }
}
