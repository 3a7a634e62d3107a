use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Money, Rate};

/// unique identifier for a loan
pub type LoanId = Uuid;

/// unique identifier for a recorded prepayment
pub type PrepaymentId = Uuid;

/// static terms of a loan as held by the persistence layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    pub annual_rate: Rate,
    pub term_months: u32,
    pub start_date: NaiveDate,
    /// lump amount the borrower had already repaid when the loan was entered
    pub amount_already_paid: Option<Money>,
    /// running total of recorded prepayments, used by approximate status
    pub cached_prepayment_total: Option<Money>,
}

impl LoanTerms {
    pub fn new(principal: Money, annual_rate: Rate, term_months: u32, start_date: NaiveDate) -> Self {
        Self {
            principal,
            annual_rate,
            term_months,
            start_date,
            amount_already_paid: None,
            cached_prepayment_total: None,
        }
    }

    pub fn already_paid(&self) -> Money {
        self.amount_already_paid.unwrap_or(Money::ZERO).max(Money::ZERO)
    }

    pub fn cached_prepayments(&self) -> Money {
        self.cached_prepayment_total.unwrap_or(Money::ZERO).max(Money::ZERO)
    }

    /// principal > 0 and rate >= 0; term 0 is a degenerate but valid loan
    pub fn is_well_formed(&self) -> bool {
        self.principal.is_positive() && !self.annual_rate.is_negative()
    }
}

/// an extra, out-of-schedule payment against principal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prepayment {
    pub id: PrepaymentId,
    pub amount: Money,
    pub date: NaiveDate,
    pub note: Option<String>,
}

impl Prepayment {
    pub fn new(amount: Money, date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            amount,
            date,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// one row of an amortization schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub month: u32,
    pub payment_date: NaiveDate,
    /// balance entering the month; on the first entry, after its prepayments
    pub beginning_balance: Money,
    /// prepayments applied in this entry's window
    ///
    /// Netted from the opening balance on the first entry, part of `principal`
    /// on every later one.
    pub prepaid: Money,
    pub payment: Money,
    pub principal: Money,
    pub interest: Money,
    pub remaining_balance: Money,
    pub settled: bool,
    pub settled_on: Option<NaiveDate>,
}

/// which derivation produced a status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusMode {
    /// derived from a schedule carrying every prepayment
    Itemized,
    /// derived from a prepayment-free schedule and a cached prepayment total
    Approximate,
}

/// derived repayment status of a loan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanStatus {
    pub mode: StatusMode,
    pub current_balance: Money,
    pub principal_paid: Money,
    pub interest_paid: Money,
    pub next_due_date: Option<NaiveDate>,
    pub settled_count: u32,
    pub remaining_count: u32,
    pub completion_percent: Decimal,
    pub closure_date: Option<NaiveDate>,
}

impl LoanStatus {
    pub fn is_closed(&self) -> bool {
        self.current_balance.is_zero()
    }
}

/// how a hypothetical prepayment repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrepaymentMode {
    OneTime,
    /// applied again every `every_months` schedule months after the first
    Recurring { every_months: u32 },
}
