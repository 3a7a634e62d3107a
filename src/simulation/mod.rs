pub mod installment_change;
pub mod prepayment;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::schedule::{closure_date, installment, total_interest};
use crate::types::{LoanTerms, Prepayment, ScheduleEntry};

pub use installment_change::{InstallmentProjection, NewInstallmentSimulator, NonConvergence};
pub use prepayment::{PrepaymentSimulation, PrepaymentSimulator};

/// loan parameters a what-if run reuses from the original schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationBasis {
    pub annual_rate: Rate,
    pub installment: Money,
    pub start_date: NaiveDate,
    /// recorded prepayments; those falling after the simulation point are replayed
    #[serde(default)]
    pub recorded_prepayments: Vec<Prepayment>,
}

impl SimulationBasis {
    pub fn for_loan(terms: &LoanTerms) -> Self {
        Self {
            annual_rate: terms.annual_rate,
            installment: installment(terms.principal, terms.annual_rate, terms.term_months),
            start_date: terms.start_date,
            recorded_prepayments: Vec::new(),
        }
    }

    pub fn with_prepayments(mut self, prepayments: &[Prepayment]) -> Self {
        self.recorded_prepayments = prepayments.to_vec();
        self.recorded_prepayments.sort_by_key(|p| p.date);
        self
    }
}

/// before/after comparison of a what-if run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSummary {
    pub original_closure_date: Option<NaiveDate>,
    pub new_closure_date: Option<NaiveDate>,
    pub original_total_interest: Money,
    pub new_total_interest: Money,
    pub interest_saved: Money,
    /// positive when the simulated schedule finishes sooner
    pub months_saved: i64,
}

impl SimulationSummary {
    pub fn compare(original: &[ScheduleEntry], simulated: &[ScheduleEntry]) -> Self {
        let original_total_interest = total_interest(original);
        let new_total_interest = total_interest(simulated);

        Self {
            original_closure_date: closure_date(original, Money::ZERO),
            new_closure_date: closure_date(simulated, Money::ZERO),
            original_total_interest,
            new_total_interest,
            interest_saved: original_total_interest - new_total_interest,
            months_saved: original.len() as i64 - simulated.len() as i64,
        }
    }
}

/// result of re-projecting the outstanding balance under a new installment
#[derive(Debug, Clone, PartialEq)]
pub struct InstallmentChangeSummary {
    pub current_balance: Money,
    pub original_installment: Money,
    pub new_installment: Money,
    pub original_closure_date: Option<NaiveDate>,
    /// interest still to be paid on the unchanged schedule
    pub original_remaining_interest: Money,
    pub original_remaining_months: u32,
    pub projection: InstallmentProjection,
}

impl InstallmentChangeSummary {
    /// `None` when the new installment never amortizes the balance
    pub fn interest_saved(&self) -> Option<Money> {
        self.projection
            .total_interest()
            .map(|new| self.original_remaining_interest - new)
    }

    /// `None` when the new installment never amortizes the balance
    pub fn months_saved(&self) -> Option<i64> {
        self.projection
            .months_to_repay()
            .map(|months| self.original_remaining_months as i64 - months as i64)
    }
}

/// renumber entries 1..N in place
pub(crate) fn renumber(entries: &mut [ScheduleEntry]) {
    for (index, entry) in entries.iter_mut().enumerate() {
        entry.month = index as u32 + 1;
    }
}
