use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::decimal::{Money, Rate};
use crate::schedule::{add_months, split_month, total_interest};
use crate::types::ScheduleEntry;

/// why a projection never reaches a zero balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NonConvergence {
    /// the installment does not exceed the first month's interest
    InstallmentBelowInterest,
    /// negative rate or non-positive installment
    InvalidInputs,
    /// month cap reached despite a positive principal component
    IterationCap,
}

/// outcome of projecting a balance under a new fixed installment
#[derive(Debug, Clone, PartialEq)]
pub enum InstallmentProjection {
    Converges {
        schedule: Vec<ScheduleEntry>,
        months_to_repay: u32,
        closure_date: Option<NaiveDate>,
        total_interest: Money,
    },
    NonConvergent {
        reason: NonConvergence,
        first_month_interest: Money,
    },
}

impl InstallmentProjection {
    pub fn is_convergent(&self) -> bool {
        matches!(self, InstallmentProjection::Converges { .. })
    }

    /// `None` means unbounded
    pub fn months_to_repay(&self) -> Option<u32> {
        match self {
            InstallmentProjection::Converges { months_to_repay, .. } => Some(*months_to_repay),
            InstallmentProjection::NonConvergent { .. } => None,
        }
    }

    pub fn closure_date(&self) -> Option<NaiveDate> {
        match self {
            InstallmentProjection::Converges { closure_date, .. } => *closure_date,
            InstallmentProjection::NonConvergent { .. } => None,
        }
    }

    pub fn total_interest(&self) -> Option<Money> {
        match self {
            InstallmentProjection::Converges { total_interest, .. } => Some(*total_interest),
            InstallmentProjection::NonConvergent { .. } => None,
        }
    }

    pub fn schedule(&self) -> &[ScheduleEntry] {
        match self {
            InstallmentProjection::Converges { schedule, .. } => schedule,
            InstallmentProjection::NonConvergent { .. } => &[],
        }
    }
}

/// projects a fresh schedule when the fixed installment itself changes
pub struct NewInstallmentSimulator<'c> {
    config: &'c EngineConfig,
}

impl<'c> NewInstallmentSimulator<'c> {
    pub fn new(config: &'c EngineConfig) -> Self {
        Self { config }
    }

    /// first payment under the new installment falls on `effective_date`
    pub fn project(
        &self,
        balance: Money,
        annual_rate: Rate,
        new_installment: Money,
        effective_date: NaiveDate,
    ) -> InstallmentProjection {
        let epsilon = self.config.settle_epsilon;
        let monthly_rate = annual_rate.monthly_rate().as_decimal();

        if balance <= epsilon {
            return InstallmentProjection::Converges {
                schedule: Vec::new(),
                months_to_repay: 0,
                closure_date: None,
                total_interest: Money::ZERO,
            };
        }

        let first_month_interest = (balance * monthly_rate).round_currency();

        if annual_rate.is_negative() || !new_installment.is_positive() {
            return InstallmentProjection::NonConvergent {
                reason: NonConvergence::InvalidInputs,
                first_month_interest,
            };
        }

        if new_installment <= first_month_interest {
            warn!(
                balance = %balance,
                installment = %new_installment,
                first_month_interest = %first_month_interest,
                "installment never amortizes the balance"
            );
            return InstallmentProjection::NonConvergent {
                reason: NonConvergence::InstallmentBelowInterest,
                first_month_interest,
            };
        }

        let mut schedule = Vec::new();
        let mut remaining = balance;

        while remaining > epsilon {
            let month = schedule.len() as u32;
            if month >= self.config.simulation_month_cap {
                warn!(cap = self.config.simulation_month_cap, balance = %remaining, "installment projection hit month cap");
                return InstallmentProjection::NonConvergent {
                    reason: NonConvergence::IterationCap,
                    first_month_interest,
                };
            }

            // interest only shrinks with the balance, so the first-month check holds throughout
            let Some(split) = split_month(remaining, monthly_rate, new_installment, epsilon) else {
                return InstallmentProjection::NonConvergent {
                    reason: NonConvergence::InstallmentBelowInterest,
                    first_month_interest,
                };
            };

            schedule.push(ScheduleEntry {
                month: month + 1,
                payment_date: add_months(effective_date, month),
                beginning_balance: remaining,
                prepaid: Money::ZERO,
                payment: split.payment,
                principal: split.principal,
                interest: split.interest,
                remaining_balance: split.remaining,
                settled: false,
                settled_on: None,
            });
            remaining = split.remaining;
        }

        let total_interest = total_interest(&schedule);
        let months_to_repay = schedule.len() as u32;
        let closure_date = schedule.last().map(|e| e.payment_date);

        debug!(
            months_to_repay,
            total_interest = %total_interest,
            installment = %new_installment,
            "new installment projected"
        );

        InstallmentProjection::Converges {
            schedule,
            months_to_repay,
            closure_date,
            total_interest,
        }
    }
}
