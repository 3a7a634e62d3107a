use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::decimal::Money;
use crate::errors::{LoanError, Result};
use crate::schedule::generator::{closing_entry, prepaid_closing_entry, window_entry};
use crate::schedule::{add_months, split_month, PrepaymentCursor, WindowOutcome};
use crate::types::{Prepayment, PrepaymentMode, ScheduleEntry};

use super::{renumber, SimulationBasis, SimulationSummary};

/// simulated schedule with its comparison against the original
#[derive(Debug, Clone, PartialEq)]
pub struct PrepaymentSimulation {
    pub schedule: Vec<ScheduleEntry>,
    pub summary: SimulationSummary,
    /// false when the month cap or an uncovered interest month cut the run short
    pub converged: bool,
}

/// projects the effect of one more hypothetical prepayment on a schedule
pub struct PrepaymentSimulator<'c> {
    config: &'c EngineConfig,
}

impl<'c> PrepaymentSimulator<'c> {
    pub fn new(config: &'c EngineConfig) -> Self {
        Self { config }
    }

    /// apply `amount` after entry `after_month` (0 = before the first entry)
    ///
    /// Entries up to the point are kept as-is. The balance from there on is
    /// re-amortized with the basis installment and rate, replaying the basis'
    /// recorded prepayments that fall after the point.
    pub fn simulate(
        &self,
        schedule: &[ScheduleEntry],
        basis: &SimulationBasis,
        amount: Money,
        after_month: u32,
        mode: PrepaymentMode,
    ) -> Result<PrepaymentSimulation> {
        let point = after_month as usize;
        if point > schedule.len() {
            return Err(LoanError::InvalidSimulationPoint {
                after_month,
                schedule_len: schedule.len(),
            });
        }
        if amount.is_negative() {
            return Err(LoanError::InvalidAmount {
                record: "simulated prepayment".to_string(),
                amount,
            });
        }
        if let PrepaymentMode::Recurring { every_months: 0 } = mode {
            return Err(LoanError::InvalidConfiguration {
                message: "recurring prepayment interval must be at least one month".to_string(),
            });
        }

        // a loan retired inside its first window has no months left to shorten
        let retired_up_front = point == 0 && schedule.len() == 1 && schedule[0].interest.is_zero();
        if amount.is_zero() || retired_up_front {
            return Ok(PrepaymentSimulation {
                schedule: schedule.to_vec(),
                summary: SimulationSummary::compare(schedule, schedule),
                converged: true,
            });
        }

        let epsilon = self.config.settle_epsilon;
        let (balance, carried_prepaid, point_date) = match point {
            0 => match schedule.first() {
                Some(first) => (first.beginning_balance, first.prepaid, basis.start_date),
                None => (Money::ZERO, Money::ZERO, basis.start_date),
            },
            _ => {
                let last = &schedule[point - 1];
                (last.remaining_balance, Money::ZERO, last.payment_date)
            }
        };

        let mut simulated = schedule[..point].to_vec();
        let mut converged = true;

        if balance <= epsilon {
            // already closed at the point, nothing to prepay
        } else if amount >= balance - epsilon {
            simulated.push(if point == 0 {
                closing_entry(0, point_date, balance, carried_prepaid)
            } else {
                prepaid_closing_entry(0, point_date, balance)
            });
        } else {
            converged = self.regenerate(&mut simulated, basis, balance, carried_prepaid, after_month, amount, mode);
        }

        renumber(&mut simulated);
        let summary = SimulationSummary::compare(schedule, &simulated);

        debug!(
            after_month,
            amount = %amount,
            ?mode,
            original_months = schedule.len(),
            simulated_months = simulated.len(),
            interest_saved = %summary.interest_saved,
            "prepayment simulated"
        );

        Ok(PrepaymentSimulation {
            schedule: simulated,
            summary,
            converged,
        })
    }

    /// amortize forward from the point, merging the hypothetical amount with
    /// recorded prepayments window by window
    #[allow(clippy::too_many_arguments)]
    fn regenerate(
        &self,
        simulated: &mut Vec<ScheduleEntry>,
        basis: &SimulationBasis,
        opening: Money,
        carried_prepaid: Money,
        after_month: u32,
        amount: Money,
        mode: PrepaymentMode,
    ) -> bool {
        let epsilon = self.config.settle_epsilon;
        let monthly_rate = basis.annual_rate.monthly_rate().as_decimal();

        // prepayments up to the first due date (or the point) are already in the prefix
        let cutoff = add_months(basis.start_date, after_month.max(1));
        let replayed: Vec<Prepayment> = basis
            .recorded_prepayments
            .iter()
            .filter(|p| p.date > cutoff)
            .cloned()
            .collect();
        let mut cursor = PrepaymentCursor::new(&replayed);

        let mut balance = opening;
        let mut month = 0;

        while balance > epsilon {
            if month >= self.config.simulation_month_cap {
                warn!(cap = self.config.simulation_month_cap, balance = %balance, "prepayment simulation hit month cap");
                return false;
            }
            month += 1;
            // due dates stay on the loan's calendar: start + (point + k) months
            let loan_month = after_month + month;
            let due = add_months(basis.start_date, loan_month);
            let window_start = add_months(basis.start_date, loan_month - 1);
            let before_window = balance;
            // on the loan's first month prepayments are netted from the opening balance
            let (mut prepaid, entry_month) = if loan_month == 1 {
                (carried_prepaid, 1)
            } else {
                (Money::ZERO, loan_month)
            };

            if month == 1 || is_recurrence(mode, month) {
                let applied = amount.min(balance);
                if balance - applied <= epsilon {
                    simulated.push(closing_for(entry_month, window_start, before_window, balance, prepaid));
                    return true;
                }
                balance -= applied;
                prepaid += applied;
            }

            match cursor.apply_through(due, balance, epsilon) {
                WindowOutcome::Cleared { prepaid_before, closing_balance, date } => {
                    simulated.push(closing_for(entry_month, date, before_window, closing_balance, prepaid + prepaid_before));
                    return true;
                }
                WindowOutcome::Reduced { prepaid: recorded, balance: reduced } => {
                    balance = reduced;
                    prepaid += recorded;
                }
            }

            let Some(split) = split_month(balance, monthly_rate, basis.installment, epsilon) else {
                warn!(month, balance = %balance, installment = %basis.installment, "simulated installment no longer covers interest");
                return false;
            };

            let window_before = if entry_month == 1 { balance + prepaid } else { before_window };
            simulated.push(window_entry(entry_month, due, window_before, prepaid, &split));
            balance = split.remaining;
        }

        true
    }
}

/// closing entry for a window whose prepayments retire the balance
fn closing_for(
    loan_month: u32,
    date: NaiveDate,
    before_window: Money,
    closing_balance: Money,
    prepaid_before: Money,
) -> ScheduleEntry {
    if loan_month == 1 {
        closing_entry(0, date, closing_balance, prepaid_before)
    } else {
        prepaid_closing_entry(0, date, before_window)
    }
}

/// recurring prepayments land before suffix months 1, 1 + n, 1 + 2n, ...
fn is_recurrence(mode: PrepaymentMode, month: u32) -> bool {
    match mode {
        PrepaymentMode::OneTime => false,
        PrepaymentMode::Recurring { every_months } => (month - 1) % every_months == 0,
    }
}
