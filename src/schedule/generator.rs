use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::config::{AlreadyPaidTreatment, EngineConfig, SettlementPolicy};
use crate::decimal::{Money, Rate};
use crate::types::{LoanTerms, Prepayment, PrepaymentId, ScheduleEntry};

use super::installment::{initially_settled_months, installment};
use super::{add_months, split_month, MonthSplit};

/// everything needed to build one loan's schedule
#[derive(Debug, Clone)]
pub struct ScheduleRequest {
    pub principal: Money,
    pub annual_rate: Rate,
    pub term_months: u32,
    pub start_date: NaiveDate,
    pub amount_already_paid: Money,
    pub initially_settled: u32,
    /// any order; sorted by date before use
    pub prepayments: Vec<Prepayment>,
    pub as_of: NaiveDate,
}

impl ScheduleRequest {
    /// request for a stored loan, deriving the settled month count from the already-paid amount
    pub fn for_loan(terms: &LoanTerms, prepayments: &[Prepayment], as_of: NaiveDate) -> Self {
        let emi = installment(terms.principal, terms.annual_rate, terms.term_months);
        Self {
            principal: terms.principal,
            annual_rate: terms.annual_rate,
            term_months: terms.term_months,
            start_date: terms.start_date,
            amount_already_paid: terms.already_paid(),
            initially_settled: initially_settled_months(terms.already_paid(), emi),
            prepayments: prepayments.to_vec(),
            as_of,
        }
    }

    /// same loan with its prepayment detail stripped, for approximate status
    pub fn without_prepayments(mut self) -> Self {
        self.prepayments.clear();
        self
    }
}

/// why generation stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// balance reached zero
    Repaid,
    /// nothing to amortize (invalid terms, or zero installment without clearing prepayments)
    Degenerate,
    /// installment no longer covers the month's interest
    NonConvergent,
    /// safety bound on generated months hit with balance outstanding
    SafetyBound,
}

/// record of one prepayment consumed by the cursor
#[derive(Debug, Clone, PartialEq)]
pub struct AppliedPrepayment {
    pub id: PrepaymentId,
    pub date: NaiveDate,
    pub requested: Money,
    pub applied: Money,
}

/// schedule plus the bookkeeping that produced it
#[derive(Debug, Clone)]
pub struct GeneratedSchedule {
    pub entries: Vec<ScheduleEntry>,
    pub installment: Money,
    pub opening_balance: Money,
    pub applied_prepayments: Vec<AppliedPrepayment>,
    pub stop_reason: StopReason,
}

/// result of draining one month's window of prepayments
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowOutcome {
    /// balance still outstanding after `prepaid` was netted
    Reduced { prepaid: Money, balance: Money },
    /// a prepayment dated `date` retired the remaining `closing_balance`
    Cleared {
        prepaid_before: Money,
        closing_balance: Money,
        date: NaiveDate,
    },
}

/// chronological merge cursor over date-sorted prepayments
///
/// Each prepayment is consumed at most once, in ascending date order, and is
/// capped to the balance it is applied against.
pub struct PrepaymentCursor<'a> {
    prepayments: &'a [Prepayment],
    next: usize,
    applied: Vec<AppliedPrepayment>,
}

impl<'a> PrepaymentCursor<'a> {
    /// `prepayments` must already be sorted by date
    pub fn new(prepayments: &'a [Prepayment]) -> Self {
        Self {
            prepayments,
            next: 0,
            applied: Vec::new(),
        }
    }

    /// apply every unconsumed prepayment dated on/before `through`
    pub fn apply_through(&mut self, through: NaiveDate, balance: Money, epsilon: Money) -> WindowOutcome {
        let mut balance = balance;
        let mut prepaid = Money::ZERO;

        while let Some(prepayment) = self.prepayments.get(self.next) {
            if prepayment.date > through {
                break;
            }
            self.next += 1;

            let applied = prepayment.amount.max(Money::ZERO).min(balance);
            self.applied.push(AppliedPrepayment {
                id: prepayment.id,
                date: prepayment.date,
                requested: prepayment.amount,
                applied,
            });

            if balance - applied <= epsilon {
                return WindowOutcome::Cleared {
                    prepaid_before: prepaid,
                    closing_balance: balance,
                    date: prepayment.date,
                };
            }

            balance -= applied;
            prepaid += applied;
        }

        WindowOutcome::Reduced { prepaid, balance }
    }

    /// number of prepayments not yet consumed
    pub fn remaining(&self) -> usize {
        self.prepayments.len() - self.next
    }

    pub fn applied(&self) -> &[AppliedPrepayment] {
        &self.applied
    }

    fn into_applied(self) -> Vec<AppliedPrepayment> {
        self.applied
    }
}

/// builds the authoritative amortization schedule of a loan
pub struct ScheduleGenerator<'c> {
    config: &'c EngineConfig,
}

impl<'c> ScheduleGenerator<'c> {
    pub fn new(config: &'c EngineConfig) -> Self {
        Self { config }
    }

    /// schedule entries only
    pub fn generate(&self, request: &ScheduleRequest) -> Vec<ScheduleEntry> {
        self.generate_detailed(request).entries
    }

    /// schedule together with installment, opening balance and applied prepayments
    pub fn generate_detailed(&self, request: &ScheduleRequest) -> GeneratedSchedule {
        let epsilon = self.config.settle_epsilon;
        let emi = installment(request.principal, request.annual_rate, request.term_months);

        let mut prepayments = request.prepayments.clone();
        prepayments.sort_by_key(|p| p.date);
        let mut cursor = PrepaymentCursor::new(&prepayments);

        if !request.principal.is_positive() || request.annual_rate.is_negative() {
            debug!(
                principal = %request.principal,
                rate = %request.annual_rate,
                "invalid loan terms, producing empty schedule"
            );
            return GeneratedSchedule {
                entries: Vec::new(),
                installment: emi,
                opening_balance: Money::ZERO,
                applied_prepayments: Vec::new(),
                stop_reason: StopReason::Degenerate,
            };
        }

        let opening_balance = match self.config.already_paid_treatment {
            AlreadyPaidTreatment::ReduceOpeningBalance => {
                (request.principal - request.amount_already_paid.max(Money::ZERO)).max(Money::ZERO)
            }
            AlreadyPaidTreatment::SettledMonthsOnly => request.principal,
        };

        let mut entries = Vec::new();
        let stop_reason;

        if request.term_months == 0 || opening_balance <= epsilon {
            // nothing left to amortize: retire the balance on the start date
            entries.push(closing_entry(1, request.start_date, opening_balance, Money::ZERO));
            stop_reason = StopReason::Repaid;
        } else if !emi.is_positive() {
            warn!(
                principal = %request.principal,
                rate = %request.annual_rate,
                term = request.term_months,
                "installment computed to zero for a positive principal"
            );
            match cursor.apply_through(NaiveDate::MAX, opening_balance, epsilon) {
                WindowOutcome::Cleared { prepaid_before, closing_balance, date } => {
                    entries.push(closing_entry(1, date, closing_balance, prepaid_before));
                    stop_reason = StopReason::Repaid;
                }
                WindowOutcome::Reduced { .. } => {
                    stop_reason = StopReason::Degenerate;
                }
            }
        } else {
            stop_reason = self.amortize(request, emi, opening_balance, &mut cursor, &mut entries);
        }

        self.mark_settled(&mut entries, request);

        debug!(
            entries = entries.len(),
            installment = %emi,
            prepayments_applied = cursor.applied().len(),
            prepayments_unused = cursor.remaining(),
            ?stop_reason,
            "schedule generated"
        );

        GeneratedSchedule {
            entries,
            installment: emi,
            opening_balance,
            applied_prepayments: cursor.into_applied(),
            stop_reason,
        }
    }

    /// month-by-month loop merging prepayment windows with installments
    fn amortize(
        &self,
        request: &ScheduleRequest,
        emi: Money,
        opening_balance: Money,
        cursor: &mut PrepaymentCursor<'_>,
        entries: &mut Vec<ScheduleEntry>,
    ) -> StopReason {
        let epsilon = self.config.settle_epsilon;
        let monthly_rate = request.annual_rate.monthly_rate().as_decimal();
        let bound = self
            .config
            .generation_bound(request.term_months, request.prepayments.len());

        let mut balance = opening_balance;
        let mut month = 0;

        while balance > epsilon {
            if month >= bound {
                warn!(bound, balance = %balance, "schedule safety bound reached");
                return StopReason::SafetyBound;
            }
            month += 1;
            let due = add_months(request.start_date, month);
            let before_window = balance;

            let prepaid = match cursor.apply_through(due, balance, epsilon) {
                WindowOutcome::Cleared { prepaid_before, closing_balance, date } => {
                    entries.push(if month == 1 {
                        closing_entry(month, date, closing_balance, prepaid_before)
                    } else {
                        prepaid_closing_entry(month, date, before_window)
                    });
                    return StopReason::Repaid;
                }
                WindowOutcome::Reduced { prepaid, balance: reduced } => {
                    balance = reduced;
                    prepaid
                }
            };

            let Some(mut split) = split_month(balance, monthly_rate, emi, epsilon) else {
                warn!(month, balance = %balance, installment = %emi, "installment no longer covers interest");
                return StopReason::NonConvergent;
            };

            // contractual final month absorbs the rounding residual
            if month == request.term_months && split.remaining.is_positive() {
                split.principal += split.remaining;
                split.payment += split.remaining;
                split.remaining = Money::ZERO;
            }

            entries.push(window_entry(month, due, before_window, prepaid, &split));

            balance = split.remaining;
        }

        StopReason::Repaid
    }

    /// renumber 1..N and apply the settlement rule against the as-of date
    fn mark_settled(&self, entries: &mut [ScheduleEntry], request: &ScheduleRequest) {
        for (index, entry) in entries.iter_mut().enumerate() {
            entry.month = index as u32 + 1;
            let by_count = entry.month <= request.initially_settled;
            let by_date = self.config.settlement_policy == SettlementPolicy::AssumeOnTime
                && entry.payment_date <= request.as_of;
            entry.settled = by_count || by_date;
            entry.settled_on = entry.settled.then_some(entry.payment_date);
        }
    }
}

/// first-month entry that retires `closing_balance` in full with no interest
///
/// `prepaid` was netted from the opening balance before the closing payment.
pub(crate) fn closing_entry(month: u32, date: NaiveDate, closing_balance: Money, prepaid: Money) -> ScheduleEntry {
    ScheduleEntry {
        month,
        payment_date: date,
        beginning_balance: closing_balance,
        prepaid,
        payment: closing_balance,
        principal: closing_balance,
        interest: Money::ZERO,
        remaining_balance: Money::ZERO,
        settled: false,
        settled_on: None,
    }
}

/// later-month entry whose window prepayments retire `before_window` in full
pub(crate) fn prepaid_closing_entry(month: u32, date: NaiveDate, before_window: Money) -> ScheduleEntry {
    ScheduleEntry {
        month,
        payment_date: date,
        beginning_balance: before_window,
        prepaid: before_window,
        payment: Money::ZERO,
        principal: before_window,
        interest: Money::ZERO,
        remaining_balance: Money::ZERO,
        settled: false,
        settled_on: None,
    }
}

/// regular entry for a month whose window netted `prepaid` off `before_window`
///
/// First-month prepayments come straight off the opening balance. From the
/// second month on they count towards the entry's principal component.
pub(crate) fn window_entry(
    month: u32,
    due: NaiveDate,
    before_window: Money,
    prepaid: Money,
    split: &MonthSplit,
) -> ScheduleEntry {
    let (beginning_balance, principal) = if month == 1 {
        (before_window - prepaid, split.principal)
    } else {
        (before_window, split.principal + prepaid)
    };

    ScheduleEntry {
        month,
        payment_date: due,
        beginning_balance,
        prepaid,
        payment: split.payment,
        principal,
        interest: split.interest,
        remaining_balance: split.remaining,
        settled: false,
        settled_on: None,
    }
}
