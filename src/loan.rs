use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::report::LoanReport;
use crate::schedule::{
    initially_settled_months, installment, total_interest, GeneratedSchedule, ScheduleGenerator,
    ScheduleRequest,
};
use crate::simulation::{
    InstallmentChangeSummary, NewInstallmentSimulator, PrepaymentSimulation, PrepaymentSimulator,
    SimulationBasis,
};
use crate::status::{ApproximateStatus, ItemizedStatus, StatusEvaluator};
use crate::types::{LoanId, LoanStatus, LoanTerms, Prepayment, PrepaymentId, PrepaymentMode, ScheduleEntry};

/// a personal loan with its recorded prepayments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub name: String,
    pub terms: LoanTerms,
    /// kept in date order
    prepayments: Vec<Prepayment>,
}

impl Loan {
    pub fn builder() -> LoanBuilder {
        LoanBuilder::new()
    }

    pub fn from_parts(id: LoanId, name: String, terms: LoanTerms, mut prepayments: Vec<Prepayment>) -> Self {
        prepayments.sort_by_key(|p| p.date);
        Self {
            id,
            name,
            terms,
            prepayments,
        }
    }

    pub fn prepayments(&self) -> &[Prepayment] {
        &self.prepayments
    }

    /// fixed monthly installment for the loan's terms
    pub fn installment(&self) -> Money {
        installment(self.terms.principal, self.terms.annual_rate, self.terms.term_months)
    }

    /// whole installments covered by the amount already paid
    pub fn initially_settled_months(&self) -> u32 {
        initially_settled_months(self.terms.already_paid(), self.installment())
    }

    /// record a prepayment, returns its id
    pub fn add_prepayment(&mut self, prepayment: Prepayment) -> Result<PrepaymentId> {
        if !prepayment.amount.is_positive() {
            return Err(LoanError::InvalidAmount {
                record: prepayment.id.to_string(),
                amount: prepayment.amount,
            });
        }

        let id = prepayment.id;
        if let Some(cached) = self.terms.cached_prepayment_total.as_mut() {
            *cached += prepayment.amount;
        }
        // after any same-day prepayments already recorded
        let index = self.prepayments.partition_point(|p| p.date <= prepayment.date);
        self.prepayments.insert(index, prepayment);

        debug!(loan_id = %self.id, prepayment_id = %id, count = self.prepayments.len(), "prepayment recorded");
        Ok(id)
    }

    /// total of recorded prepayments, as the persistence layer would cache it
    pub fn cached_prepayment_total(&self) -> Money {
        match self.terms.cached_prepayment_total {
            Some(total) => total.max(Money::ZERO),
            None => self.prepayments.iter().map(|p| p.amount).sum(),
        }
    }

    fn request(&self, as_of: NaiveDate) -> ScheduleRequest {
        ScheduleRequest::for_loan(&self.terms, &self.prepayments, as_of)
    }

    /// itemized schedule with every recorded prepayment
    pub fn schedule(&self, as_of: NaiveDate, config: &EngineConfig) -> Vec<ScheduleEntry> {
        ScheduleGenerator::new(config).generate(&self.request(as_of))
    }

    /// schedule along with the generator's bookkeeping
    pub fn generate(&self, as_of: NaiveDate, config: &EngineConfig) -> GeneratedSchedule {
        ScheduleGenerator::new(config).generate_detailed(&self.request(as_of))
    }

    /// schedule as of the provider's current date
    pub fn schedule_at(&self, time: &SafeTimeProvider, config: &EngineConfig) -> Vec<ScheduleEntry> {
        self.schedule(time.now().date_naive(), config)
    }

    /// status from the itemized schedule
    pub fn status(&self, as_of: NaiveDate, config: &EngineConfig) -> LoanStatus {
        let generated = self.generate(as_of, config);
        self.itemized_status(&generated, as_of)
    }

    fn itemized_status(&self, generated: &GeneratedSchedule, as_of: NaiveDate) -> LoanStatus {
        ItemizedStatus::as_of(&generated.entries, &generated.applied_prepayments, as_of)
            .evaluate(&generated.entries, self.terms.principal)
    }

    pub fn status_at(&self, time: &SafeTimeProvider, config: &EngineConfig) -> LoanStatus {
        self.status(time.now().date_naive(), config)
    }

    /// status from a prepayment-free schedule and the cached prepayment total
    pub fn approximate_status(&self, as_of: NaiveDate, config: &EngineConfig) -> LoanStatus {
        let plain = ScheduleGenerator::new(config).generate(&self.request(as_of).without_prepayments());
        ApproximateStatus::new(self.cached_prepayment_total()).evaluate(&plain, self.terms.principal)
    }

    /// what-if for one more prepayment after entry `after_month` of the current schedule
    pub fn simulate_prepayment(
        &self,
        as_of: NaiveDate,
        config: &EngineConfig,
        amount: Money,
        after_month: u32,
        mode: PrepaymentMode,
    ) -> Result<PrepaymentSimulation> {
        let schedule = self.schedule(as_of, config);
        PrepaymentSimulator::new(config).simulate(
            &schedule,
            &SimulationBasis::for_loan(&self.terms).with_prepayments(&self.prepayments),
            amount,
            after_month,
            mode,
        )
    }

    /// what-if for switching the outstanding balance to `new_installment`
    ///
    /// The first new payment falls on `effective_date`, or the next due date
    /// when none is given.
    pub fn simulate_new_installment(
        &self,
        as_of: NaiveDate,
        config: &EngineConfig,
        new_installment: Money,
        effective_date: Option<NaiveDate>,
    ) -> InstallmentChangeSummary {
        let generated = self.generate(as_of, config);
        let status = self.itemized_status(&generated, as_of);
        let remaining: Vec<ScheduleEntry> = generated.entries.into_iter().filter(|e| !e.settled).collect();

        let effective_date = effective_date
            .or(status.next_due_date)
            .unwrap_or(as_of);

        let projection = NewInstallmentSimulator::new(config).project(
            status.current_balance,
            self.terms.annual_rate,
            new_installment,
            effective_date,
        );

        InstallmentChangeSummary {
            current_balance: status.current_balance,
            original_installment: self.installment(),
            new_installment,
            original_closure_date: status.closure_date,
            original_remaining_interest: total_interest(&remaining),
            original_remaining_months: remaining.len() as u32,
            projection,
        }
    }

    /// serializable report of the loan as of a date
    pub fn report(&self, as_of: NaiveDate, config: &EngineConfig) -> LoanReport {
        LoanReport::for_loan(self, as_of, config)
    }

    /// report rendered to json
    pub fn json(&self, as_of: NaiveDate, config: &EngineConfig) -> Result<String> {
        self.report(as_of, config).to_json()
    }
}

/// builder for loans
pub struct LoanBuilder {
    id: Option<LoanId>,
    name: Option<String>,
    principal: Option<Money>,
    rate: Option<Rate>,
    term_months: Option<u32>,
    start_date: Option<NaiveDate>,
    amount_already_paid: Option<Money>,
    cached_prepayment_total: Option<Money>,
    prepayments: Vec<Prepayment>,
}

impl LoanBuilder {
    pub fn new() -> Self {
        Self {
            id: None,
            name: None,
            principal: None,
            rate: None,
            term_months: None,
            start_date: None,
            amount_already_paid: None,
            cached_prepayment_total: None,
            prepayments: Vec::new(),
        }
    }

    pub fn id(mut self, id: LoanId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn principal(mut self, principal: Money) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn rate(mut self, rate: Rate) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn term_months(mut self, months: u32) -> Self {
        self.term_months = Some(months);
        self
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn amount_already_paid(mut self, amount: Money) -> Self {
        self.amount_already_paid = Some(amount);
        self
    }

    pub fn cached_prepayment_total(mut self, total: Money) -> Self {
        self.cached_prepayment_total = Some(total);
        self
    }

    pub fn prepayment(mut self, prepayment: Prepayment) -> Self {
        self.prepayments.push(prepayment);
        self
    }

    pub fn prepayments(mut self, prepayments: impl IntoIterator<Item = Prepayment>) -> Self {
        self.prepayments.extend(prepayments);
        self
    }

    /// build a possibly partially-entered loan; missing amounts default to zero
    pub fn build(self) -> Result<Loan> {
        let start_date = self.start_date.ok_or(LoanError::InvalidTerms {
            message: "start date is required".to_string(),
        })?;

        let terms = LoanTerms {
            principal: self.principal.unwrap_or(Money::ZERO),
            annual_rate: self.rate.unwrap_or(Rate::ZERO),
            term_months: self.term_months.unwrap_or(0),
            start_date,
            amount_already_paid: self.amount_already_paid,
            cached_prepayment_total: self.cached_prepayment_total,
        };

        Ok(Loan::from_parts(
            self.id.unwrap_or_else(Uuid::new_v4),
            self.name.unwrap_or_default(),
            terms,
            self.prepayments,
        ))
    }

    /// build, rejecting terms the engine would only degrade on
    pub fn build_strict(self) -> Result<Loan> {
        let loan = self.build()?;
        let terms = &loan.terms;

        if !terms.principal.is_positive() {
            return Err(LoanError::InvalidTerms {
                message: format!("principal must be positive, got {}", terms.principal),
            });
        }
        if terms.annual_rate.is_negative() {
            return Err(LoanError::InvalidInterestRate {
                rate: terms.annual_rate,
            });
        }
        if terms.term_months == 0 {
            return Err(LoanError::InvalidTerms {
                message: "term must be at least one month".to_string(),
            });
        }
        if let Some(bad) = loan.prepayments.iter().find(|p| !p.amount.is_positive()) {
            return Err(LoanError::InvalidAmount {
                record: bad.id.to_string(),
                amount: bad.amount,
            });
        }

        Ok(loan)
    }
}

impl Default for LoanBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn car_loan() -> Loan {
        Loan::builder()
            .name("car")
            .principal(Money::from_major(100_000))
            .rate(Rate::from_percentage(12))
            .term_months(12)
            .start_date(date(2024, 1, 1))
            .build_strict()
            .unwrap()
    }

    #[test]
    fn test_builder_and_installment() {
        let loan = car_loan();
        assert_eq!(loan.name, "car");
        assert_eq!(loan.installment(), Money::from_decimal(dec!(8884.88)));
        assert_eq!(loan.initially_settled_months(), 0);
        assert!(loan.prepayments().is_empty());
    }

    #[test]
    fn test_build_accepts_partial_loan() {
        let loan = Loan::builder().start_date(date(2024, 1, 1)).build().unwrap();
        assert_eq!(loan.installment(), Money::ZERO);
        assert!(loan.schedule(date(2024, 6, 1), &EngineConfig::default()).is_empty());
        assert_eq!(loan.status(date(2024, 6, 1), &EngineConfig::default()).completion_percent, dec!(100));
    }

    #[test]
    fn test_build_strict_rejects_bad_terms() {
        let missing_date = Loan::builder().principal(Money::from_major(1_000)).build();
        assert!(matches!(missing_date, Err(LoanError::InvalidTerms { .. })));

        let zero_principal = Loan::builder()
            .rate(Rate::from_percentage(5))
            .term_months(12)
            .start_date(date(2024, 1, 1))
            .build_strict();
        assert!(matches!(zero_principal, Err(LoanError::InvalidTerms { .. })));

        let negative_rate = Loan::builder()
            .principal(Money::from_major(1_000))
            .rate(Rate::from_decimal(dec!(-0.01)))
            .term_months(12)
            .start_date(date(2024, 1, 1))
            .build_strict();
        assert!(matches!(negative_rate, Err(LoanError::InvalidInterestRate { .. })));
    }

    #[test]
    fn test_add_prepayment_keeps_order_and_cached_total() {
        let mut loan = Loan::builder()
            .principal(Money::from_major(100_000))
            .rate(Rate::from_percentage(12))
            .term_months(12)
            .start_date(date(2024, 1, 1))
            .cached_prepayment_total(Money::ZERO)
            .build()
            .unwrap();

        loan.add_prepayment(Prepayment::new(Money::from_major(2_000), date(2024, 6, 1))).unwrap();
        loan.add_prepayment(Prepayment::new(Money::from_major(1_000), date(2024, 3, 1))).unwrap();

        assert_eq!(loan.prepayments()[0].date, date(2024, 3, 1));
        assert_eq!(loan.cached_prepayment_total(), Money::from_major(3_000));

        let rejected = loan.add_prepayment(Prepayment::new(Money::ZERO, date(2024, 7, 1)));
        assert!(matches!(rejected, Err(LoanError::InvalidAmount { .. })));
        assert_eq!(loan.prepayments().len(), 2);
    }

    #[test]
    fn test_status_itemized_and_approximate() {
        let mut loan = car_loan();
        loan.add_prepayment(Prepayment::new(Money::from_major(10_000), date(2024, 1, 15))).unwrap();
        let config = EngineConfig::default();

        let itemized = loan.status(date(2024, 2, 10), &config);
        let approximate = loan.approximate_status(date(2024, 2, 10), &config);

        assert_eq!(itemized.mode, crate::types::StatusMode::Itemized);
        assert_eq!(approximate.mode, crate::types::StatusMode::Approximate);
        // the itemized run also saves a month of interest on the prepaid 10k
        assert!(itemized.current_balance < approximate.current_balance);
        assert_eq!(approximate.current_balance, Money::from_decimal(dec!(82115.12)));
    }

    #[test]
    fn test_schedule_at_uses_time_provider() {
        let loan = car_loan();
        let time = SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 3, 15, 0, 0, 0).unwrap()
        ));
        let config = EngineConfig::default();

        let schedule = loan.schedule_at(&time, &config);
        assert_eq!(schedule.iter().filter(|e| e.settled).count(), 2);

        time.test_control().unwrap().advance(Duration::days(31));
        assert_eq!(loan.status_at(&time, &config).settled_count, 3);
    }

    #[test]
    fn test_simulate_prepayment_through_loan() {
        let loan = car_loan();
        let result = loan
            .simulate_prepayment(date(2024, 4, 2), &EngineConfig::default(), Money::from_major(20_000), 3, PrepaymentMode::OneTime)
            .unwrap();

        assert!(result.summary.interest_saved.is_positive());
        assert!(result.schedule.len() < 12);
    }

    #[test]
    fn test_simulate_new_installment_through_loan() {
        let loan = car_loan();
        let summary = loan.simulate_new_installment(
            date(2024, 4, 2),
            &EngineConfig::default(),
            Money::from_major(12_000),
            None,
        );

        assert_eq!(summary.original_remaining_months, 9);
        assert_eq!(summary.original_installment, Money::from_decimal(dec!(8884.88)));
        assert_eq!(summary.projection.schedule()[0].payment_date, date(2024, 5, 1));
        assert!(summary.months_saved().unwrap() > 0);
        assert!(summary.interest_saved().unwrap().is_positive());
    }

    #[test]
    fn test_status_before_first_due_date() {
        let loan = Loan::builder()
            .principal(Money::from_major(100_000))
            .rate(Rate::from_percentage(12))
            .term_months(12)
            .start_date(date(2024, 1, 1))
            .amount_already_paid(Money::from_major(5_000))
            .build_strict()
            .unwrap();
        let config = EngineConfig::default();

        let status = loan.status(date(2024, 1, 20), &config);
        assert_eq!(status.settled_count, 0);
        assert_eq!(status.current_balance, Money::from_major(95_000));
        assert_eq!(status.principal_paid, Money::from_major(5_000));

        let summary = loan.simulate_new_installment(date(2024, 1, 20), &config, Money::from_major(10_000), None);
        assert_eq!(summary.current_balance, Money::from_major(95_000));
        assert_eq!(summary.projection.schedule()[0].beginning_balance, Money::from_major(95_000));
        assert_eq!(summary.projection.schedule()[0].payment_date, date(2024, 2, 1));
    }

    #[test]
    fn test_status_counts_prepayments_made_since_last_due_date() {
        let mut loan = car_loan();
        loan.add_prepayment(Prepayment::new(Money::from_major(10_000), date(2024, 1, 15))).unwrap();
        loan.add_prepayment(Prepayment::new(Money::from_major(4_000), date(2024, 2, 20))).unwrap();
        let config = EngineConfig::default();

        // before the first due date only the january prepayment has been made
        let january = loan.status(date(2024, 1, 20), &config);
        assert_eq!(january.current_balance, Money::from_major(90_000));

        let schedule = loan.schedule(date(2024, 2, 25), &config);
        let february = loan.status(date(2024, 2, 25), &config);
        assert_eq!(february.settled_count, 1);
        assert_eq!(february.current_balance, schedule[0].remaining_balance - Money::from_major(4_000));
    }

    #[test]
    fn test_json_report() {
        let loan = car_loan();
        let json = loan.json(date(2024, 2, 10), &EngineConfig::default()).unwrap();
        assert!(json.contains("\"name\":\"car\""));
        assert!(json.contains("\"installment\":\"8884.88\""));
    }
}
