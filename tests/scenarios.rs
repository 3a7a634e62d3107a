//! End-to-end loan scenarios
//!
//! These tests drive the public `Loan` facade the way a dashboard would:
//! build a loan, ask for its schedule and status, and run what-if projections.

use chrono::NaiveDate;
use loan_schedule_rs::{
    EngineConfig, InstallmentProjection, Loan, LoanError, Money, NonConvergence,
    NewInstallmentSimulator, Prepayment, PrepaymentMode, Rate, StatusMode,
};
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn loan(principal: i64, rate_pct: u32, term: u32) -> Loan {
    Loan::builder()
        .name("personal")
        .principal(Money::from_major(principal))
        .rate(Rate::from_percentage(rate_pct))
        .term_months(term)
        .start_date(date(2024, 1, 1))
        .build_strict()
        .expect("valid loan terms")
}

mod reference_loans {
    use super::*;

    /// 100k at 12% over a year: installment and the first month's split
    #[test]
    fn test_twelve_month_loan_first_entry() {
        let loan = loan(100_000, 12, 12);
        let schedule = loan.schedule(date(2024, 1, 1), &EngineConfig::default());

        assert_eq!(loan.installment(), Money::from_decimal(dec!(8884.88)));
        assert_eq!(schedule.len(), 12);

        let first = &schedule[0];
        assert_eq!(first.payment_date, date(2024, 2, 1));
        assert_eq!(first.interest, Money::from_major(1_000));
        assert_eq!(first.principal, Money::from_decimal(dec!(7884.88)));
        assert_eq!(first.remaining_balance, Money::from_decimal(dec!(92115.12)));
        assert_eq!(schedule.last().unwrap().remaining_balance, Money::ZERO);
    }

    /// a prepayment larger than the principal on day one closes the loan immediately
    #[test]
    fn test_oversized_prepayment_on_start_date() {
        let mut loan = loan(10_000, 10, 12);
        loan.add_prepayment(Prepayment::new(Money::from_major(15_000), date(2024, 1, 1)))
            .unwrap();

        let schedule = loan.schedule(date(2024, 1, 1), &EngineConfig::default());

        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].principal, Money::from_major(10_000));
        assert_eq!(schedule[0].remaining_balance, Money::ZERO);
        assert_eq!(schedule[0].interest, Money::ZERO);
        assert!(schedule[0].settled);
    }

    /// an installment equal to the first month's interest never repays the balance
    #[test]
    fn test_interest_only_installment_is_reported_unbounded() {
        let config = EngineConfig::default();
        let projection = NewInstallmentSimulator::new(&config).project(
            Money::from_major(50_000),
            Rate::from_percentage(10),
            Money::from_decimal(dec!(416.67)),
            date(2024, 1, 1),
        );

        assert!(matches!(
            projection,
            InstallmentProjection::NonConvergent {
                reason: NonConvergence::InstallmentBelowInterest,
                ..
            }
        ));
        assert_eq!(projection.closure_date(), None);
        assert_eq!(projection.months_to_repay(), None);
    }

    /// a zero-term loan is retired in one entry on its start date
    #[test]
    fn test_zero_term_loan() {
        let loan = Loan::builder()
            .principal(Money::from_major(5_000))
            .rate(Rate::from_percentage(8))
            .term_months(0)
            .start_date(date(2024, 1, 1))
            .build()
            .unwrap();

        let schedule = loan.schedule(date(2024, 1, 1), &EngineConfig::default());

        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].payment_date, date(2024, 1, 1));
        assert_eq!(schedule[0].principal, Money::from_major(5_000));
        assert_eq!(schedule[0].remaining_balance, Money::ZERO);
    }
}

mod schedule_properties {
    use super::*;

    fn loan_with_prepayments() -> Loan {
        Loan::builder()
            .principal(Money::from_major(250_000))
            .rate(Rate::from_annual_percent(dec!(8.75)))
            .term_months(120)
            .start_date(date(2024, 1, 31))
            .prepayment(Prepayment::new(Money::from_major(20_000), date(2025, 6, 10)))
            .prepayment(Prepayment::new(Money::from_major(5_000), date(2024, 3, 3)))
            .prepayment(Prepayment::new(Money::from_major(15_000), date(2027, 12, 24)))
            .build_strict()
            .unwrap()
    }

    /// principal components and the final balance add back to the loan amount
    /// when no prepayment falls before the first due date
    #[test]
    fn test_conservation_and_monotonic_balance() {
        let loan = loan_with_prepayments();
        let schedule = loan.schedule(date(2026, 1, 1), &EngineConfig::default());

        let principal: Money = schedule.iter().map(|e| e.principal).sum();
        let prepaid: Money = schedule.iter().map(|e| e.prepaid).sum();
        let last = schedule.last().unwrap();
        assert_eq!(principal + last.remaining_balance, Money::from_major(250_000));
        assert_eq!(prepaid, Money::from_major(40_000));
        assert_eq!(last.remaining_balance, Money::ZERO);

        for pair in schedule.windows(2) {
            assert!(pair[1].remaining_balance <= pair[0].remaining_balance);
            assert_eq!(pair[0].remaining_balance, pair[1].beginning_balance);
        }
        assert!(schedule.len() < 120);
    }

    /// entries are settled exactly when their due date has passed
    #[test]
    fn test_settled_prefix_follows_as_of() {
        let loan = loan_with_prepayments();
        let as_of = date(2025, 2, 28);
        let schedule = loan.schedule(as_of, &EngineConfig::default());

        for entry in &schedule {
            assert_eq!(entry.settled, entry.payment_date <= as_of);
            assert_eq!(entry.settled_on, entry.settled.then_some(entry.payment_date));
        }
        // month-end start dates clamp to shorter months
        assert_eq!(schedule[0].payment_date, date(2024, 2, 29));
        assert_eq!(schedule[1].payment_date, date(2024, 3, 31));
    }

    /// prepayments reduce total interest against the same loan without them
    #[test]
    fn test_prepayments_save_interest() {
        let with = loan_with_prepayments();
        let without = Loan::builder()
            .principal(Money::from_major(250_000))
            .rate(Rate::from_annual_percent(dec!(8.75)))
            .term_months(120)
            .start_date(date(2024, 1, 31))
            .build_strict()
            .unwrap();

        let config = EngineConfig::default();
        let with_interest = loan_schedule_rs::total_interest(&with.schedule(date(2024, 1, 31), &config));
        let without_interest = loan_schedule_rs::total_interest(&without.schedule(date(2024, 1, 31), &config));
        assert!(with_interest < without_interest);
    }

    /// the already-paid amount marks whole installments settled even before their dates
    #[test]
    fn test_amount_already_paid() {
        let loan = Loan::builder()
            .principal(Money::from_major(100_000))
            .rate(Rate::from_percentage(12))
            .term_months(12)
            .start_date(date(2024, 1, 1))
            .amount_already_paid(Money::from_major(20_000))
            .build_strict()
            .unwrap();

        assert_eq!(loan.initially_settled_months(), 2);

        let config = EngineConfig::recorded_payments_only();
        let schedule = loan.schedule(date(2024, 1, 1), &config);
        assert!(schedule[0].settled && schedule[1].settled);
        assert!(!schedule[2].settled);
        assert_eq!(schedule[0].beginning_balance, Money::from_major(80_000));
    }
}

mod status {
    use super::*;

    /// itemized and approximate status carry distinct mode tags and agree without prepayments
    #[test]
    fn test_status_modes() {
        let loan = loan(60_000, 6, 36);
        let config = EngineConfig::default();
        let itemized = loan.status(date(2025, 1, 15), &config);
        let approximate = loan.approximate_status(date(2025, 1, 15), &config);

        assert_eq!(itemized.mode, StatusMode::Itemized);
        assert_eq!(approximate.mode, StatusMode::Approximate);
        assert_eq!(itemized.current_balance, approximate.current_balance);
        assert_eq!(itemized.settled_count, 12);
        assert_eq!(itemized.next_due_date, Some(date(2025, 2, 1)));
        assert!(itemized.completion_percent > dec!(0) && itemized.completion_percent < dec!(100));
    }

    /// after the final due date the loan is closed and fully complete
    #[test]
    fn test_closed_loan_status() {
        let loan = loan(60_000, 6, 36);
        let status = loan.status(date(2030, 1, 1), &EngineConfig::default());

        assert!(status.is_closed());
        assert_eq!(status.completion_percent, dec!(100));
        assert_eq!(status.next_due_date, None);
        assert_eq!(status.closure_date, Some(date(2027, 1, 1)));
    }
}

mod what_if {
    use super::*;

    /// a recurring yearly prepayment shortens the loan more than a single one
    #[test]
    fn test_recurring_prepayment_simulation() {
        let loan = loan(200_000, 9, 240);
        let config = EngineConfig::default();
        let as_of = date(2025, 1, 10);

        let once = loan
            .simulate_prepayment(as_of, &config, Money::from_major(10_000), 12, PrepaymentMode::OneTime)
            .unwrap();
        let yearly = loan
            .simulate_prepayment(
                as_of,
                &config,
                Money::from_major(10_000),
                12,
                PrepaymentMode::Recurring { every_months: 12 },
            )
            .unwrap();

        assert!(once.converged && yearly.converged);
        assert!(once.summary.months_saved > 0);
        assert!(yearly.summary.months_saved > once.summary.months_saved);
        assert!(yearly.summary.interest_saved > once.summary.interest_saved);
        assert_eq!(yearly.schedule.last().unwrap().remaining_balance, Money::ZERO);
    }

    /// a simulation point past the schedule is rejected
    #[test]
    fn test_simulation_point_out_of_range() {
        let loan = loan(10_000, 5, 12);
        let result = loan.simulate_prepayment(
            date(2024, 1, 1),
            &EngineConfig::default(),
            Money::from_major(100),
            13,
            PrepaymentMode::OneTime,
        );
        assert!(matches!(result, Err(LoanError::InvalidSimulationPoint { .. })));
    }

    /// a lower installment lengthens the loan and costs interest
    #[test]
    fn test_lower_installment_costs_more() {
        let loan = loan(50_000, 10, 60);
        let summary = loan.simulate_new_installment(
            date(2024, 1, 1),
            &EngineConfig::default(),
            Money::from_major(700),
            None,
        );

        assert_eq!(summary.current_balance, Money::from_major(50_000));
        assert_eq!(summary.original_remaining_months, 60);
        assert!(summary.projection.is_convergent());
        assert!(summary.months_saved().unwrap() < 0);
        assert!(summary.interest_saved().unwrap().is_negative());
    }
}
