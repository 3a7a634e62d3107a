//! what-if - extra prepayments and a changed installment against the current schedule
use chrono::NaiveDate;
use loan_schedule_rs::{EngineConfig, InstallmentProjection, Loan, Money, PrepaymentMode, Rate};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let today = NaiveDate::from_ymd_opt(2025, 3, 10).ok_or("bad date")?;
    let config = EngineConfig::default();

    let loan = Loan::builder()
        .name("home")
        .principal(Money::from_major(200_000))
        .rate(Rate::from_percentage(9))
        .term_months(240)
        .start_date(NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("bad date")?)
        .build_strict()?;

    let settled = loan.status(today, &config).settled_count;

    println!("=== one extra 10,000 now vs every year ===\n");
    for mode in [PrepaymentMode::OneTime, PrepaymentMode::Recurring { every_months: 12 }] {
        let result = loan.simulate_prepayment(today, &config, Money::from_major(10_000), settled, mode)?;
        println!(
            "{mode:?}: closes {:?} instead of {:?}, {} months sooner, {} interest saved",
            result.summary.new_closure_date,
            result.summary.original_closure_date,
            result.summary.months_saved,
            result.summary.interest_saved,
        );
    }

    println!("\n=== changing the installment ===\n");
    for installment in [1_500, 2_500, 1_000] {
        let summary = loan.simulate_new_installment(today, &config, Money::from_major(installment), None);
        match &summary.projection {
            InstallmentProjection::Converges { months_to_repay, closure_date, total_interest, .. } => println!(
                "{installment}/month: {months_to_repay} months, closes {closure_date:?}, interest {total_interest}"
            ),
            InstallmentProjection::NonConvergent { reason, first_month_interest } => println!(
                "{installment}/month never repays ({reason:?}, first month interest {first_month_interest})"
            ),
        }
    }

    Ok(())
}
