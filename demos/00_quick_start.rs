//! quick start - minimal example to get started
use chrono::NaiveDate;
use loan_schedule_rs::{EngineConfig, Loan, Money, Rate};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("bad date")?;
    let today = NaiveDate::from_ymd_opt(2024, 6, 15).ok_or("bad date")?;

    // a 100,000 loan at 12% over one year
    let loan = Loan::builder()
        .name("car")
        .principal(Money::from_major(100_000))
        .rate(Rate::from_percentage(12))
        .term_months(12)
        .start_date(start)
        .build_strict()?;

    let config = EngineConfig::default();
    println!("installment: {}", loan.installment());

    for entry in loan.schedule(today, &config) {
        println!(
            "{:>3} {} interest {:>9} principal {:>10} balance {:>10} {}",
            entry.month,
            entry.payment_date,
            entry.interest,
            entry.principal,
            entry.remaining_balance,
            if entry.settled { "paid" } else { "" },
        );
    }

    let status = loan.status(today, &config);
    println!("\nbalance {} ({}% repaid), next due {:?}", status.current_balance, status.completion_percent, status.next_due_date);

    Ok(())
}
