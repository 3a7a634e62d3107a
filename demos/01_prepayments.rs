//! prepayments - lump sums folded into the schedule, itemized vs approximate status
use chrono::{Duration, NaiveDate, TimeZone, Utc};
use loan_schedule_rs::{
    total_interest, EngineConfig, Loan, Money, Prepayment, Rate, SafeTimeProvider, TimeSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== prepayments ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();
    let config = EngineConfig::default();

    let mut loan = Loan::builder()
        .name("renovation")
        .principal(Money::from_major(40_000))
        .rate(Rate::from_percentage(11))
        .term_months(48)
        .start_date(NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("bad date")?)
        .build_strict()?;

    let before = total_interest(&loan.schedule_at(&time, &config));
    println!("total interest without prepayments: {before}");

    loan.add_prepayment(
        Prepayment::new(Money::from_major(5_000), NaiveDate::from_ymd_opt(2024, 7, 20).ok_or("bad date")?)
            .with_note("bonus"),
    )?;
    loan.add_prepayment(Prepayment::new(
        Money::from_major(3_000),
        NaiveDate::from_ymd_opt(2025, 2, 3).ok_or("bad date")?,
    ))?;

    let after = total_interest(&loan.schedule_at(&time, &config));
    println!("total interest with prepayments:    {after}");
    println!("saved:                              {}\n", before - after);

    // a year and a half later
    controller.advance(Duration::days(548));
    let today = time.now().date_naive();

    let itemized = loan.status(today, &config);
    let approximate = loan.approximate_status(today, &config);
    println!("as of {today}");
    println!("  itemized balance:    {} ({}%)", itemized.current_balance, itemized.completion_percent);
    println!("  approximate balance: {} ({}%)", approximate.current_balance, approximate.completion_percent);
    println!("  closes on:           {:?}", itemized.closure_date);

    Ok(())
}
