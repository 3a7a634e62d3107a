//! records - rebuilding a loan from stored documents and rendering a report
use chrono::NaiveDate;
use loan_schedule_rs::{EngineConfig, Loan, LoanError, LoanRecord, PrepaymentRecord};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let loan_json = r#"{
        "name": "studies",
        "principal": "18000",
        "annual_rate_percent": "6.9",
        "term_months": 36,
        "start_date": "2024-09-01T08:00:00Z",
        "amount_already_paid": "1000"
    }"#;
    let prepayments_json = r#"[
        { "amount": "2000", "date": "2025-01-10", "note": "grant" }
    ]"#;

    let record: LoanRecord = serde_json::from_str(loan_json)?;
    let prepayments: Vec<PrepaymentRecord> = serde_json::from_str(prepayments_json)?;
    let loan = Loan::from_records(&record, &prepayments)?;

    let today = NaiveDate::from_ymd_opt(2025, 6, 1).ok_or("bad date")?;
    println!("{}", loan.report(today, &EngineConfig::default()).to_json_pretty()?);

    // a malformed date is reported against its record
    let broken: Vec<PrepaymentRecord> = serde_json::from_str(r#"[{ "amount": "500", "date": "10/01/2025" }]"#)?;
    match Loan::from_records(&record, &broken) {
        Err(LoanError::InvalidDate { record, message }) => println!("\nrejected {record}: {message}"),
        other => println!("\nunexpected: {other:?}"),
    }

    Ok(())
}
