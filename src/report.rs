//! serializable views for presentation layers

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::decimal::Money;
use crate::errors::Result;
use crate::loan::Loan;
use crate::schedule::ScheduleTotals;
use crate::types::{LoanId, LoanStatus, LoanTerms, ScheduleEntry};

/// serializable view of a loan as of one date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanReport {
    pub loan_id: LoanId,
    pub name: String,
    pub as_of: NaiveDate,
    pub terms: LoanTerms,
    pub installment: Money,
    pub status: LoanStatus,
    pub totals: ScheduleTotals,
    pub prepayment_count: usize,
    pub schedule: Vec<ScheduleEntry>,
}

impl LoanReport {
    pub fn for_loan(loan: &Loan, as_of: NaiveDate, config: &EngineConfig) -> Self {
        let schedule = loan.schedule(as_of, config);
        let status = loan.status(as_of, config);

        LoanReport {
            loan_id: loan.id,
            name: loan.name.clone(),
            as_of,
            terms: loan.terms.clone(),
            installment: loan.installment(),
            status,
            totals: ScheduleTotals::of(&schedule),
            prepayment_count: loan.prepayments().len(),
            schedule,
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::types::Prepayment;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_report_round_trips_through_json() {
        let loan = Loan::builder()
            .name("home improvement")
            .principal(Money::from_major(24_000))
            .rate(Rate::from_percentage(9))
            .term_months(24)
            .start_date(date(2024, 1, 1))
            .prepayment(Prepayment::new(Money::from_major(3_000), date(2024, 4, 10)))
            .build_strict()
            .unwrap();

        let report = loan.report(date(2024, 7, 1), &EngineConfig::default());
        assert_eq!(report.prepayment_count, 1);
        assert_eq!(report.totals.months as usize, report.schedule.len());
        assert_eq!(report.totals.total_prepaid, Money::from_major(3_000));
        assert_eq!(report.status.settled_count, 6);

        let json = report.to_json_pretty().unwrap();
        let parsed: LoanReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }
}
