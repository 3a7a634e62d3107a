//! documents as the persistence layer stores them, dates kept as strings

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::loan::Loan;
use crate::types::{LoanTerms, Prepayment};

/// stored loan document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanRecord {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub name: String,
    pub principal: Money,
    /// annual percentage, e.g. 12.5
    pub annual_rate_percent: Decimal,
    pub term_months: u32,
    pub start_date: String,
    #[serde(default)]
    pub amount_already_paid: Option<Money>,
    #[serde(default)]
    pub total_prepayments: Option<Money>,
}

/// stored prepayment document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrepaymentRecord {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub amount: Money,
    pub date: String,
    #[serde(default)]
    pub note: Option<String>,
}

impl LoanRecord {
    fn label(&self) -> String {
        match (&self.id, self.name.is_empty()) {
            (Some(id), _) => format!("loan {id}"),
            (None, false) => format!("loan '{}'", self.name),
            (None, true) => "loan".to_string(),
        }
    }
}

impl PrepaymentRecord {
    /// `index` is the record's position in a batch, if it came from one
    fn label(&self, index: Option<usize>) -> String {
        match (&self.id, index) {
            (Some(id), _) => format!("prepayment {id}"),
            (None, Some(index)) => format!("prepayment #{}", index + 1),
            (None, None) => "prepayment".to_string(),
        }
    }

    fn to_prepayment(&self, index: Option<usize>) -> Result<Prepayment> {
        let record = self.label(index);
        if !self.amount.is_positive() {
            return Err(LoanError::InvalidAmount {
                record,
                amount: self.amount,
            });
        }

        let mut prepayment = Prepayment::new(self.amount, parse_date(&record, &self.date)?);
        if let Some(id) = self.id {
            prepayment.id = id;
        }
        prepayment.note = self.note.clone();
        Ok(prepayment)
    }
}

/// accepts `YYYY-MM-DD` or an RFC 3339 timestamp, keeping its calendar date
pub fn parse_date(record: &str, value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|timestamp| timestamp.date_naive())
        .map_err(|e| LoanError::InvalidDate {
            record: record.to_string(),
            message: format!("'{value}' is neither YYYY-MM-DD nor RFC 3339 ({e})"),
        })
}

impl TryFrom<&LoanRecord> for LoanTerms {
    type Error = LoanError;

    fn try_from(record: &LoanRecord) -> Result<Self> {
        Ok(LoanTerms {
            principal: record.principal,
            annual_rate: Rate::from_annual_percent(record.annual_rate_percent),
            term_months: record.term_months,
            start_date: parse_date(&record.label(), &record.start_date)?,
            amount_already_paid: record.amount_already_paid,
            cached_prepayment_total: record.total_prepayments,
        })
    }
}

impl TryFrom<&PrepaymentRecord> for Prepayment {
    type Error = LoanError;

    fn try_from(record: &PrepaymentRecord) -> Result<Self> {
        record.to_prepayment(None)
    }
}

/// convert stored prepayments, stopping at the first malformed one
pub fn parse_prepayments(records: &[PrepaymentRecord]) -> Result<Vec<Prepayment>> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            record.to_prepayment(Some(index)).inspect_err(|e| {
                warn!(error = %e, "rejecting stored prepayment");
            })
        })
        .collect()
}

impl Loan {
    /// rebuild a loan from its stored documents
    pub fn from_records(record: &LoanRecord, prepayments: &[PrepaymentRecord]) -> Result<Loan> {
        let terms = LoanTerms::try_from(record)?;
        let prepayments = parse_prepayments(prepayments)?;
        Ok(Loan::from_parts(
            record.id.unwrap_or_else(Uuid::new_v4),
            record.name.clone(),
            terms,
            prepayments,
        ))
    }
}
