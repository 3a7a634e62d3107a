use thiserror::Error;

use crate::decimal::{Money, Rate};

#[derive(Error, Debug)]
pub enum LoanError {
    #[error("invalid loan terms: {message}")]
    InvalidTerms {
        message: String,
    },

    #[error("invalid amount on record {record}: {amount}")]
    InvalidAmount {
        record: String,
        amount: Money,
    },

    #[error("invalid interest rate: {rate}")]
    InvalidInterestRate {
        rate: Rate,
    },

    #[error("invalid date on record {record}: {message}")]
    InvalidDate {
        record: String,
        message: String,
    },

    #[error("simulation point {after_month} is past the end of a {schedule_len}-entry schedule")]
    InvalidSimulationPoint {
        after_month: u32,
        schedule_len: usize,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LoanError>;
