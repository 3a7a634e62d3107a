use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LoanError, Result};

/// engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// balances at or below this are treated as fully repaid
    pub settle_epsilon: Money,
    /// extra months allowed beyond term + 2 x prepayments before generation stops
    pub iteration_buffer: u32,
    /// hard ceiling on months produced by either simulator
    pub simulation_month_cap: u32,
    pub settlement_policy: SettlementPolicy,
    pub already_paid_treatment: AlreadyPaidTreatment,
}

/// rule deciding when a schedule entry counts as paid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementPolicy {
    /// settled once covered by the already-paid count or its due date has passed
    AssumeOnTime,
    /// settled only when covered by the already-paid count
    InitialCountOnly,
}

/// how the amount already paid enters the schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlreadyPaidTreatment {
    /// subtract it from the opening balance and mark whole installments settled
    ReduceOpeningBalance,
    /// only mark whole installments settled
    SettledMonthsOnly,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            settle_epsilon: Money::CENT,
            iteration_buffer: 12,
            simulation_month_cap: 1200,
            settlement_policy: SettlementPolicy::AssumeOnTime,
            already_paid_treatment: AlreadyPaidTreatment::ReduceOpeningBalance,
        }
    }
}

impl EngineConfig {
    /// configuration that only trusts the recorded already-paid count
    pub fn recorded_payments_only() -> Self {
        Self {
            settlement_policy: SettlementPolicy::InitialCountOnly,
            ..Self::default()
        }
    }

    /// configuration that treats the already-paid amount as whole installments
    /// without touching the opening balance
    pub fn installment_count_offset() -> Self {
        Self {
            already_paid_treatment: AlreadyPaidTreatment::SettledMonthsOnly,
            ..Self::default()
        }
    }

    /// parse from json, missing fields fall back to defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.settle_epsilon.is_negative() {
            return Err(LoanError::InvalidConfiguration {
                message: format!("settle_epsilon must not be negative, got {}", self.settle_epsilon),
            });
        }
        if self.simulation_month_cap == 0 {
            return Err(LoanError::InvalidConfiguration {
                message: "simulation_month_cap must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// safety bound on generated months for a loan
    pub fn generation_bound(&self, term_months: u32, prepayment_count: usize) -> u32 {
        let prepayments = u32::try_from(prepayment_count).unwrap_or(u32::MAX / 4);
        term_months
            .saturating_add(prepayments.saturating_mul(2))
            .saturating_add(self.iteration_buffer)
    }
}
