pub mod config;
pub mod decimal;
pub mod errors;
pub mod loan;
pub mod records;
pub mod report;
pub mod schedule;
pub mod simulation;
pub mod status;
pub mod types;

// re-export key types
pub use config::{AlreadyPaidTreatment, EngineConfig, SettlementPolicy};
pub use decimal::{Money, Rate};
pub use errors::{LoanError, Result};
pub use loan::{Loan, LoanBuilder};
pub use records::{parse_prepayments, LoanRecord, PrepaymentRecord};
pub use report::LoanReport;
pub use schedule::{
    installment, total_interest, GeneratedSchedule, ScheduleGenerator, ScheduleRequest,
    ScheduleTotals, StopReason,
};
pub use simulation::{
    InstallmentChangeSummary, InstallmentProjection, NewInstallmentSimulator, NonConvergence,
    PrepaymentSimulation, PrepaymentSimulator, SimulationBasis, SimulationSummary,
};
pub use status::{ApproximateStatus, ItemizedStatus, StatusEvaluator};
pub use types::{
    LoanId, LoanStatus, LoanTerms, Prepayment, PrepaymentId, PrepaymentMode, ScheduleEntry,
    StatusMode,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
