pub mod audit;
pub mod billing;
pub mod charges;
pub mod config;
pub mod decimal;
pub mod engine;
pub mod errors;
pub mod ledger;
pub mod occupancy;
pub mod records;
pub mod report;
pub mod settlement;
pub mod types;

// re-export key types
pub use decimal::Money;
pub use errors::{BillingError, Result};
pub use audit::{AuditAction, AuditEntry, AuditRecorder, AuditTrail};
pub use billing::{
    GenerationReport, InvoiceGenerator, PaymentProcessor, PaymentReceipt, PaymentRequest,
};
pub use charges::{ChargeAggregator, ChargeBreakdown};
pub use config::{BillingConfig, MealPrices};
pub use engine::BillingEngine;
pub use ledger::Ledger;
pub use occupancy::{AssignmentOutcome, OccupancyManager, ReleasedSeat};
pub use records::{
    AttendanceRecord, CustomCharge, Expense, Invoice, NewCharge, NewExpense, Payment,
    Resident, ResidentIntake, Room, Seat, TenancyRecord,
};
pub use report::{MonthlyFinancials, OccupancySnapshot, PendingDues, Reports, ResidentStatement};
pub use settlement::{OutstandingInvoice, Settlement, SettlementEngine, SettlementPreview};
pub use types::{
    Actor, BillingPeriod, ChargeType, ExpenseCategory, InvoiceStatus, Meal, Month,
    PaymentMethod, ResidentStatus, RoomType,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
