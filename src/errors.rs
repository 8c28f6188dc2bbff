use thiserror::Error;
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::{BillingPeriod, ResidentStatus};

#[derive(Error, Debug)]
pub enum BillingError {
    #[error("missing required field: {field}")]
    MissingField {
        field: &'static str,
    },

    #[error("invalid amount: {amount}")]
    InvalidAmount {
        amount: Money,
    },

    #[error("invalid billing period: {token}")]
    InvalidPeriod {
        token: String,
    },

    #[error("invoice already exists for resident {resident_id} in period {period}")]
    DuplicateInvoice {
        resident_id: Uuid,
        period: BillingPeriod,
    },

    #[error("deposit invoice already exists for resident {resident_id} in the current tenancy")]
    DuplicateDepositInvoice {
        resident_id: Uuid,
    },

    #[error("room number already in use: {number}")]
    DuplicateRoomNumber {
        number: String,
    },

    #[error("seat {seat_id} is already occupied")]
    SeatOccupied {
        seat_id: Uuid,
    },

    #[error("resident {resident_id} already occupies a seat")]
    ResidentAlreadySeated {
        resident_id: Uuid,
    },

    #[error("room {room_id} has occupied seats")]
    RoomOccupied {
        room_id: Uuid,
    },

    #[error("room not found: {id}")]
    RoomNotFound {
        id: Uuid,
    },

    #[error("seat not found: {id}")]
    SeatNotFound {
        id: Uuid,
    },

    #[error("resident not found: {id}")]
    ResidentNotFound {
        id: Uuid,
    },

    #[error("invoice not found: {id}")]
    InvoiceNotFound {
        id: Uuid,
    },

    #[error("charge not found: {id}")]
    ChargeNotFound {
        id: Uuid,
    },

    #[error("expense not found: {id}")]
    ExpenseNotFound {
        id: Uuid,
    },

    #[error("resident {resident_id} has status {status:?}")]
    ResidentNotActive {
        resident_id: Uuid,
        status: ResidentStatus,
    },

    #[error("ledger integrity failure: {message}")]
    Persistence {
        message: String,
    },
}

/// coarse classification used by callers to map errors onto retry and
/// display policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    State,
    Persistence,
}

impl BillingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BillingError::MissingField { .. }
            | BillingError::InvalidAmount { .. }
            | BillingError::InvalidPeriod { .. } => ErrorKind::Validation,

            BillingError::DuplicateInvoice { .. }
            | BillingError::DuplicateDepositInvoice { .. }
            | BillingError::DuplicateRoomNumber { .. }
            | BillingError::SeatOccupied { .. }
            | BillingError::ResidentAlreadySeated { .. }
            | BillingError::RoomOccupied { .. } => ErrorKind::Conflict,

            BillingError::RoomNotFound { .. }
            | BillingError::SeatNotFound { .. }
            | BillingError::ResidentNotFound { .. }
            | BillingError::InvoiceNotFound { .. }
            | BillingError::ChargeNotFound { .. }
            | BillingError::ExpenseNotFound { .. } => ErrorKind::NotFound,

            BillingError::ResidentNotActive { .. } => ErrorKind::State,

            BillingError::Persistence { .. } => ErrorKind::Persistence,
        }
    }
}

pub type Result<T> = std::result::Result<T, BillingError>;
