use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::Result;
use crate::types::Actor;

/// actions the engine records on its audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditAction {
    #[serde(rename = "ROOM_ADD")]
    RoomAdded,
    #[serde(rename = "ROOM_EDIT")]
    RoomUpdated,
    #[serde(rename = "ROOM_DEL")]
    RoomRemoved,
    #[serde(rename = "RES_ADD")]
    ResidentAdded,
    #[serde(rename = "RES_EDIT")]
    ResidentUpdated,
    #[serde(rename = "RES_LEFT")]
    ResidentLeft,
    #[serde(rename = "BILL_GEN")]
    InvoicesGenerated,
    #[serde(rename = "PAY_ADD")]
    PaymentReceived,
    #[serde(rename = "CHARGE_ADD")]
    ChargeAdded,
    #[serde(rename = "CHARGE_DEL")]
    ChargeRemoved,
    #[serde(rename = "EXPENSE_ADD")]
    ExpenseRecorded,
    #[serde(rename = "EXPENSE_DEL")]
    ExpenseRemoved,
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            AuditAction::RoomAdded => "ROOM_ADD",
            AuditAction::RoomUpdated => "ROOM_EDIT",
            AuditAction::RoomRemoved => "ROOM_DEL",
            AuditAction::ResidentAdded => "RES_ADD",
            AuditAction::ResidentUpdated => "RES_EDIT",
            AuditAction::ResidentLeft => "RES_LEFT",
            AuditAction::InvoicesGenerated => "BILL_GEN",
            AuditAction::PaymentReceived => "PAY_ADD",
            AuditAction::ChargeAdded => "CHARGE_ADD",
            AuditAction::ChargeRemoved => "CHARGE_DEL",
            AuditAction::ExpenseRecorded => "EXPENSE_ADD",
            AuditAction::ExpenseRemoved => "EXPENSE_DEL",
        };
        write!(f, "{code}")
    }
}

/// one who-did-what record; diagnostic only, never a source of truth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub action: AuditAction,
    pub details: String,
    pub actor: String,
    pub timestamp: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        action: AuditAction,
        details: impl Into<String>,
        actor: &Actor,
        timestamp: DateTime<Utc>,
    ) -> Self {
        AuditEntry {
            action,
            details: details.into(),
            actor: actor.name.clone(),
            timestamp,
        }
    }
}

/// sink for audit entries; hosts plug their own implementation to forward
/// entries to a durable log
pub trait AuditRecorder {
    fn record(&mut self, entry: AuditEntry) -> Result<()>;
}

/// in-memory audit trail keeping only the most recent entries
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditTrail {
    entries: Vec<AuditEntry>,
}

impl AuditTrail {
    /// display cap; older entries are discarded
    pub const CAP: usize = 50;

    pub fn new() -> Self {
        AuditTrail {
            entries: Vec::new(),
        }
    }

    /// most recent entries, oldest first
    pub fn recent(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&AuditEntry> {
        self.entries.last()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl AuditRecorder for AuditTrail {
    fn record(&mut self, entry: AuditEntry) -> Result<()> {
        self.entries.push(entry);
        if self.entries.len() > Self::CAP {
            let excess = self.entries.len() - Self::CAP;
            self.entries.drain(..excess);
        }
        Ok(())
    }
}
