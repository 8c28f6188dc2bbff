use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::errors::{BillingError, Result};

/// unique identifier for a room
pub type RoomId = Uuid;
/// unique identifier for a seat
pub type SeatId = Uuid;
/// unique identifier for a resident
pub type ResidentId = Uuid;
/// unique identifier for an invoice
pub type InvoiceId = Uuid;
/// unique identifier for a payment
pub type PaymentId = Uuid;
/// unique identifier for a custom charge
pub type ChargeId = Uuid;
/// unique identifier for an expense
pub type ExpenseId = Uuid;
/// unique identifier for a tenancy history record
pub type TenancyId = Uuid;

/// identity performing a mutating operation, recorded on audit entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
}

impl Actor {
    pub fn named(name: impl Into<String>) -> Self {
        Actor { name: name.into() }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// room layout types with fixed seat capacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomType {
    #[serde(rename = "2-seat")]
    TwoSeater,
    #[serde(rename = "3-seat")]
    ThreeSeater,
    #[serde(rename = "4-seat")]
    FourSeater,
    #[serde(rename = "office")]
    Office,
    #[serde(rename = "store")]
    Store,
}

impl RoomType {
    /// number of billable seats this layout holds
    pub fn capacity(&self) -> u32 {
        match self {
            RoomType::TwoSeater => 2,
            RoomType::ThreeSeater => 3,
            RoomType::FourSeater => 4,
            RoomType::Office | RoomType::Store => 0,
        }
    }
}

/// resident lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResidentStatus {
    Active,
    Left,
}

/// invoice payment status, derived from amount_paid vs total_due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    Unpaid,
    #[serde(rename = "Partially Paid")]
    PartiallyPaid,
    Paid,
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvoiceStatus::Unpaid => write!(f, "Unpaid"),
            InvoiceStatus::PartiallyPaid => write!(f, "Partially Paid"),
            InvoiceStatus::Paid => write!(f, "Paid"),
        }
    }
}

/// accepted payment channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    #[serde(rename = "Bank Transfer")]
    BankTransfer,
    EasyPaisa,
    JazzCash,
    Cheque,
    /// synthetic method used when a security deposit absorbs dues at move-out
    #[serde(rename = "Deposit Settlement")]
    DepositSettlement,
}

/// one-off charge categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargeType {
    Electricity,
    Damage,
    Guest,
    Security,
    Other,
}

/// operational expense categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExpenseCategory {
    Electricity,
    Maintenance,
    Salary,
    Groceries,
    Internet,
    Rent,
    Other,
}

/// mess meals tracked per attendance day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Meal {
    Breakfast,
    Lunch,
    Dinner,
}

/// calendar month used as the invoicing cycle key
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Month {
    year: i32,
    month: u32,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) || !(1..=9999).contains(&year) {
            return Err(BillingError::InvalidPeriod {
                token: format!("{year:04}-{month:02}"),
            });
        }
        Ok(Month { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Month {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// whether the given date falls inside this month
    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Month {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self> {
        let parse = || -> Option<Month> {
            let (y, m) = s.split_once('-')?;
            let year = y.parse().ok()?;
            let month = m.parse().ok()?;
            Month::new(year, month).ok()
        };
        parse().ok_or_else(|| BillingError::InvalidPeriod {
            token: s.to_string(),
        })
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Month {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// invoice period: a calendar month or the one-time deposit sentinel.
/// the ordering places the deposit sentinel before any month and months
/// chronologically; settlement consumes unpaid invoices in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BillingPeriod {
    SecurityDeposit,
    Month(Month),
}

impl BillingPeriod {
    pub const DEPOSIT_TOKEN: &'static str = "Security Deposit";

    pub fn month(&self) -> Option<Month> {
        match self {
            BillingPeriod::Month(m) => Some(*m),
            BillingPeriod::SecurityDeposit => None,
        }
    }

    pub fn is_deposit(&self) -> bool {
        matches!(self, BillingPeriod::SecurityDeposit)
    }
}

impl From<Month> for BillingPeriod {
    fn from(m: Month) -> Self {
        BillingPeriod::Month(m)
    }
}

impl Ord for BillingPeriod {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (BillingPeriod::SecurityDeposit, BillingPeriod::SecurityDeposit) => Ordering::Equal,
            (BillingPeriod::SecurityDeposit, BillingPeriod::Month(_)) => Ordering::Less,
            (BillingPeriod::Month(_), BillingPeriod::SecurityDeposit) => Ordering::Greater,
            (BillingPeriod::Month(a), BillingPeriod::Month(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for BillingPeriod {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BillingPeriod::SecurityDeposit => write!(f, "{}", Self::DEPOSIT_TOKEN),
            BillingPeriod::Month(m) => write!(f, "{m}"),
        }
    }
}

impl FromStr for BillingPeriod {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self> {
        if s == Self::DEPOSIT_TOKEN {
            Ok(BillingPeriod::SecurityDeposit)
        } else {
            Ok(BillingPeriod::Month(s.parse()?))
        }
    }
}

impl Serialize for BillingPeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for BillingPeriod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
