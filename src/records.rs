use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::types::{
    BillingPeriod, ChargeId, ChargeType, ExpenseCategory, ExpenseId, InvoiceId, InvoiceStatus,
    Meal, PaymentId, PaymentMethod, ResidentId, ResidentStatus, RoomId, RoomType, SeatId,
    TenancyId,
};

/// room row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub number: String,
    #[serde(rename = "type")]
    pub room_type: RoomType,
}

/// seat row; a seat with no resident reference is vacant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seat {
    pub id: SeatId,
    pub room_id: RoomId,
    pub seat_number: u32,
    pub rent: Money,
    pub resident_id: Option<ResidentId>,
}

impl Seat {
    pub fn is_vacant(&self) -> bool {
        self.resident_id.is_none()
    }
}

/// resident row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resident {
    pub id: ResidentId,
    pub name: String,
    pub cnic: String,
    pub phone: Option<String>,
    pub guardian_phone: Option<String>,
    pub move_in: NaiveDate,
    pub move_out: Option<NaiveDate>,
    pub deposit: Money,
    pub status: ResidentStatus,
}

impl Resident {
    pub fn is_active(&self) -> bool {
        self.status == ResidentStatus::Active
    }
}

/// intake details for registering a new resident
#[derive(Debug, Clone)]
pub struct ResidentIntake {
    pub name: String,
    pub cnic: String,
    pub phone: Option<String>,
    pub guardian_phone: Option<String>,
    pub move_in: NaiveDate,
    /// falls back to the configured default when not set
    pub deposit: Option<Money>,
}

/// tenancy history row, immutable once closed. room and seat numbers are
/// denormalized snapshots so the record survives later room edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenancyRecord {
    pub id: TenancyId,
    pub resident_id: ResidentId,
    pub room_number: String,
    pub seat_number: u32,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl TenancyRecord {
    pub fn is_open(&self) -> bool {
        self.end_date.is_none()
    }
}

/// mess attendance row, one per resident per date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub resident_id: ResidentId,
    pub date: NaiveDate,
    pub breakfast: bool,
    pub breakfast_cost: Money,
    pub lunch: bool,
    pub lunch_cost: Money,
    pub dinner: bool,
    pub dinner_cost: Money,
}

impl AttendanceRecord {
    pub fn blank(resident_id: ResidentId, date: NaiveDate) -> Self {
        AttendanceRecord {
            resident_id,
            date,
            breakfast: false,
            breakfast_cost: Money::ZERO,
            lunch: false,
            lunch_cost: Money::ZERO,
            dinner: false,
            dinner_cost: Money::ZERO,
        }
    }

    /// set one meal's cost; the attended flag tracks whether the cost is
    /// positive, other meals are left untouched
    pub fn set_meal(&mut self, meal: Meal, cost: Money) {
        let attended = cost.is_positive();
        match meal {
            Meal::Breakfast => {
                self.breakfast = attended;
                self.breakfast_cost = cost;
            }
            Meal::Lunch => {
                self.lunch = attended;
                self.lunch_cost = cost;
            }
            Meal::Dinner => {
                self.dinner = attended;
                self.dinner_cost = cost;
            }
        }
    }

    pub fn day_total(&self) -> Money {
        self.breakfast_cost + self.lunch_cost + self.dinner_cost
    }
}

/// one-off charge row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomCharge {
    pub id: ChargeId,
    pub resident_id: ResidentId,
    pub date: NaiveDate,
    #[serde(rename = "type")]
    pub charge_type: ChargeType,
    pub amount: Money,
    pub notes: Option<String>,
}

/// input for recording a one-off charge
#[derive(Debug, Clone)]
pub struct NewCharge {
    pub resident_id: ResidentId,
    pub date: NaiveDate,
    pub charge_type: ChargeType,
    pub amount: Money,
    pub notes: Option<String>,
}

/// invoice row. total_due and status are computed at issue time and
/// maintained through register_payment; they are never set directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub resident_id: ResidentId,
    pub period: BillingPeriod,
    pub room_rent: Money,
    pub mess_total: Money,
    pub custom_total: Money,
    pub prev_dues: Money,
    pub total_due: Money,
    pub amount_paid: Money,
    pub status: InvoiceStatus,
    pub issued_on: NaiveDate,
}

impl Invoice {
    /// issue a new invoice; total_due is the sum of the four components and
    /// a zero-due invoice starts out already Paid
    pub fn issue(
        resident_id: ResidentId,
        period: BillingPeriod,
        room_rent: Money,
        mess_total: Money,
        custom_total: Money,
        prev_dues: Money,
        issued_on: NaiveDate,
    ) -> Self {
        let total_due = room_rent + mess_total + custom_total + prev_dues;
        Invoice {
            id: Uuid::new_v4(),
            resident_id,
            period,
            room_rent,
            mess_total,
            custom_total,
            prev_dues,
            total_due,
            amount_paid: Money::ZERO,
            status: derive_status(Money::ZERO, total_due),
            issued_on,
        }
    }

    /// apply a payment amount; amount_paid only ever grows and status is
    /// recomputed through the shared derivation
    pub fn register_payment(&mut self, amount: Money) {
        self.amount_paid += amount;
        self.status = derive_status(self.amount_paid, self.total_due);
    }

    /// unpaid balance, floored at zero when overpaid
    pub fn outstanding(&self) -> Money {
        (self.total_due - self.amount_paid).max(Money::ZERO)
    }
}

/// the one place invoice status is derived from amounts
fn derive_status(amount_paid: Money, total_due: Money) -> InvoiceStatus {
    if amount_paid >= total_due {
        InvoiceStatus::Paid
    } else if amount_paid.is_zero() {
        InvoiceStatus::Unpaid
    } else {
        InvoiceStatus::PartiallyPaid
    }
}

/// payment row; immutable once recorded. invoice_id is empty for detached
/// payments such as historical imports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub resident_id: ResidentId,
    pub invoice_id: Option<InvoiceId>,
    pub amount: Money,
    pub date: NaiveDate,
    pub method: PaymentMethod,
    pub notes: Option<String>,
}

/// operational expense row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub title: String,
    pub category: ExpenseCategory,
    pub amount: Money,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

/// input for recording an operational expense
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub title: String,
    pub category: ExpenseCategory,
    pub amount: Money,
    pub date: NaiveDate,
    pub notes: Option<String>,
}
