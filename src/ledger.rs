use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{BillingError, Result};
use crate::records::{
    AttendanceRecord, CustomCharge, Expense, Invoice, NewCharge, NewExpense, Payment, Resident,
    Room, Seat, TenancyRecord,
};
use crate::types::{
    BillingPeriod, ChargeId, ExpenseId, InvoiceId, InvoiceStatus, Meal, Month, PaymentId,
    ResidentId, ResidentStatus, RoomId, RoomType, SeatId, TenancyId,
};

/// in-memory ledger store. tables are reachable only through methods that
/// uphold the store constraints: seat occupancy is a checked swap, invoices
/// are unique per (resident, period), attendance is an atomic upsert keyed
/// (resident, date), and at most one tenancy record per resident is open.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ledger {
    rooms: Vec<Room>,
    seats: Vec<Seat>,
    residents: Vec<Resident>,
    attendance: Vec<AttendanceRecord>,
    custom_charges: Vec<CustomCharge>,
    invoices: Vec<Invoice>,
    payments: Vec<Payment>,
    expenses: Vec<Expense>,
    tenancy_history: Vec<TenancyRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger::default()
    }

    // ---- rooms and seats ----

    /// add a room and its seats, numbered 1..=capacity, all vacant at the
    /// given rent
    pub fn add_room(
        &mut self,
        number: impl Into<String>,
        room_type: RoomType,
        default_rent: Money,
    ) -> Result<RoomId> {
        let number = number.into();
        if number.trim().is_empty() {
            return Err(BillingError::MissingField { field: "number" });
        }
        if default_rent.is_negative() {
            return Err(BillingError::InvalidAmount {
                amount: default_rent,
            });
        }
        if self.rooms.iter().any(|r| r.number == number) {
            return Err(BillingError::DuplicateRoomNumber { number });
        }

        let room_id = Uuid::new_v4();
        for seat_number in 1..=room_type.capacity() {
            self.seats.push(Seat {
                id: Uuid::new_v4(),
                room_id,
                seat_number,
                rent: default_rent,
                resident_id: None,
            });
        }
        self.rooms.push(Room {
            id: room_id,
            number,
            room_type,
        });
        Ok(room_id)
    }

    /// remove a room and its seats; rejected while any seat is occupied
    pub fn remove_room(&mut self, room_id: RoomId) -> Result<()> {
        if self.room(room_id).is_none() {
            return Err(BillingError::RoomNotFound { id: room_id });
        }
        let occupied = self
            .seats
            .iter()
            .any(|s| s.room_id == room_id && !s.is_vacant());
        if occupied {
            return Err(BillingError::RoomOccupied { room_id });
        }
        self.seats.retain(|s| s.room_id != room_id);
        self.rooms.retain(|r| r.id != room_id);
        Ok(())
    }

    pub fn set_seat_rent(&mut self, seat_id: SeatId, rent: Money) -> Result<()> {
        if rent.is_negative() {
            return Err(BillingError::InvalidAmount { amount: rent });
        }
        let seat = self
            .seats
            .iter_mut()
            .find(|s| s.id == seat_id)
            .ok_or(BillingError::SeatNotFound { id: seat_id })?;
        seat.rent = rent;
        Ok(())
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn seat(&self, id: SeatId) -> Option<&Seat> {
        self.seats.iter().find(|s| s.id == id)
    }

    pub fn seats(&self) -> &[Seat] {
        &self.seats
    }

    pub fn seats_in(&self, room_id: RoomId) -> impl Iterator<Item = &Seat> {
        self.seats.iter().filter(move |s| s.room_id == room_id)
    }

    pub fn vacant_seats(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter().filter(|s| s.is_vacant())
    }

    /// the seat currently occupied by the resident, if any
    pub fn seat_of(&self, resident_id: ResidentId) -> Option<&Seat> {
        self.seats
            .iter()
            .find(|s| s.resident_id == Some(resident_id))
    }

    /// assign a resident to a seat; checked swap, rejected unless the seat
    /// is vacant and the resident is housed nowhere else
    pub(crate) fn occupy_seat(&mut self, seat_id: SeatId, resident_id: ResidentId) -> Result<()> {
        if self.resident(resident_id).is_none() {
            return Err(BillingError::ResidentNotFound { id: resident_id });
        }
        if self.seat_of(resident_id).is_some() {
            return Err(BillingError::ResidentAlreadySeated { resident_id });
        }
        let seat = self
            .seats
            .iter_mut()
            .find(|s| s.id == seat_id)
            .ok_or(BillingError::SeatNotFound { id: seat_id })?;
        if seat.resident_id.is_some() {
            return Err(BillingError::SeatOccupied { seat_id });
        }
        seat.resident_id = Some(resident_id);
        Ok(())
    }

    /// detach the occupant from a seat; the seat keeps its rent
    pub(crate) fn vacate_seat(&mut self, seat_id: SeatId) -> Result<()> {
        let seat = self
            .seats
            .iter_mut()
            .find(|s| s.id == seat_id)
            .ok_or(BillingError::SeatNotFound { id: seat_id })?;
        seat.resident_id = None;
        Ok(())
    }

    // ---- residents ----

    pub fn insert_resident(&mut self, resident: Resident) -> Result<ResidentId> {
        if resident.name.trim().is_empty() {
            return Err(BillingError::MissingField { field: "name" });
        }
        if resident.cnic.trim().is_empty() {
            return Err(BillingError::MissingField { field: "cnic" });
        }
        if resident.deposit.is_negative() {
            return Err(BillingError::InvalidAmount {
                amount: resident.deposit,
            });
        }
        let id = resident.id;
        self.residents.push(resident);
        Ok(id)
    }

    pub fn resident(&self, id: ResidentId) -> Option<&Resident> {
        self.residents.iter().find(|r| r.id == id)
    }

    pub fn residents(&self) -> &[Resident] {
        &self.residents
    }

    pub fn active_residents(&self) -> impl Iterator<Item = &Resident> {
        self.residents.iter().filter(|r| r.is_active())
    }

    pub fn set_deposit(&mut self, resident_id: ResidentId, deposit: Money) -> Result<()> {
        if deposit.is_negative() {
            return Err(BillingError::InvalidAmount { amount: deposit });
        }
        let resident = self.resident_mut(resident_id)?;
        resident.deposit = deposit;
        Ok(())
    }

    /// reopen a Left resident for a new tenancy; the new move_in date also
    /// resets deposit-invoice eligibility
    pub fn reactivate_resident(
        &mut self,
        resident_id: ResidentId,
        move_in: NaiveDate,
        deposit: Money,
    ) -> Result<()> {
        if deposit.is_negative() {
            return Err(BillingError::InvalidAmount { amount: deposit });
        }
        let resident = self.resident_mut(resident_id)?;
        if resident.is_active() {
            return Err(BillingError::ResidentNotActive {
                resident_id,
                status: resident.status,
            });
        }
        resident.status = ResidentStatus::Active;
        resident.move_in = move_in;
        resident.move_out = None;
        resident.deposit = deposit;
        Ok(())
    }

    pub(crate) fn mark_left(&mut self, resident_id: ResidentId, date: NaiveDate) -> Result<()> {
        let resident = self.resident_mut(resident_id)?;
        resident.status = ResidentStatus::Left;
        resident.move_out = Some(date);
        Ok(())
    }

    fn resident_mut(&mut self, id: ResidentId) -> Result<&mut Resident> {
        self.residents
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(BillingError::ResidentNotFound { id })
    }

    // ---- tenancy history ----

    pub(crate) fn open_tenancy(
        &mut self,
        resident_id: ResidentId,
        room_number: String,
        seat_number: u32,
        start_date: NaiveDate,
    ) -> Result<TenancyId> {
        if self.open_tenancy_of(resident_id).is_some() {
            return Err(BillingError::Persistence {
                message: format!("resident {resident_id} already has an open tenancy record"),
            });
        }
        let id = Uuid::new_v4();
        self.tenancy_history.push(TenancyRecord {
            id,
            resident_id,
            room_number,
            seat_number,
            start_date,
            end_date: None,
        });
        Ok(id)
    }

    /// close the resident's open tenancy record, if one exists
    pub(crate) fn close_tenancy(
        &mut self,
        resident_id: ResidentId,
        end_date: NaiveDate,
    ) -> Result<Option<TenancyId>> {
        let open = self
            .tenancy_history
            .iter_mut()
            .find(|t| t.resident_id == resident_id && t.is_open());
        match open {
            Some(record) => {
                record.end_date = Some(end_date);
                Ok(Some(record.id))
            }
            None => Ok(None),
        }
    }

    pub fn open_tenancy_of(&self, resident_id: ResidentId) -> Option<&TenancyRecord> {
        self.tenancy_history
            .iter()
            .find(|t| t.resident_id == resident_id && t.is_open())
    }

    pub fn tenancy_history_of(&self, resident_id: ResidentId) -> impl Iterator<Item = &TenancyRecord> {
        self.tenancy_history
            .iter()
            .filter(move |t| t.resident_id == resident_id)
    }

    pub fn tenancy_history(&self) -> &[TenancyRecord] {
        &self.tenancy_history
    }

    // ---- attendance ----

    /// upsert one meal's cost for (resident, date); creates the day record
    /// on first touch, otherwise updates it in place
    pub fn upsert_meal_cost(
        &mut self,
        resident_id: ResidentId,
        date: NaiveDate,
        meal: Meal,
        cost: Money,
    ) -> Result<()> {
        if cost.is_negative() {
            return Err(BillingError::InvalidAmount { amount: cost });
        }
        if self.resident(resident_id).is_none() {
            return Err(BillingError::ResidentNotFound { id: resident_id });
        }
        match self
            .attendance
            .iter_mut()
            .find(|a| a.resident_id == resident_id && a.date == date)
        {
            Some(record) => record.set_meal(meal, cost),
            None => {
                let mut record = AttendanceRecord::blank(resident_id, date);
                record.set_meal(meal, cost);
                self.attendance.push(record);
            }
        }
        Ok(())
    }

    pub fn attendance(&self) -> &[AttendanceRecord] {
        &self.attendance
    }

    pub fn attendance_on(&self, resident_id: ResidentId, date: NaiveDate) -> Option<&AttendanceRecord> {
        self.attendance
            .iter()
            .find(|a| a.resident_id == resident_id && a.date == date)
    }

    pub fn attendance_in(
        &self,
        resident_id: ResidentId,
        month: Month,
    ) -> impl Iterator<Item = &AttendanceRecord> {
        self.attendance
            .iter()
            .filter(move |a| a.resident_id == resident_id && month.contains(a.date))
    }

    // ---- custom charges ----

    pub fn add_charge(&mut self, charge: NewCharge) -> Result<ChargeId> {
        if !charge.amount.is_positive() {
            return Err(BillingError::InvalidAmount {
                amount: charge.amount,
            });
        }
        if self.resident(charge.resident_id).is_none() {
            return Err(BillingError::ResidentNotFound {
                id: charge.resident_id,
            });
        }
        let id = Uuid::new_v4();
        self.custom_charges.push(CustomCharge {
            id,
            resident_id: charge.resident_id,
            date: charge.date,
            charge_type: charge.charge_type,
            amount: charge.amount,
            notes: charge.notes,
        });
        Ok(id)
    }

    pub fn remove_charge(&mut self, charge_id: ChargeId) -> Result<CustomCharge> {
        let idx = self
            .custom_charges
            .iter()
            .position(|c| c.id == charge_id)
            .ok_or(BillingError::ChargeNotFound { id: charge_id })?;
        Ok(self.custom_charges.remove(idx))
    }

    pub fn charges_in(
        &self,
        resident_id: ResidentId,
        month: Month,
    ) -> impl Iterator<Item = &CustomCharge> {
        self.custom_charges
            .iter()
            .filter(move |c| c.resident_id == resident_id && month.contains(c.date))
    }

    pub fn charges(&self) -> &[CustomCharge] {
        &self.custom_charges
    }

    // ---- invoices ----

    /// insert an invoice, enforcing uniqueness: one invoice per
    /// (resident, month), and one deposit invoice per resident per tenancy
    /// (tenancy = issued on or after the resident's current move_in)
    pub(crate) fn insert_invoice(&mut self, invoice: Invoice) -> Result<InvoiceId> {
        if self.resident(invoice.resident_id).is_none() {
            return Err(BillingError::ResidentNotFound {
                id: invoice.resident_id,
            });
        }

        match invoice.period {
            BillingPeriod::Month(_) => {
                let duplicate = self
                    .invoices
                    .iter()
                    .any(|i| i.resident_id == invoice.resident_id && i.period == invoice.period);
                if duplicate {
                    return Err(BillingError::DuplicateInvoice {
                        resident_id: invoice.resident_id,
                        period: invoice.period,
                    });
                }
            }
            BillingPeriod::SecurityDeposit => {
                if self.deposit_invoice_in_tenancy(invoice.resident_id).is_some() {
                    return Err(BillingError::DuplicateDepositInvoice {
                        resident_id: invoice.resident_id,
                    });
                }
            }
        }

        let id = invoice.id;
        self.invoices.push(invoice);
        Ok(id)
    }

    /// apply an amount to an invoice through the shared status derivation;
    /// returns the updated invoice
    pub(crate) fn register_invoice_payment(
        &mut self,
        invoice_id: InvoiceId,
        amount: Money,
    ) -> Result<Invoice> {
        let invoice = self
            .invoices
            .iter_mut()
            .find(|i| i.id == invoice_id)
            .ok_or(BillingError::InvoiceNotFound { id: invoice_id })?;
        invoice.register_payment(amount);
        Ok(invoice.clone())
    }

    pub fn invoice(&self, id: InvoiceId) -> Option<&Invoice> {
        self.invoices.iter().find(|i| i.id == id)
    }

    pub fn invoices(&self) -> &[Invoice] {
        &self.invoices
    }

    pub fn invoices_for(&self, resident_id: ResidentId) -> impl Iterator<Item = &Invoice> {
        self.invoices
            .iter()
            .filter(move |i| i.resident_id == resident_id)
    }

    pub fn invoice_for_period(
        &self,
        resident_id: ResidentId,
        period: BillingPeriod,
    ) -> Option<&Invoice> {
        self.invoices
            .iter()
            .find(|i| i.resident_id == resident_id && i.period == period)
    }

    pub fn unpaid_invoices(&self, resident_id: ResidentId) -> impl Iterator<Item = &Invoice> {
        self.invoices_for(resident_id)
            .filter(|i| i.status != InvoiceStatus::Paid)
    }

    /// the deposit invoice issued within the resident's current tenancy
    /// (on or after the current move_in date), if any
    pub fn deposit_invoice_in_tenancy(&self, resident_id: ResidentId) -> Option<&Invoice> {
        let move_in = self.resident(resident_id)?.move_in;
        self.invoices
            .iter()
            .find(|i| i.resident_id == resident_id && i.period.is_deposit() && i.issued_on >= move_in)
    }

    // ---- payments ----

    pub(crate) fn insert_payment(&mut self, payment: Payment) -> PaymentId {
        let id = payment.id;
        self.payments.push(payment);
        id
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn payments_for(&self, resident_id: ResidentId) -> impl Iterator<Item = &Payment> {
        self.payments
            .iter()
            .filter(move |p| p.resident_id == resident_id)
    }

    pub fn payments_for_invoice(&self, invoice_id: InvoiceId) -> impl Iterator<Item = &Payment> {
        self.payments
            .iter()
            .filter(move |p| p.invoice_id == Some(invoice_id))
    }

    // ---- expenses ----

    pub fn add_expense(&mut self, expense: NewExpense) -> Result<ExpenseId> {
        if expense.title.trim().is_empty() {
            return Err(BillingError::MissingField { field: "title" });
        }
        if !expense.amount.is_positive() {
            return Err(BillingError::InvalidAmount {
                amount: expense.amount,
            });
        }
        let id = Uuid::new_v4();
        self.expenses.push(Expense {
            id,
            title: expense.title,
            category: expense.category,
            amount: expense.amount,
            date: expense.date,
            notes: expense.notes,
        });
        Ok(id)
    }

    pub fn remove_expense(&mut self, expense_id: ExpenseId) -> Result<Expense> {
        let idx = self
            .expenses
            .iter()
            .position(|e| e.id == expense_id)
            .ok_or(BillingError::ExpenseNotFound { id: expense_id })?;
        Ok(self.expenses.remove(idx))
    }

    pub fn expense(&self, id: ExpenseId) -> Option<&Expense> {
        self.expenses.iter().find(|e| e.id == id)
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }
}
