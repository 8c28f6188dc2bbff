use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use tracing::warn;
use uuid::Uuid;

use crate::audit::{AuditAction, AuditEntry, AuditRecorder, AuditTrail};
use crate::billing::{
    GenerationReport, InvoiceGenerator, PaymentProcessor, PaymentReceipt, PaymentRequest,
};
use crate::charges::{ChargeAggregator, ChargeBreakdown};
use crate::config::BillingConfig;
use crate::decimal::Money;
use crate::errors::{BillingError, Result};
use crate::ledger::Ledger;
use crate::occupancy::{AssignmentOutcome, OccupancyManager, ReleasedSeat};
use crate::records::{CustomCharge, Expense, NewCharge, NewExpense, Resident, ResidentIntake};
use crate::report::Reports;
use crate::settlement::{Settlement, SettlementEngine, SettlementPreview};
use crate::types::{
    Actor, ChargeId, ExpenseId, Meal, Month, ResidentId, ResidentStatus, RoomId, RoomType, SeatId,
};

/// the operation surface of the billing system. owns the ledger store and
/// an audit sink; every mutation flows through here so each one carries an
/// audit entry. a host needing cross-thread access wraps the engine in its
/// own lock, which serializes all operations.
pub struct BillingEngine<A: AuditRecorder = AuditTrail> {
    config: BillingConfig,
    ledger: Ledger,
    audit: A,
}

impl BillingEngine<AuditTrail> {
    /// engine over an empty ledger with the built-in audit trail
    pub fn new(config: BillingConfig) -> Self {
        Self::with_recorder(config, AuditTrail::new())
    }

    /// engine around a previously captured ledger snapshot
    pub fn from_snapshot(config: BillingConfig, ledger: Ledger) -> Self {
        BillingEngine {
            config,
            ledger,
            audit: AuditTrail::new(),
        }
    }
}

impl<A: AuditRecorder> BillingEngine<A> {
    /// engine with a host-provided audit sink
    pub fn with_recorder(config: BillingConfig, audit: A) -> Self {
        BillingEngine {
            config,
            ledger: Ledger::new(),
            audit,
        }
    }

    pub fn config(&self) -> &BillingConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn audit(&self) -> &A {
        &self.audit
    }

    pub fn reports(&self) -> Reports<'_> {
        Reports::new(&self.ledger)
    }

    /// the audit trail is diagnostic: a failing sink is logged and the
    /// primary operation carries on
    fn record_audit(
        &mut self,
        action: AuditAction,
        details: String,
        actor: &Actor,
        time_provider: &SafeTimeProvider,
    ) {
        let entry = AuditEntry::new(action, details, actor, time_provider.now());
        if let Err(err) = self.audit.record(entry) {
            warn!("audit entry dropped for {}: {}", action, err);
        }
    }

    // ---- rooms ----

    /// add a room and its seats at a default rent
    pub fn add_room(
        &mut self,
        number: impl Into<String>,
        room_type: RoomType,
        default_rent: Money,
        actor: &Actor,
        time_provider: &SafeTimeProvider,
    ) -> Result<RoomId> {
        let number = number.into();
        let room_id = self
            .ledger
            .add_room(number.clone(), room_type, default_rent)?;
        self.record_audit(
            AuditAction::RoomAdded,
            format!("Room {number} added"),
            actor,
            time_provider,
        );
        Ok(room_id)
    }

    /// remove a room; rejected while any of its seats is occupied
    pub fn remove_room(
        &mut self,
        room_id: RoomId,
        actor: &Actor,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        self.ledger.remove_room(room_id)?;
        self.record_audit(
            AuditAction::RoomRemoved,
            "Room deleted".to_string(),
            actor,
            time_provider,
        );
        Ok(())
    }

    /// change one seat's rent; affects invoices generated from then on
    pub fn set_seat_rent(
        &mut self,
        seat_id: SeatId,
        rent: Money,
        actor: &Actor,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let room_id = self
            .ledger
            .seat(seat_id)
            .ok_or(BillingError::SeatNotFound { id: seat_id })?
            .room_id;
        let number = self
            .ledger
            .room(room_id)
            .ok_or_else(|| BillingError::Persistence {
                message: format!("seat {seat_id} references a missing room"),
            })?
            .number
            .clone();
        self.ledger.set_seat_rent(seat_id, rent)?;
        self.record_audit(
            AuditAction::RoomUpdated,
            format!("Room {number} updated"),
            actor,
            time_provider,
        );
        Ok(())
    }

    // ---- residents and occupancy ----

    /// register a new resident and optionally seat them right away. the
    /// deposit falls back to the configured default when the intake leaves
    /// it unset; seating runs the move-in invoice path.
    pub fn move_in(
        &mut self,
        intake: ResidentIntake,
        seat: Option<SeatId>,
        rent: Option<Money>,
        actor: &Actor,
        time_provider: &SafeTimeProvider,
    ) -> Result<ResidentId> {
        if let Some(seat_id) = seat {
            let target = self
                .ledger
                .seat(seat_id)
                .ok_or(BillingError::SeatNotFound { id: seat_id })?;
            if !target.is_vacant() {
                return Err(BillingError::SeatOccupied { seat_id });
            }
        }
        if let Some(rent) = rent {
            if rent.is_negative() {
                return Err(BillingError::InvalidAmount { amount: rent });
            }
        }

        let move_in = intake.move_in;
        let resident = Resident {
            id: Uuid::new_v4(),
            name: intake.name,
            cnic: intake.cnic,
            phone: intake.phone,
            guardian_phone: intake.guardian_phone,
            move_in,
            move_out: None,
            deposit: intake.deposit.unwrap_or(self.config.default_deposit),
            status: ResidentStatus::Active,
        };
        let name = resident.name.clone();
        let resident_id = self.ledger.insert_resident(resident)?;

        if let Some(seat_id) = seat {
            OccupancyManager::assign(&mut self.ledger, resident_id, seat_id, rent, move_in)?;
        }

        self.record_audit(
            AuditAction::ResidentAdded,
            format!("Added {name}"),
            actor,
            time_provider,
        );
        Ok(resident_id)
    }

    /// seat a resident, or transfer one who is already seated
    pub fn assign_seat(
        &mut self,
        resident_id: ResidentId,
        seat_id: SeatId,
        rent: Option<Money>,
        actor: &Actor,
        time_provider: &SafeTimeProvider,
    ) -> Result<AssignmentOutcome> {
        let name = self.resident_name(resident_id)?;
        let outcome = OccupancyManager::assign(
            &mut self.ledger,
            resident_id,
            seat_id,
            rent,
            today(time_provider),
        )?;
        self.record_audit(
            AuditAction::ResidentUpdated,
            format!("Updated {name}"),
            actor,
            time_provider,
        );
        Ok(outcome)
    }

    /// unseat a resident without moving them out; the tenancy record closes
    pub fn release_seat(
        &mut self,
        resident_id: ResidentId,
        actor: &Actor,
        time_provider: &SafeTimeProvider,
    ) -> Result<Option<ReleasedSeat>> {
        let name = self.resident_name(resident_id)?;
        let released =
            OccupancyManager::release(&mut self.ledger, resident_id, today(time_provider))?;
        self.record_audit(
            AuditAction::ResidentUpdated,
            format!("Updated {name}"),
            actor,
            time_provider,
        );
        Ok(released)
    }

    /// correct the deposit held for a resident
    pub fn set_deposit(
        &mut self,
        resident_id: ResidentId,
        deposit: Money,
        actor: &Actor,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let name = self.resident_name(resident_id)?;
        self.ledger.set_deposit(resident_id, deposit)?;
        self.record_audit(
            AuditAction::ResidentUpdated,
            format!("Updated {name}"),
            actor,
            time_provider,
        );
        Ok(())
    }

    /// re-open a Left resident for a fresh tenancy. the new move_in date
    /// starts a new deposit-invoice scope.
    pub fn reactivate_resident(
        &mut self,
        resident_id: ResidentId,
        move_in: NaiveDate,
        deposit: Option<Money>,
        actor: &Actor,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let name = self.resident_name(resident_id)?;
        let deposit = deposit.unwrap_or(self.config.default_deposit);
        self.ledger.reactivate_resident(resident_id, move_in, deposit)?;
        self.record_audit(
            AuditAction::ResidentUpdated,
            format!("Updated {name}"),
            actor,
            time_provider,
        );
        Ok(())
    }

    // ---- attendance feed ----

    /// record one meal's cost for a day, creating or updating the day row.
    /// feed updates carry no audit entry.
    pub fn set_meal_cost(
        &mut self,
        resident_id: ResidentId,
        date: NaiveDate,
        meal: Meal,
        cost: Money,
    ) -> Result<()> {
        self.ledger.upsert_meal_cost(resident_id, date, meal, cost)
    }

    /// mark a meal attended at the configured price, or not attended at
    /// zero cost
    pub fn mark_meal(
        &mut self,
        resident_id: ResidentId,
        date: NaiveDate,
        meal: Meal,
        attended: bool,
    ) -> Result<()> {
        let cost = if attended {
            self.config.meal_prices.price_of(meal)
        } else {
            Money::ZERO
        };
        self.ledger.upsert_meal_cost(resident_id, date, meal, cost)
    }

    // ---- custom charges ----

    /// add a one-off charge to an active resident
    pub fn add_charge(
        &mut self,
        charge: NewCharge,
        actor: &Actor,
        time_provider: &SafeTimeProvider,
    ) -> Result<ChargeId> {
        let resident = self
            .ledger
            .resident(charge.resident_id)
            .ok_or(BillingError::ResidentNotFound {
                id: charge.resident_id,
            })?;
        // a charge on a Left resident would never reach an invoice
        if !resident.is_active() {
            return Err(BillingError::ResidentNotActive {
                resident_id: charge.resident_id,
                status: resident.status,
            });
        }
        let name = resident.name.clone();
        let amount = charge.amount;
        let charge_id = self.ledger.add_charge(charge)?;
        self.record_audit(
            AuditAction::ChargeAdded,
            format!("Added {amount} to {name}"),
            actor,
            time_provider,
        );
        Ok(charge_id)
    }

    pub fn remove_charge(
        &mut self,
        charge_id: ChargeId,
        actor: &Actor,
        time_provider: &SafeTimeProvider,
    ) -> Result<CustomCharge> {
        let removed = self.ledger.remove_charge(charge_id)?;
        self.record_audit(
            AuditAction::ChargeRemoved,
            "Deleted a charge record".to_string(),
            actor,
            time_provider,
        );
        Ok(removed)
    }

    // ---- billing ----

    /// rent, mess and custom totals for a resident and month; read-only
    pub fn aggregate_charges(
        &self,
        resident_id: ResidentId,
        period: Month,
    ) -> Result<ChargeBreakdown> {
        ChargeAggregator::new(&self.ledger).charges_for(resident_id, period)
    }

    /// run monthly generation for every active resident. per-resident
    /// failures are collected in the report rather than aborting the batch.
    pub fn generate_invoices(
        &mut self,
        period: Month,
        actor: &Actor,
        time_provider: &SafeTimeProvider,
    ) -> GenerationReport {
        let report =
            InvoiceGenerator::new(period).generate(&mut self.ledger, today(time_provider));
        for failure in &report.errors {
            warn!(
                "invoice generation failed for resident {}: {}",
                failure.resident_id, failure.reason
            );
        }
        self.record_audit(
            AuditAction::InvoicesGenerated,
            format!("Generated {} invoices for {}", report.generated, report.period),
            actor,
            time_provider,
        );
        report
    }

    /// apply a payment to an invoice and record the transaction
    pub fn apply_payment(
        &mut self,
        request: PaymentRequest,
        actor: &Actor,
        time_provider: &SafeTimeProvider,
    ) -> Result<PaymentReceipt> {
        let receipt = PaymentProcessor::apply(&mut self.ledger, request)?;
        self.record_audit(
            AuditAction::PaymentReceived,
            format!(
                "Received {} for Invoice #{}",
                receipt.payment.amount, receipt.invoice.period
            ),
            actor,
            time_provider,
        );
        Ok(receipt)
    }

    // ---- settlement ----

    /// settlement arithmetic for a resident, without writing anything
    pub fn preview_settlement(&self, resident_id: ResidentId) -> Result<SettlementPreview> {
        SettlementEngine::preview(&self.ledger, resident_id)
    }

    /// settle and move a resident out
    pub fn move_out(
        &mut self,
        resident_id: ResidentId,
        actor: &Actor,
        time_provider: &SafeTimeProvider,
    ) -> Result<Settlement> {
        let name = self.resident_name(resident_id)?;
        let settlement =
            SettlementEngine::execute(&mut self.ledger, resident_id, today(time_provider))?;
        self.record_audit(
            AuditAction::ResidentLeft,
            format!("{} moved out. Settled: {}", name, settlement.net),
            actor,
            time_provider,
        );
        Ok(settlement)
    }

    // ---- expenses ----

    /// record an operating cost
    pub fn record_expense(
        &mut self,
        expense: NewExpense,
        actor: &Actor,
        time_provider: &SafeTimeProvider,
    ) -> Result<ExpenseId> {
        let title = expense.title.clone();
        let amount = expense.amount;
        let expense_id = self.ledger.add_expense(expense)?;
        self.record_audit(
            AuditAction::ExpenseRecorded,
            format!("Added expense: {title} ({amount})"),
            actor,
            time_provider,
        );
        Ok(expense_id)
    }

    pub fn remove_expense(
        &mut self,
        expense_id: ExpenseId,
        actor: &Actor,
        time_provider: &SafeTimeProvider,
    ) -> Result<Expense> {
        let removed = self.ledger.remove_expense(expense_id)?;
        self.record_audit(
            AuditAction::ExpenseRemoved,
            "Deleted an expense record".to_string(),
            actor,
            time_provider,
        );
        Ok(removed)
    }

    fn resident_name(&self, resident_id: ResidentId) -> Result<String> {
        Ok(self
            .ledger
            .resident(resident_id)
            .ok_or(BillingError::ResidentNotFound { id: resident_id })?
            .name
            .clone())
    }
}

fn today(time_provider: &SafeTimeProvider) -> NaiveDate {
    time_provider.now().date_naive()
}
