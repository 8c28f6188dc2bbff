use chrono::NaiveDate;

use crate::billing::{PaymentProcessor, PaymentRequest};
use crate::decimal::Money;
use crate::errors::{BillingError, Result};
use crate::ledger::Ledger;
use crate::occupancy::OccupancyManager;
use crate::records::NewExpense;
use crate::types::{
    BillingPeriod, ExpenseCategory, ExpenseId, InvoiceId, PaymentMethod, ResidentId,
};

const SETTLEMENT_NOTE: &str = "Adjusted from Security Deposit on Move Out";

/// one unpaid invoice in a settlement preview, ordered oldest first
#[derive(Debug, Clone, PartialEq)]
pub struct OutstandingInvoice {
    pub invoice_id: InvoiceId,
    pub period: BillingPeriod,
    pub outstanding: Money,
}

/// read-only settlement arithmetic; shown to the operator before move-out
#[derive(Debug, Clone, PartialEq)]
pub struct SettlementPreview {
    pub resident_id: ResidentId,
    pub deposit: Money,
    pub outstanding_dues: Money,
    /// deposit minus dues; negative when the resident still owes
    pub net: Money,
    pub unpaid: Vec<OutstandingInvoice>,
}

/// the completed move-out reconciliation
#[derive(Debug, Clone, PartialEq)]
pub struct Settlement {
    pub resident_id: ResidentId,
    pub deposit: Money,
    pub dues_before: Money,
    /// portion of the deposit consumed by unpaid invoices
    pub applied: Money,
    pub net: Money,
    pub settled_invoices: Vec<InvoiceId>,
    pub refund_expense: Option<ExpenseId>,
    pub moved_out_on: NaiveDate,
}

/// reconciles a departing resident's deposit against open invoices
pub struct SettlementEngine;

impl SettlementEngine {
    /// compute the settlement a move-out would perform, without writing.
    /// hosts confirm this with the operator before calling `execute`.
    pub fn preview(ledger: &Ledger, resident_id: ResidentId) -> Result<SettlementPreview> {
        let resident = ledger
            .resident(resident_id)
            .ok_or(BillingError::ResidentNotFound { id: resident_id })?;
        if !resident.is_active() {
            return Err(BillingError::ResidentNotActive {
                resident_id,
                status: resident.status,
            });
        }

        let mut unpaid: Vec<OutstandingInvoice> = ledger
            .unpaid_invoices(resident_id)
            .map(|i| OutstandingInvoice {
                invoice_id: i.id,
                period: i.period,
                outstanding: i.outstanding(),
            })
            .collect();
        // deposit sentinel first, then months oldest to newest
        unpaid.sort_by_key(|i| i.period);

        let outstanding_dues: Money = unpaid.iter().map(|i| i.outstanding).sum();
        Ok(SettlementPreview {
            resident_id,
            deposit: resident.deposit,
            outstanding_dues,
            net: resident.deposit - outstanding_dues,
            unpaid,
        })
    }

    /// move the resident out: apply the deposit across unpaid invoices in
    /// ascending period order, free the seat, close the tenancy record,
    /// mark the resident Left, and record a refund expense when the
    /// deposit exceeds the dues. a shortfall stays on the invoices.
    pub fn execute(
        ledger: &mut Ledger,
        resident_id: ResidentId,
        today: NaiveDate,
    ) -> Result<Settlement> {
        let preview = Self::preview(ledger, resident_id)?;
        let resident_name = ledger
            .resident(resident_id)
            .ok_or(BillingError::ResidentNotFound { id: resident_id })?
            .name
            .clone();

        let mut remaining = preview.deposit;
        let mut applied = Money::ZERO;
        let mut settled_invoices = Vec::new();
        for entry in &preview.unpaid {
            if !remaining.is_positive() {
                break;
            }
            let pay = entry.outstanding.min(remaining);
            if !pay.is_positive() {
                continue;
            }
            PaymentProcessor::apply(
                ledger,
                PaymentRequest {
                    invoice_id: entry.invoice_id,
                    amount: pay,
                    date: today,
                    method: PaymentMethod::DepositSettlement,
                    notes: Some(SETTLEMENT_NOTE.to_string()),
                },
            )?;
            remaining -= pay;
            applied += pay;
            settled_invoices.push(entry.invoice_id);
        }

        let released = OccupancyManager::release(ledger, resident_id, today)?;
        ledger.mark_left(resident_id, today)?;

        let refund_expense = if preview.net.is_positive() {
            let room_label = released
                .as_ref()
                .map(|s| s.room_number.clone())
                .or_else(|| {
                    ledger
                        .tenancy_history_of(resident_id)
                        .last()
                        .map(|t| t.room_number.clone())
                });
            let title = match room_label {
                Some(number) => format!("Security Refund - {resident_name} (Room {number})"),
                None => format!("Security Refund - {resident_name}"),
            };
            let mut notes = format!(
                "Deposit: {} | Dues Deducted: {}",
                preview.deposit, preview.outstanding_dues
            );
            if !settled_invoices.is_empty() {
                let refs: Vec<String> = settled_invoices
                    .iter()
                    .map(|id| invoice_ref(*id))
                    .collect();
                notes.push_str(&format!(" | Settled Invs: {}", refs.join(", ")));
            }
            Some(ledger.add_expense(NewExpense {
                title,
                category: ExpenseCategory::Other,
                amount: preview.net,
                date: today,
                notes: Some(notes),
            })?)
        } else {
            None
        };

        Ok(Settlement {
            resident_id,
            deposit: preview.deposit,
            dues_before: preview.outstanding_dues,
            applied,
            net: preview.net,
            settled_invoices,
            refund_expense,
            moved_out_on: today,
        })
    }
}

/// short display reference for an invoice, e.g. "#9F86D0"
fn invoice_ref(id: InvoiceId) -> String {
    let hex = id.simple().to_string();
    format!("#{}", hex[..6].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::records::{Invoice, Resident};
    use crate::types::{InvoiceStatus, Month, ResidentStatus, RoomType, SeatId};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn month(s: &str) -> Month {
        s.parse().unwrap()
    }

    fn add_resident(ledger: &mut Ledger, name: &str, deposit: i64) -> ResidentId {
        ledger
            .insert_resident(Resident {
                id: Uuid::new_v4(),
                name: name.to_string(),
                cnic: "35202-1111111-1".to_string(),
                phone: None,
                guardian_phone: None,
                move_in: date(2024, 1, 1),
                move_out: None,
                deposit: Money::from_major(deposit),
                status: ResidentStatus::Active,
            })
            .unwrap()
    }

    fn seat(ledger: &mut Ledger, number: &str, rent: i64) -> SeatId {
        let room_id = ledger
            .add_room(number, RoomType::TwoSeater, Money::from_major(rent))
            .unwrap();
        ledger.seats_in(room_id).next().unwrap().id
    }

    fn rent_invoice(ledger: &mut Ledger, resident: ResidentId, period: &str, rent: i64) -> InvoiceId {
        let invoice = Invoice::issue(
            resident,
            BillingPeriod::Month(month(period)),
            Money::from_major(rent),
            Money::ZERO,
            Money::ZERO,
            Money::ZERO,
            date(2024, 1, 1),
        );
        ledger.insert_invoice(invoice).unwrap()
    }

    #[test]
    fn test_surplus_deposit_pays_everything_and_records_refund() {
        let mut ledger = Ledger::new();
        let ali = add_resident(&mut ledger, "Ali", 5_000);
        let jan = rent_invoice(&mut ledger, ali, "2024-01", 2_000);
        let feb = rent_invoice(&mut ledger, ali, "2024-02", 1_000);

        let preview = SettlementEngine::preview(&ledger, ali).unwrap();
        assert_eq!(preview.outstanding_dues, Money::from_major(3_000));
        assert_eq!(preview.net, Money::from_major(2_000));

        let settlement = SettlementEngine::execute(&mut ledger, ali, date(2024, 3, 15)).unwrap();
        assert_eq!(settlement.applied, Money::from_major(3_000));
        assert_eq!(settlement.net, Money::from_major(2_000));
        assert_eq!(settlement.settled_invoices, vec![jan, feb]);

        assert_eq!(ledger.invoice(jan).unwrap().status, InvoiceStatus::Paid);
        assert_eq!(ledger.invoice(feb).unwrap().status, InvoiceStatus::Paid);

        let expense_id = settlement.refund_expense.unwrap();
        let expense = ledger
            .expenses()
            .iter()
            .find(|e| e.id == expense_id)
            .unwrap();
        assert_eq!(expense.amount, Money::from_major(2_000));
        assert_eq!(expense.category, ExpenseCategory::Other);
        assert!(expense.title.starts_with("Security Refund - Ali"));
        let notes = expense.notes.as_deref().unwrap();
        assert!(notes.contains("Deposit: 5000"));
        assert!(notes.contains("Dues Deducted: 3000"));
        assert!(notes.contains("Settled Invs: #"));

        let resident = ledger.resident(ali).unwrap();
        assert_eq!(resident.status, ResidentStatus::Left);
        assert_eq!(resident.move_out, Some(date(2024, 3, 15)));
    }

    #[test]
    fn test_short_deposit_pays_oldest_first_and_leaves_shortfall() {
        let mut ledger = Ledger::new();
        let ali = add_resident(&mut ledger, "Ali", 1_000);
        // inserted newest first to prove ordering comes from the period
        let feb = rent_invoice(&mut ledger, ali, "2024-02", 1_500);
        let jan = rent_invoice(&mut ledger, ali, "2024-01", 1_500);

        let settlement = SettlementEngine::execute(&mut ledger, ali, date(2024, 3, 1)).unwrap();
        assert_eq!(settlement.net, Money::from_major(-2_000));
        assert_eq!(settlement.applied, Money::from_major(1_000));
        assert_eq!(settlement.settled_invoices, vec![jan]);
        assert!(settlement.refund_expense.is_none());
        assert!(ledger.expenses().is_empty());

        assert_eq!(
            ledger.invoice(jan).unwrap().status,
            InvoiceStatus::PartiallyPaid
        );
        assert_eq!(
            ledger.invoice(jan).unwrap().amount_paid,
            Money::from_major(1_000)
        );
        assert_eq!(ledger.invoice(feb).unwrap().status, InvoiceStatus::Unpaid);
    }

    #[test]
    fn test_deposit_invoice_settles_before_months() {
        let mut ledger = Ledger::new();
        let ali = add_resident(&mut ledger, "Ali", 800);
        let jan = rent_invoice(&mut ledger, ali, "2024-01", 1_000);
        let dep = ledger
            .insert_invoice(Invoice::issue(
                ali,
                BillingPeriod::SecurityDeposit,
                Money::ZERO,
                Money::ZERO,
                Money::from_major(500),
                Money::ZERO,
                date(2024, 1, 2),
            ))
            .unwrap();

        let settlement = SettlementEngine::execute(&mut ledger, ali, date(2024, 2, 1)).unwrap();
        // 500 clears the deposit invoice, the remaining 300 goes to january
        assert_eq!(settlement.settled_invoices, vec![dep, jan]);
        assert_eq!(ledger.invoice(dep).unwrap().status, InvoiceStatus::Paid);
        assert_eq!(
            ledger.invoice(jan).unwrap().amount_paid,
            Money::from_major(300)
        );
    }

    #[test]
    fn test_settlement_payments_use_deposit_method() {
        let mut ledger = Ledger::new();
        let ali = add_resident(&mut ledger, "Ali", 2_000);
        rent_invoice(&mut ledger, ali, "2024-01", 1_500);

        SettlementEngine::execute(&mut ledger, ali, date(2024, 2, 1)).unwrap();

        let payments: Vec<_> = ledger.payments_for(ali).collect();
        assert_eq!(payments.len(), 1);
        assert_eq!(payments[0].amount, Money::from_major(1_500));
        assert_eq!(payments[0].method, PaymentMethod::DepositSettlement);
        assert_eq!(payments[0].notes.as_deref(), Some(SETTLEMENT_NOTE));
    }

    #[test]
    fn test_move_out_frees_seat_and_closes_history() {
        let mut ledger = Ledger::new();
        let seat_id = seat(&mut ledger, "101", 4_000);
        let ali = add_resident(&mut ledger, "Ali", 4_000);
        OccupancyManager::assign(&mut ledger, ali, seat_id, None, date(2024, 1, 1)).unwrap();

        let settlement = SettlementEngine::execute(&mut ledger, ali, date(2024, 5, 31)).unwrap();

        assert!(ledger.seat(seat_id).unwrap().is_vacant());
        assert!(ledger.open_tenancy_of(ali).is_none());
        let stints: Vec<_> = ledger.tenancy_history_of(ali).collect();
        assert_eq!(stints.len(), 1);
        assert_eq!(stints[0].end_date, Some(date(2024, 5, 31)));
        assert_eq!(settlement.moved_out_on, date(2024, 5, 31));

        // deposit 4000 against the deposit invoice (4000) and january rent
        // (4000): the deposit invoice settles in full, rent stays unpaid
        assert_eq!(settlement.net, Money::from_major(-4_000));
        assert!(settlement.refund_expense.is_none());
    }

    #[test]
    fn test_move_out_of_left_resident_rejected() {
        let mut ledger = Ledger::new();
        let ali = add_resident(&mut ledger, "Ali", 1_000);
        SettlementEngine::execute(&mut ledger, ali, date(2024, 2, 1)).unwrap();

        let err = SettlementEngine::execute(&mut ledger, ali, date(2024, 2, 2)).unwrap_err();
        assert!(matches!(err, BillingError::ResidentNotActive { .. }));
        let missing = SettlementEngine::preview(&ledger, Uuid::new_v4()).unwrap_err();
        assert!(matches!(missing, BillingError::ResidentNotFound { .. }));
    }

    #[test]
    fn test_no_dues_full_refund() {
        let mut ledger = Ledger::new();
        let ali = add_resident(&mut ledger, "Ali", 3_000);

        let settlement = SettlementEngine::execute(&mut ledger, ali, date(2024, 2, 1)).unwrap();
        assert_eq!(settlement.applied, Money::ZERO);
        assert_eq!(settlement.net, Money::from_major(3_000));
        assert!(settlement.settled_invoices.is_empty());

        let expense_id = settlement.refund_expense.unwrap();
        let expense = ledger
            .expenses()
            .iter()
            .find(|e| e.id == expense_id)
            .unwrap();
        let notes = expense.notes.as_deref().unwrap();
        assert!(!notes.contains("Settled Invs"));
    }
}
