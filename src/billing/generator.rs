use chrono::NaiveDate;

use crate::charges::ChargeAggregator;
use crate::errors::{BillingError, Result};
use crate::ledger::Ledger;
use crate::records::Invoice;
use crate::types::{BillingPeriod, Month, ResidentId};

/// outcome of one generation run
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub period: Month,
    pub generated: u32,
    pub skipped: u32,
    pub errors: Vec<GenerationFailure>,
}

/// a resident the batch could not invoice
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationFailure {
    pub resident_id: ResidentId,
    pub reason: String,
}

/// creates one invoice per active resident for a billing month
pub struct InvoiceGenerator {
    period: Month,
}

impl InvoiceGenerator {
    pub fn new(period: Month) -> Self {
        InvoiceGenerator { period }
    }

    /// idempotent batch: residents already invoiced for the period are
    /// skipped, and failures are collected per resident rather than
    /// aborting the run. re-running completes a partially finished batch.
    pub fn generate(&self, ledger: &mut Ledger, issued_on: NaiveDate) -> GenerationReport {
        let mut report = GenerationReport {
            period: self.period,
            generated: 0,
            skipped: 0,
            errors: Vec::new(),
        };
        let period = BillingPeriod::Month(self.period);
        let active: Vec<ResidentId> = ledger.active_residents().map(|r| r.id).collect();

        for resident_id in active {
            if ledger.invoice_for_period(resident_id, period).is_some() {
                report.skipped += 1;
                continue;
            }
            match self.issue_for(ledger, resident_id, issued_on) {
                Ok(()) => report.generated += 1,
                // uniqueness backstop closes the pre-check/insert gap
                Err(BillingError::DuplicateInvoice { .. }) => report.skipped += 1,
                Err(err) => report.errors.push(GenerationFailure {
                    resident_id,
                    reason: err.to_string(),
                }),
            }
        }
        report
    }

    fn issue_for(
        &self,
        ledger: &mut Ledger,
        resident_id: ResidentId,
        issued_on: NaiveDate,
    ) -> Result<()> {
        let aggregator = ChargeAggregator::new(ledger);
        let breakdown = aggregator.charges_for(resident_id, self.period)?;
        let prev_dues = aggregator.prev_dues(resident_id, self.period);

        let invoice = Invoice::issue(
            resident_id,
            BillingPeriod::Month(self.period),
            breakdown.rent,
            breakdown.mess_total,
            breakdown.custom_total,
            prev_dues,
            issued_on,
        );
        ledger.insert_invoice(invoice)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::decimal::Money;
    use crate::records::{NewCharge, Resident};
    use crate::types::{ChargeType, InvoiceStatus, Meal, ResidentStatus, RoomType, SeatId};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn month(s: &str) -> Month {
        s.parse().unwrap()
    }

    fn add_resident(ledger: &mut Ledger, name: &str, status: ResidentStatus) -> ResidentId {
        ledger
            .insert_resident(Resident {
                id: Uuid::new_v4(),
                name: name.to_string(),
                cnic: "35202-1111111-1".to_string(),
                phone: None,
                guardian_phone: None,
                move_in: date(2024, 1, 1),
                move_out: None,
                deposit: Money::ZERO,
                status,
            })
            .unwrap()
    }

    fn seat_with_rent(ledger: &mut Ledger, number: &str, rent: i64) -> SeatId {
        let room_id = ledger
            .add_room(number, RoomType::TwoSeater, Money::from_major(rent))
            .unwrap();
        ledger.seats_in(room_id).next().unwrap().id
    }

    #[test]
    fn test_generates_only_for_active_residents() {
        let mut ledger = Ledger::new();
        let seat = seat_with_rent(&mut ledger, "101", 5_000);
        let ali = add_resident(&mut ledger, "Ali", ResidentStatus::Active);
        add_resident(&mut ledger, "Gone", ResidentStatus::Left);
        ledger.occupy_seat(seat, ali).unwrap();

        let report = InvoiceGenerator::new(month("2024-02"))
            .generate(&mut ledger, date(2024, 2, 1));
        assert_eq!(report.generated, 1);
        assert_eq!(report.skipped, 0);
        assert!(report.errors.is_empty());
        assert_eq!(ledger.invoices().len(), 1);

        let invoice = &ledger.invoices()[0];
        assert_eq!(invoice.resident_id, ali);
        assert_eq!(invoice.room_rent, Money::from_major(5_000));
        assert_eq!(invoice.total_due, Money::from_major(5_000));
        assert_eq!(invoice.status, InvoiceStatus::Unpaid);
    }

    #[test]
    fn test_generation_is_idempotent() {
        let mut ledger = Ledger::new();
        let seat = seat_with_rent(&mut ledger, "101", 5_000);
        let ali = add_resident(&mut ledger, "Ali", ResidentStatus::Active);
        ledger.occupy_seat(seat, ali).unwrap();

        let generator = InvoiceGenerator::new(month("2024-02"));
        let first = generator.generate(&mut ledger, date(2024, 2, 1));
        assert_eq!(first.generated, 1);

        let snapshot = ledger.invoices().to_vec();
        let second = generator.generate(&mut ledger, date(2024, 2, 2));
        assert_eq!(second.generated, 0);
        assert_eq!(second.skipped, 1);
        // no duplicates and no mutation of the first run's invoices
        assert_eq!(ledger.invoices(), snapshot.as_slice());
    }

    #[test]
    fn test_carry_forward_snapshots_prior_outstanding() {
        let mut ledger = Ledger::new();
        let seat = seat_with_rent(&mut ledger, "101", 1_000);
        let ali = add_resident(&mut ledger, "Ali", ResidentStatus::Active);
        ledger.occupy_seat(seat, ali).unwrap();

        // january invoice left half paid
        let mut jan = Invoice::issue(
            ali,
            BillingPeriod::Month(month("2024-01")),
            Money::from_major(1_000),
            Money::ZERO,
            Money::ZERO,
            Money::ZERO,
            date(2024, 1, 1),
        );
        jan.register_payment(Money::from_major(500));
        ledger.insert_invoice(jan).unwrap();

        let report = InvoiceGenerator::new(month("2024-02"))
            .generate(&mut ledger, date(2024, 2, 1));
        assert_eq!(report.generated, 1);

        let feb = ledger
            .invoice_for_period(ali, BillingPeriod::Month(month("2024-02")))
            .unwrap();
        assert_eq!(feb.prev_dues, Money::from_major(500));
        assert_eq!(feb.total_due, Money::from_major(1_500));
    }

    #[test]
    fn test_zero_due_invoice_generated_paid() {
        let mut ledger = Ledger::new();
        // seatless, no activity: still invoiced, at zero, already Paid
        let ali = add_resident(&mut ledger, "Ali", ResidentStatus::Active);

        let report = InvoiceGenerator::new(month("2024-02"))
            .generate(&mut ledger, date(2024, 2, 1));
        assert_eq!(report.generated, 1);

        let invoice = ledger
            .invoice_for_period(ali, BillingPeriod::Month(month("2024-02")))
            .unwrap();
        assert!(invoice.total_due.is_zero());
        assert_eq!(invoice.status, InvoiceStatus::Paid);
    }

    #[test]
    fn test_invoice_composes_all_charge_sources() {
        let mut ledger = Ledger::new();
        let seat = seat_with_rent(&mut ledger, "101", 4_500);
        let ali = add_resident(&mut ledger, "Ali", ResidentStatus::Active);
        ledger.occupy_seat(seat, ali).unwrap();

        ledger
            .upsert_meal_cost(ali, date(2024, 2, 3), Meal::Lunch, Money::from_major(120))
            .unwrap();
        ledger
            .upsert_meal_cost(ali, date(2024, 2, 4), Meal::Dinner, Money::from_major(100))
            .unwrap();
        ledger
            .add_charge(NewCharge {
                resident_id: ali,
                date: date(2024, 2, 10),
                charge_type: ChargeType::Electricity,
                amount: Money::from_major(350),
                notes: None,
            })
            .unwrap();

        InvoiceGenerator::new(month("2024-02")).generate(&mut ledger, date(2024, 2, 28));

        let invoice = ledger
            .invoice_for_period(ali, BillingPeriod::Month(month("2024-02")))
            .unwrap();
        assert_eq!(invoice.room_rent, Money::from_major(4_500));
        assert_eq!(invoice.mess_total, Money::from_major(220));
        assert_eq!(invoice.custom_total, Money::from_major(350));
        assert_eq!(
            invoice.total_due,
            invoice.room_rent + invoice.mess_total + invoice.custom_total + invoice.prev_dues
        );
    }
}
