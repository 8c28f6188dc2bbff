use chrono::NaiveDate;

use crate::decimal::Money;
use crate::errors::{BillingError, Result};
use crate::ledger::Ledger;
use crate::records::Invoice;
use crate::types::{BillingPeriod, InvoiceId, Month, ResidentId, SeatId, TenancyId};

/// what a seat assignment produced
#[derive(Debug, Clone, PartialEq)]
pub struct AssignmentOutcome {
    pub seat_id: SeatId,
    pub tenancy_id: TenancyId,
    /// the seat freed by a transfer; None on a fresh assignment
    pub transferred_from: Option<SeatId>,
    pub deposit_invoice: Option<InvoiceId>,
    pub rent_invoice: Option<InvoiceId>,
}

/// snapshot of the seat a resident was released from
#[derive(Debug, Clone, PartialEq)]
pub struct ReleasedSeat {
    pub seat_id: SeatId,
    pub room_number: String,
    pub seat_number: u32,
}

/// seat assignment, transfer and release, with the move-in invoice path
pub struct OccupancyManager;

impl OccupancyManager {
    /// assign a resident to a vacant seat.
    ///
    /// a resident already seated elsewhere is transferred: the old seat is
    /// freed, its tenancy record closed, a new one opened, and no invoices
    /// are issued. a fresh assignment opens a tenancy record and issues the
    /// security-deposit invoice (at most once per tenancy) plus the
    /// current-month rent invoice when one does not already exist.
    pub fn assign(
        ledger: &mut Ledger,
        resident_id: ResidentId,
        seat_id: SeatId,
        rent: Option<Money>,
        today: NaiveDate,
    ) -> Result<AssignmentOutcome> {
        let resident = ledger
            .resident(resident_id)
            .ok_or(BillingError::ResidentNotFound { id: resident_id })?;
        if !resident.is_active() {
            return Err(BillingError::ResidentNotActive {
                resident_id,
                status: resident.status,
            });
        }
        let deposit = resident.deposit;

        if let Some(rent) = rent {
            if rent.is_negative() {
                return Err(BillingError::InvalidAmount { amount: rent });
            }
        }

        // every check precedes the first write, so a rejection leaves
        // nothing behind
        let target = ledger
            .seat(seat_id)
            .ok_or(BillingError::SeatNotFound { id: seat_id })?;
        if !target.is_vacant() {
            return Err(BillingError::SeatOccupied { seat_id });
        }
        let room_id = target.room_id;
        let seat_number = target.seat_number;
        let effective_rent = rent.unwrap_or(target.rent);
        let room_number = ledger
            .room(room_id)
            .ok_or_else(|| BillingError::Persistence {
                message: format!("seat {seat_id} references a missing room"),
            })?
            .number
            .clone();

        let previous = ledger.seat_of(resident_id).map(|s| s.id);
        if let Some(old_seat) = previous {
            ledger.vacate_seat(old_seat)?;
            ledger.close_tenancy(resident_id, today)?;
        }
        ledger.occupy_seat(seat_id, resident_id)?;
        if let Some(rent) = rent {
            ledger.set_seat_rent(seat_id, rent)?;
        }
        let tenancy_id = ledger.open_tenancy(resident_id, room_number, seat_number, today)?;

        // move-in invoices apply to fresh assignments only; a transfer
        // carries its existing invoices
        let mut deposit_invoice = None;
        let mut rent_invoice = None;
        if previous.is_none() {
            if deposit.is_positive() && ledger.deposit_invoice_in_tenancy(resident_id).is_none() {
                let invoice = Invoice::issue(
                    resident_id,
                    BillingPeriod::SecurityDeposit,
                    Money::ZERO,
                    Money::ZERO,
                    deposit,
                    Money::ZERO,
                    today,
                );
                deposit_invoice = Some(ledger.insert_invoice(invoice)?);
            }

            let month = BillingPeriod::Month(Month::from_date(today));
            if effective_rent.is_positive()
                && ledger.invoice_for_period(resident_id, month).is_none()
            {
                let invoice = Invoice::issue(
                    resident_id,
                    month,
                    effective_rent,
                    Money::ZERO,
                    Money::ZERO,
                    Money::ZERO,
                    today,
                );
                rent_invoice = Some(ledger.insert_invoice(invoice)?);
            }
        }

        Ok(AssignmentOutcome {
            seat_id,
            tenancy_id,
            transferred_from: previous,
            deposit_invoice,
            rent_invoice,
        })
    }

    /// free the resident's seat, if any, and close the open tenancy record.
    /// the seat keeps its rent for the next occupant.
    pub fn release(
        ledger: &mut Ledger,
        resident_id: ResidentId,
        today: NaiveDate,
    ) -> Result<Option<ReleasedSeat>> {
        if ledger.resident(resident_id).is_none() {
            return Err(BillingError::ResidentNotFound { id: resident_id });
        }

        let seat = ledger
            .seat_of(resident_id)
            .map(|s| (s.id, s.room_id, s.seat_number));
        let released = match seat {
            Some((seat_id, room_id, seat_number)) => {
                let room_number = ledger
                    .room(room_id)
                    .ok_or_else(|| BillingError::Persistence {
                        message: format!("seat {seat_id} references a missing room"),
                    })?
                    .number
                    .clone();
                ledger.vacate_seat(seat_id)?;
                Some(ReleasedSeat {
                    seat_id,
                    room_number,
                    seat_number,
                })
            }
            None => None,
        };
        ledger.close_tenancy(resident_id, today)?;
        Ok(released)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::records::Resident;
    use crate::types::{InvoiceStatus, ResidentStatus, RoomType};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn add_resident(ledger: &mut Ledger, name: &str, deposit: i64) -> ResidentId {
        ledger
            .insert_resident(Resident {
                id: Uuid::new_v4(),
                name: name.to_string(),
                cnic: "35202-1111111-1".to_string(),
                phone: None,
                guardian_phone: None,
                move_in: date(2024, 1, 10),
                move_out: None,
                deposit: Money::from_major(deposit),
                status: ResidentStatus::Active,
            })
            .unwrap()
    }

    fn two_seats(ledger: &mut Ledger, number: &str, rent: i64) -> (SeatId, SeatId) {
        let room_id = ledger
            .add_room(number, RoomType::TwoSeater, Money::from_major(rent))
            .unwrap();
        let mut seats = ledger.seats_in(room_id);
        let first = seats.next().unwrap().id;
        let second = seats.next().unwrap().id;
        (first, second)
    }

    #[test]
    fn test_fresh_assignment_issues_deposit_and_rent_invoices() {
        let mut ledger = Ledger::new();
        let (seat, _) = two_seats(&mut ledger, "101", 4_500);
        let ali = add_resident(&mut ledger, "Ali", 5_000);

        let outcome =
            OccupancyManager::assign(&mut ledger, ali, seat, None, date(2024, 1, 10)).unwrap();

        assert_eq!(ledger.seat_of(ali).unwrap().id, seat);
        assert!(outcome.transferred_from.is_none());

        let stint = ledger.open_tenancy_of(ali).unwrap();
        assert_eq!(stint.room_number, "101");
        assert_eq!(stint.seat_number, 1);

        let deposit = ledger.invoice(outcome.deposit_invoice.unwrap()).unwrap();
        assert_eq!(deposit.period, BillingPeriod::SecurityDeposit);
        assert_eq!(deposit.custom_total, Money::from_major(5_000));
        assert_eq!(deposit.total_due, Money::from_major(5_000));
        assert_eq!(deposit.status, InvoiceStatus::Unpaid);

        let rent = ledger.invoice(outcome.rent_invoice.unwrap()).unwrap();
        assert_eq!(rent.period, "2024-01".parse().unwrap());
        assert_eq!(rent.room_rent, Money::from_major(4_500));
        assert_eq!(rent.prev_dues, Money::ZERO);
    }

    #[test]
    fn test_rent_override_updates_seat_and_invoice() {
        let mut ledger = Ledger::new();
        let (seat, _) = two_seats(&mut ledger, "101", 4_500);
        let ali = add_resident(&mut ledger, "Ali", 0);

        let outcome = OccupancyManager::assign(
            &mut ledger,
            ali,
            seat,
            Some(Money::from_major(6_000)),
            date(2024, 1, 10),
        )
        .unwrap();

        assert_eq!(ledger.seat(seat).unwrap().rent, Money::from_major(6_000));
        assert!(outcome.deposit_invoice.is_none());
        let rent = ledger.invoice(outcome.rent_invoice.unwrap()).unwrap();
        assert_eq!(rent.room_rent, Money::from_major(6_000));
    }

    #[test]
    fn test_transfer_moves_seat_without_new_invoices() {
        let mut ledger = Ledger::new();
        let (first, second) = two_seats(&mut ledger, "101", 4_500);
        let ali = add_resident(&mut ledger, "Ali", 5_000);
        OccupancyManager::assign(&mut ledger, ali, first, None, date(2024, 1, 10)).unwrap();
        let invoices_before = ledger.invoices().len();

        let outcome =
            OccupancyManager::assign(&mut ledger, ali, second, None, date(2024, 3, 1)).unwrap();

        assert_eq!(outcome.transferred_from, Some(first));
        assert!(outcome.deposit_invoice.is_none());
        assert!(outcome.rent_invoice.is_none());
        assert_eq!(ledger.invoices().len(), invoices_before);

        assert!(ledger.seat(first).unwrap().is_vacant());
        assert_eq!(ledger.seat_of(ali).unwrap().id, second);

        let stints: Vec<_> = ledger.tenancy_history_of(ali).collect();
        assert_eq!(stints.len(), 2);
        assert_eq!(stints[0].end_date, Some(date(2024, 3, 1)));
        assert_eq!(stints[1].start_date, date(2024, 3, 1));
        assert!(stints[1].is_open());
    }

    #[test]
    fn test_occupied_seat_rejected_without_side_effects() {
        let mut ledger = Ledger::new();
        let (seat, _) = two_seats(&mut ledger, "101", 4_500);
        let ali = add_resident(&mut ledger, "Ali", 5_000);
        let sara = add_resident(&mut ledger, "Sara", 5_000);
        OccupancyManager::assign(&mut ledger, ali, seat, None, date(2024, 1, 10)).unwrap();
        let invoices_before = ledger.invoices().len();

        let err =
            OccupancyManager::assign(&mut ledger, sara, seat, None, date(2024, 1, 11)).unwrap_err();

        assert!(matches!(err, BillingError::SeatOccupied { .. }));
        assert!(ledger.seat_of(sara).is_none());
        assert!(ledger.open_tenancy_of(sara).is_none());
        assert_eq!(ledger.invoices().len(), invoices_before);
    }

    #[test]
    fn test_reassignment_in_same_tenancy_skips_move_in_invoices() {
        let mut ledger = Ledger::new();
        let (first, second) = two_seats(&mut ledger, "101", 4_500);
        let ali = add_resident(&mut ledger, "Ali", 5_000);
        OccupancyManager::assign(&mut ledger, ali, first, None, date(2024, 1, 10)).unwrap();
        OccupancyManager::release(&mut ledger, ali, date(2024, 1, 15)).unwrap();
        let invoices_before = ledger.invoices().len();

        // still Active, same move_in: the deposit and january rent invoices
        // already exist for this tenancy
        let outcome =
            OccupancyManager::assign(&mut ledger, ali, second, None, date(2024, 1, 20)).unwrap();

        assert!(outcome.deposit_invoice.is_none());
        assert!(outcome.rent_invoice.is_none());
        assert_eq!(ledger.invoices().len(), invoices_before);
    }

    #[test]
    fn test_release_frees_seat_and_closes_history() {
        let mut ledger = Ledger::new();
        let (seat, _) = two_seats(&mut ledger, "101", 4_500);
        let ali = add_resident(&mut ledger, "Ali", 0);
        OccupancyManager::assign(&mut ledger, ali, seat, None, date(2024, 1, 10)).unwrap();

        let released = OccupancyManager::release(&mut ledger, ali, date(2024, 6, 30))
            .unwrap()
            .unwrap();
        assert_eq!(released.room_number, "101");
        assert_eq!(released.seat_number, 1);
        assert!(ledger.seat(seat).unwrap().is_vacant());
        assert_eq!(ledger.seat(seat).unwrap().rent, Money::from_major(4_500));

        let stint = ledger.tenancy_history_of(ali).next().unwrap();
        assert_eq!(stint.end_date, Some(date(2024, 6, 30)));
        assert!(ledger.open_tenancy_of(ali).is_none());

        // a seatless release is a quiet no-op
        let again = OccupancyManager::release(&mut ledger, ali, date(2024, 7, 1)).unwrap();
        assert!(again.is_none());
    }

    #[test]
    fn test_left_resident_cannot_be_assigned() {
        let mut ledger = Ledger::new();
        let (seat, _) = two_seats(&mut ledger, "101", 4_500);
        let ali = add_resident(&mut ledger, "Ali", 5_000);
        ledger.mark_left(ali, date(2024, 2, 1)).unwrap();

        let err =
            OccupancyManager::assign(&mut ledger, ali, seat, None, date(2024, 2, 2)).unwrap_err();
        assert!(matches!(err, BillingError::ResidentNotActive { .. }));
    }
}
