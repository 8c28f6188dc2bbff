use crate::decimal::Money;
use crate::errors::{BillingError, Result};
use crate::ledger::Ledger;
use crate::records::{Invoice, Payment, Resident, TenancyRecord};
use crate::types::{BillingPeriod, Month, ResidentId};

/// seat utilization at a point in time
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancySnapshot {
    pub total_seats: usize,
    pub occupied_seats: usize,
    pub active_residents: usize,
    /// occupied share as a whole percentage; zero when there are no seats
    pub occupancy_rate: u32,
}

/// money movement for one calendar month. billed and collected read the
/// month's invoices (collected counts later payments against them too);
/// income and expenses read rows dated within the month.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyFinancials {
    pub month: Month,
    pub billed: Money,
    pub collected: Money,
    pub income: Money,
    pub expenses: Money,
}

/// a resident and their total unpaid invoice balance
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDues {
    pub resident_id: ResidentId,
    pub name: String,
    pub outstanding: Money,
}

/// everything on file for one resident, for history display
#[derive(Debug, Clone, PartialEq)]
pub struct ResidentStatement<'a> {
    pub resident: &'a Resident,
    pub stints: Vec<&'a TenancyRecord>,
    pub invoices: Vec<&'a Invoice>,
    pub payments: Vec<&'a Payment>,
}

/// read-only views over the ledger
pub struct Reports<'a> {
    ledger: &'a Ledger,
}

impl<'a> Reports<'a> {
    pub fn new(ledger: &'a Ledger) -> Self {
        Reports { ledger }
    }

    pub fn occupancy(&self) -> OccupancySnapshot {
        let total_seats = self.ledger.seats().len();
        let occupied_seats = self
            .ledger
            .seats()
            .iter()
            .filter(|s| !s.is_vacant())
            .count();
        let active_residents = self.ledger.active_residents().count();
        let occupancy_rate = if total_seats == 0 {
            0
        } else {
            ((occupied_seats * 100 + total_seats / 2) / total_seats) as u32
        };
        OccupancySnapshot {
            total_seats,
            occupied_seats,
            active_residents,
            occupancy_rate,
        }
    }

    pub fn monthly_financials(&self, month: Month) -> MonthlyFinancials {
        let period = BillingPeriod::Month(month);
        let mut billed = Money::ZERO;
        let mut collected = Money::ZERO;
        for invoice in self.ledger.invoices() {
            if invoice.period == period {
                billed += invoice.total_due;
                collected += invoice.amount_paid;
            }
        }
        let income = self
            .ledger
            .payments()
            .iter()
            .filter(|p| month.contains(p.date))
            .map(|p| p.amount)
            .sum();
        let expenses = self
            .ledger
            .expenses()
            .iter()
            .filter(|e| month.contains(e.date))
            .map(|e| e.amount)
            .sum();
        MonthlyFinancials {
            month,
            billed,
            collected,
            income,
            expenses,
        }
    }

    /// residents carrying unpaid balances, largest first, at most `limit`
    pub fn top_pending_dues(&self, limit: usize) -> Vec<PendingDues> {
        let mut pending: Vec<PendingDues> = self
            .ledger
            .residents()
            .iter()
            .filter_map(|r| {
                let outstanding: Money = self
                    .ledger
                    .unpaid_invoices(r.id)
                    .map(|i| i.outstanding())
                    .sum();
                outstanding.is_positive().then(|| PendingDues {
                    resident_id: r.id,
                    name: r.name.clone(),
                    outstanding,
                })
            })
            .collect();
        pending.sort_by(|a, b| b.outstanding.cmp(&a.outstanding));
        pending.truncate(limit);
        pending
    }

    /// full statement for one resident. invoices come back in period order
    /// (deposit first) and payments in date order.
    pub fn resident_statement(&self, resident_id: ResidentId) -> Result<ResidentStatement<'a>> {
        let resident = self
            .ledger
            .resident(resident_id)
            .ok_or(BillingError::ResidentNotFound { id: resident_id })?;
        let stints: Vec<&TenancyRecord> = self.ledger.tenancy_history_of(resident_id).collect();
        let mut invoices: Vec<&Invoice> = self.ledger.invoices_for(resident_id).collect();
        invoices.sort_by_key(|i| i.period);
        let mut payments: Vec<&Payment> = self.ledger.payments_for(resident_id).collect();
        payments.sort_by_key(|p| p.date);
        Ok(ResidentStatement {
            resident,
            stints,
            invoices,
            payments,
        })
    }
}
