use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{BillingError, Result};
use crate::ledger::Ledger;
use crate::types::{BillingPeriod, Month, ResidentId};

/// aggregated billable activity for one resident and one month
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChargeBreakdown {
    pub rent: Money,
    pub mess_total: Money,
    pub custom_total: Money,
}

impl ChargeBreakdown {
    pub fn total(&self) -> Money {
        self.rent + self.mess_total + self.custom_total
    }
}

/// computes charges from raw activity records; read-only
pub struct ChargeAggregator<'a> {
    ledger: &'a Ledger,
}

impl<'a> ChargeAggregator<'a> {
    pub fn new(ledger: &'a Ledger) -> Self {
        ChargeAggregator { ledger }
    }

    /// rent, mess and custom totals for the month. a seatless resident
    /// aggregates zero rent rather than being skipped.
    pub fn charges_for(&self, resident_id: ResidentId, month: Month) -> Result<ChargeBreakdown> {
        if self.ledger.resident(resident_id).is_none() {
            return Err(BillingError::ResidentNotFound { id: resident_id });
        }

        let rent = self
            .ledger
            .seat_of(resident_id)
            .map(|s| s.rent)
            .unwrap_or(Money::ZERO);
        let mess_total = self
            .ledger
            .attendance_in(resident_id, month)
            .map(|a| a.day_total())
            .sum();
        let custom_total = self
            .ledger
            .charges_in(resident_id, month)
            .map(|c| c.amount)
            .sum();

        Ok(ChargeBreakdown {
            rent,
            mess_total,
            custom_total,
        })
    }

    /// balance carried from months strictly earlier than the target,
    /// summed unfloored so an overpaid month carries forward as credit.
    /// deposit invoices have no ordering relation to months and never
    /// participate.
    pub fn prev_dues(&self, resident_id: ResidentId, before: Month) -> Money {
        self.ledger
            .invoices_for(resident_id)
            .filter_map(|i| match i.period {
                BillingPeriod::Month(m) if m < before => Some(i.total_due - i.amount_paid),
                _ => None,
            })
            .sum()
    }
}
