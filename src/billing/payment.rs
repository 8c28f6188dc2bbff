use chrono::NaiveDate;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::{BillingError, Result};
use crate::ledger::Ledger;
use crate::records::{Invoice, Payment};
use crate::types::{InvoiceId, PaymentMethod};

/// payment application request
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRequest {
    pub invoice_id: InvoiceId,
    pub amount: Money,
    pub date: NaiveDate,
    pub method: PaymentMethod,
    pub notes: Option<String>,
}

/// snapshots of the recorded payment and the invoice it updated
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentReceipt {
    pub invoice: Invoice,
    pub payment: Payment,
}

/// applies monetary payments against invoices
pub struct PaymentProcessor;

impl PaymentProcessor {
    /// record an immutable payment row and update its invoice as one unit.
    /// validation precedes both writes so a rejected request leaves no
    /// trace. overpayment is accepted; status saturates at Paid.
    pub fn apply(ledger: &mut Ledger, request: PaymentRequest) -> Result<PaymentReceipt> {
        if !request.amount.is_positive() {
            return Err(BillingError::InvalidAmount {
                amount: request.amount,
            });
        }
        let resident_id = ledger
            .invoice(request.invoice_id)
            .ok_or(BillingError::InvoiceNotFound {
                id: request.invoice_id,
            })?
            .resident_id;

        let payment = Payment {
            id: Uuid::new_v4(),
            resident_id,
            invoice_id: Some(request.invoice_id),
            amount: request.amount,
            date: request.date,
            method: request.method,
            notes: request.notes,
        };
        ledger.insert_payment(payment.clone());
        let invoice = ledger.register_invoice_payment(request.invoice_id, request.amount)?;

        Ok(PaymentReceipt { invoice, payment })
    }
}
