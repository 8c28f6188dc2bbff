pub mod generator;
pub mod payment;

pub use generator::{GenerationFailure, GenerationReport, InvoiceGenerator};
pub use payment::{PaymentProcessor, PaymentReceipt, PaymentRequest};
