//! Billing infrastructure - invoice generation and settlement

mod service;

pub use service::{BillingConfig, InvoiceService};
