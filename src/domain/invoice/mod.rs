//! Invoice domain

mod entity;

pub use entity::{
    calculate_tax_micros, invoice_number, Invoice, InvoiceDraft, InvoiceId, InvoiceLineItem,
    InvoiceStatus,
};
