//! Audit infrastructure - recording and listing audit entries

mod service;

pub use service::{AuditPage, AuditService, DEFAULT_AUDIT_PAGE_SIZE, MAX_AUDIT_PAGE_SIZE};
