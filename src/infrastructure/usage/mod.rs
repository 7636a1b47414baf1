//! Usage infrastructure - usage recording and reporting

mod service;

pub use service::UsageService;
