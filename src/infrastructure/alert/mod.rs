//! Alert infrastructure - alert management, evaluation and notification

mod notifier;
mod service;

#[cfg(test)]
pub use notifier::MockAlertNotifier;
pub use notifier::{AlertNotifier, ChannelNotifier, EVENT_HEADER, SIGNATURE_HEADER};
pub use service::{
    AlertService, AlertStores, ChannelsRequest, CreateAlertRequest, CreateCostAlertRequest,
    UpdateAlertRequest, UpdateCostAlertRequest,
};
