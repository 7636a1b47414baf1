//! Gateway Console API
//!
//! Backend of an AI-gateway console:
//! - Accounts with e-mail verification and JWT sessions
//! - Projects with role-based permissions and project-scoped API keys
//! - A mock OpenAI-compatible gateway with usage and cost tracking
//! - Alerts, cost alerts, invoices and an audit trail

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::info;

use api::state::{AppState, AppStateParts};
use domain::model::default_catalog;
use infrastructure::alert::ChannelNotifier;
use infrastructure::email::create_mailer;
use infrastructure::observability::PrometheusMetrics;
use infrastructure::storage::StorageFactory;

/// Connect storage and assemble every service from configuration
pub async fn create_app_state_with_config(
    config: &AppConfig,
    metrics: Option<PrometheusMetrics>,
) -> anyhow::Result<AppState> {
    let storage_config = config.storage_config()?;
    info!(backend = %storage_config.storage_type(), "Connecting storage");

    let backend = StorageFactory::connect(&storage_config).await?;
    let mailer = create_mailer(&config.email)?;
    let notifier = ChannelNotifier::new(mailer.clone())?;
    let catalog = default_catalog();

    info!(
        providers = catalog.providers().len(),
        models = catalog.enabled_models().len(),
        "Model catalog loaded"
    );

    Ok(AppState::from_parts(AppStateParts {
        backend,
        mailer,
        notifier: Arc::new(notifier),
        jwt: config.jwt_config(),
        verification: config.verification_settings(),
        billing: config.billing.clone(),
        catalog,
        metrics,
    }))
}

/// In-memory state with default settings
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default(), None).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use infrastructure::storage::StorageType;

    #[tokio::test]
    async fn test_default_state_uses_memory_storage() {
        let state = create_app_state().await.unwrap();

        assert_eq!(state.backend.storage_type(), StorageType::InMemory);
        assert!(!state.catalog.enabled_models().is_empty());
    }
}
