//! Application state for shared services

use std::sync::Arc;

use crate::domain::alert::{Alert, CostAlert};
use crate::domain::api_key::ApiKey;
use crate::domain::audit::AuditLog;
use crate::domain::invoice::Invoice;
use crate::domain::model::ModelCatalog;
use crate::domain::project::{Permission, Project, ProjectId};
use crate::domain::usage::UsageRecord;
use crate::domain::user::User;
use crate::infrastructure::alert::{AlertNotifier, AlertService, AlertStores};
use crate::infrastructure::api_key::{ApiKeyService, StorageApiKeyRepository};
use crate::infrastructure::audit::AuditService;
use crate::infrastructure::auth::{JwtConfig, JwtGenerator, JwtService};
use crate::infrastructure::billing::{BillingConfig, InvoiceService};
use crate::infrastructure::email::Mailer;
use crate::infrastructure::gateway::GatewayService;
use crate::infrastructure::observability::PrometheusMetrics;
use crate::infrastructure::project::{ProjectDependents, ProjectService};
use crate::infrastructure::storage::{tables, StorageBackend};
use crate::infrastructure::usage::UsageService;
use crate::infrastructure::user::{
    Argon2Hasher, StorageUserRepository, UserService, VerificationSettings,
};

use super::types::ApiError;

pub type ConsoleUserService = UserService<StorageUserRepository, Argon2Hasher>;
pub type ConsoleApiKeyService = ApiKeyService<StorageApiKeyRepository>;

/// Everything needed to assemble the application state
#[derive(Debug)]
pub struct AppStateParts {
    pub backend: StorageBackend,
    pub mailer: Arc<dyn Mailer>,
    pub notifier: Arc<dyn AlertNotifier>,
    pub jwt: JwtConfig,
    pub verification: VerificationSettings,
    pub billing: BillingConfig,
    pub catalog: ModelCatalog,
    pub metrics: Option<PrometheusMetrics>,
}

/// Application state shared by all handlers
#[derive(Debug, Clone)]
pub struct AppState {
    pub backend: StorageBackend,
    pub jwt_service: Arc<dyn JwtGenerator>,
    pub user_service: Arc<ConsoleUserService>,
    pub project_service: Arc<ProjectService>,
    pub api_key_service: Arc<ConsoleApiKeyService>,
    pub usage_service: Arc<UsageService>,
    pub alert_service: Arc<AlertService>,
    pub invoice_service: Arc<InvoiceService>,
    pub audit_service: Arc<AuditService>,
    pub gateway_service: Arc<GatewayService>,
    pub catalog: Arc<ModelCatalog>,
    pub metrics: Option<PrometheusMetrics>,
}

impl AppState {
    /// Wire the services on top of one storage backend
    pub fn from_parts(parts: AppStateParts) -> Self {
        let backend = parts.backend;

        // each storage is created once so every service sees the same data
        let users = backend.storage::<User>(tables::USERS);
        let projects = backend.storage::<Project>(tables::PROJECTS);
        let api_keys = backend.storage::<ApiKey>(tables::API_KEYS);
        let usage_records = backend.storage::<UsageRecord>(tables::USAGE_RECORDS);
        let alerts = backend.storage::<Alert>(tables::ALERTS);
        let cost_alerts = backend.storage::<CostAlert>(tables::COST_ALERTS);
        let invoices = backend.storage::<Invoice>(tables::INVOICES);
        let audit_logs = backend.storage::<AuditLog>(tables::AUDIT_LOGS);

        let user_service = Arc::new(
            UserService::new(
                Arc::new(StorageUserRepository::new(users.clone())),
                Arc::new(Argon2Hasher::new()),
                parts.mailer,
            )
            .with_verification(parts.verification),
        );

        let project_service = Arc::new(ProjectService::new(
            projects.clone(),
            users,
            ProjectDependents {
                api_keys: api_keys.clone(),
                alerts: alerts.clone(),
                cost_alerts: cost_alerts.clone(),
            },
        ));

        let api_key_service = Arc::new(ApiKeyService::new(Arc::new(
            StorageApiKeyRepository::new(api_keys),
        )));

        let usage_service = Arc::new(UsageService::new(usage_records));

        let alert_service = Arc::new(AlertService::new(
            AlertStores {
                alerts,
                cost_alerts,
                projects,
            },
            usage_service.clone(),
            parts.notifier,
        ));

        let invoice_service = Arc::new(InvoiceService::new(
            invoices,
            usage_service.clone(),
            parts.billing,
        ));

        let catalog = Arc::new(parts.catalog);
        let gateway_service = Arc::new(GatewayService::new(
            catalog.clone(),
            usage_service.clone(),
            alert_service.clone(),
        ));

        Self {
            backend,
            jwt_service: Arc::new(JwtService::new(parts.jwt)),
            user_service,
            project_service,
            api_key_service,
            usage_service,
            alert_service,
            invoice_service,
            audit_service: Arc::new(AuditService::new(audit_logs)),
            gateway_service,
            catalog,
            metrics: parts.metrics,
        }
    }

    /// Project lookup that also enforces `permission` for `user`
    pub async fn authorize(
        &self,
        project_id: &str,
        user: &User,
        permission: Permission,
    ) -> Result<Project, ApiError> {
        let project_id = ProjectId::parse(project_id)?;
        Ok(self
            .project_service
            .authorize(&project_id, user.id(), permission)
            .await?)
    }
}
