use serde::Deserialize;

use crate::infrastructure::auth::JwtConfig;
use crate::infrastructure::billing::BillingConfig;
use crate::infrastructure::email::EmailConfig;
use crate::infrastructure::observability::ObservabilityConfig;
use crate::infrastructure::storage::{PostgresConfig, StorageConfig, StorageType};
use crate::infrastructure::user::{
    VerificationSettings, DEFAULT_CODE_LENGTH, DEFAULT_CODE_TTL_MINUTES,
};

const DEFAULT_JWT_SECRET: &str = "change-me-in-production";
const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub verification: VerificationConfig,
    #[serde(default)]
    pub email: EmailConfig,
    #[serde(default)]
    pub billing: BillingConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted request body in bytes
    pub max_body_bytes: usize,
    /// Empty allows any origin
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Storage section: `backend` is `memory` or `postgres`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: String,
    pub url: Option<String>,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_hours: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub code_length: usize,
    pub code_ttl_minutes: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_bytes: 1024 * 1024,
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            url: None,
            max_connections: 10,
            min_connections: 1,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_expiration_hours: 24,
        }
    }
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            code_length: DEFAULT_CODE_LENGTH,
            code_ttl_minutes: DEFAULT_CODE_TTL_MINUTES,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_allowed_origins")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Resolve the storage section; `DATABASE_URL` backs up a missing url
    pub fn storage_config(&self) -> anyhow::Result<StorageConfig> {
        let storage_type = StorageType::from_str(&self.storage.backend)
            .ok_or_else(|| anyhow::anyhow!("Unknown storage backend '{}'", self.storage.backend))?;

        match storage_type {
            StorageType::InMemory => Ok(StorageConfig::in_memory()),
            StorageType::Postgres => {
                let url = self
                    .storage
                    .url
                    .clone()
                    .or_else(|| std::env::var("DATABASE_URL").ok())
                    .ok_or_else(|| {
                        anyhow::anyhow!("storage.url or DATABASE_URL is required for postgres")
                    })?;

                Ok(StorageConfig::postgres(
                    PostgresConfig::new(url)
                        .with_max_connections(self.storage.max_connections)
                        .with_min_connections(self.storage.min_connections),
                ))
            }
        }
    }

    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig::new(&self.auth.jwt_secret, self.auth.jwt_expiration_hours)
    }

    pub fn verification_settings(&self) -> VerificationSettings {
        VerificationSettings {
            code_length: self.verification.code_length,
            code_ttl_minutes: self.verification.code_ttl_minutes,
        }
    }

    /// Errors make the configuration unusable; warnings are reported by `check-config`
    pub fn validate(&self) -> anyhow::Result<Vec<String>> {
        let mut warnings = Vec::new();

        self.storage_config()?;

        if self.auth.jwt_expiration_hours == 0 {
            anyhow::bail!("auth.jwt_expiration_hours must be at least 1");
        }

        if !(4..=32).contains(&self.verification.code_length) {
            anyhow::bail!("verification.code_length must be between 4 and 32");
        }

        if self.verification.code_ttl_minutes <= 0 {
            anyhow::bail!("verification.code_ttl_minutes must be positive");
        }

        if self.server.max_body_bytes == 0 {
            anyhow::bail!("server.max_body_bytes must be positive");
        }

        if !(0.0..=1.0).contains(&self.observability.tracing.sampling_ratio) {
            anyhow::bail!("observability.tracing.sampling_ratio must be between 0.0 and 1.0");
        }

        if self.auth.jwt_secret == DEFAULT_JWT_SECRET {
            warnings.push("auth.jwt_secret uses the built-in default".to_string());
        } else if self.auth.jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            warnings.push(format!(
                "auth.jwt_secret is shorter than {} characters",
                MIN_JWT_SECRET_LENGTH
            ));
        }

        if self.billing.tax_rate_bps > 10_000 {
            anyhow::bail!("billing.tax_rate_bps must not exceed 10000");
        }

        Ok(warnings)
    }
}
