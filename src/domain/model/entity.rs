//! Provider and model catalog entries

use serde::{Deserialize, Serialize};

use super::validation::{validate_catalog_id, ModelValidationError};

/// Micro-dollars per US dollar
pub const MICROS_PER_USD: i64 = 1_000_000;

macro_rules! catalog_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Result<Self, ModelValidationError> {
                let id = id.into();
                validate_catalog_id(&id)?;
                Ok(Self(id))
            }

            /// Built-in catalog entries; checked by the catalog tests
            pub(crate) fn from_static(id: &'static str) -> Self {
                debug_assert!(validate_catalog_id(id).is_ok(), "invalid catalog id {id}");
                Self(id.to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ModelValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

catalog_id!(
    /// Provider identifier, e.g. `openai`
    ProviderId
);

catalog_id!(
    /// Model identifier as sent by gateway clients, e.g. `gpt-4o`
    ModelId
);

/// Operational status of an upstream provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    #[default]
    Operational,
    Degraded,
    Outage,
}

/// Upstream LLM provider shown in the catalog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelProviderInfo {
    id: ProviderId,
    name: String,
    website: String,
    status: ProviderStatus,
}

impl ModelProviderInfo {
    pub fn new(id: ProviderId, name: impl Into<String>, website: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            website: website.into(),
            status: ProviderStatus::Operational,
        }
    }

    pub fn with_status(mut self, status: ProviderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn id(&self) -> &ProviderId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn website(&self) -> &str {
        &self.website
    }

    pub fn status(&self) -> ProviderStatus {
        self.status
    }
}

/// A model offered through the gateway with per-million-token pricing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    id: ModelId,
    provider_id: ProviderId,
    name: String,
    context_window: u32,
    /// Micro-dollars per million input tokens
    input_price_per_million_micros: i64,
    /// Micro-dollars per million output tokens
    output_price_per_million_micros: i64,
    enabled: bool,
}

impl Model {
    /// Prices are given in USD per million tokens
    pub fn new(
        id: ModelId,
        provider_id: ProviderId,
        name: impl Into<String>,
        context_window: u32,
        input_usd_per_million: f64,
        output_usd_per_million: f64,
    ) -> Self {
        Self {
            id,
            provider_id,
            name: name.into(),
            context_window,
            input_price_per_million_micros: usd_to_micros(input_usd_per_million),
            output_price_per_million_micros: usd_to_micros(output_usd_per_million),
            enabled: true,
        }
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn id(&self) -> &ModelId {
        &self.id
    }

    pub fn provider_id(&self) -> &ProviderId {
        &self.provider_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn context_window(&self) -> u32 {
        self.context_window
    }

    pub fn input_price_per_million_micros(&self) -> i64 {
        self.input_price_per_million_micros
    }

    pub fn output_price_per_million_micros(&self) -> i64 {
        self.output_price_per_million_micros
    }

    pub fn input_price_per_million_usd(&self) -> f64 {
        micros_to_usd(self.input_price_per_million_micros)
    }

    pub fn output_price_per_million_usd(&self) -> f64 {
        micros_to_usd(self.output_price_per_million_micros)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

pub fn usd_to_micros(usd: f64) -> i64 {
    (usd * MICROS_PER_USD as f64).round() as i64
}

pub fn micros_to_usd(micros: i64) -> f64 {
    micros as f64 / MICROS_PER_USD as f64
}
