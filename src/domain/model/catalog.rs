//! Read-only catalog of providers and models

use super::entity::{Model, ModelId, ModelProviderInfo, ProviderId};

/// Providers and their models, in display order
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    providers: Vec<ModelProviderInfo>,
    models: Vec<Model>,
}

impl ModelCatalog {
    pub fn new(providers: Vec<ModelProviderInfo>, models: Vec<Model>) -> Self {
        Self { providers, models }
    }

    pub fn providers(&self) -> &[ModelProviderInfo] {
        &self.providers
    }

    pub fn provider(&self, id: &str) -> Option<&ModelProviderInfo> {
        self.providers.iter().find(|p| p.id().as_str() == id)
    }

    /// All models, optionally restricted to one provider
    pub fn models(&self, provider: Option<&str>) -> Vec<&Model> {
        self.models
            .iter()
            .filter(|m| provider.is_none_or(|p| m.provider_id().as_str() == p))
            .collect()
    }

    pub fn enabled_models(&self) -> Vec<&Model> {
        self.models.iter().filter(|m| m.is_enabled()).collect()
    }

    pub fn model(&self, id: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.id().as_str() == id)
    }
}

struct ModelSeed {
    id: &'static str,
    provider: &'static str,
    name: &'static str,
    context_window: u32,
    input_usd_per_million: f64,
    output_usd_per_million: f64,
}

const PROVIDERS: &[(&str, &str, &str)] = &[
    ("openai", "OpenAI", "https://openai.com"),
    ("anthropic", "Anthropic", "https://www.anthropic.com"),
    ("google", "Google", "https://ai.google.dev"),
    ("mistral", "Mistral AI", "https://mistral.ai"),
];

const MODELS: &[ModelSeed] = &[
    ModelSeed {
        id: "gpt-4o",
        provider: "openai",
        name: "GPT-4o",
        context_window: 128_000,
        input_usd_per_million: 2.50,
        output_usd_per_million: 10.00,
    },
    ModelSeed {
        id: "gpt-4o-mini",
        provider: "openai",
        name: "GPT-4o mini",
        context_window: 128_000,
        input_usd_per_million: 0.15,
        output_usd_per_million: 0.60,
    },
    ModelSeed {
        id: "claude-3.5-sonnet",
        provider: "anthropic",
        name: "Claude 3.5 Sonnet",
        context_window: 200_000,
        input_usd_per_million: 3.00,
        output_usd_per_million: 15.00,
    },
    ModelSeed {
        id: "claude-3.5-haiku",
        provider: "anthropic",
        name: "Claude 3.5 Haiku",
        context_window: 200_000,
        input_usd_per_million: 0.80,
        output_usd_per_million: 4.00,
    },
    ModelSeed {
        id: "gemini-1.5-pro",
        provider: "google",
        name: "Gemini 1.5 Pro",
        context_window: 2_000_000,
        input_usd_per_million: 1.25,
        output_usd_per_million: 5.00,
    },
    ModelSeed {
        id: "gemini-1.5-flash",
        provider: "google",
        name: "Gemini 1.5 Flash",
        context_window: 1_000_000,
        input_usd_per_million: 0.075,
        output_usd_per_million: 0.30,
    },
    ModelSeed {
        id: "mistral-large",
        provider: "mistral",
        name: "Mistral Large",
        context_window: 128_000,
        input_usd_per_million: 2.00,
        output_usd_per_million: 6.00,
    },
    ModelSeed {
        id: "mistral-small",
        provider: "mistral",
        name: "Mistral Small",
        context_window: 32_000,
        input_usd_per_million: 0.20,
        output_usd_per_million: 0.60,
    },
];

/// Catalog shipped with the gateway
pub fn default_catalog() -> ModelCatalog {
    let providers = PROVIDERS
        .iter()
        .map(|(id, name, website)| {
            ModelProviderInfo::new(ProviderId::from_static(*id), *name, *website)
        })
        .collect();

    let models = MODELS
        .iter()
        .map(|seed| {
            Model::new(
                ModelId::from_static(seed.id),
                ProviderId::from_static(seed.provider),
                seed.name,
                seed.context_window,
                seed.input_usd_per_million,
                seed.output_usd_per_million,
            )
        })
        .collect();

    ModelCatalog::new(providers, models)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::validate_catalog_id;

    #[test]
    fn test_catalog_ids_are_valid() {
        for (id, _, _) in PROVIDERS {
            assert!(validate_catalog_id(id).is_ok(), "{}", id);
        }
        for seed in MODELS {
            assert!(validate_catalog_id(seed.id).is_ok(), "{}", seed.id);
        }
    }

    #[test]
    fn test_every_model_has_a_known_provider() {
        let catalog = default_catalog();

        for model in catalog.models(None) {
            assert!(
                catalog.provider(model.provider_id().as_str()).is_some(),
                "unknown provider for {}",
                model.id()
            );
        }
    }

    #[test]
    fn test_filter_by_provider() {
        let catalog = default_catalog();

        let anthropic = catalog.models(Some("anthropic"));
        assert_eq!(anthropic.len(), 2);
        assert!(anthropic.iter().all(|m| m.provider_id().as_str() == "anthropic"));
        assert!(catalog.models(Some("nobody")).is_empty());
    }

    #[test]
    fn test_lookup_model() {
        let catalog = default_catalog();

        let model = catalog.model("gpt-4o-mini").unwrap();
        assert_eq!(model.input_price_per_million_micros(), 150_000);
        assert_eq!(model.output_price_per_million_micros(), 600_000);
        assert!(catalog.model("gpt-5").is_none());
    }

    #[test]
    fn test_enabled_models_excludes_disabled() {
        let base = default_catalog();
        let mut models: Vec<Model> = base.models(None).into_iter().cloned().collect();
        models[0] = models[0].clone().with_enabled(false);
        let catalog = ModelCatalog::new(base.providers().to_vec(), models);

        assert_eq!(catalog.enabled_models().len(), MODELS.len() - 1);
    }
}
