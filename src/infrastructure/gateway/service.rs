//! Mock chat completion backend
//!
//! Answers with a deterministic reply instead of calling a provider, but
//! accounts for the request exactly like a real one would be: tokens and
//! cost are estimated, usage is recorded against the calling key's project
//! and the project's alerts are evaluated.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::api_key::ApiKey;
use crate::domain::model::{Model, ModelCatalog};
use crate::domain::usage::{
    estimate_request_cost, estimate_tokens, CostEstimate, UsageRecord, UsageRecordId,
    CHARS_PER_TOKEN,
};
use crate::domain::DomainError;
use crate::infrastructure::alert::AlertService;
use crate::infrastructure::observability::{record_gateway_request, GatewayRequestMetric};
use crate::infrastructure::usage::UsageService;

pub const MAX_COMPLETION_TOKENS: u32 = 32_000;

const ALLOWED_ROLES: &[&str] = &["system", "user", "assistant", "tool"];
const ECHO_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    Length,
}

/// Result of a mock completion with its accounting
#[derive(Debug, Clone)]
pub struct ChatCompletion {
    pub id: String,
    pub model: String,
    pub content: String,
    pub finish_reason: FinishReason,
    pub estimate: CostEstimate,
    pub usage_record_id: UsageRecordId,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug)]
pub struct GatewayService {
    catalog: Arc<ModelCatalog>,
    usage: Arc<UsageService>,
    alerts: Arc<AlertService>,
}

impl GatewayService {
    pub fn new(
        catalog: Arc<ModelCatalog>,
        usage: Arc<UsageService>,
        alerts: Arc<AlertService>,
    ) -> Self {
        Self {
            catalog,
            usage,
            alerts,
        }
    }

    /// Enabled models callers may request
    pub fn models(&self) -> Vec<&Model> {
        self.catalog.enabled_models()
    }

    pub async fn complete(
        &self,
        api_key: &ApiKey,
        request: ChatCompletionRequest,
    ) -> Result<ChatCompletion, DomainError> {
        let started = Instant::now();
        validate_request(&request)?;

        let model = self
            .catalog
            .model(&request.model)
            .ok_or_else(|| DomainError::not_found(format!("Model '{}' not found", request.model)))?;

        if !model.is_enabled() {
            return Err(DomainError::validation_field(
                "model",
                format!("Model '{}' is disabled", request.model),
            ));
        }

        let prompt_tokens = request
            .messages
            .iter()
            .map(|m| estimate_tokens(&m.content))
            .fold(0u32, u32::saturating_add);

        let (content, finish_reason) = mock_reply(model, &request.messages, request.max_tokens);
        let completion_tokens = estimate_tokens(&content);
        let estimate = estimate_request_cost(model, prompt_tokens, completion_tokens);

        let record = UsageRecord::new(
            api_key.project_id().clone(),
            api_key.id().clone(),
            model.id().as_str(),
        )
        .with_estimate(&estimate)
        .with_latency_ms(started.elapsed().as_millis() as u64);

        let record = self.usage.record(record).await?;

        if let Err(e) = self.alerts.evaluate(api_key.project_id(), Utc::now()).await {
            warn!(project_id = %api_key.project_id(), error = %e, "Alert evaluation failed");
        }

        record_gateway_request(&GatewayRequestMetric {
            provider: model.provider_id().as_str(),
            model: model.id().as_str(),
            duration: started.elapsed(),
            success: true,
            input_tokens: estimate.input_tokens as u64,
            output_tokens: estimate.output_tokens as u64,
            cost_micros: estimate.total_cost_micros,
        });

        info!(
            project_id = %api_key.project_id(),
            api_key_id = %api_key.id(),
            model = %model.id().as_str(),
            prompt_tokens,
            completion_tokens,
            cost_micros = estimate.total_cost_micros,
            "Chat completion served"
        );

        Ok(ChatCompletion {
            id: format!("chatcmpl-{}", record.id().as_str().replace('-', "")),
            model: model.id().as_str().to_string(),
            content,
            finish_reason,
            estimate,
            usage_record_id: record.id().clone(),
            created_at: record.timestamp,
        })
    }
}

fn validate_request(request: &ChatCompletionRequest) -> Result<(), DomainError> {
    if request.model.trim().is_empty() {
        return Err(DomainError::validation_field("model", "Model is required"));
    }

    if request.messages.is_empty() {
        return Err(DomainError::validation_field(
            "messages",
            "At least one message is required",
        ));
    }

    if let Some(message) = request
        .messages
        .iter()
        .find(|m| !ALLOWED_ROLES.contains(&m.role.as_str()))
    {
        return Err(DomainError::validation_field(
            "messages",
            format!("Unsupported message role '{}'", message.role),
        ));
    }

    if let Some(max_tokens) = request.max_tokens {
        if max_tokens == 0 || max_tokens > MAX_COMPLETION_TOKENS {
            return Err(DomainError::validation_field(
                "max_tokens",
                format!("max_tokens must be between 1 and {}", MAX_COMPLETION_TOKENS),
            ));
        }
    }

    Ok(())
}

/// Deterministic reply echoing the last user message, cut to `max_tokens`
fn mock_reply(
    model: &Model,
    messages: &[ChatMessage],
    max_tokens: Option<u32>,
) -> (String, FinishReason) {
    let last_user = messages
        .iter()
        .rev()
        .find(|m| m.role == "user")
        .map(|m| m.content.as_str())
        .unwrap_or_default();

    let echoed: String = last_user.chars().take(ECHO_CHARS).collect();
    let reply = format!(
        "This is a simulated response from {}. You said: \"{}\"",
        model.name(),
        echoed
    );

    match max_tokens {
        Some(limit) if estimate_tokens(&reply) > limit => {
            let max_chars = limit as usize * CHARS_PER_TOKEN;
            (reply.chars().take(max_chars).collect(), FinishReason::Length)
        }
        _ => (reply, FinishReason::Stop),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::alert::{Alert, CostAlert};
    use crate::domain::api_key::ApiKeyId;
    use crate::domain::model::{default_catalog, ModelId, ModelProviderInfo, ProviderId};
    use crate::domain::project::{Project, ProjectId};
    use crate::domain::usage::UsageQuery;
    use crate::domain::user::UserId;
    use crate::infrastructure::alert::{AlertStores, MockAlertNotifier};
    use crate::infrastructure::storage::InMemoryStorage;

    struct Fixture {
        service: GatewayService,
        usage: Arc<UsageService>,
        key: ApiKey,
    }

    fn fixture(catalog: ModelCatalog) -> Fixture {
        let usage = Arc::new(UsageService::new(Arc::new(
            InMemoryStorage::<UsageRecord>::new(),
        )));
        let alerts = Arc::new(AlertService::new(
            AlertStores {
                alerts: Arc::new(InMemoryStorage::<Alert>::new()),
                cost_alerts: Arc::new(InMemoryStorage::<CostAlert>::new()),
                projects: Arc::new(InMemoryStorage::<Project>::new()),
            },
            usage.clone(),
            Arc::new(MockAlertNotifier::new()),
        ));
        let key = ApiKey::new(
            ApiKeyId::generate(),
            "CI",
            ProjectId::generate(),
            "sha256$hash",
            "gw_live_abcdefgh",
            UserId::generate(),
        );

        Fixture {
            service: GatewayService::new(Arc::new(catalog), usage.clone(), alerts),
            usage,
            key,
        }
    }

    fn request(model: &str, content: &str, max_tokens: Option<u32>) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: model.to_string(),
            messages: vec![
                ChatMessage::new("system", "Be brief."),
                ChatMessage::new("user", content),
            ],
            max_tokens,
        }
    }

    #[tokio::test]
    async fn test_completion_is_deterministic_and_recorded() {
        let f = fixture(default_catalog());

        let first = f
            .service
            .complete(&f.key, request("gpt-4o", "Hello there", None))
            .await
            .unwrap();
        let second = f
            .service
            .complete(&f.key, request("gpt-4o", "Hello there", None))
            .await
            .unwrap();

        assert_eq!(first.content, second.content);
        assert!(first.content.contains("Hello there"));
        assert_eq!(first.finish_reason, FinishReason::Stop);
        // "Be brief." = 9 chars, "Hello there" = 11 chars
        assert_eq!(first.estimate.input_tokens, 3 + 3);
        assert_eq!(first.estimate.output_tokens, estimate_tokens(&first.content));

        let records = f
            .usage
            .query(f.key.project_id(), &UsageQuery::new())
            .await
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].api_key_id, *f.key.id());
        assert_eq!(records[0].cost_micros, first.estimate.total_cost_micros);
    }

    #[tokio::test]
    async fn test_max_tokens_caps_reply() {
        let f = fixture(default_catalog());

        let completion = f
            .service
            .complete(&f.key, request("gpt-4o", &"long ".repeat(100), Some(5)))
            .await
            .unwrap();

        assert_eq!(completion.finish_reason, FinishReason::Length);
        assert_eq!(completion.estimate.output_tokens, 5);
        assert_eq!(completion.content.chars().count(), 20);
    }

    #[tokio::test]
    async fn test_unknown_model_is_not_found() {
        let f = fixture(default_catalog());

        let result = f
            .service
            .complete(&f.key, request("no-such-model", "hi", None))
            .await;
        assert!(matches!(result, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_disabled_model_is_rejected() {
        let provider = ProviderId::new("openai").unwrap();
        let catalog = ModelCatalog::new(
            vec![ModelProviderInfo::new(provider.clone(), "OpenAI", "https://openai.com")],
            vec![Model::new(
                ModelId::new("legacy").unwrap(),
                provider,
                "Legacy",
                4_096,
                1.0,
                2.0,
            )
            .with_enabled(false)],
        );
        let f = fixture(catalog);

        let result = f.service.complete(&f.key, request("legacy", "hi", None)).await;
        assert!(matches!(result, Err(DomainError::Validation { .. })));
        assert!(f.service.models().is_empty());
    }

    #[tokio::test]
    async fn test_request_validation() {
        let f = fixture(default_catalog());

        let empty = ChatCompletionRequest {
            model: "gpt-4o".to_string(),
            messages: vec![],
            max_tokens: None,
        };
        assert!(matches!(
            f.service.complete(&f.key, empty).await,
            Err(DomainError::Validation { .. })
        ));

        assert!(matches!(
            f.service
                .complete(&f.key, request("gpt-4o", "hi", Some(32_001)))
                .await,
            Err(DomainError::Validation { .. })
        ));

        let bad_role = ChatCompletionRequest {
            model: "gpt-4o".to_string(),
            messages: vec![ChatMessage::new("robot", "hi")],
            max_tokens: None,
        };
        assert!(matches!(
            f.service.complete(&f.key, bad_role).await,
            Err(DomainError::Validation { .. })
        ));
    }
}
