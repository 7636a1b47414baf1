//! Alert notification delivery over e-mail and webhooks

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, warn};

use crate::domain::alert::AlertNotification;
use crate::domain::DomainError;
use crate::infrastructure::crypto::hmac_sha256_hex;
use crate::infrastructure::email::{alert_email, Mailer};

#[cfg(test)]
use mockall::automock;

pub const SIGNATURE_HEADER: &str = "X-Gateway-Signature";
pub const EVENT_HEADER: &str = "X-Gateway-Event";

const WEBHOOK_TIMEOUT_SECS: u64 = 10;

/// Delivers a fired alert to its configured channels
#[cfg_attr(test, automock)]
#[async_trait]
pub trait AlertNotifier: Send + Sync + Debug {
    async fn notify(&self, notification: &AlertNotification) -> Result<(), DomainError>;
}

/// Sends e-mail through the mailer and signed JSON webhooks through reqwest
#[derive(Debug)]
pub struct ChannelNotifier {
    mailer: Arc<dyn Mailer>,
    http_client: Client,
}

impl ChannelNotifier {
    pub fn new(mailer: Arc<dyn Mailer>) -> Result<Self, DomainError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(WEBHOOK_TIMEOUT_SECS))
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            mailer,
            http_client,
        })
    }

    async fn send_webhook(
        &self,
        url: &str,
        secret: Option<&str>,
        notification: &AlertNotification,
    ) -> Result<(), DomainError> {
        let payload = serde_json::to_string(notification)
            .map_err(|e| DomainError::internal(format!("Failed to serialize payload: {}", e)))?;

        let mut request = self
            .http_client
            .post(url)
            .header("Content-Type", "application/json")
            .header(EVENT_HEADER, notification.kind.event());

        if let Some(secret) = secret {
            let signature = hmac_sha256_hex(secret, payload.as_bytes());
            request = request.header(SIGNATURE_HEADER, format!("sha256={}", signature));
        }

        let response = request.body(payload).send().await.map_err(|e| {
            let reason = if e.is_timeout() {
                "Request timed out".to_string()
            } else if e.is_connect() {
                "Connection failed".to_string()
            } else {
                format!("Request failed: {}", e)
            };
            DomainError::notification("webhook", reason)
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::notification(
                "webhook",
                format!("HTTP status {}", status.as_u16()),
            ));
        }

        Ok(())
    }
}

#[async_trait]
impl AlertNotifier for ChannelNotifier {
    /// Attempts every channel; the first failure is returned after all ran
    async fn notify(&self, notification: &AlertNotification) -> Result<(), DomainError> {
        let channels = &notification.channels;
        let mut first_error = None;

        if !channels.emails.is_empty() {
            let content = alert_email(notification);
            for recipient in &channels.emails {
                if let Err(e) = self
                    .mailer
                    .send(recipient, &content.subject, &content.body)
                    .await
                {
                    warn!(alert_id = %notification.alert_id, error = %e, "Alert e-mail failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(ref url) = channels.webhook_url {
            match self
                .send_webhook(url, channels.webhook_secret.as_deref(), notification)
                .await
            {
                Ok(()) => info!(alert_id = %notification.alert_id, "Alert webhook delivered"),
                Err(e) => {
                    warn!(alert_id = %notification.alert_id, error = %e, "Alert webhook failed");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::domain::alert::{Alert, AlertId, AlertMetric, AlertWindow, NotificationChannels};
    use crate::domain::project::ProjectId;
    use crate::domain::user::UserId;
    use crate::infrastructure::email::MockMailer;

    fn notification(channels: NotificationChannels) -> AlertNotification {
        let alert = Alert::new(
            AlertId::generate(),
            ProjectId::generate(),
            "Too many requests",
            AlertMetric::RequestCount,
            100.0,
            AlertWindow::Hour,
            UserId::generate(),
        )
        .with_channels(channels);

        AlertNotification::for_alert(&alert, "Acme", 120.0, Utc::now())
    }

    fn silent_mailer() -> Arc<dyn Mailer> {
        let mut mailer = MockMailer::new();
        mailer.expect_send().never();
        Arc::new(mailer)
    }

    #[tokio::test]
    async fn test_emails_every_recipient() {
        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .withf(|_, subject, _| subject.contains("Too many requests"))
            .times(2)
            .returning(|_, _, _| Ok(()));

        let notifier = ChannelNotifier::new(Arc::new(mailer)).unwrap();
        let channels = NotificationChannels::new(vec![
            "ops@example.com".to_string(),
            "cto@example.com".to_string(),
        ]);

        notifier.notify(&notification(channels)).await.unwrap();
    }

    #[tokio::test]
    async fn test_signed_webhook() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/hooks/alerts"))
            .and(header(EVENT_HEADER, "alert.triggered"))
            .and(header_exists(SIGNATURE_HEADER))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = ChannelNotifier::new(silent_mailer()).unwrap();
        let channels = NotificationChannels::default().with_webhook(
            format!("{}/hooks/alerts", server.uri()),
            Some("whsec_test".to_string()),
        );

        notifier.notify(&notification(channels)).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let body = String::from_utf8(requests[0].body.clone()).unwrap();
        let signature = requests[0]
            .headers
            .get(SIGNATURE_HEADER)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert_eq!(
            signature,
            format!("sha256={}", hmac_sha256_hex("whsec_test", body.as_bytes()))
        );

        let payload: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(payload["kind"], "alert");
        assert_eq!(payload["project_name"], "Acme");
    }

    #[tokio::test]
    async fn test_unsigned_webhook_without_secret() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = ChannelNotifier::new(silent_mailer()).unwrap();
        let channels = NotificationChannels::default().with_webhook(server.uri(), None);

        notifier.notify(&notification(channels)).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        assert!(requests[0].headers.get(SIGNATURE_HEADER).is_none());
    }

    #[tokio::test]
    async fn test_webhook_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let notifier = ChannelNotifier::new(silent_mailer()).unwrap();
        let channels = NotificationChannels::default().with_webhook(server.uri(), None);

        let result = notifier.notify(&notification(channels)).await;
        assert!(matches!(result, Err(DomainError::Notification { .. })));
    }

    #[tokio::test]
    async fn test_mail_failure_does_not_skip_webhook() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let mut mailer = MockMailer::new();
        mailer
            .expect_send()
            .returning(|_, _, _| Err(DomainError::notification("email", "smtp down")));

        let notifier = ChannelNotifier::new(Arc::new(mailer)).unwrap();
        let channels = NotificationChannels::new(vec!["ops@example.com".to_string()])
            .with_webhook(server.uri(), None);

        let result = notifier.notify(&notification(channels)).await;
        assert!(result.is_err());
    }
}
