//! Outgoing e-mail
//!
//! The [`Mailer`] trait is the seam used by the user and alert services.
//! [`LettreMailer`] delivers through SMTP or writes `.eml` files for local
//! development; [`LogMailer`] only logs the message.

mod templates;

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use serde::Deserialize;
use std::fmt::Debug;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::DomainError;

pub use templates::{alert_email, verification_email, EmailContent};

#[cfg(test)]
use mockall::automock;

/// Sends a plain-text e-mail to a single recipient
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Mailer: Send + Sync + Debug {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DomainError>;
}

/// How e-mail leaves the process
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EmailTransportConfig {
    Smtp {
        host: String,
        #[serde(default = "default_smtp_port")]
        port: u16,
        #[serde(default)]
        username: String,
        #[serde(default)]
        password: String,
        #[serde(default = "default_use_tls")]
        use_tls: bool,
    },
    File {
        path: PathBuf,
    },
    #[default]
    Log,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_use_tls() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmailConfig {
    pub from_email: String,
    pub from_name: String,
    pub transport: EmailTransportConfig,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            from_email: "no-reply@gateway.local".to_string(),
            from_name: "AI Gateway".to_string(),
            transport: EmailTransportConfig::default(),
        }
    }
}

enum LettreTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

/// Mailer backed by a lettre transport
pub struct LettreMailer {
    transport: LettreTransport,
    from: Mailbox,
}

impl Debug for LettreMailer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let transport = match self.transport {
            LettreTransport::Smtp(_) => "smtp",
            LettreTransport::File(_) => "file",
        };

        f.debug_struct("LettreMailer")
            .field("transport", &transport)
            .field("from", &self.from.to_string())
            .finish()
    }
}

impl LettreMailer {
    pub fn smtp(
        from: Mailbox,
        host: &str,
        port: u16,
        credentials: Option<Credentials>,
        use_tls: bool,
    ) -> Result<Self, DomainError> {
        if !use_tls {
            warn!("SMTP TLS is disabled - this is not recommended for production");
        }

        let builder = if use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host).map_err(|e| {
                DomainError::configuration(format!("Failed to create SMTP transport: {}", e))
            })?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
        };

        let builder = builder.port(port);
        let builder = match credentials {
            Some(credentials) => builder.credentials(credentials),
            None => builder,
        };

        Ok(Self {
            transport: LettreTransport::Smtp(builder.build()),
            from,
        })
    }

    /// Writes each message into `dir` as an `.eml` file
    pub fn file(from: Mailbox, dir: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            DomainError::configuration(format!(
                "Failed to create e-mail directory '{}': {}",
                dir.display(),
                e
            ))
        })?;

        Ok(Self {
            transport: LettreTransport::File(AsyncFileTransport::<Tokio1Executor>::new(dir)),
            from,
        })
    }
}

#[async_trait]
impl Mailer for LettreMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DomainError> {
        let to: Mailbox = to
            .parse()
            .map_err(|e| DomainError::notification("email", format!("Invalid recipient: {}", e)))?;

        let message = Message::builder()
            .from(self.from.clone())
            .to(to.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| DomainError::notification("email", format!("Failed to build message: {}", e)))?;

        match &self.transport {
            LettreTransport::Smtp(smtp) => {
                smtp.send(message).await.map_err(|e| {
                    DomainError::notification("email", format!("SMTP delivery failed: {}", e))
                })?;
            }
            LettreTransport::File(file) => {
                file.send(message).await.map_err(|e| {
                    DomainError::notification("email", format!("File delivery failed: {}", e))
                })?;
            }
        }

        debug!(to = %to, subject = %subject, "E-mail sent");
        Ok(())
    }
}

/// Logs messages instead of delivering them
#[derive(Debug, Clone, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), DomainError> {
        info!(to = %to, subject = %subject, body = %body, "E-mail (log transport)");
        Ok(())
    }
}

/// Build the mailer selected by configuration
pub fn create_mailer(config: &EmailConfig) -> Result<Arc<dyn Mailer>, DomainError> {
    let from: Mailbox = format!("{} <{}>", config.from_name, config.from_email)
        .parse()
        .map_err(|e| DomainError::configuration(format!("Invalid e-mail sender: {}", e)))?;

    let mailer: Arc<dyn Mailer> = match &config.transport {
        EmailTransportConfig::Smtp {
            host,
            port,
            username,
            password,
            use_tls,
        } => {
            let credentials = (!username.is_empty())
                .then(|| Credentials::new(username.clone(), password.clone()));
            Arc::new(LettreMailer::smtp(from, host, *port, credentials, *use_tls)?)
        }
        EmailTransportConfig::File { path } => Arc::new(LettreMailer::file(from, path)?),
        EmailTransportConfig::Log => Arc::new(LogMailer),
    };

    info!(transport = config.transport_name(), "E-mail transport configured");
    Ok(mailer)
}

impl EmailConfig {
    fn transport_name(&self) -> &'static str {
        match self.transport {
            EmailTransportConfig::Smtp { .. } => "smtp",
            EmailTransportConfig::File { .. } => "file",
            EmailTransportConfig::Log => "log",
        }
    }
}
