//! Check-config command - validates configuration without starting the server

use crate::config::AppConfig;

/// Load configuration, print a summary and report problems
pub fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    let warnings = config.validate()?;

    println!("{}", summary(&config));

    for warning in &warnings {
        println!("warning: {}", warning);
    }

    println!("configuration OK");
    Ok(())
}

fn summary(config: &AppConfig) -> String {
    [
        format!("server:        {}:{}", config.server.host, config.server.port),
        format!("storage:       {}", config.storage.backend),
        format!(
            "logging:       {} ({:?})",
            config.logging.level, config.logging.format
        ),
        format!(
            "verification:  {} chars, {} min",
            config.verification.code_length, config.verification.code_ttl_minutes
        ),
        format!(
            "billing:       tax {} bps, due in {} days",
            config.billing.tax_rate_bps, config.billing.invoice_due_days
        ),
        format!(
            "metrics:       {}",
            if config.observability.metrics.enabled {
                config.observability.metrics.path.as_str()
            } else {
                "disabled"
            }
        ),
        format!("otlp tracing:  {}", config.observability.tracing.enabled),
    ]
    .join("\n")
}
