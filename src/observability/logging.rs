//! Structured logging.
//!
//! # Responsibilities
//! - Install the global `tracing` subscriber for the CLI
//! - Resolve the filter from `RUST_LOG`, falling back to the configured level

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor the config name a level.
pub const DEFAULT_FILTER: &str = "emailverify_client=info,emailverify=info";

/// Build the filter directive for a configured level.
///
/// A bare level such as `debug` applies to this crate only; anything
/// containing `=` or `,` is taken as a full directive.
pub fn filter_directive(level: Option<&str>) -> String {
    match level.map(str::trim) {
        None | Some("") => DEFAULT_FILTER.to_string(),
        Some(directive) if directive.contains('=') || directive.contains(',') => {
            directive.to_string()
        }
        Some(level) => format!("emailverify_client={level},emailverify={level}"),
    }
}

/// Install the global subscriber. Later calls are ignored.
pub fn init_logging(level: Option<&str>) {
    let result = tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter_directive(level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();

    if result.is_err() {
        tracing::debug!("Global subscriber already installed");
    }
}
