//! Process-wide `tracing` setup: a `pretty` formatter for local
//! development and a `json` formatter for production, selected by
//! [`crate::config::LogFormat`], with the filter taken from `RUST_LOG`
//! (spec §10).

use crate::config::LogFormat;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Installs the global `tracing` subscriber. Call exactly once, at
/// process start, before constructing any other component.
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = FmtSubscriber::builder().with_env_filter(filter);
    match format {
        LogFormat::Pretty => {
            let _ = tracing::subscriber::set_global_default(builder.pretty().finish());
        }
        LogFormat::Json => {
            let _ = tracing::subscriber::set_global_default(builder.json().finish());
        }
    }
}
