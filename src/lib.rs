//! # Camflow
//!
//! Declarative CAM runner: reads a specification of tools, processes, bounds, tasks and
//! models, generates the toolpaths it asks for and exports them as G-code.
//!
//! ## Architecture
//!
//! Camflow is organized as a workspace with multiple crates:
//!
//! 1. **camflow-core** - Event bus, registries, entity collections, plugin lifecycle
//! 2. **camflow-camtools** - Slice strategy, milling task type, G-code export
//! 3. **camflow-settings** - Application configuration
//! 4. **camflow** - Environment construction, flow interpreter and the binary

pub mod environment;
pub mod flow;

pub use camflow_core as core;
pub use camflow_settings::{Config, LogFormat, LoggingSettings};
pub use environment::Environment;
pub use flow::{Document, FlowError, FlowInterpreter, FlowReport, Format};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Initialize logging from the logging settings
///
/// Sets up structured logging with:
/// - `RUST_LOG` support, falling back to the configured level
/// - Pretty or JSON lines on stderr
///
/// Calling it again after a subscriber is installed is not an error.
pub fn init_logging(settings: &LoggingSettings) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&settings.level))
        .map_err(|e| anyhow::anyhow!("Invalid log level '{}': {}", settings.level, e))?;

    let registry = tracing_subscriber::registry().with(env_filter);
    let installed = match settings.format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_level(true)
                    .with_line_number(true)
                    .pretty(),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .json(),
            )
            .try_init(),
    };
    if installed.is_err() {
        tracing::debug!("Logging already initialized");
    }

    Ok(())
}
