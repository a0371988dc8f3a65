//! Tracing initialisation for triage binaries.
//!
//! Call [`init_tracing`] once at program start. Later calls are ignored
//! (the global subscriber can only be set once per process).
//!
//! Without `RUST_LOG`, the triage crates log at the requested level and
//! every dependency is held at `warn`.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crate targets that follow the requested verbosity.
const TRIAGE_TARGETS: &[&str] = &["triage_core", "triage_service", "triage"];

/// Filter directives used when `RUST_LOG` is unset.
fn default_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    let mut directives = String::from("warn");
    for target in TRIAGE_TARGETS {
        directives.push_str(&format!(",{target}={level}"));
    }
    directives
}

/// Initialise the global tracing subscriber, writing to stderr so command
/// output on stdout stays machine-readable.
///
/// * `json`: emit newline-delimited JSON log lines.
/// * `level`: verbosity for the triage crates when `RUST_LOG` is not set.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let layer = fmt::layer().with_writer(std::io::stderr);
    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer.json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(layer)
            .try_init()
            .ok();
    }
}
