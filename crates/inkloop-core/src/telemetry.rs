//! Tracing initialisation for inkloop binaries.
//!
//! Call [`init_tracing`] once at program start. Later calls are ignored
//! (the global subscriber can only be set once per process).

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Crates whose events follow the requested level. Everything else stays
/// at `warn` so HTTP internals do not drown the run log.
const OWN_TARGETS: [&str; 3] = ["inkloop_core", "inkloop_providers", "inkloop"];

/// Default filter directive for `level` when `RUST_LOG` is unset.
pub fn default_directive(level: Level) -> String {
    let mut directive = String::from("warn");
    for target in OWN_TARGETS {
        directive.push_str(&format!(",{target}={}", level.as_str().to_ascii_lowercase()));
    }
    directive
}

/// Install the global subscriber.
///
/// * `json`: newline-delimited JSON instead of human-readable lines.
/// * `level`: verbosity for inkloop crates when `RUST_LOG` is not set.
///
/// Logs go to stderr so stdout stays free for drafts and event streams.
pub fn init_tracing(json: bool, level: Level) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(level)));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .try_init()
            .ok();
    }
}
