//! Tracing setup for the `infrabench` binary.
//!
//! Validation events (see [`crate::obs`]) and the CLI's own logs are
//! written to stderr, so a report printed to stdout can be piped as is.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Targets whose verbosity follows the `level` argument. Everything else
/// stays at `warn` so dependency chatter does not drown validation events.
const OWN_TARGETS: [&str; 2] = ["infrabench_core", "infrabench"];

fn default_directives(level: Level) -> String {
    let level = level.as_str().to_ascii_lowercase();
    let mut directives = vec!["warn".to_string()];
    directives.extend(OWN_TARGETS.iter().map(|t| format!("{}={}", t, level)));
    directives.join(",")
}

/// Install the global subscriber; a second call leaves the first in place.
///
/// `RUST_LOG` replaces the default filter entirely. With `json`, every
/// event is one JSON object per line.
pub fn init_tracing(json: bool, level: Level) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(level)));

    let output = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let output = if json {
        output.json().boxed()
    } else {
        output.boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(output)
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_scope_level_to_own_targets() {
        assert_eq!(
            default_directives(Level::DEBUG),
            "warn,infrabench_core=debug,infrabench=debug"
        );
    }

    #[test]
    fn test_repeated_init_is_harmless() {
        init_tracing(false, Level::WARN);
        init_tracing(true, Level::DEBUG);
    }
}
