//! Logging initialization.
//!
//! Controlled by two environment variables:
//! - `SRCPACK_LOG`: an `EnvFilter` directive (default `warn`), e.g.
//!   `SRCPACK_LOG=srcpack=debug`
//! - `SRCPACK_LOG_FORMAT=json`: JSON events instead of compact text
//!
//! Everything goes to stderr so stdout stays clean for `--format json`.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Filter directive variable.
pub const LOG_ENV: &str = "SRCPACK_LOG";
/// Formatter selection variable.
pub const LOG_FORMAT_ENV: &str = "SRCPACK_LOG_FORMAT";

/// Install the global subscriber. Safe to call once per process; a second
/// call is ignored.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var(LOG_FORMAT_ENV).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .without_time()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    if let Err(e) = result {
        eprintln!("warning: logging already initialized: {e}");
    }
}
