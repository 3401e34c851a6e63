use std::sync::Once;

use tracing_subscriber::EnvFilter;

static SUBSCRIBER: Once = Once::new();

const DEFAULT_LOG_FILTER: &str = "info";

/// Install the process-wide log subscriber for the relay.
///
/// `RUST_LOG` selects the filter; without it everything below `info` is
/// dropped, which keeps poll-loop chatter out of production logs while
/// `RUST_LOG=driver=debug` still opens it up for one crate. Output goes to
/// stderr. Safe to call from multiple entry points; only the first call
/// installs anything.
pub fn init_tracing() {
    SUBSCRIBER.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
        let _ = tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_env_filter(filter)
            .try_init();
    });
}
