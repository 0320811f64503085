//! Log output for `jenkins-trigger`.
//!
//! Progress lines are the tool's product and go to stdout through a
//! [`ProgressSink`](crate::progress::ProgressSink); diagnostics from
//! `tracing` (HTTP calls, crumb lookup, per-poll classification) go to
//! stderr so a pipeline can capture one without the other.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` overrides `level` (e.g. `RUST_LOG=jenkins_client=debug` to
/// see each request). With `json` every record is one JSON object per
/// line. A second call is a no-op.
pub fn init_tracing(json: bool, level: Level) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if json {
        registry.with(layer.json()).try_init()
    } else {
        registry.with(layer).try_init()
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
