//! Structured logging.
//!
//! Everything logs through `tracing` to stderr, so stdout carries only the
//! command's report. Two renderings are available: console lines from
//! `tracing_subscriber::fmt`, or JSONL from [`JsonlLayer`].
//!
//! ```ignore
//! let ctx = LogContext::for_this_run();
//! log_event!(ctx, INFO, event_names::LOAD_FINISHED, Stage::Load,
//!     "Loaded time tags", events = 120_000u64);
//! ```

pub mod config;
pub mod events;
pub mod layer;

pub use config::{LogConfig, LogFormat};
pub use events::{event_names, Level, LogContext, LogEvent, Stage};
pub use layer::JsonlLayer;

use std::hash::{DefaultHasher, Hash, Hasher};
use std::io::IsTerminal;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. A second call is a no-op.
///
/// `RUST_LOG`, when it holds valid directives, takes over from
/// `config.level`.
pub fn init_logging(config: &LogConfig) {
    let filter = EnvFilter::builder()
        .with_default_directive(config.level.into())
        .from_env_lossy();
    let registry = tracing_subscriber::registry().with(filter);

    let installed = match config.format {
        LogFormat::Jsonl => registry.with(JsonlLayer::stderr()).try_init(),
        LogFormat::Human => {
            let console = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(std::io::stderr().is_terminal());
            if config.timestamps {
                registry.with(console).try_init()
            } else {
                registry.with(console.without_time()).try_init()
            }
        }
    };
    if installed.is_err() {
        tracing::debug!("subscriber already installed");
    }
}

/// `run-<UTC timestamp>-<8 hex>`; sortable by start time.
pub fn generate_run_id() -> String {
    let nonce = uuid::Uuid::new_v4().simple().to_string();
    format!(
        "run-{}-{}",
        chrono::Utc::now().format("%Y%m%dT%H%M%S"),
        &nonce[..8]
    )
}

/// Stable per-machine id that does not expose the hostname.
pub fn host_id() -> String {
    let name = hostname::get()
        .map(|h| h.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    format!("host-{:08x}", hasher.finish() as u32)
}

/// Emit a tracing event tagged with the run context.
///
/// The event name becomes the tracing target; `run_id`, `host_id` and
/// `stage` are recorded on every event.
#[macro_export]
macro_rules! log_event {
    ($ctx:expr, $level:ident, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)* $(,)?) => {
        ::tracing::event!(
            target: $event,
            ::tracing::Level::$level,
            run_id = %$ctx.run_id,
            host_id = %$ctx.host_id,
            stage = %$stage,
            message = $msg,
            $($key = $val,)*
        )
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_ids_are_unique_and_prefixed() {
        let a = generate_run_id();
        let b = generate_run_id();
        assert_ne!(a, b);
        assert!(a.starts_with("run-"));
        let nonce = a.rsplit('-').next().unwrap();
        assert_eq!(nonce.len(), 8);
        assert!(nonce.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn host_id_is_stable() {
        assert_eq!(host_id(), host_id());
        assert_eq!(host_id().len(), "host-".len() + 8);
    }

    #[test]
    fn context_for_this_run_uses_host_id() {
        let ctx = LogContext::for_this_run();
        assert_eq!(ctx.host_id, host_id());
    }
}
