//! Structured logging for dx.
//!
//! Provides dual-mode logging:
//! - Human-readable console output for interactive use
//! - Machine-parseable JSONL for agents consuming `--format json`
//!
//! stdout is reserved for command payloads; all log output goes to stderr.
//!
//! ```ignore
//! use dx_core::logging::{init_logging, LogConfig, LogContext, Stage, event_names};
//!
//! init_logging(&LogConfig::from_env(None, None));
//! let ctx = LogContext::new("dx-20260115-143022-a7xq", "diagnose");
//! dx_core::log_event!(ctx, INFO, event_names::RUN_STARTED, Stage::Init, "starting");
//! ```

pub mod config;
pub mod events;

pub use config::{LogConfig, LogFormat, LogLevel};
pub use events::{event_names, LogContext, Stage};

use std::io::IsTerminal;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter for the resolved level only. `RUST_LOG` is already folded into
/// [`LogConfig`], so it is not read again here.
fn level_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::default().add_directive(config.level.filter().into())
}

/// Initialize the logging subsystem.
///
/// Must be called once at startup before any logging occurs. A second call
/// is a no-op.
pub fn init_logging(config: &LogConfig) {
    let filter = level_filter(config);

    let human = config.format == LogFormat::Human;
    let ansi = human && std::io::stderr().is_terminal();

    let stamped = (human && config.timestamps).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(ansi)
    });
    let plain = (human && !config.timestamps).then(|| {
        fmt::layer()
            .without_time()
            .with_writer(std::io::stderr)
            .with_ansi(ansi)
    });
    let jsonl = (!human).then(|| {
        fmt::layer()
            .json()
            .flatten_event(true)
            .with_current_span(false)
            .with_writer(std::io::stderr)
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stamped)
        .with(plain)
        .with(jsonl)
        .try_init();
}

/// Emit a run-level event carrying the context's correlation fields.
///
/// ```ignore
/// log_event!(ctx, INFO, event_names::RUN_FINISHED, Stage::Output, "done", exit_code = 0);
/// ```
#[macro_export]
macro_rules! log_event {
    ($ctx:expr, INFO, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::info!(
            target: $event,
            run_id = %$ctx.run_id,
            command = %$ctx.command,
            stage = %$stage,
            $($key = $val,)*
            "{}", $msg
        )
    };
    ($ctx:expr, DEBUG, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::debug!(
            target: $event,
            run_id = %$ctx.run_id,
            command = %$ctx.command,
            stage = %$stage,
            $($key = $val,)*
            "{}", $msg
        )
    };
    ($ctx:expr, WARN, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::warn!(
            target: $event,
            run_id = %$ctx.run_id,
            command = %$ctx.command,
            stage = %$stage,
            $($key = $val,)*
            "{}", $msg
        )
    };
    ($ctx:expr, ERROR, $event:expr, $stage:expr, $msg:expr $(, $key:ident = $val:expr)*) => {
        tracing::error!(
            target: $event,
            run_id = %$ctx.run_id,
            command = %$ctx.command,
            stage = %$stage,
            $($key = $val,)*
            "{}", $msg
        )
    };
}
