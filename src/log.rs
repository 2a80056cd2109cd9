//! Structured logging for taskline.
//!
//! The engine emits `tracing` events at operation boundaries; this module only
//! installs a subscriber for hosts that do not bring their own.
//!
//! Level resolution, first match wins:
//! 1. `init(true)` forces DEBUG
//! 2. `TASKLINE_DEBUG=1` (or `true`) forces DEBUG
//! 3. `TASKLINE_LOG=<level>` (error, warn, info, debug, trace)
//! 4. INFO
//!
//! Logs go to stderr.

use tracing::Level;
use tracing_subscriber::fmt;

/// Environment variable that enables debug logging.
pub const DEBUG_ENV: &str = "TASKLINE_DEBUG";
/// Environment variable holding an explicit log level.
pub const LEVEL_ENV: &str = "TASKLINE_LOG";

/// Install the global stderr subscriber.
///
/// Returns `false` when a subscriber was already installed, which is not an
/// error: the first one wins.
pub fn init(debug: bool) -> bool {
    let level = resolve_level(
        debug,
        std::env::var(DEBUG_ENV).ok().as_deref(),
        std::env::var(LEVEL_ENV).ok().as_deref(),
    );

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}

fn resolve_level(debug: bool, debug_env: Option<&str>, level_env: Option<&str>) -> Level {
    let env_debug = debug_env
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    if debug || env_debug {
        return Level::DEBUG;
    }

    level_env.and_then(parse_level).unwrap_or(Level::INFO)
}

fn parse_level(s: &str) -> Option<Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(Level::ERROR),
        "warn" | "warning" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}
