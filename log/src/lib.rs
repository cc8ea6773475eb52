use std::sync::Mutex;

use slog::Drain;
use slog::Fuse;
use slog_async::Async;
use slog_json::Json;

pub use slog::{debug, error, info, o, trace, warn, Logger};

/// Builds the root logger: JSON lines on stderr, written asynchronously and
/// tagged with the build information of the running binary.
pub fn initialize_logger() -> slog::Logger {
    let drain = Mutex::new(Json::default(std::io::stderr())).map(Fuse);
    let drain = Async::new(drain).build().fuse();

    Logger::root(drain, build_values())
}

/// Builds the root logger from `RUST_LOG` and installs it as the global
/// `slog-scope` logger. The returned guard must be kept alive.
#[cfg(feature = "env_logging")]
pub fn initialize_env_logger() -> (slog::Logger, slog_scope::GlobalLoggerGuard) {
    let drain = Mutex::new(Json::default(std::io::stderr())).map(Fuse);
    let drain = slog_envlogger::new(drain).ignore_res();
    let drain = Async::new(drain).build().fuse();

    let logger = Logger::root(drain, build_values());
    let guard = slog_scope::set_global_logger(logger.clone());

    (logger, guard)
}

/// A logger that discards everything, for tests and one-shot helpers.
pub fn discard() -> slog::Logger {
    Logger::root(slog::Discard, o!())
}

fn build_values() -> slog::OwnedKV<impl slog::SendSyncRefUnwindSafeKV + 'static> {
    o!(
        "service" => info::SERVICE,
        "version" => info::VERSION,
        "revision" => info::REVISION,
        "build_timestamp" => info::BUILD_TIMESTAMP
    )
}
