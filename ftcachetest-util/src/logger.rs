//! Logger
//!
//! Logs to stderr, filtered by `RUST_LOG`, and optionally to a file,
//! filtered by `RUST_LOG_FILE`.

// Imports
use {
	std::{
		env,
		fs,
		io::{self, IsTerminal},
		path::Path,
		sync::{Mutex, PoisonError},
	},
	tracing::Level,
	tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer},
};

/// Default filter for stderr
const DEFAULT_STDERR_FILTER: &str = "info";

/// Default filter for the log file
const DEFAULT_FILE_FILTER: &str = "debug";

/// Initializes the global logger.
///
/// Any messages queued through [`pre_init`] are emitted right after.
/// If the log file cannot be opened, logging continues to stderr only.
pub fn init(log_file: Option<&Path>, log_file_append: bool) {
	let stderr_layer = fmt::layer()
		.with_ansi(io::stderr().is_terminal())
		.with_writer(io::stderr)
		.with_filter(self::env_filter("RUST_LOG", DEFAULT_STDERR_FILTER));

	let file_layer = log_file.and_then(|path| {
		let file = fs::OpenOptions::new()
			.create(true)
			.write(true)
			.append(log_file_append)
			.truncate(!log_file_append)
			.open(path);

		match file {
			Ok(file) => Some(
				fmt::layer()
					.with_ansi(false)
					.with_writer(Mutex::new(file))
					.with_filter(self::env_filter("RUST_LOG_FILE", DEFAULT_FILE_FILTER)),
			),
			Err(err) => {
				pre_init::warn(format!("Unable to open log file {path:?}: {err}"));
				None
			},
		}
	});

	// Note: Another subscriber may already be installed (e.g. by tests), in
	//       which case we just log through it.
	if let Err(err) = tracing_subscriber::registry()
		.with(stderr_layer)
		.with(file_layer)
		.try_init()
	{
		pre_init::warn(format!("Logger was already initialized: {err}"));
	}

	pre_init::flush();
}

/// Creates an env filter from `var`, falling back to `default` if unset or invalid
fn env_filter(var: &str, default: &str) -> EnvFilter {
	match env::var(var) {
		Ok(filter) => EnvFilter::try_new(&filter).unwrap_or_else(|err| {
			pre_init::warn(format!("Ignoring invalid filter {filter:?} in `{var}`: {err}"));
			EnvFilter::new(default)
		}),
		Err(_) => EnvFilter::new(default),
	}
}

/// Messages logged before the logger exists
pub mod pre_init {
	use super::*;

	/// Queued messages
	static QUEUE: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

	/// Queues a debug message
	pub fn debug(msg: impl Into<String>) {
		self::push(Level::DEBUG, msg.into());
	}

	/// Queues a warning
	pub fn warn(msg: impl Into<String>) {
		self::push(Level::WARN, msg.into());
	}

	fn push(level: Level, msg: String) {
		QUEUE.lock().unwrap_or_else(PoisonError::into_inner).push((level, msg));
	}

	/// Emits all queued messages through `tracing`
	pub(super) fn flush() {
		let msgs = std::mem::take(&mut *QUEUE.lock().unwrap_or_else(PoisonError::into_inner));
		for (level, msg) in msgs {
			match level == Level::WARN {
				true => tracing::warn!("{msg}"),
				false => tracing::debug!("{msg}"),
			}
		}
	}

	#[cfg(test)]
	mod tests {
		use super::*;

		#[test]
		fn flush_empties_queue() {
			debug("first");
			warn("second");
			flush();
			assert!(QUEUE.lock().unwrap().is_empty());
		}
	}
}
