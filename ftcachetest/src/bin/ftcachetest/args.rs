//! Arguments

// Imports
use std::path::PathBuf;

/// Arguments
#[derive(Debug)]
#[derive(clap::Parser)]
pub struct Args {
	/// Log file
	///
	/// Specifies a file to perform verbose logging to.
	/// You can use `RUST_LOG_FILE` to set filtering options
	#[clap(long = "log-file")]
	pub log_file: Option<PathBuf>,

	/// Whether to append to the log file
	#[clap(long = "log-file-append")]
	pub log_file_append: bool,

	/// Config file
	///
	/// If not specified, the default sweep is used.
	#[clap(long = "config")]
	pub config_file: Option<PathBuf>,

	/// Injects a fault into a worker's region before its first verification.
	///
	/// Used to check that corruption is caught: the process must fail,
	/// naming this worker.
	#[clap(long = "inject-fault", value_name = "WORKER")]
	pub inject_fault: Option<usize>,
}
