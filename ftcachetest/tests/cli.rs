//! Command line interface

// Imports
use std::{
	env,
	fs,
	path::PathBuf,
	process::{Command, Output},
};

/// Writes `config` to a temporary file and runs the binary with it and `args`
fn run(name: &str, config: &str, args: &[&str]) -> Output {
	let config_path = env::temp_dir().join(format!("ftcachetest-{}-{name}.json", std::process::id()));
	fs::write(&config_path, config).expect("Unable to write config");

	let output = Command::new(env!("CARGO_BIN_EXE_ftcachetest"))
		.arg("--config")
		.arg(&config_path)
		.args(args)
		.env("RUST_LOG", "info")
		.output()
		.expect("Unable to run binary");

	let _ = fs::remove_file(config_path);
	output
}

const SMALL_SWEEP: &str = r#"{
	"num_workers": 4,
	"memsizes": [256, 512],
	"flush_size": 4096,
	"check_interval": 1,
	"max_repeats": 12,
	"seed": 1
}"#;

#[test]
fn sweep_succeeds() {
	let output = run("sweep", SMALL_SWEEP, &[]);
	let stderr = String::from_utf8_lossy(&output.stderr);
	assert!(output.status.success(), "Sweep failed: {stderr}");

	// Note: Repeat counts 1, 2, 5 and 12, each over both sizes
	assert_eq!(stderr.matches("done. duration:").count(), 8);
	assert_eq!(stderr.matches("anti-optimization checksum: 0x").count(), 8 * 4);
}

#[test]
fn injected_fault_fails_process() {
	let output = run("fault", SMALL_SWEEP, &["--inject-fault", "1"]);
	let stderr = String::from_utf8_lossy(&output.stderr);

	assert!(!output.status.success());
	assert!(
		stderr.contains("memory corruption detected by worker 1 in cycle 0"),
		"Missing diagnostic: {stderr}"
	);
	assert_eq!(stderr.matches("done. duration:").count(), 0);
}

#[test]
fn invalid_config_fails_process() {
	let output = run("invalid", r#"{ "num_workers": 0, "memsizes": [256], "max_repeats": 1 }"#, &[]);
	let stderr = String::from_utf8_lossy(&output.stderr);

	assert!(!output.status.success());
	assert!(stderr.contains("invalid run parameters"), "Missing diagnostic: {stderr}");
}

#[test]
fn missing_config_file() {
	let output = Command::new(env!("CARGO_BIN_EXE_ftcachetest"))
		.arg("--config")
		.arg(PathBuf::from("/nonexistent/ftcachetest.json"))
		.output()
		.expect("Unable to run binary");

	assert!(!output.status.success());
	assert!(String::from_utf8_lossy(&output.stderr).contains("Unable to open config file"));
}
