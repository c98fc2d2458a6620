//! Configuration

/// Configuration
#[derive(Debug)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
	/// Number of workers
	pub num_workers: usize,

	/// Region sizes to sweep over, in bytes
	pub memsizes: Vec<usize>,

	/// Scratch buffer size, in bytes
	pub flush_size: usize,

	/// Rounds between verifications
	pub check_interval: u64,

	/// First repeat count
	pub min_repeats: u64,

	/// Last repeat count
	pub max_repeats: u64,

	/// Growth of the repeat count between sweeps
	pub repeat_growth: f64,

	/// Seed, for reproducible runs
	pub seed: Option<u64>,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			num_workers:    4,
			memsizes:       vec![256, 512, 1024, 2048, 4096, 8192, 16384],
			flush_size:     1 << 20,
			check_interval: 5000,
			min_repeats:    1,
			max_repeats:    1_000_000_000,
			repeat_growth:  2.5,
			seed:           None,
		}
	}
}
