//! Filipe's Cache Tester (`ftcachetest`)

// Modules
mod args;
mod config;

// Imports
use {
	self::{args::Args, config::Config},
	anyhow::Context,
	clap::Parser,
	ftcachetest::{harness, sweep, Harness, RepeatSchedule, RunParams, WorkerId},
	ftcachetest_util::logger,
	std::{fs, time::Instant},
};

fn main() -> Result<(), anyhow::Error> {
	// Get arguments
	let args = Args::parse();
	logger::pre_init::debug(format!("Args: {args:?}"));

	// Initialize logging
	logger::init(args.log_file.as_deref(), args.log_file_append);

	// Read the config file, if any
	let config = match &args.config_file {
		Some(config_file) => {
			let config_file = fs::File::open(config_file).context("Unable to open config file")?;
			serde_json::from_reader::<_, Config>(config_file).context("Unable to parse config file")?
		},
		None => Config::default(),
	};
	tracing::debug!(?config, "Loaded config");
	anyhow::ensure!(!config.memsizes.is_empty(), "Config must specify at least one region size");

	// Then sweep through all runs
	let schedule = RepeatSchedule::new(config.min_repeats, config.max_repeats, config.repeat_growth);
	for (run_idx, (num_repeats, memsize)) in sweep::runs(schedule, &config.memsizes).enumerate() {
		let params = RunParams {
			num_workers: config.num_workers,
			memsize,
			num_repeats,
			flush_size: config.flush_size,
			check_interval: config.check_interval,
			seed: config.seed.map(|seed| harness::mix_seed(seed, run_idx as u64)),
			// Note: Only the first run is sabotaged, there's nothing more to learn after it.
			inject_fault: args.inject_fault.filter(|_| run_idx == 0).map(WorkerId::new),
		};

		tracing::info!("num_repeats: {num_repeats} size: {memsize}");
		let start_time = Instant::now();
		Harness::new(params)
			.run()
			.with_context(|| format!("Run failed (num_repeats: {num_repeats}, size: {memsize})"))?;
		let duration = start_time.elapsed();

		tracing::info!("done. duration: {:.3} seconds.", duration.as_secs_f64());
	}

	Ok(())
}
