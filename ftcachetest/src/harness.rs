//! Harness
//!
//! Runs all workers of a single test run over a shared arena.

// Imports
use {
	crate::{
		arena::MAX_WORKERS,
		worker::{RoundParams, Worker, WorkerOutput},
		Arena,
		Barrier,
		Error,
		Region,
		SyncError,
		WorkerId,
	},
	rand::{rngs::StdRng, SeedableRng},
	std::thread,
};

/// Run parameters
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct RunParams {
	/// Number of workers
	pub num_workers: usize,

	/// Bytes per worker region
	pub memsize: usize,

	/// Rounds per worker
	pub num_repeats: u64,

	/// Bytes per worker scratch buffer
	pub flush_size: usize,

	/// Rounds between verifications
	pub check_interval: u64,

	/// Seed for the worker's random number generators.
	///
	/// If `None`, each worker is seeded from the OS.
	pub seed: Option<u64>,

	/// Worker whose region gets a foreign byte before its first verification
	pub inject_fault: Option<WorkerId>,
}

impl RunParams {
	/// Validates these parameters
	///
	/// # Errors
	/// Returns an error describing the first invalid parameter.
	pub fn validate(&self) -> Result<(), Error> {
		let invalid = |msg: String| Err(Error::InvalidParameters(msg));

		if !(1..=MAX_WORKERS).contains(&self.num_workers) {
			return invalid(format!(
				"number of workers must be within 1..={MAX_WORKERS}, found {}",
				self.num_workers
			));
		}
		if self.memsize == 0 {
			return invalid("region size must be positive".to_owned());
		}
		if self.check_interval == 0 {
			return invalid("check interval must be positive".to_owned());
		}
		match self.inject_fault {
			Some(worker) if worker.to_usize() >= self.num_workers => {
				return invalid(format!("cannot inject fault into non-existing worker {worker}"));
			},
			Some(_) if self.num_workers == 1 => {
				return invalid("cannot inject fault with a single worker".to_owned());
			},
			_ => (),
		}

		Ok(())
	}

	/// Returns the round parameters for `worker`
	fn round_params(&self, worker: WorkerId) -> RoundParams {
		RoundParams {
			num_repeats:    self.num_repeats,
			check_interval: self.check_interval,
			flush_size:     self.flush_size,
			inject_fault:   self.inject_fault == Some(worker),
		}
	}

	/// Creates the random number generator for `worker`
	fn worker_rng(&self, worker: WorkerId) -> StdRng {
		match self.seed {
			Some(seed) => StdRng::seed_from_u64(self::mix_seed(seed, worker.to_usize() as u64)),
			None => StdRng::from_entropy(),
		}
	}
}

/// Derives an independent seed for `stream` from `seed`
pub fn mix_seed(seed: u64, stream: u64) -> u64 {
	// Note: `StdRng::seed_from_u64` already scrambles its input, we just need
	//       distinct inputs for distinct streams.
	seed ^ stream.wrapping_add(1).wrapping_mul(0x9e37_79b9_7f4a_7c15)
}

/// Harness
#[derive(Debug)]
pub struct Harness {
	/// Parameters
	params: RunParams,
}

impl Harness {
	/// Creates a new harness
	pub fn new(params: RunParams) -> Self {
		Self { params }
	}

	/// Returns the parameters
	pub fn params(&self) -> &RunParams {
		&self.params
	}

	/// Allocates an arena, runs all workers over it, and releases it.
	///
	/// # Errors
	/// Returns an error if the parameters are invalid, if allocation fails,
	/// or if any worker fails.
	pub fn run(&self) -> Result<RunOutput, Error> {
		self.params.validate()?;

		let mut arena = Arena::allocate(self.params.memsize, self.params.num_workers)?;
		let output = self.run_on(&mut arena);
		arena.release();

		output
	}

	/// Runs all workers over `arena`.
	///
	/// The barrier is created before, and every worker is joined before returning,
	/// so neither the arena nor the barrier can be observed after teardown.
	///
	/// # Errors
	/// Returns an error if the parameters are invalid, don't match the arena,
	/// or if any worker fails. If multiple workers fail, the root cause is returned
	/// over the errors it induced on the others.
	pub fn run_on(&self, arena: &mut Arena) -> Result<RunOutput, Error> {
		self.params.validate()?;
		if (arena.memsize(), arena.num_workers()) != (self.params.memsize, self.params.num_workers) {
			return Err(Error::InvalidParameters(format!(
				"arena has {} regions of {} bytes, expected {} regions of {} bytes",
				arena.num_workers(),
				arena.memsize(),
				self.params.num_workers,
				self.params.memsize
			)));
		}

		let barrier = Barrier::new(self.params.num_workers)?;
		tracing::info!(
			num_workers = self.params.num_workers,
			memsize = self.params.memsize,
			num_repeats = self.params.num_repeats,
			"Starting run"
		);
		tracing::debug!(params = ?self.params, "Run parameters");

		let results = thread::scope(|s| {
			let barrier = &barrier;
			let handles = arena
				.regions_mut()
				.map(|region| {
					let worker = region.worker();
					let params = self.params.round_params(worker);
					let rng = self.params.worker_rng(worker);

					let handle = thread::Builder::new()
						.name(format!("worker-{worker}"))
						.spawn_scoped(s, move || self::run_worker(region, params, rng, barrier));

					// Note: Workers already spawned would otherwise wait for this one forever
					if let Err(err) = &handle {
						tracing::error!(%worker, ?err, "Unable to spawn worker");
						barrier.abandon();
					}

					(worker, handle)
				})
				.collect::<Vec<_>>();

			handles
				.into_iter()
				.map(|(worker, handle)| match handle {
					Ok(handle) => handle.join().unwrap_or_else(|_| {
						tracing::error!(%worker, "Worker panicked");
						Err(Error::Synchronization(SyncError::WorkerPanicked { worker }))
					}),
					Err(_) => Err(Error::Synchronization(SyncError::SpawnFailed { worker })),
				})
				.collect::<Vec<_>>()
		});

		let workers = self::root_cause(results)?;
		tracing::info!(num_workers = workers.len(), "Run finished");
		Ok(RunOutput { workers })
	}
}

/// Initializes and runs a single worker.
///
/// If the worker fails at any point, including during initialization,
/// `barrier` is abandoned so its siblings don't wait for it forever.
fn run_worker(region: Region<'_>, params: RoundParams, rng: StdRng, barrier: &Barrier) -> Result<WorkerOutput, Error> {
	let _guard = barrier.abandon_on_panic();
	let res = Worker::init(region, params, rng).and_then(|worker| worker.run(barrier));
	if res.is_err() {
		barrier.abandon();
	}

	res
}

/// Collects all worker results.
///
/// Errors induced by another worker's failure are only returned
/// if no other error exists.
fn root_cause(results: Vec<Result<WorkerOutput, Error>>) -> Result<Vec<WorkerOutput>, Error> {
	let mut workers = Vec::with_capacity(results.len());
	let mut induced_err = None;
	for res in results {
		match res {
			Ok(output) => workers.push(output),
			Err(err) if err.is_induced() => {
				induced_err.get_or_insert(err);
			},
			Err(err) => return Err(err),
		}
	}

	match induced_err {
		Some(err) => Err(err),
		None => Ok(workers),
	}
}

/// Output for [`Harness::run`]
#[derive(Clone, Debug)]
pub struct RunOutput {
	/// Output of each worker, in worker order
	pub workers: Vec<WorkerOutput>,
}
