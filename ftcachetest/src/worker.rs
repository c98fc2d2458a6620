//! Worker
//!
//! Drives a single worker through its rounds:
//! shuffle, rendezvous, flush, rendezvous and, every `check_interval` rounds, verify.

// Imports
use {
	crate::{arena::Region, detector, pressure::ScratchBuffer, shuffle::Shuffler, Barrier, Error, WorkerId},
	rand::Rng,
};

/// Round parameters
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct RoundParams {
	/// Number of rounds
	pub num_repeats: u64,

	/// Rounds between verifications
	pub check_interval: u64,

	/// Scratch buffer size
	pub flush_size: usize,

	/// Whether to plant a foreign byte before the first verification
	pub inject_fault: bool,
}

/// Worker
#[derive(Debug)]
pub struct Worker<'a, R> {
	/// Owned region
	region: Region<'a>,

	/// Scratch buffer
	scratch: ScratchBuffer,

	/// Shuffler
	shuffler: Shuffler,

	/// Random number generator
	rng: R,

	/// Parameters
	params: RoundParams,
}

impl<'a, R: Rng> Worker<'a, R> {
	/// Initializes a worker, filling its region with owned bytes.
	///
	/// # Errors
	/// Returns an error if the scratch buffer couldn't be allocated,
	/// or if `check_interval` is zero.
	pub fn init(mut region: Region<'a>, params: RoundParams, mut rng: R) -> Result<Self, Error> {
		if params.check_interval == 0 {
			return Err(Error::InvalidParameters("check interval must be positive".to_owned()));
		}

		let worker = region.worker();
		region.fill_owned(&mut rng);
		let scratch = ScratchBuffer::allocate(params.flush_size).map_err(|err| {
			tracing::error!(%worker, flush_size = params.flush_size, "Unable to allocate scratch buffer");
			err.with_worker(worker)
		})?;
		tracing::trace!(%worker, len = region.bytes().len(), "Worker initialized");

		Ok(Self {
			region,
			scratch,
			shuffler: Shuffler::new(),
			rng,
			params,
		})
	}

	/// Returns this worker's id
	pub fn id(&self) -> WorkerId {
		self.region.worker()
	}

	/// Returns this worker's region
	pub fn region(&self) -> &Region<'a> {
		&self.region
	}

	/// Returns this worker's region mutably
	pub fn region_mut(&mut self) -> &mut Region<'a> {
		&mut self.region
	}

	/// Runs all rounds, rendezvousing with the other workers through `barrier`.
	///
	/// # Errors
	/// Returns an error on the first corruption detected, or if the barrier is abandoned.
	/// On error, no further rendezvous are attempted.
	pub fn run(mut self, barrier: &Barrier) -> Result<WorkerOutput, Error> {
		let worker = self.id();
		let mut verifications = 0;
		for cycle in 0..self.params.num_repeats {
			// Mutate
			let swaps = self.shuffler.shuffle(self.region.bytes_mut(), &mut self.rng);
			let spin_len = ScratchBuffer::spin_len(&mut self.rng);
			tracing::trace!(%worker, cycle, swaps, spin_len, "Shuffled region");

			barrier.wait()?;

			// Pressure
			self.scratch.spin(spin_len);
			let flush_value = self.scratch.flush(&mut self.rng);
			tracing::trace!(%worker, cycle, flush_value, "Flushed scratch buffer");

			barrier.wait()?;

			// Verify
			if cycle % self.params.check_interval == 0 {
				if self.params.inject_fault && verifications == 0 {
					self.inject_fault(cycle);
				}

				if let Err(err) = detector::verify(&self.region, cycle) {
					tracing::error!(%worker, cycle, "Memory corruption detected");
					return Err(err);
				}
				verifications += 1;
			}
		}

		let checksum = self
			.scratch
			.checksum()
			.wrapping_add(self.region.bytes().iter().map(|&byte| u64::from(byte)).sum::<u64>());
		tracing::info!(%worker, verifications, "Worker done (anti-optimization checksum: {checksum:#x})");

		Ok(WorkerOutput {
			worker,
			checksum,
			verifications,
		})
	}

	/// Plants a byte owned by another worker in our region
	fn inject_fault(&mut self, cycle: u64) {
		let Some(foreign) = self.region.foreign_byte() else {
			tracing::warn!(worker = %self.id(), "Cannot inject fault with a single worker");
			return;
		};

		let bytes = self.region.bytes_mut();
		if bytes.is_empty() {
			return;
		}
		let idx = self.rng.gen_range(0..bytes.len());
		bytes[idx] = foreign;
		tracing::warn!(worker = %self.id(), cycle, idx, foreign, "Injected fault");
	}
}

/// Output of [`Worker::run`]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct WorkerOutput {
	/// Worker
	pub worker: WorkerId,

	/// Anti-optimization checksum.
	///
	/// Has no meaning, other than making the memory traffic observable.
	pub checksum: u64,

	/// Verifications performed
	pub verifications: u64,
}
