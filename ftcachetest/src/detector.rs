//! Corruption detector

// Imports
use crate::{arena::Region, Error, WorkerId};

/// Extension trait to check byte ownership
#[extend::ext(name = ByteOwnership)]
pub impl [u8] {
	/// Returns whether every byte is congruent to `worker` modulo `num_workers`.
	///
	/// Always scans the whole slice.
	fn is_owned_by(&self, worker: WorkerId, num_workers: usize) -> bool {
		let worker = worker.to_usize();
		self.iter()
			.fold(true, |owned, &byte| owned & (usize::from(byte) % num_workers == worker))
	}
}

/// Checks that `bytes` only contain values owned by `worker`
pub fn check(bytes: &[u8], worker: WorkerId, num_workers: usize) -> bool {
	bytes.is_owned_by(worker, num_workers)
}

/// Verifies `region` at `cycle`.
///
/// # Errors
/// Returns [`Error::Corruption`] if the region holds any byte its worker doesn't own.
pub fn verify(region: &Region<'_>, cycle: u64) -> Result<(), Error> {
	let worker = region.worker();
	match self::check(region.bytes(), worker, region.num_workers()) {
		true => Ok(()),
		false => Err(Error::Corruption { worker, cycle }),
	}
}
