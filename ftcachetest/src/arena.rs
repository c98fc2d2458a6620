//! Arena
//!
//! A single contiguous buffer partitioned into one region per worker.

// Imports
use {
	crate::Error,
	rand::Rng,
	std::fmt,
};

/// Maximum number of workers.
///
/// Each worker owns the byte values congruent to its id, so past this
/// some workers would own no value at all.
pub const MAX_WORKERS: usize = 256;

/// Worker identity
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Debug)]
pub struct WorkerId(usize);

impl WorkerId {
	/// Creates a worker id from its index
	pub const fn new(idx: usize) -> Self {
		Self(idx)
	}

	/// Returns the index of this worker
	pub const fn to_usize(self) -> usize {
		self.0
	}
}

impl fmt::Display for WorkerId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		self.0.fmt(f)
	}
}

/// Arena
#[derive(Debug)]
pub struct Arena {
	/// All bytes
	bytes: Vec<u8>,

	/// Bytes per region
	memsize: usize,

	/// Number of regions
	num_workers: usize,
}

impl Arena {
	/// Allocates an arena for `num_workers` regions of `memsize` bytes each.
	///
	/// # Errors
	/// Returns an error if either argument is zero, or if the memory couldn't be reserved.
	pub fn allocate(memsize: usize, num_workers: usize) -> Result<Self, Error> {
		if memsize == 0 || num_workers == 0 {
			return Err(Error::InvalidParameters(format!(
				"arena needs at least one non-empty region (memsize: {memsize}, num_workers: {num_workers})"
			)));
		}

		let len = memsize.checked_mul(num_workers).ok_or(Error::Allocation {
			what:   "arena",
			bytes:  usize::MAX,
			worker: None,
		})?;

		let mut bytes = Vec::new();
		bytes
			.try_reserve_exact(len)
			.map_err(|_| Error::Allocation {
				what:   "arena",
				bytes:  len,
				worker: None,
			})?;
		bytes.resize(len, 0);
		tracing::trace!(len, memsize, num_workers, "Allocated arena");

		Ok(Self {
			bytes,
			memsize,
			num_workers,
		})
	}

	/// Returns the total size of this arena
	pub fn len(&self) -> usize {
		self.bytes.len()
	}

	/// Returns if this arena is empty.
	///
	/// Always false, since arenas can't be created empty.
	pub fn is_empty(&self) -> bool {
		self.bytes.is_empty()
	}

	/// Returns the size of each region
	pub fn memsize(&self) -> usize {
		self.memsize
	}

	/// Returns the number of regions
	pub fn num_workers(&self) -> usize {
		self.num_workers
	}

	/// Returns the bytes of `worker`'s region, if it exists
	pub fn region(&self, worker: WorkerId) -> Option<&[u8]> {
		self.bytes.chunks_exact(self.memsize).nth(worker.to_usize())
	}

	/// Splits this arena into all of its regions, in worker order.
	///
	/// The regions borrow the arena, so they can't outlive it.
	pub fn regions_mut(&mut self) -> impl ExactSizeIterator<Item = Region<'_>> {
		let num_workers = self.num_workers;
		self.bytes
			.chunks_exact_mut(self.memsize)
			.enumerate()
			.map(move |(idx, bytes)| Region {
				worker: WorkerId::new(idx),
				num_workers,
				bytes,
			})
	}

	/// Releases this arena
	pub fn release(self) {
		tracing::trace!(len = self.bytes.len(), "Released arena");
	}
}

/// Region of the arena owned by a single worker
#[derive(Debug)]
pub struct Region<'a> {
	/// Owner
	worker: WorkerId,

	/// Number of workers sharing the arena
	num_workers: usize,

	/// Bytes
	bytes: &'a mut [u8],
}

impl Region<'_> {
	/// Returns the owner of this region
	pub fn worker(&self) -> WorkerId {
		self.worker
	}

	/// Returns the number of workers sharing the arena
	pub fn num_workers(&self) -> usize {
		self.num_workers
	}

	/// Returns the bytes of this region
	pub fn bytes(&self) -> &[u8] {
		&*self.bytes
	}

	/// Returns the bytes of this region mutably
	pub fn bytes_mut(&mut self) -> &mut [u8] {
		&mut *self.bytes
	}

	/// Fills this region with random bytes owned by its worker
	pub fn fill_owned(&mut self, rng: &mut impl Rng) {
		let (worker, num_workers) = (self.worker, self.num_workers);
		for byte in self.bytes.iter_mut() {
			*byte = self::owned_byte(rng, worker, num_workers);
		}
	}

	/// Returns a byte value owned by some other worker.
	///
	/// Returns `None` if there's only a single worker.
	pub fn foreign_byte(&self) -> Option<u8> {
		match self.num_workers {
			1 => None,
			num_workers => u8::try_from((self.worker.to_usize() + 1) % num_workers).ok(),
		}
	}
}

/// Returns a uniformly random byte `b` with `b % num_workers == worker`.
///
/// # Panics
/// Panics if `worker >= num_workers` or `num_workers > MAX_WORKERS`.
pub fn owned_byte(rng: &mut impl Rng, worker: WorkerId, num_workers: usize) -> u8 {
	assert!(num_workers <= MAX_WORKERS, "Too many workers: {num_workers}");
	assert!(worker.to_usize() < num_workers, "Invalid worker {worker} for {num_workers} workers");

	// Note: We pick the multiple directly instead of rounding a random byte down,
	//       so values can't wrap past 255 when `num_workers` doesn't divide 256.
	let worker = worker.to_usize();
	let multiple = rng.gen_range(0..=(usize::from(u8::MAX) - worker) / num_workers);
	u8::try_from(multiple * num_workers + worker).expect("Owned byte didn't fit in a byte")
}

#[cfg(test)]
mod tests {
	use {super::*, rand::SeedableRng};

	#[test]
	fn regions_partition_arena() {
		let mut arena = Arena::allocate(64, 5).unwrap();
		let base = arena.bytes.as_ptr() as usize;
		let len = arena.len();
		assert_eq!(len, 320);
		assert!(!arena.is_empty());

		let ranges = arena
			.regions_mut()
			.map(|region| {
				let range = region.bytes().as_ptr_range();
				(region.worker(), range.start as usize - base, range.end as usize - base)
			})
			.collect::<Vec<_>>();

		assert_eq!(ranges.len(), 5);
		let mut expected_start = 0;
		for (idx, &(worker, start, end)) in ranges.iter().enumerate() {
			assert_eq!(worker, WorkerId::new(idx));
			assert_eq!(start, expected_start, "Gap or overlap before region {idx}");
			assert_eq!(end - start, 64);
			expected_start = end;
		}
		assert_eq!(expected_start, len);
	}

	#[test]
	fn region_views_match_regions() {
		let mut arena = Arena::allocate(8, 3).unwrap();
		for mut region in arena.regions_mut() {
			let value = u8::try_from(region.worker().to_usize()).unwrap();
			region.bytes_mut().fill(value);
		}

		assert_eq!(arena.region(WorkerId::new(0)), Some(&[0; 8][..]));
		assert_eq!(arena.region(WorkerId::new(2)), Some(&[2; 8][..]));
		assert_eq!(arena.region(WorkerId::new(3)), None);
	}

	#[test]
	fn allocate_rejects_degenerate_sizes() {
		assert!(matches!(Arena::allocate(0, 4), Err(Error::InvalidParameters(_))));
		assert!(matches!(Arena::allocate(256, 0), Err(Error::InvalidParameters(_))));
		assert_eq!(Arena::allocate(usize::MAX, 2).unwrap_err(), Error::Allocation {
			what:   "arena",
			bytes:  usize::MAX,
			worker: None,
		});
	}

	#[test]
	fn owned_bytes_never_wrap() {
		let mut rng = rand::rngs::StdRng::seed_from_u64(5);

		// Note: 3 and 7 don't divide 256, so rounding a random byte down would overflow.
		for num_workers in [1, 2, 3, 4, 7, 255, 256] {
			for worker in 0..num_workers {
				for _ in 0..64 {
					let byte = owned_byte(&mut rng, WorkerId::new(worker), num_workers);
					assert_eq!(usize::from(byte) % num_workers, worker);
				}
			}
		}
	}

	#[test]
	fn fill_owned_covers_region() {
		let mut rng = rand::rngs::StdRng::seed_from_u64(1);
		let mut arena = Arena::allocate(512, 3).unwrap();
		for mut region in arena.regions_mut() {
			region.fill_owned(&mut rng);
			let worker = region.worker().to_usize();
			assert!(region.bytes().iter().all(|&byte| usize::from(byte) % 3 == worker));
		}
	}

	#[test]
	fn foreign_byte_belongs_to_another_worker() {
		let mut arena = Arena::allocate(4, 4).unwrap();
		for region in arena.regions_mut() {
			let byte = region.foreign_byte().unwrap();
			assert_ne!(usize::from(byte) % 4, region.worker().to_usize());
		}

		let mut arena = Arena::allocate(4, 1).unwrap();
		assert_eq!(arena.regions_mut().next().unwrap().foreign_byte(), None);
	}
}
