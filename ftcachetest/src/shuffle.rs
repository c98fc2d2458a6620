//! Shuffle engine
//!
//! Moves bytes around inside a single region. No byte value is ever
//! created or altered, so the region's ownership invariant is preserved.

// Imports
use {rand::Rng, std::cmp};

/// Maximum length of each swapped run
pub const MAX_RUN_LEN: usize = 100;

/// Upper bound (exclusive) on the number of swaps per shuffle
pub const MAX_SWAPS: usize = 100;

/// Shuffler
#[derive(Debug)]
pub struct Shuffler {
	/// Temporary copy of the run being swapped.
	///
	/// Never grows past [`MAX_RUN_LEN`] and is emptied after every swap.
	scratch: Vec<u8>,
}

impl Shuffler {
	/// Creates a new shuffler
	pub fn new() -> Self {
		Self {
			scratch: Vec::with_capacity(MAX_RUN_LEN),
		}
	}

	/// Performs a random number of random swaps within `bytes`.
	///
	/// Returns the number of swaps performed.
	pub fn shuffle(&mut self, bytes: &mut [u8], rng: &mut impl Rng) -> usize {
		let swaps = rng.gen_range(0..MAX_SWAPS);
		if bytes.is_empty() {
			return 0;
		}

		// Note: Regions smaller than a run simply get shorter runs.
		let max_len = cmp::min(MAX_RUN_LEN, bytes.len());
		for _ in 0..swaps {
			let len = rng.gen_range(1..=max_len);
			let lhs = rng.gen_range(0..=bytes.len() - len);
			let rhs = rng.gen_range(0..=bytes.len() - len);
			self.swap_runs(bytes, lhs, rhs, len);
		}

		swaps
	}

	/// Swaps the runs `lhs..lhs+len` and `rhs..rhs+len` of `bytes`.
	///
	/// If the runs overlap, the bytes they share stay in place and only the
	/// parts that aren't shared are exchanged. This keeps the swap a
	/// permutation, and performing it twice restores the original bytes.
	///
	/// # Panics
	/// Panics if either run is out of bounds, or if `len > MAX_RUN_LEN`.
	pub fn swap_runs(&mut self, bytes: &mut [u8], lhs: usize, rhs: usize, len: usize) {
		assert!(len <= MAX_RUN_LEN, "Run length {len} exceeds maximum of {MAX_RUN_LEN}");
		assert!(
			cmp::max(lhs, rhs) + len <= bytes.len(),
			"Runs {lhs}/{rhs} of length {len} don't fit in {} bytes",
			bytes.len()
		);

		let (start, end) = (cmp::min(lhs, rhs), cmp::max(lhs, rhs));
		let distance = end - start;
		if distance == 0 || len == 0 {
			return;
		}

		// Note: Disjoint runs are exchanged whole. Overlapping runs exchange just
		//       their leading and trailing `distance` bytes.
		let swap_len = cmp::min(distance, len);
		let other = start + cmp::max(distance, len);

		self.scratch.extend_from_slice(&bytes[start..start + swap_len]);
		bytes.copy_within(other..other + swap_len, start);
		bytes[other..other + swap_len].copy_from_slice(&self.scratch);
		self.scratch.clear();
	}
}

impl Default for Shuffler {
	fn default() -> Self {
		Self::new()
	}
}
