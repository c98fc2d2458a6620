//! Cache pressure generator

// Imports
use {
	crate::Error,
	rand::Rng,
	std::hint,
};

/// Upper bound (exclusive) of the randomized spin before each flush
pub const MAX_SPIN: u32 = 16;

/// Scratch buffer.
///
/// Overwriting it evicts the cache lines of whatever the worker touched before,
/// in roughly the same window as every other worker does the same.
#[derive(Debug)]
pub struct ScratchBuffer {
	/// Bytes
	bytes: Vec<u8>,

	/// Last value observed by the spin loop
	sentinel: u32,
}

impl ScratchBuffer {
	/// Allocates a scratch buffer of `flush_size` bytes
	///
	/// # Errors
	/// Returns an error if the memory couldn't be reserved.
	pub fn allocate(flush_size: usize) -> Result<Self, Error> {
		let mut bytes = Vec::new();
		bytes.try_reserve_exact(flush_size).map_err(|_| Error::Allocation {
			what:   "scratch buffer",
			bytes:  flush_size,
			worker: None,
		})?;
		bytes.resize(flush_size, 0);

		Ok(Self { bytes, sentinel: 0 })
	}

	/// Returns the bytes of this buffer
	pub fn bytes(&self) -> &[u8] {
		&self.bytes
	}

	/// Chooses how long the next spin will last
	pub fn spin_len(rng: &mut impl Rng) -> u32 {
		rng.gen_range(0..MAX_SPIN)
	}

	/// Busy-waits for `len` iterations
	pub fn spin(&mut self, mut len: u32) {
		while len > 0 {
			len -= 1;
			self.sentinel = hint::black_box(len);
		}
	}

	/// Overwrites the whole buffer with a single random byte.
	///
	/// Returns the byte written.
	pub fn flush(&mut self, rng: &mut impl Rng) -> u8 {
		let value = rng.gen::<u8>();
		self.bytes.fill(value);
		hint::black_box(self.bytes.as_mut_slice());

		value
	}

	/// Returns the anti-optimization checksum of this buffer.
	///
	/// Only exists so the writes to the buffer are observable.
	pub fn checksum(&self) -> u64 {
		self.bytes
			.iter()
			.fold(u64::from(self.sentinel), |sum, &byte| sum.wrapping_add(u64::from(byte)))
	}
}
