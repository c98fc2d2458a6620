//! Sweep
//!
//! Geometrically growing repeat counts, each run over a fixed set of region sizes.

// Imports
use itertools::Itertools;

/// Repeat schedule.
///
/// Yields a strictly increasing sequence of repeat counts, starting at `start`
/// and multiplying by `growth` each step, up to and including `max`.
#[derive(Clone, Debug)]
pub struct RepeatSchedule {
	/// Next repeat count
	next: Option<u64>,

	/// Maximum repeat count
	max: u64,

	/// Growth factor
	growth: f64,
}

impl RepeatSchedule {
	/// Creates a new schedule
	pub fn new(start: u64, max: u64, growth: f64) -> Self {
		Self {
			next: (start <= max).then_some(start),
			max,
			growth,
		}
	}
}

impl Iterator for RepeatSchedule {
	type Item = u64;

	fn next(&mut self) -> Option<Self::Item> {
		let cur = self.next?;

		// Note: Always advance by at least 1, so small counts and
		//       growth factors below 2 still make progress.
		// Note: Float to int casts saturate, so huge values just end the schedule.
		let grown = (cur as f64 * self.growth) as u64;
		self.next = cur
			.checked_add(1)
			.map(|min_next| u64::max(min_next, grown))
			.filter(|&next| next <= self.max);

		Some(cur)
	}
}

/// Returns all `(num_repeats, memsize)` runs of a sweep, in order
pub fn runs<'a>(schedule: RepeatSchedule, memsizes: &'a [usize]) -> impl Iterator<Item = (u64, usize)> + 'a {
	schedule.cartesian_product(memsizes.iter().copied())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn schedule_grows_geometrically() {
		let schedule = RepeatSchedule::new(1, 1000, 2.5).collect::<Vec<_>>();
		assert_eq!(schedule, [1, 2, 5, 12, 30, 75, 187, 467]);
	}

	#[test]
	fn schedule_includes_max() {
		let schedule = RepeatSchedule::new(1, 16, 2.0).collect::<Vec<_>>();
		assert_eq!(schedule, [1, 2, 4, 8, 16]);
	}

	#[test]
	fn schedule_always_progresses() {
		let schedule = RepeatSchedule::new(0, 5, 1.0).collect::<Vec<_>>();
		assert_eq!(schedule, [0, 1, 2, 3, 4, 5]);

		let schedule = RepeatSchedule::new(3, 10, f64::NAN).collect::<Vec<_>>();
		assert_eq!(schedule, [3, 4, 5, 6, 7, 8, 9, 10]);
	}

	#[test]
	fn schedule_ends_at_u64_max() {
		let schedule = RepeatSchedule::new(u64::MAX - 1, u64::MAX, 10.0).collect::<Vec<_>>();
		assert_eq!(schedule, [u64::MAX - 1, u64::MAX]);
	}

	#[test]
	fn empty_schedule() {
		assert_eq!(RepeatSchedule::new(10, 5, 2.0).count(), 0);
	}

	#[test]
	fn runs_sweep_sizes_per_repeat_count() {
		let runs = runs(RepeatSchedule::new(1, 4, 2.0), &[256, 512]).collect::<Vec<_>>();
		assert_eq!(runs, [(1, 256), (1, 512), (2, 256), (2, 512), (4, 256), (4, 512)]);
	}
}
