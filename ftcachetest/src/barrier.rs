//! Barrier
//!
//! Reusable rendezvous for a fixed number of workers. Unlike
//! [`std::sync::Barrier`], it can be abandoned, so a failing worker wakes its
//! siblings up with an error instead of leaving them waiting forever.

// Imports
use {
	crate::SyncError,
	std::{
		sync::{Condvar, Mutex, MutexGuard, PoisonError},
		thread,
	},
};

/// Barrier
#[derive(Debug)]
pub struct Barrier {
	/// Number of participants per rendezvous
	participants: usize,

	/// State
	state: Mutex<State>,

	/// Signalled when a rendezvous completes or the barrier is abandoned
	cvar: Condvar,
}

/// Barrier state
#[derive(Debug)]
struct State {
	/// Participants that arrived at the current rendezvous
	arrived: usize,

	/// Completed rendezvous
	generation: u64,

	/// Whether a participant gave up
	abandoned: bool,
}

impl Barrier {
	/// Creates a barrier for `participants` workers
	///
	/// # Errors
	/// Returns an error if `participants` is zero.
	pub fn new(participants: usize) -> Result<Self, SyncError> {
		if participants == 0 {
			return Err(SyncError::NoParticipants);
		}

		Ok(Self {
			participants,
			state: Mutex::new(State {
				arrived:    0,
				generation: 0,
				abandoned:  false,
			}),
			cvar: Condvar::new(),
		})
	}

	/// Returns the number of participants
	pub fn participants(&self) -> usize {
		self.participants
	}

	/// Blocks until all participants have called `wait`.
	///
	/// Exactly one participant per rendezvous is told it arrived last.
	///
	/// # Errors
	/// Returns an error if the barrier was abandoned before the rendezvous completed.
	pub fn wait(&self) -> Result<BarrierWaitResult, SyncError> {
		let mut state = self.lock();
		if state.abandoned {
			return Err(SyncError::Abandoned);
		}

		state.arrived += 1;
		if state.arrived == self.participants {
			state.arrived = 0;
			state.generation = state.generation.wrapping_add(1);
			self.cvar.notify_all();
			return Ok(BarrierWaitResult { is_last: true });
		}

		let generation = state.generation;
		let state = self
			.cvar
			.wait_while(state, |state| state.generation == generation && !state.abandoned)
			.unwrap_or_else(PoisonError::into_inner);

		// Note: If the generation advanced, our rendezvous completed, even if
		//       the barrier was abandoned afterwards.
		match state.generation == generation {
			true => Err(SyncError::Abandoned),
			false => Ok(BarrierWaitResult { is_last: false }),
		}
	}

	/// Abandons this barrier.
	///
	/// All current and future waiters return [`SyncError::Abandoned`].
	pub fn abandon(&self) {
		let mut state = self.lock();
		if !state.abandoned {
			tracing::debug!(arrived = state.arrived, generation = state.generation, "Abandoning barrier");
			state.abandoned = true;
		}
		self.cvar.notify_all();
	}

	/// Returns whether this barrier was abandoned
	pub fn is_abandoned(&self) -> bool {
		self.lock().abandoned
	}

	/// Returns a guard that abandons this barrier if the current thread panics
	pub fn abandon_on_panic(&self) -> AbandonOnPanic<'_> {
		AbandonOnPanic { barrier: self }
	}

	fn lock(&self) -> MutexGuard<'_, State> {
		// Note: The state is never left inconsistent, so poisoning can be ignored
		self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

/// Result of [`Barrier::wait`]
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct BarrierWaitResult {
	/// Whether this participant completed the rendezvous
	is_last: bool,
}

impl BarrierWaitResult {
	/// Returns whether this participant was the last to arrive
	pub fn is_last(&self) -> bool {
		self.is_last
	}
}

/// Abandons a barrier when dropped during a panic
#[derive(Debug)]
pub struct AbandonOnPanic<'a> {
	barrier: &'a Barrier,
}

impl Drop for AbandonOnPanic<'_> {
	fn drop(&mut self) {
		if thread::panicking() {
			self.barrier.abandon();
		}
	}
}

#[cfg(test)]
mod tests {
	use {
		super::*,
		std::{
			sync::atomic::{AtomicUsize, Ordering},
			time::Duration,
		},
	};

	#[test]
	fn no_participants() {
		assert_eq!(Barrier::new(0).unwrap_err(), SyncError::NoParticipants);
	}

	#[test]
	fn single_participant_never_blocks() {
		let barrier = Barrier::new(1).unwrap();
		assert_eq!(barrier.participants(), 1);
		for _ in 0..10 {
			assert!(barrier.wait().unwrap().is_last());
		}
	}

	#[test]
	fn blocks_until_all_arrive() {
		const PARTICIPANTS: usize = 4;
		let barrier = Barrier::new(PARTICIPANTS).unwrap();
		let released = AtomicUsize::new(0);

		thread::scope(|s| {
			let waiters = (0..PARTICIPANTS - 1)
				.map(|_| {
					s.spawn(|| {
						let res = barrier.wait();
						released.fetch_add(1, Ordering::SeqCst);
						res
					})
				})
				.collect::<Vec<_>>();

			// With a participant missing, nobody may be released
			thread::sleep(Duration::from_millis(200));
			assert_eq!(released.load(Ordering::SeqCst), 0);

			let last = barrier.wait().unwrap();
			let results = waiters
				.into_iter()
				.map(|waiter| waiter.join().unwrap().unwrap())
				.collect::<Vec<_>>();

			assert_eq!(released.load(Ordering::SeqCst), PARTICIPANTS - 1);
			assert!(last.is_last());
			assert!(results.iter().all(|res| !res.is_last()));
		});
	}

	#[test]
	fn reusable_with_single_last_arriver() {
		const PARTICIPANTS: usize = 3;
		const ROUNDS: usize = 500;
		let barrier = Barrier::new(PARTICIPANTS).unwrap();
		let last_arrivals = AtomicUsize::new(0);

		thread::scope(|s| {
			for _ in 0..PARTICIPANTS {
				s.spawn(|| {
					for _ in 0..ROUNDS {
						if barrier.wait().unwrap().is_last() {
							last_arrivals.fetch_add(1, Ordering::SeqCst);
						}
					}
				});
			}
		});

		assert_eq!(last_arrivals.load(Ordering::SeqCst), ROUNDS);
	}

	#[test]
	fn abandon_wakes_waiters() {
		let barrier = Barrier::new(3).unwrap();

		thread::scope(|s| {
			let waiters = (0..2).map(|_| s.spawn(|| barrier.wait())).collect::<Vec<_>>();

			thread::sleep(Duration::from_millis(50));
			barrier.abandon();

			for waiter in waiters {
				assert_eq!(waiter.join().unwrap(), Err(SyncError::Abandoned));
			}
		});

		assert!(barrier.is_abandoned());
		assert_eq!(barrier.wait(), Err(SyncError::Abandoned));
	}

	#[test]
	fn panic_abandons() {
		let barrier = Barrier::new(2).unwrap();

		thread::scope(|s| {
			let waiter = s.spawn(|| barrier.wait());
			let panicker = s.spawn(|| {
				let _guard = barrier.abandon_on_panic();
				panic!("Worker failed");
			});

			assert!(panicker.join().is_err());
			assert_eq!(waiter.join().unwrap(), Err(SyncError::Abandoned));
		});
	}
}
