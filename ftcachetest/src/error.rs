//! Errors

// Imports
use {crate::arena::WorkerId, std::fmt};

/// Harness error.
///
/// Every variant is fatal: the driver stops on the first one.
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum Error {
	/// Memory could not be reserved
	Allocation {
		/// What was being allocated
		what:  &'static str,
		/// Requested size, in bytes
		bytes: usize,
		/// Worker that requested it, if any
		worker: Option<WorkerId>,
	},

	/// Barrier misuse, or a sibling worker failed
	Synchronization(SyncError),

	/// A region contained a byte not owned by its worker
	Corruption {
		/// Worker whose region was corrupted
		worker: WorkerId,
		/// Cycle in which the corruption was detected
		cycle:  u64,
	},

	/// Run parameters violate the harness' preconditions
	InvalidParameters(String),
}

impl Error {
	/// Attributes this error to `worker`, if it isn't already attributed
	#[must_use]
	pub fn with_worker(self, worker: WorkerId) -> Self {
		match self {
			Self::Allocation {
				what,
				bytes,
				worker: None,
			} => Self::Allocation {
				what,
				bytes,
				worker: Some(worker),
			},
			err => err,
		}
	}

	/// Returns whether this error is a consequence of another worker's failure,
	/// rather than a root cause.
	pub fn is_induced(&self) -> bool {
		matches!(self, Self::Synchronization(SyncError::Abandoned))
	}
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Allocation { what, bytes, worker } => {
				write!(f, "unable to allocate {bytes} bytes for {what}")?;
				if let Some(worker) = worker {
					write!(f, " of worker {worker}")?;
				}
				Ok(())
			},
			Self::Synchronization(err) => write!(f, "synchronization failure: {err}"),
			Self::Corruption { worker, cycle } => {
				write!(f, "memory corruption detected by worker {worker} in cycle {cycle}")
			},
			Self::InvalidParameters(msg) => write!(f, "invalid run parameters: {msg}"),
		}
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			Self::Synchronization(err) => Some(err),
			_ => None,
		}
	}
}

impl From<SyncError> for Error {
	fn from(err: SyncError) -> Self {
		Self::Synchronization(err)
	}
}

/// Synchronization error
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum SyncError {
	/// Barrier was created without participants
	NoParticipants,

	/// A participant gave up, so the rendezvous can never complete
	Abandoned,

	/// A worker thread could not be spawned
	SpawnFailed {
		/// Worker that wasn't spawned
		worker: WorkerId,
	},

	/// A worker thread panicked
	WorkerPanicked {
		/// Worker that panicked
		worker: WorkerId,
	},
}

impl fmt::Display for SyncError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::NoParticipants => write!(f, "barrier has no participants"),
			Self::Abandoned => write!(f, "barrier was abandoned by another worker"),
			Self::SpawnFailed { worker } => write!(f, "unable to spawn worker {worker}"),
			Self::WorkerPanicked { worker } => write!(f, "worker {worker} panicked"),
		}
	}
}

impl std::error::Error for SyncError {}
