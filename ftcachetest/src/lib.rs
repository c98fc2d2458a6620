//! Filipe's Cache Tester (`ftcachetest`)
//!
//! Stresses cache coherency by having several workers shuffle their own region
//! of a shared arena, flush their caches together, and then verify that no
//! byte from another worker leaked into their region.

// Modules
pub mod arena;
pub mod barrier;
pub mod detector;
pub mod error;
pub mod harness;
pub mod pressure;
pub mod shuffle;
pub mod sweep;
pub mod worker;

// Exports
pub use self::{
	arena::{Arena, Region, WorkerId},
	barrier::Barrier,
	error::{Error, SyncError},
	harness::{Harness, RunOutput, RunParams},
	sweep::RepeatSchedule,
};
