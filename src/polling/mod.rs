//! Job completion polling.
//!
//! # Data Flow
//! ```text
//! overview (status, noOfEntries, progress.estimatedTimeRemaining)
//!     → waiter.rs: compute_delay
//!         - ETA parses (delay.rs) → ETA seconds
//!         - otherwise             → 2^(log10(entries) - 1) seconds
//!         - clamp to [min_delay, max_delay]
//!     → waiter.rs: wait (sleep, or abort on the cancellation signal)
//! policy.rs: how long the service may hold each response, progress callback
//! ```
//!
//! # Design Decisions
//! - Larger jobs are polled less often
//! - Each wait is bounded by `max_delay`; the workflow as a whole is bounded
//!   only by the caller's cancellation signal

pub mod delay;
pub mod policy;
pub mod waiter;

pub use policy::{ProgressCallback, WaitPolicy};
pub use waiter::{JobCompletionWaiter, DEFAULT_MAX_DELAY, DEFAULT_MIN_DELAY};
