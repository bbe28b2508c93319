//! Cooperative cancellation subsystem.
//!
//! # Data Flow
//! ```text
//! Caller creates CancellationSignal
//!     → passes &signal to submit / get / list (shared by the whole chain)
//!     → multiplexer registers an abort callback per call (Registration)
//!     → waiter races its delay against signal.cancelled()
//!
//! signal.cancel()
//!     → flips the flag once
//!     → fires every registered callback exactly once
//!     → in-flight call / wait returns ClientError::OperationCanceled
//! ```
//!
//! # Design Decisions
//! - Callback lists instead of a native token; registering on an already
//!   cancelled signal fires the callback immediately
//! - Observers hold a Weak reference; only the caller owns the signal
//! - Registrations are RAII guards and unregister on drop

pub mod signal;

pub use signal::{CallbackId, CancellationSignal, Registration};
