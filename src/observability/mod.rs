//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! rest::multiplexer (one event per endpoint attempt)
//! polling::waiter   (one event per poll)
//!     → logging.rs (tracing events, filtered by RUST_LOG or config)
//!     → metrics.rs (counters and histograms through the `metrics` facade)
//!
//! Consumers:
//!     → stderr (fmt layer) for the CLI
//!     → whatever recorder the embedding application installs
//! ```
//!
//! # Design Decisions
//! - The library only emits; installing a subscriber or recorder is left to
//!   the binary or the embedding application
//! - Without a recorder every metric call is a no-op

pub mod logging;
pub mod metrics;
