//! Email validation jobs.
//!
//! # Data Flow
//! ```text
//! submit / submit_file
//!     → POST email-validations[?waitTime] (JSON or multipart)
//!     → 200/202 snapshot
//!     → loop: terminal or NO_WAIT? ─▶ done
//!             progress callback → JobCompletionWaiter::wait
//!             → GET email-validations/{id}[?waitTime]
//!             → 404/410 ─▶ Ok(None)
//!     → completed with truncated entries → follow entries cursor
//! list / list_entries → rest::paginate (lazy stream)
//! ```
//!
//! # Design Decisions
//! - One signal may cover the submission and every poll after it
//! - A job disappearing between polls is an absent result, not an error

pub mod client;
pub mod types;

pub use client::EmailValidations;
pub use types::{
    CompletionCallback, Direction, EntryListOptions, FileOptions, FileValidationRequest,
    JobSettings, Progress, RequestEntry, Validation, ValidationEntry, ValidationListOptions,
    ValidationOverview, ValidationRequest, ValidationStatus,
};
