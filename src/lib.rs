//! Client library for a remote email verification service.
//!
//! # Architecture Overview
//!
//! ```text
//!   caller
//!     │  Client (client.rs)
//!     ├─▶ EmailValidations / Credits ──────────────┐
//!     │       submit → poll (polling::waiter) → get │
//!     │       list → rest::paginate                 │
//!     │                                             ▼
//!     │                                  RestClient (rest::multiplexer)
//!     │                                     │ rotate endpoints, fail over on
//!     │                                     │ transport errors and 5xx
//!     │                                     ├─▶ auth::Authenticator
//!     │                                     │     basic / bearer+TOTP / mTLS
//!     │                                     ▼
//!     │                          api-1 ─ api-2 ─ api-3 (HTTPS)
//!     │
//!     └─ CancellationSignal (cancellation) aborts any request or wait
//! ```

pub mod auth;
pub mod cancellation;
pub mod client;
pub mod config;
pub mod credits;
pub mod error;
pub mod observability;
pub mod polling;
pub mod rest;
pub mod validations;

pub use cancellation::CancellationSignal;
pub use client::{Client, ClientBuilder};
pub use error::{ClientError, ClientResult};
pub use polling::WaitPolicy;
pub use validations::{
    FileValidationRequest, Validation, ValidationOverview, ValidationRequest, ValidationStatus,
};
