//! REST transport subsystem.
//!
//! # Data Flow
//! ```text
//! RestRequest (method, resource, query, body, overrides)
//!     → multiplexer.rs: pick start endpoint (endpoints.rs rotation)
//!         → authenticate (auth::Authenticator), send
//!         → transport error / 5xx ─▶ record failure, next endpoint
//!         → 401 / 402 / 403 / 429 ─▶ typed error (problem.rs)
//!         → anything else ─▶ RestOutcome (outcome.rs)
//!     → all endpoints failed ─▶ ClientError::ServiceUnreachable
//! pagination.rs: RestRequest → Stream of items across cursor segments
//! ```
//!
//! # Design Decisions
//! - Requests are endpoint-agnostic and rebuilt per attempt
//! - No implicit retry on the same endpoint; each endpoint is tried once
//! - Cancellation aborts the in-flight attempt and skips the rest

pub mod endpoints;
pub mod multiplexer;
pub mod outcome;
pub mod pagination;
pub mod problem;
pub mod request;

pub use endpoints::EndpointSet;
pub use multiplexer::{default_user_agent, RestClient, TransportOptions};
pub use outcome::RestOutcome;
pub use pagination::{paginate, ListSegment, ListSegmentMeta};
pub use problem::Problem;
pub use request::{MultipartPayload, RequestBody, RequestOverrides, RestRequest};
