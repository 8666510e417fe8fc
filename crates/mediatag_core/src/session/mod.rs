//! Tagging sessions.
//!
//! A session takes a validated [`TaggingRequest`] through every step in
//! order: analysis of videos, speaker reconciliation and review, metadata
//! embedding into temp copies, routing to the destination, and transcript
//! sidecars. It is meant to run on a worker thread; the caller listens on
//! the event channel and may cancel through the shared token.

mod errors;
mod request;
mod review;
mod runner;
mod types;

pub use errors::{SessionError, SessionResult, ValidationError};
pub use request::TaggingRequest;
pub use review::{AcceptAll, ReviewHandler};
pub use runner::TaggingSession;
pub use types::{ItemFailure, SessionEvent, SessionOutcome, SessionSummary};
