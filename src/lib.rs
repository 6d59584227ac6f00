//! Shared building blocks for the exam services.
//!
//! The two-factor core lives in the `exam-2fa` crate and is re-exported here
//! as [`twofa`]. [`logging`] sets up the tracing subscriber the services log
//! through.

pub mod logging;

pub use exam_2fa::totp as twofa;
pub use logging::{LogConfig, LoggingError};
