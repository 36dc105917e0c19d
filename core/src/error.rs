//! Failure taxonomy for the test client.
//!
//! # Design
//! Failures are never returned to the caller; they are rendered to a
//! message and pushed through the [`crate::Reporter`]. The enum exists so
//! the sticky builder error stays structured and so tests can reason about
//! kinds rather than parse strings. Message texts are part of the
//! observable behavior and are asserted on by the self-tests.

use std::fmt;

use crate::expand::{expand, Arg};

/// Failures surfaced through the failure reporter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// `body_json` was handed the nil payload (`serde_json::Value::Null`).
    NilJsonPayload,

    /// `form_data` received an odd-length name/value list.
    OddFormArgs { count: usize },

    /// A 3xx code was passed to `expect_status`; redirects are declared
    /// via `expect_redirect_to`.
    StatusExpectationMisuse { code: u16 },

    /// Request construction or network-level failure, including a missed
    /// deadline.
    Transport { cause: String },

    /// A redirect hop targeted a path other than the expected one.
    RedirectMismatch { expected: String, actual: String },

    /// The redirect chain exceeded the hop limit.
    RedirectLoop { limit: usize, hop: usize },

    /// A redirect was expected but the exchange completed without one.
    RedirectExpectedButMissing { expected: String },

    /// An explicit expected status did not match the actual status.
    StatusMismatch { expected: u16, actual: u16 },

    /// No expectation was configured and the response status was 400 or
    /// above.
    UnexpectedFailureStatus { actual: u16 },

    /// The response body could not be drained.
    BodyRead { cause: String },

    /// The response body could not be decoded into the requested type.
    BodyDecode { cause: String },

    /// A self-test scenario that was expected to fail reached success.
    AssertionNotMet,
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Failure::NilJsonPayload => "payload to send is nil".to_string(),
            Failure::OddFormArgs { count } => expand(
                "Incorrect number of parameters $0 items, missed pair",
                &[Arg::Value(count)],
            ),
            Failure::StatusExpectationMisuse { code } => expand(
                "misuse of expect_status($0), use expect_redirect_to instead",
                &[Arg::Value(code)],
            ),
            Failure::Transport { cause } => {
                expand("Expected no error, got $0", &[Arg::Value(cause)])
            }
            Failure::RedirectMismatch { expected, actual } => expand(
                "expected to redirect path '$0', actual path '$1'",
                &[Arg::Value(expected), Arg::Value(actual)],
            ),
            Failure::RedirectLoop { limit, hop } => expand(
                "redirect limit of $0 exceeded at hop $1",
                &[Arg::Value(limit), Arg::Value(hop)],
            ),
            Failure::RedirectExpectedButMissing { expected } => expand(
                "expected to redirect path '$0' but no redirection happened",
                &[Arg::Value(expected)],
            ),
            Failure::StatusMismatch { expected, actual } => expand(
                "expected $0, got $1",
                &[Arg::Value(expected), Arg::Value(actual)],
            ),
            Failure::UnexpectedFailureStatus { actual } => {
                expand("expected success, got $0", &[Arg::Value(actual)])
            }
            Failure::BodyRead { cause } => {
                expand("failed to read response body: $0", &[Arg::Value(cause)])
            }
            Failure::BodyDecode { cause } => {
                expand("unmarshal payload failed: $0", &[Arg::Value(cause)])
            }
            Failure::AssertionNotMet => "ASSERTION NOT MET".to_string(),
        };
        f.write_str(&message)
    }
}

impl std::error::Error for Failure {}
