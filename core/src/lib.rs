//! Fluent HTTP request builder for exercising handlers under test.
//!
//! # Overview
//! Wraps the repetitive request/response plumbing of handler tests: build a
//! request through chained mutators, dispatch it against the server under
//! test, and validate status and redirect behavior. Failures go to a
//! pluggable [`Reporter`] instead of `Result` values, so test bodies stay
//! focused on the server, not on the client.
//!
//! # Design
//! - `Client` is a consuming builder created fresh per logical call; the
//!   first configuration error sticks and turns later operations into
//!   no-ops.
//! - Dispatch is synchronous and one-shot (ureq), with redirects followed
//!   manually so the hop limit and redirect-path policy stay in one place.
//! - [`Reporter`] is the single dynamic-dispatch seam: [`PanicReporter`]
//!   for real tests, [`FakeReporter`] for asserting that a scenario fails
//!   with the exact message it should.
//! - Process-wide defaults live in an explicit [`ClientConfig`], not in
//!   globals.

pub mod client;
pub mod config;
pub mod error;
pub mod expand;
pub mod report;
pub mod response;

pub use client::Client;
pub use config::{ClientConfig, CONTENT_TYPE_FORM, CONTENT_TYPE_JSON, USER_AGENT};
pub use error::Failure;
pub use expand::{expand, Arg};
pub use report::{FakeReporter, PanicReporter, Reporter};
pub use response::SimpleResponse;
