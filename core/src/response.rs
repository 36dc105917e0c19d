//! Simplified, fully-materialized view of a dispatched response.

use serde::de::DeserializeOwned;

use crate::error::Failure;
use crate::report::Reporter;

/// Immutable snapshot of a response: headers, status, and the body drained
/// to text. Produced by [`crate::Client::execute_simple`]; an empty value
/// (status `0`) means the dispatch already failed and reported.
pub struct SimpleResponse<'t> {
    pub headers: Vec<(String, String)>,
    pub status: u16,
    pub body: String,

    reporter: &'t dyn Reporter,
}

impl<'t> SimpleResponse<'t> {
    pub(crate) fn new(
        reporter: &'t dyn Reporter,
        status: u16,
        headers: Vec<(String, String)>,
        body: String,
    ) -> Self {
        Self { headers, status, body, reporter }
    }

    pub(crate) fn empty(reporter: &'t dyn Reporter) -> Self {
        Self::new(reporter, 0, Vec::new(), String::new())
    }

    /// First value for `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Decode the body as JSON into `T`, reporting a failure when decoding
    /// is not possible.
    pub fn decode_json<T: DeserializeOwned>(&self) -> Option<T> {
        match serde_json::from_str(&self.body) {
            Ok(value) => Some(value),
            Err(err) => {
                let failure = Failure::BodyDecode { cause: err.to_string() };
                self.reporter.report(&failure.to_string());
                self.reporter.fail_now();
                None
            }
        }
    }
}
