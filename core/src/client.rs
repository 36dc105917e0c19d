//! Fluent request builder and dispatch engine.
//!
//! # Design
//! `Client` accumulates request configuration through chained consuming
//! mutators, then either materializes a plain `http::Request` (`build`) or
//! dispatches it against a server base address and validates the outcome
//! (`execute` / `execute_simple`). Every failure goes through the
//! [`Reporter`]; the first failure also lands in the sticky builder error,
//! after which all further mutators are no-ops and building yields nothing.
//! One builder serves exactly one logical HTTP call.

use std::time::Duration;

use http::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use http::{Method, Request, StatusCode};
use serde::Serialize;
use url::Url;

use crate::config::{ClientConfig, CONTENT_TYPE_FORM, CONTENT_TYPE_JSON};
use crate::error::Failure;
use crate::expand::{expand, Arg};
use crate::report::Reporter;
use crate::response::SimpleResponse;

/// Chainable builder for one test HTTP call.
///
/// ```no_run
/// use testclient_core::{Client, PanicReporter};
///
/// let t = PanicReporter::new();
/// let resp = Client::new(&t)
///     .post("/some-request/$0/resource", &[testclient_core::Arg::Value(&"id-1")])
///     .header("special-header", "magic")
///     .body_string(r#"{"token":"opaque-string"}"#)
///     .execute_simple("http://127.0.0.1:3000");
/// ```
pub struct Client<'t> {
    reporter: &'t dyn Reporter,
    config: ClientConfig,

    method: String,
    url: String,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
    form: Vec<(String, String)>,
    timeout: Option<Duration>,
    expected_status: Option<u16>,
    expect_redirect_path: Option<String>,
    err: Option<Failure>,
}

impl<'t> Client<'t> {
    /// A fresh builder with default configuration: method `GET`, path `/`,
    /// and the seeded `Accept` / `User-Agent` headers.
    pub fn new(reporter: &'t dyn Reporter) -> Self {
        Self::with_config(reporter, ClientConfig::default())
    }

    pub fn with_config(reporter: &'t dyn Reporter, config: ClientConfig) -> Self {
        let headers = vec![
            ("Accept".to_string(), CONTENT_TYPE_JSON.to_string()),
            ("User-Agent".to_string(), config.user_agent.clone()),
        ];
        Self {
            reporter,
            config,
            method: "GET".to_string(),
            url: "/".to_string(),
            headers,
            body: None,
            form: Vec::new(),
            timeout: None,
            expected_status: None,
            expect_redirect_path: None,
            err: None,
        }
    }

    /// HTTP method to use; the verb is not validated.
    pub fn method(mut self, method: &str) -> Self {
        if self.err.is_some() {
            return self;
        }
        self.method = method.to_string();
        self
    }

    /// Request path, expanded eagerly with `$0`-style positional tokens.
    /// A leading slash is not required here; joining onto the base address
    /// inserts one when missing.
    pub fn url(mut self, template: &str, args: &[Arg<'_>]) -> Self {
        if self.err.is_some() {
            return self;
        }
        self.url = expand(template, args);
        self
    }

    pub fn get(self, template: &str, args: &[Arg<'_>]) -> Self {
        self.method("GET").url(template, args)
    }

    pub fn post(self, template: &str, args: &[Arg<'_>]) -> Self {
        self.method("POST").url(template, args)
    }

    pub fn put(self, template: &str, args: &[Arg<'_>]) -> Self {
        self.method("PUT").url(template, args)
    }

    pub fn patch(self, template: &str, args: &[Arg<'_>]) -> Self {
        self.method("PATCH").url(template, args)
    }

    pub fn delete(self, template: &str, args: &[Arg<'_>]) -> Self {
        self.method("DELETE").url(template, args)
    }

    /// Set `name` to a single value, replacing any existing values.
    pub fn header(self, name: &str, value: &str) -> Self {
        self.header_values(name, value, &[])
    }

    /// Replace all values for `name` with `value`, then append each of
    /// `more` in order. Repeated calls with the same name reset first and
    /// re-accumulate.
    pub fn header_values(mut self, name: &str, value: &str, more: &[&str]) -> Self {
        if self.err.is_some() {
            return self;
        }
        set_header(&mut self.headers, name, value);
        for extra in more {
            self.headers.push((name.to_string(), (*extra).to_string()));
        }
        self
    }

    /// Drop all headers including the seeded defaults. Must be called
    /// before other header mutations to have a defined effect.
    pub fn clear_headers(mut self) -> Self {
        if self.err.is_some() {
            return self;
        }
        self.headers.clear();
        self
    }

    /// Raw body content.
    pub fn body_bytes(mut self, body: &[u8]) -> Self {
        if self.err.is_some() {
            return self;
        }
        self.body = Some(body.to_vec());
        self
    }

    /// Literal string body. The default content type applies unless a
    /// `Content-Type` header was set or `clear_headers` is in effect.
    pub fn body_string(self, body: &str) -> Self {
        self.body_bytes(body.as_bytes())
    }

    /// Serialize `payload` to JSON and use it as the body. The nil payload
    /// (anything serializing to JSON `null`) fails the test before any
    /// byte serialization is attempted.
    pub fn body_json<T: Serialize>(mut self, payload: &T) -> Self {
        if self.err.is_some() {
            return self;
        }
        let value = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(err) => {
                self.fail(Failure::Transport { cause: err.to_string() });
                return self;
            }
        };
        if value.is_null() {
            self.fail(Failure::NilJsonPayload);
            return self;
        }
        self.body = Some(value.to_string().into_bytes());
        self
    }

    /// Append form fields given as flattened name/value pairs and
    /// re-encode the whole form into the body. Form data takes precedence
    /// over any body set before it.
    pub fn form_data(mut self, pairs: &[&str]) -> Self {
        if self.err.is_some() {
            return self;
        }
        if pairs.len() % 2 != 0 {
            self.fail(Failure::OddFormArgs { count: pairs.len() });
            return self;
        }
        for pair in pairs.chunks_exact(2) {
            self.form.push((pair[0].to_string(), pair[1].to_string()));
        }
        let mut encoder = form_urlencoded::Serializer::new(String::new());
        for (name, value) in &self.form {
            encoder.append_pair(name, value);
        }
        self.body = Some(encoder.finish().into_bytes());
        self
    }

    /// Deadline for the whole dispatch. A missed deadline surfaces as a
    /// transport failure.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        if self.err.is_some() {
            return self;
        }
        self.timeout = Some(timeout);
        self
    }

    /// Exact status the response must carry. Without this, any status in
    /// `200..400` passes. Do not use for redirects; see
    /// [`Client::expect_redirect_to`].
    pub fn expect_status(mut self, status: u16) -> Self {
        if self.err.is_some() {
            return self;
        }
        if (300..400).contains(&status) {
            self.fail(Failure::StatusExpectationMisuse { code: status });
            return self;
        }
        self.expected_status = Some(status);
        self
    }

    /// Path that a redirect during dispatch must target. Dispatch fails if
    /// no redirect happens at all, or if any hop targets another path.
    pub fn expect_redirect_to(mut self, path: &str) -> Self {
        if self.err.is_some() {
            return self;
        }
        self.expect_redirect_path = Some(path.to_string());
        self
    }

    /// Materialize the request without a server base address. Returns
    /// `None` when the builder is in an error state or construction fails;
    /// the failure is already reported.
    pub fn build(&mut self) -> Option<Request<Vec<u8>>> {
        self.build_against("")
    }

    /// Dispatch against `base_url` and validate redirect and status
    /// policy. Returns the raw response, or `None` with the failure
    /// reported.
    pub fn execute(mut self, base_url: &str) -> Option<http::Response<ureq::Body>> {
        self.dispatch(base_url)
    }

    /// As [`Client::execute`], then drain the body into a
    /// [`SimpleResponse`]. Returns the empty response on failure.
    pub fn execute_simple(mut self, base_url: &str) -> SimpleResponse<'t> {
        let reporter = self.reporter;
        let Some(mut response) = self.dispatch(base_url) else {
            return SimpleResponse::empty(reporter);
        };
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        match response.body_mut().read_to_string() {
            Ok(body) => SimpleResponse::new(reporter, status, headers, body),
            Err(err) => {
                self.fail(Failure::BodyRead { cause: err.to_string() });
                SimpleResponse::empty(reporter)
            }
        }
    }

    fn build_against(&mut self, base_url: &str) -> Option<Request<Vec<u8>>> {
        if self.err.is_some() {
            return None;
        }
        let uri = join_path(base_url, &self.url);
        let mut headers = self.headers.clone();
        if !self.form.is_empty() {
            set_header(&mut headers, "Content-Type", CONTENT_TYPE_FORM);
        } else if self.body.is_some() && !has_header(&headers, "Content-Type") {
            let content_type = self.config.default_content_type.clone();
            set_header(&mut headers, "Content-Type", &content_type);
        }
        let mut builder = Request::builder().method(self.method.as_str()).uri(uri);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        match builder.body(self.body.clone().unwrap_or_default()) {
            Ok(request) => Some(request),
            Err(err) => {
                self.fail(Failure::Transport { cause: err.to_string() });
                None
            }
        }
    }

    fn dispatch(&mut self, base_url: &str) -> Option<http::Response<ureq::Body>> {
        let request = self.build_against(base_url)?;
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(0)
            .timeout_global(self.timeout)
            .build()
            .new_agent();

        let (parts, first_body) = request.into_parts();
        let mut method = parts.method;
        let mut headers = parts.headers;
        let mut body = first_body;
        let mut target: Url = match parts.uri.to_string().parse() {
            Ok(url) => url,
            Err(err) => {
                self.fail(Failure::Transport { cause: err.to_string() });
                return None;
            }
        };

        let mut hops = 0usize;
        let mut was_redirected = false;

        loop {
            let mut request = match Request::builder()
                .method(method.clone())
                .uri(target.as_str())
                .body(body.clone())
            {
                Ok(request) => request,
                Err(err) => {
                    self.fail(Failure::Transport { cause: err.to_string() });
                    return None;
                }
            };
            *request.headers_mut() = headers.clone();

            let response = match agent.run(request) {
                Ok(response) => response,
                Err(err) => {
                    self.fail(Failure::Transport { cause: err.to_string() });
                    return None;
                }
            };

            let Some(location) = redirect_target(&response) else {
                return self.validate(response, was_redirected);
            };

            hops += 1;
            if hops > self.config.max_redirect_hops {
                self.fail(Failure::RedirectLoop {
                    limit: self.config.max_redirect_hops,
                    hop: hops,
                });
                return None;
            }
            let next = match target.join(&location) {
                Ok(next) => next,
                Err(err) => {
                    self.fail(Failure::Transport { cause: err.to_string() });
                    return None;
                }
            };
            if let Some(expected) = self.expect_redirect_path.clone() {
                if next.path() != expected {
                    self.fail(Failure::RedirectMismatch {
                        expected,
                        actual: next.path().to_string(),
                    });
                    return None;
                }
                was_redirected = true;
            }
            log::debug!("redirected to {next}");

            if switches_to_get(response.status(), &method) {
                method = Method::GET;
                body.clear();
                headers.remove(CONTENT_TYPE);
                headers.remove(CONTENT_LENGTH);
            }
            target = next;
        }
    }

    fn validate(
        &mut self,
        response: http::Response<ureq::Body>,
        was_redirected: bool,
    ) -> Option<http::Response<ureq::Body>> {
        if let Some(expected) = self.expect_redirect_path.clone() {
            if !was_redirected {
                self.fail(Failure::RedirectExpectedButMissing { expected });
                return None;
            }
        }
        let status = response.status().as_u16();
        match self.expected_status {
            None => {
                if status >= 400 {
                    self.fail(Failure::UnexpectedFailureStatus { actual: status });
                    return None;
                }
            }
            Some(expected) if expected != status => {
                self.fail(Failure::StatusMismatch { expected, actual: status });
                return None;
            }
            Some(_) => {}
        }
        if self.reporter.expects_failure() {
            // the scenario under self-test was supposed to fail before now
            self.fail(Failure::AssertionNotMet);
        }
        Some(response)
    }

    fn fail(&mut self, failure: Failure) {
        self.reporter.report(&failure.to_string());
        self.reporter.fail_now();
        if self.err.is_none() {
            self.err = Some(failure);
        }
    }
}

/// Join a request path onto a base address with exactly one slash between
/// them.
fn join_path(base: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    headers.retain(|(existing, _)| !existing.eq_ignore_ascii_case(name));
    headers.push((name.to_string(), value.to_string()));
}

fn has_header(headers: &[(String, String)], name: &str) -> bool {
    headers.iter().any(|(existing, _)| existing.eq_ignore_ascii_case(name))
}

/// The Location target when `response` is a redirect the transport would
/// follow, `None` for final responses.
fn redirect_target(response: &http::Response<ureq::Body>) -> Option<String> {
    if !matches!(response.status().as_u16(), 301 | 302 | 303 | 307 | 308) {
        return None;
    }
    response
        .headers()
        .get(LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// 301/302/303 hops downgrade non-GET methods to a bodyless GET; 307/308
/// preserve method and body.
fn switches_to_get(status: StatusCode, method: &Method) -> bool {
    matches!(status.as_u16(), 301 | 302 | 303)
        && *method != Method::GET
        && *method != Method::HEAD
}
