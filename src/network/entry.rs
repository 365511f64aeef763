//! Correlated HTTP transaction models.
//!
//! Instrumentation reports three independent event shapes (request,
//! response, transport error), each carrying the transaction identifier
//! that ties them together. [`TrafficEntry`] is the folded result: one
//! record per logical HTTP call.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// An intercepted HTTP request.
///
/// `identifier` is the correlation key: opaque, unique per logical call,
/// and echoed by the matching response or error event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub identifier: String,
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl Request {
    /// Build a request event with empty headers and no body.
    pub fn new(
        identifier: impl Into<String>,
        method: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            method: method.into(),
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Attach a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Attach a body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// A response observed for an earlier request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Identifier of the request this response answers.
    pub request_identifier: String,
    pub status_code: u16,
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

impl Response {
    /// Build a response event with empty headers and no body.
    pub fn new(
        request_identifier: impl Into<String>,
        status_code: u16,
        url: impl Into<String>,
    ) -> Self {
        Self {
            request_identifier: request_identifier.into(),
            status_code,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Attach a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Attach a body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }
}

/// A transport-level failure observed for an earlier request.
///
/// `domain` and `code` mirror whatever error surface the platform's
/// networking stack exposes; `reason` is its human-readable description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportError {
    /// Identifier of the request that failed.
    pub request_identifier: String,
    pub domain: String,
    pub code: i64,
    pub reason: String,
}

impl TransportError {
    pub fn new(
        request_identifier: impl Into<String>,
        domain: impl Into<String>,
        code: i64,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            request_identifier: request_identifier.into(),
            domain: domain.into(),
            code,
            reason: reason.into(),
        }
    }
}

/// One logical HTTP transaction.
///
/// Created the instant a request is recorded; the terminal fields are
/// filled in later when a matching response or error arrives. In practice
/// a transaction either succeeds or fails, but the model deliberately
/// keeps both fields independent: the correlation layer mirrors what
/// instrumentation reports and does not arbitrate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrafficEntry {
    request: Request,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    response: Option<Response>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<TransportError>,
}

impl TrafficEntry {
    /// Wrap a freshly observed request.
    pub fn new(request: Request) -> Self {
        Self {
            request,
            response: None,
            error: None,
        }
    }

    /// The transaction identifier, taken from the request.
    pub fn identifier(&self) -> &str {
        &self.request.identifier
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn response(&self) -> Option<&Response> {
        self.response.as_ref()
    }

    pub fn error(&self) -> Option<&TransportError> {
        self.error.as_ref()
    }

    /// True once a response or an error has been recorded.
    pub fn is_completed(&self) -> bool {
        self.response.is_some() || self.error.is_some()
    }

    /// Overwrite-wins: a duplicate response replaces the previous one.
    pub(crate) fn set_response(&mut self, response: Response) {
        self.response = Some(response);
    }

    /// Overwrite-wins: a duplicate error replaces the previous one.
    pub(crate) fn set_error(&mut self, error: TransportError) {
        self.error = Some(error);
    }
}
