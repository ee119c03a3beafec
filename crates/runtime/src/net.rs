//! HTTP helper
//!
//! [`send_request`] performs one blocking `ureq` exchange on a worker pool
//! and hands back a [`Promise`] of the response head. The body is read by a
//! follow-up task into its own promise, so callers can look at the status
//! and headers before the body arrives.
//!
//! # Outcomes
//!
//! - Malformed or non-HTTP URL: the response promise breaks with an
//!   invalid-argument error, before anything is scheduled.
//! - Connection or transport failure: the response promise breaks with an
//!   I/O error.
//! - Any status, 2xx or not: the response promise resolves.
//! - Body read failure or invalid UTF-8: the body promise breaks with an
//!   I/O error.
//!
//! There is no request timeout. The body is read to end-of-file whatever its
//! size.

use crate::scheduler::{self, WorkerPool};
use std::io::Read;
use tracing::debug;
use url::Url;
use weft_core::error::{Error, Result};
use weft_core::list_ops::List;
use weft_core::map_ops::{Map, MapBuilder, Mapped};
use weft_core::promise::{Promise, PromiseBuilder};

/// Response head plus a pending body
#[derive(Debug, Clone)]
pub struct NetResponse {
    status: u16,
    headers: Map<String, List<String>>,
    body: Promise<String>,
}

impl NetResponse {
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Headers keyed by lowercased name, values in response order
    pub fn headers(&self) -> &Map<String, List<String>> {
        &self.headers
    }

    /// First `content-type` value, if any
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(&"content-type".to_string())
            .ok()
            .and_then(|values| values.iter().next())
            .map(String::as_str)
    }

    /// Body text, decoded as UTF-8
    pub fn body_content(&self) -> Promise<String> {
        self.body.clone()
    }
}

/// Send a request on the shared worker pool
pub fn send_request(
    url: &str,
    method: &str,
    body: Option<String>,
    mime_type: Option<String>,
) -> Promise<NetResponse> {
    send_request_on(scheduler::shared(), url, method, body, mime_type)
}

/// Send a request on `pool`
pub fn send_request_on(
    pool: &WorkerPool,
    url: &str,
    method: &str,
    body: Option<String>,
    mime_type: Option<String>,
) -> Promise<NetResponse> {
    let builder = PromiseBuilder::new();
    let promise = builder.promise();

    let url = match parse_url(url) {
        Ok(url) => url,
        Err(e) => {
            builder.break_promise(e);
            return promise;
        }
    };
    let method = method.to_ascii_uppercase();
    let body_pool = pool.clone();

    pool.execute(move || {
        debug!(%method, %url, "sending request");
        match exchange(&url, &method, body.as_deref(), mime_type.as_deref()) {
            Ok(response) => {
                let status = response.status();
                let headers = collect_headers(&response);
                let body_builder = PromiseBuilder::new();
                let body = body_builder.promise();
                body_pool.execute(move || {
                    body_builder.settle(read_body(response));
                });
                builder.complete(NetResponse {
                    status,
                    headers,
                    body,
                });
            }
            Err(e) => {
                debug!(%url, error = %e, "request failed");
                builder.break_promise(e);
            }
        }
    });
    promise
}

fn parse_url(url: &str) -> Result<Url> {
    let parsed =
        Url::parse(url).map_err(|e| Error::invalid_argument(format!("bad URL {:?}: {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(Error::invalid_argument(format!(
            "unsupported URL scheme {:?}",
            scheme
        ))),
    }
}

/// Run the exchange up to the response head
///
/// Non-2xx statuses come back as responses, not errors.
fn exchange(
    url: &Url,
    method: &str,
    body: Option<&str>,
    mime_type: Option<&str>,
) -> Result<ureq::Response> {
    let agent = ureq::AgentBuilder::new().build();

    let mut request = agent.request_url(method, url);
    if let Some(mime_type) = mime_type {
        request = request.set("Content-Type", mime_type);
    }
    let result = match body {
        Some(body) => request.send_string(body),
        None => request.call(),
    };

    match result {
        Ok(response) => Ok(response),
        Err(ureq::Error::Status(_, response)) => Ok(response),
        Err(ureq::Error::Transport(e)) => Err(Error::io(format!("connection error: {}", e))),
    }
}

fn collect_headers(response: &ureq::Response) -> Map<String, List<String>> {
    let mut headers = MapBuilder::new();
    for name in response.headers_names() {
        let key = name.to_ascii_lowercase();
        if headers.has(&key) {
            continue;
        }
        let values: List<String> = response
            .all(&name)
            .into_iter()
            .map(str::to_string)
            .collect();
        headers.set(key, values);
    }
    headers.into_map()
}

fn read_body(response: ureq::Response) -> Result<String> {
    let mut bytes = Vec::new();
    response.into_reader().read_to_end(&mut bytes)?;
    String::from_utf8(bytes).map_err(|e| Error::io(format!("response body is not UTF-8: {}", e)))
}
