//! HTTPS retrieval of remote configuration documents.
//!
//! Requests go through the [`Transport`] trait so resolution logic can be
//! tested without a network. [`UreqTransport`] is the real implementation; it
//! never follows redirects itself, [`fetch_toml`] does that so every hop can
//! be checked for HTTPS.

use std::time::Duration;

use tracing::{debug, warn};
use url::Url;

use crate::sys::Deadline;
use crate::{FetchError, Result};

/// Per-request timeout for remote fetches.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum number of redirects followed for one fetch.
pub const MAX_REDIRECTS: usize = 3;

/// User-Agent header (GitHub's API rejects requests without one).
const USER_AGENT: &str = concat!("fjrd/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
}

/// A response as seen by resolution logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// `Location` header, present on redirects.
    pub location: Option<String>,
    /// Body text. Only read for successful GET requests.
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_redirect(&self) -> bool {
        (300..400).contains(&self.status)
    }
}

/// Blocking HTTP transport.
///
/// Implementations must return 3xx responses as-is instead of following them,
/// and must report non-2xx statuses as responses rather than errors.
pub trait Transport {
    fn send(
        &self,
        method: Method,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<HttpResponse, FetchError>;
}

/// [`Transport`] backed by a ureq agent.
pub struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = ureq::AgentBuilder::new()
            .redirects(0)
            .user_agent(USER_AGENT)
            .build();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn send(
        &self,
        method: Method,
        url: &str,
        timeout: Duration,
    ) -> std::result::Result<HttpResponse, FetchError> {
        let request = match method {
            Method::Get => self.agent.get(url),
            Method::Head => self.agent.head(url),
        }
        .timeout(timeout);

        match request.call() {
            Ok(response) => into_response(response, method),
            Err(ureq::Error::Status(_, response)) => into_response(response, method),
            Err(ureq::Error::Transport(transport)) => Err(transport_error(&transport)),
        }
    }
}

fn into_response(
    response: ureq::Response,
    method: Method,
) -> std::result::Result<HttpResponse, FetchError> {
    let status = response.status();
    let location = response.header("location").map(str::to_string);
    let body = if method == Method::Get && (200..300).contains(&status) {
        response
            .into_string()
            .map_err(|e| FetchError::Transport(format!("failed to read response body: {}", e)))?
    } else {
        String::new()
    };
    Ok(HttpResponse {
        status,
        location,
        body,
    })
}

fn transport_error(err: &ureq::Transport) -> FetchError {
    let mut source: Option<&(dyn std::error::Error + 'static)> = std::error::Error::source(err);
    while let Some(inner) = source {
        let timed_out = inner.downcast_ref::<std::io::Error>().is_some_and(|io| {
            matches!(
                io.kind(),
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
            )
        });
        if timed_out {
            return FetchError::Timeout;
        }
        source = inner.source();
    }
    FetchError::Transport(err.to_string())
}

/// Fetch a `.toml` document over HTTPS.
///
/// - the URL must use `https` and end in `.toml` (checked before any request)
/// - at most [`MAX_REDIRECTS`] redirects are followed, and only to `https`
///   targets; otherwise the redirect response itself is the final response
/// - the final status must be 2xx
/// - each request is bounded by [`FETCH_TIMEOUT`] and by `deadline`
pub fn fetch_toml(transport: &dyn Transport, url: &str, deadline: &Deadline) -> Result<String> {
    let mut current = Url::parse(url)
        .map_err(|e| FetchError::Transport(format!("invalid URL {}: {}", url, e)))?;
    if current.scheme() != "https" {
        return Err(FetchError::InsecureProtocol(current.scheme().to_string()).into());
    }
    if !url.ends_with(".toml") {
        return Err(FetchError::NotToml(url.to_string()).into());
    }

    let mut hops = 0;
    let response = loop {
        deadline.check()?;
        debug!(url = %current, "Fetching remote configuration");
        let response = transport.send(Method::Get, current.as_str(), deadline.cap(FETCH_TIMEOUT))?;
        if !response.is_redirect() || hops == MAX_REDIRECTS {
            break response;
        }
        let Some(next) = response
            .location
            .as_deref()
            .and_then(|location| current.join(location).ok())
        else {
            break response;
        };
        if next.scheme() != "https" {
            warn!(from = %current, to = %next, "Refusing to follow redirect to a non-HTTPS URL");
            break response;
        }
        hops += 1;
        current = next;
    };

    if !response.is_success() {
        return Err(FetchError::Status(response.status).into());
    }
    Ok(response.body)
}

/// HEAD `url` and report whether it answered 2xx.
///
/// Transport failures count as "not found"; only deadline errors propagate.
pub fn probe(transport: &dyn Transport, url: &str, deadline: &Deadline) -> Result<bool> {
    deadline.check()?;
    match transport.send(Method::Head, url, deadline.cap(FETCH_TIMEOUT)) {
        Ok(response) => Ok(response.is_success()),
        Err(err) => {
            debug!(%url, error = %err, "Probe failed");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use crate::test_utils::FakeTransport;

    const CONFIG: &str = "version = 1\n";

    #[test]
    fn test_fetch_success() {
        let transport = FakeTransport::new().respond("https://example.com/fjrd.toml", 200, CONFIG);
        let body = fetch_toml(&transport, "https://example.com/fjrd.toml", &Deadline::none()).unwrap();
        assert_eq!(body, CONFIG);
    }

    #[test]
    fn test_fetch_rejects_http_without_request() {
        let transport = FakeTransport::new();
        let err = fetch_toml(&transport, "http://example.com/fjrd.toml", &Deadline::none()).unwrap_err();
        assert!(matches!(
            err,
            Error::Fetch(FetchError::InsecureProtocol(ref s)) if s == "http"
        ));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_fetch_rejects_non_toml_without_request() {
        let transport = FakeTransport::new();
        let err = fetch_toml(&transport, "https://example.com/fjrd.json", &Deadline::none()).unwrap_err();
        assert!(matches!(err, Error::Fetch(FetchError::NotToml(_))));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_fetch_non_success_status() {
        let transport = FakeTransport::new();
        let err = fetch_toml(&transport, "https://example.com/fjrd.toml", &Deadline::none()).unwrap_err();
        assert!(matches!(err, Error::Fetch(FetchError::Status(404))));
    }

    #[test]
    fn test_fetch_follows_https_redirects() {
        let transport = FakeTransport::new()
            .redirect("https://example.com/a.toml", "https://example.com/b.toml")
            .redirect("https://example.com/b.toml", "/c.toml")
            .respond("https://example.com/c.toml", 200, CONFIG);
        let body = fetch_toml(&transport, "https://example.com/a.toml", &Deadline::none()).unwrap();
        assert_eq!(body, CONFIG);
        assert_eq!(transport.requests().len(), 3);
    }

    #[test]
    fn test_fetch_stops_after_max_redirects() {
        let transport = FakeTransport::new()
            .redirect("https://example.com/0.toml", "https://example.com/1.toml")
            .redirect("https://example.com/1.toml", "https://example.com/2.toml")
            .redirect("https://example.com/2.toml", "https://example.com/3.toml")
            .redirect("https://example.com/3.toml", "https://example.com/4.toml")
            .respond("https://example.com/4.toml", 200, CONFIG);
        let err = fetch_toml(&transport, "https://example.com/0.toml", &Deadline::none()).unwrap_err();
        assert!(matches!(err, Error::Fetch(FetchError::Status(302))));
        assert_eq!(transport.requests().len(), MAX_REDIRECTS + 1);
    }

    #[test]
    fn test_fetch_does_not_follow_redirect_to_http() {
        let transport = FakeTransport::new()
            .redirect("https://example.com/a.toml", "http://example.com/a.toml")
            .respond("http://example.com/a.toml", 200, CONFIG);
        let err = fetch_toml(&transport, "https://example.com/a.toml", &Deadline::none()).unwrap_err();
        assert!(matches!(err, Error::Fetch(FetchError::Status(302))));
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_fetch_honors_expired_deadline() {
        let transport = FakeTransport::new().respond("https://example.com/fjrd.toml", 200, CONFIG);
        let deadline = Deadline::after(Duration::ZERO);
        let err = fetch_toml(&transport, "https://example.com/fjrd.toml", &deadline).unwrap_err();
        assert!(matches!(err, Error::DeadlineExceeded));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_probe_reports_presence() {
        let transport = FakeTransport::new().respond("https://example.com/fjrd.toml", 200, CONFIG);
        assert!(probe(&transport, "https://example.com/fjrd.toml", &Deadline::none()).unwrap());
        assert!(!probe(&transport, "https://example.com/other.toml", &Deadline::none()).unwrap());
    }

    #[test]
    fn test_probe_treats_transport_failure_as_missing() {
        let transport = FakeTransport::offline();
        assert!(!probe(&transport, "https://example.com/fjrd.toml", &Deadline::none()).unwrap());
    }
}
