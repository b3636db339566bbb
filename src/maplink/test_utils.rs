//! Test helpers: an in-memory transport with canned responses and a call log.

use std::collections::HashMap;
use std::sync::Mutex;

use url::Url;

use super::providers::Transport;
use super::types::LinkError;

#[derive(Default)]
pub(crate) struct FakeTransport {
    /// Canned JSON bodies keyed by URL path (e.g. "/search").
    json: HashMap<String, serde_json::Value>,
    /// Short URL → final URL.
    redirects: HashMap<String, String>,
    fail_all: bool,
    calls: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every request fails as a transport error.
    pub(crate) fn failing() -> Self {
        Self { fail_all: true, ..Self::default() }
    }

    pub(crate) fn with_json(mut self, path: &str, body: serde_json::Value) -> Self {
        self.json.insert(path.to_string(), body);
        self
    }

    pub(crate) fn with_redirect(mut self, from: &str, to: &str) -> Self {
        self.redirects.insert(from.to_string(), to.to_string());
        self
    }

    /// Every URL requested so far, in order.
    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Transport for FakeTransport {
    fn get_json(&self, url: &Url) -> Result<serde_json::Value, LinkError> {
        self.calls.lock().unwrap().push(url.to_string());
        if self.fail_all {
            return Err(LinkError::Transport("connection refused".into()));
        }
        self.json
            .get(url.path())
            .cloned()
            .ok_or_else(|| LinkError::Transport(format!("404 for {}", url)))
    }

    fn resolve_redirect(&self, url: &str) -> Result<String, LinkError> {
        self.calls.lock().unwrap().push(url.to_string());
        if self.fail_all {
            return Err(LinkError::Transport("dns error: failed to lookup address".into()));
        }
        // unknown URLs resolve to themselves, as a HEAD without a redirect would
        Ok(self.redirects.get(url).cloned().unwrap_or_else(|| url.to_string()))
    }
}
