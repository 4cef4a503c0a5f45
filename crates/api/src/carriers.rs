//! Text map carriers over HTTP headers.

use std::collections::HashMap;

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use telemetry::{Extractor, Injector};
use tracing::debug;

/// Writes propagation fields into a header map.
pub struct HeaderInjector<'a>(pub &'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        match (
            HeaderName::from_bytes(key.as_bytes()),
            HeaderValue::from_str(&value),
        ) {
            (Ok(name), Ok(value)) => {
                self.0.insert(name, value);
            }
            _ => debug!(key, "Skipping field that is not a valid header"),
        }
    }
}

/// Reads propagation fields from a header map.
///
/// Header names are case-insensitive. A header sent several times reads as
/// one comma-joined value, so list headers such as `tracestate` and
/// `baggage` keep every member.
pub struct HeaderExtractor<'a> {
    headers: &'a HeaderMap,
    combined: HashMap<&'a str, String>,
}

impl<'a> HeaderExtractor<'a> {
    pub fn new(headers: &'a HeaderMap) -> Self {
        let mut combined = HashMap::new();
        for name in headers.keys() {
            if headers.get_all(name).iter().nth(1).is_none() {
                continue;
            }
            let joined = headers
                .get_all(name)
                .iter()
                .filter_map(|value| value.to_str().ok())
                .collect::<Vec<_>>()
                .join(",");
            combined.insert(name.as_str(), joined);
        }

        Self { headers, combined }
    }
}

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        let name = HeaderName::from_bytes(key.as_bytes()).ok()?;
        match self.combined.get(name.as_str()) {
            Some(joined) => Some(joined.as_str()),
            None => self.headers.get(&name).and_then(|value| value.to_str().ok()),
        }
    }

    fn keys(&self) -> Vec<&str> {
        self.headers.keys().map(HeaderName::as_str).collect()
    }
}
