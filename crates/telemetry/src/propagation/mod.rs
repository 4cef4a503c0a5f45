//! Text map propagation.
//!
//! A propagator writes a [`Context`] into a string carrier (HTTP headers,
//! message metadata, a plain map) and reads it back on the other side.

mod baggage;
mod composite;
mod trace_context;

use std::collections::HashMap;
use std::fmt;
use std::hash::BuildHasher;

pub use baggage::BaggagePropagator;
pub use composite::TextMapCompositePropagator;
pub use trace_context::TraceContextPropagator;

use crate::context::Context;

/// Write side of a carrier.
pub trait Injector {
    fn set(&mut self, key: &str, value: String);
}

/// Read side of a carrier.
pub trait Extractor {
    fn get(&self, key: &str) -> Option<&str>;

    fn keys(&self) -> Vec<&str>;
}

impl<S: BuildHasher> Injector for HashMap<String, String, S> {
    fn set(&mut self, key: &str, value: String) {
        self.insert(key.to_string(), value);
    }
}

impl<S: BuildHasher> Extractor for HashMap<String, String, S> {
    fn get(&self, key: &str) -> Option<&str> {
        HashMap::get(self, key).map(String::as_str)
    }

    fn keys(&self) -> Vec<&str> {
        HashMap::keys(self).map(String::as_str).collect()
    }
}

/// Injects and extracts a context as string key/value pairs.
pub trait TextMapPropagator: Send + Sync + fmt::Debug {
    /// Write the relevant parts of `cx` into the carrier.
    fn inject_context(&self, cx: &Context, injector: &mut dyn Injector);

    /// Read from the carrier and return `cx` updated with what was found.
    ///
    /// Missing or malformed fields leave `cx` unchanged.
    fn extract_with_context(&self, cx: &Context, extractor: &dyn Extractor) -> Context;

    /// Carrier keys this propagator reads and writes
    fn fields(&self) -> Vec<&'static str>;

    /// Extract on top of the root context.
    fn extract(&self, extractor: &dyn Extractor) -> Context {
        self.extract_with_context(&Context::new(), extractor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_map_carrier() {
        let mut carrier: HashMap<String, String> = HashMap::new();
        Injector::set(&mut carrier, "traceparent", "value".to_string());

        assert_eq!(Extractor::get(&carrier, "traceparent"), Some("value"));
        assert_eq!(Extractor::get(&carrier, "missing"), None);
        assert_eq!(Extractor::keys(&carrier), vec!["traceparent"]);
    }
}
