//! Span context: the part of a span that crosses process boundaries.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::constants::MAX_TRACESTATE_ENTRIES;
use crate::error::{DomainError, DomainResult};
use crate::ids::{SpanId, TraceId};

static TRACESTATE_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[a-z][_0-9a-z\-*/]{0,255}|[a-z0-9][_0-9a-z\-*/]{0,240}@[a-z][_0-9a-z\-*/]{0,13})$")
        .expect("tracestate key pattern is valid")
});

static TRACESTATE_VALUE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[\x20-\x2b\x2d-\x3c\x3e-\x7e]{0,255}[\x21-\x2b\x2d-\x3c\x3e-\x7e]$")
        .expect("tracestate value pattern is valid")
});

// =============================================================================
// Trace Flags
// =============================================================================

/// Eight trace option bits; only the sampled bit is defined.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct TraceFlags(u8);

impl TraceFlags {
    pub const DEFAULT: TraceFlags = TraceFlags(0x00);
    pub const SAMPLED: TraceFlags = TraceFlags(0x01);

    pub const fn new(flags: u8) -> Self {
        Self(flags)
    }

    pub const fn is_sampled(self) -> bool {
        self.0 & Self::SAMPLED.0 == Self::SAMPLED.0
    }

    /// Copy of these flags with the sampled bit set or cleared
    pub const fn with_sampled(self, sampled: bool) -> Self {
        if sampled {
            Self(self.0 | Self::SAMPLED.0)
        } else {
            Self(self.0 & !Self::SAMPLED.0)
        }
    }

    pub const fn to_u8(self) -> u8 {
        self.0
    }
}

impl fmt::Display for TraceFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}", self.0)
    }
}

// =============================================================================
// Trace State
// =============================================================================

/// Ordered vendor entries carried in the `tracestate` header.
///
/// The left-most entry is the most recently updated one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraceState(Vec<(String, String)>);

impl TraceState {
    /// Build from key/value pairs, validating each entry.
    pub fn from_key_value<I, K, V>(entries: I) -> DomainResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut state = Vec::new();
        for (key, value) in entries {
            let (key, value) = (key.into(), value.into());
            validate_entry(&key, &value)?;
            if state.iter().any(|(existing, _)| *existing == key) {
                return Err(DomainError::invalid_tracestate(format!("duplicate key {}", key)));
            }
            state.push((key, value));
        }

        if state.len() > MAX_TRACESTATE_ENTRIES {
            return Err(DomainError::invalid_tracestate(format!(
                "{} entries exceed the limit of {}",
                state.len(),
                MAX_TRACESTATE_ENTRIES
            )));
        }

        Ok(Self(state))
    }

    /// Parse a `tracestate` header value. Empty list members are skipped.
    pub fn parse(header: &str) -> DomainResult<Self> {
        let entries = header
            .split(',')
            .map(|member| member.trim_matches(|c| c == ' ' || c == '\t'))
            .filter(|member| !member.is_empty())
            .map(|member| {
                member
                    .split_once('=')
                    .ok_or_else(|| DomainError::invalid_tracestate(format!("missing '=' in {}", member)))
            })
            .collect::<DomainResult<Vec<_>>>()?;

        Self::from_key_value(entries)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.as_str())
    }

    /// New state with `key` moved to the front.
    ///
    /// When the state is full, the right-most entry is dropped.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) -> DomainResult<Self> {
        let (key, value) = (key.into(), value.into());
        validate_entry(&key, &value)?;

        let mut entries: Vec<(String, String)> = self
            .0
            .iter()
            .filter(|(existing, _)| *existing != key)
            .cloned()
            .collect();
        entries.truncate(MAX_TRACESTATE_ENTRIES - 1);
        entries.insert(0, (key, value));

        Ok(Self(entries))
    }

    /// New state without `key`.
    pub fn delete(&self, key: &str) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(existing, _)| existing != key)
                .cloned()
                .collect(),
        )
    }

    /// Header value, entries joined by `,`
    pub fn header(&self) -> String {
        self.0
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn validate_entry(key: &str, value: &str) -> DomainResult<()> {
    if !TRACESTATE_KEY.is_match(key) {
        return Err(DomainError::invalid_tracestate(format!("invalid key {:?}", key)));
    }
    if !TRACESTATE_VALUE.is_match(value) {
        return Err(DomainError::invalid_tracestate(format!("invalid value for key {}", key)));
    }
    Ok(())
}

impl fmt::Display for TraceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header())
    }
}

impl Serialize for TraceState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

// =============================================================================
// Span Context
// =============================================================================

/// Immutable identity of a span as seen by other processes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SpanContext {
    trace_id: TraceId,
    span_id: SpanId,
    trace_flags: TraceFlags,
    is_remote: bool,
    trace_state: TraceState,
}

impl SpanContext {
    pub fn new(
        trace_id: TraceId,
        span_id: SpanId,
        trace_flags: TraceFlags,
        is_remote: bool,
        trace_state: TraceState,
    ) -> Self {
        Self {
            trace_id,
            span_id,
            trace_flags,
            is_remote,
            trace_state,
        }
    }

    /// The invalid context, used when there is no span
    pub fn empty() -> Self {
        Self::new(
            TraceId::INVALID,
            SpanId::INVALID,
            TraceFlags::DEFAULT,
            false,
            TraceState::default(),
        )
    }

    pub fn trace_id(&self) -> TraceId {
        self.trace_id
    }

    pub fn span_id(&self) -> SpanId {
        self.span_id
    }

    pub fn trace_flags(&self) -> TraceFlags {
        self.trace_flags
    }

    /// Whether this context was extracted from a carrier
    pub fn is_remote(&self) -> bool {
        self.is_remote
    }

    pub fn trace_state(&self) -> &TraceState {
        &self.trace_state
    }

    pub fn is_valid(&self) -> bool {
        self.trace_id.is_valid() && self.span_id.is_valid()
    }

    pub fn is_sampled(&self) -> bool {
        self.trace_flags.is_sampled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_flags_sampled_bit() {
        assert!(TraceFlags::SAMPLED.is_sampled());
        assert!(!TraceFlags::DEFAULT.is_sampled());
        assert_eq!(TraceFlags::new(0x03).with_sampled(false).to_u8(), 0x02);
        assert_eq!(TraceFlags::SAMPLED.to_string(), "01");
    }

    #[test]
    fn test_trace_state_parse_keeps_order() {
        let state = TraceState::parse("rojo=00f067aa0ba902b7, congo=t61rcWkgMzE").unwrap();
        assert_eq!(state.len(), 2);
        assert_eq!(state.get("congo"), Some("t61rcWkgMzE"));
        assert_eq!(state.header(), "rojo=00f067aa0ba902b7,congo=t61rcWkgMzE");
    }

    #[test]
    fn test_trace_state_skips_empty_members() {
        let state = TraceState::parse("a=1,,  ,b=2").unwrap();
        assert_eq!(state.header(), "a=1,b=2");
    }

    #[test]
    fn test_trace_state_accepts_multi_tenant_key() {
        let state = TraceState::parse("fw529a3039@dt=abc").unwrap();
        assert_eq!(state.get("fw529a3039@dt"), Some("abc"));
    }

    #[test]
    fn test_trace_state_rejects_invalid_entries() {
        assert!(TraceState::parse("Upper=1").is_err());
        assert!(TraceState::parse("key=").is_err());
        assert!(TraceState::parse("key=a,b").is_err());
        assert!(TraceState::parse("key=a=b").is_err());
        assert!(TraceState::from_key_value([("key", "trailing ")]).is_err());
        assert!(TraceState::parse("a=1,a=2").is_err());
    }

    #[test]
    fn test_trace_state_rejects_too_many_entries() {
        let header = (0..=MAX_TRACESTATE_ENTRIES)
            .map(|i| format!("k{}=v", i))
            .collect::<Vec<_>>()
            .join(",");
        assert!(TraceState::parse(&header).is_err());
    }

    #[test]
    fn test_trace_state_insert_moves_key_to_front() {
        let state = TraceState::parse("a=1,b=2").unwrap();
        let updated = state.insert("b", "3").unwrap();
        assert_eq!(updated.header(), "b=3,a=1");
        assert_eq!(updated.delete("a").header(), "b=3");
    }

    #[test]
    fn test_trace_state_insert_drops_rightmost_when_full() {
        let full = TraceState::from_key_value((0..MAX_TRACESTATE_ENTRIES).map(|i| (format!("k{}", i), "v"))).unwrap();
        let updated = full.insert("new", "v").unwrap();
        assert_eq!(updated.len(), MAX_TRACESTATE_ENTRIES);
        assert_eq!(updated.get("new"), Some("v"));
        assert_eq!(updated.get(&format!("k{}", MAX_TRACESTATE_ENTRIES - 1)), None);
    }

    #[test]
    fn test_span_context_validity() {
        assert!(!SpanContext::empty().is_valid());

        let context = SpanContext::new(
            TraceId::from(7u128),
            SpanId::from(9u64),
            TraceFlags::SAMPLED,
            true,
            TraceState::default(),
        );
        assert!(context.is_valid());
        assert!(context.is_sampled());
        assert!(context.is_remote());
    }
}
