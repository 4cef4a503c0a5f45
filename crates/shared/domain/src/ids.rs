//! Trace and span identifiers.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::error::{DomainError, DomainResult};
use crate::hex;

/// 16-byte identifier shared by every span of a trace.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct TraceId([u8; 16]);

impl TraceId {
    /// The all-zero id, never valid on the wire
    pub const INVALID: TraceId = TraceId([0; 16]);

    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    pub const fn to_bytes(self) -> [u8; 16] {
        self.0
    }

    /// Parse 32 lowercase hex chars. The all-zero id is rejected.
    pub fn from_hex(hex: &str) -> DomainResult<Self> {
        hex::decode::<16>(hex)
            .map(Self)
            .filter(TraceId::is_valid)
            .ok_or_else(|| DomainError::InvalidTraceId(hex.to_string()))
    }

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

impl From<u128> for TraceId {
    fn from(value: u128) -> Self {
        Self(value.to_be_bytes())
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TraceId({})", self)
    }
}

impl Serialize for TraceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 8-byte identifier of a single span.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SpanId([u8; 8]);

impl SpanId {
    /// The all-zero id, used as "no parent"
    pub const INVALID: SpanId = SpanId([0; 8]);

    pub const fn from_bytes(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    pub const fn to_bytes(self) -> [u8; 8] {
        self.0
    }

    /// Parse 16 lowercase hex chars. The all-zero id is rejected.
    pub fn from_hex(hex: &str) -> DomainResult<Self> {
        hex::decode::<8>(hex)
            .map(Self)
            .filter(SpanId::is_valid)
            .ok_or_else(|| DomainError::InvalidSpanId(hex.to_string()))
    }

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

impl From<u64> for SpanId {
    fn from(value: u64) -> Self {
        Self(value.to_be_bytes())
    }
}

impl fmt::Display for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for SpanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SpanId({})", self)
    }
}

impl Serialize for SpanId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trace_id_hex_round_trip() {
        let hex = "4bf92f3577b34da6a3ce929d0e0e4736";
        let id = TraceId::from_hex(hex).unwrap();
        assert_eq!(id.to_string(), hex);
        assert!(id.is_valid());
    }

    #[test]
    fn test_trace_id_rejects_all_zero() {
        let result = TraceId::from_hex("00000000000000000000000000000000");
        assert!(matches!(result, Err(DomainError::InvalidTraceId(_))));
    }

    #[test]
    fn test_span_id_rejects_uppercase() {
        assert!(SpanId::from_hex("00F067AA0BA902B7").is_err());
    }

    #[test]
    fn test_ids_from_integers_are_big_endian() {
        assert_eq!(TraceId::from(1u128).to_string(), "00000000000000000000000000000001");
        assert_eq!(SpanId::from(0xabu64).to_string(), "00000000000000ab");
    }

    #[test]
    fn test_ids_serialize_as_hex_strings() {
        let id = SpanId::from_hex("00f067aa0ba902b7").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"00f067aa0ba902b7\"");
    }
}
