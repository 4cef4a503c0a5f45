//! W3C baggage: user-defined key/value pairs that travel with a trace.

use std::collections::BTreeMap;

use crate::constants::{MAX_BAGGAGE_BYTES, MAX_BAGGAGE_ENTRIES};
use crate::error::{DomainError, DomainResult};

/// A single baggage value with its optional `;`-separated properties.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaggageEntry {
    value: String,
    metadata: String,
}

impl BaggageEntry {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn metadata(&self) -> &str {
        &self.metadata
    }
}

/// Set of baggage entries keyed by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Baggage {
    entries: BTreeMap<String, BaggageEntry>,
}

impl Baggage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry without properties.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> DomainResult<()> {
        self.insert_with_metadata(key, value, String::new())
    }

    /// Insert or replace an entry.
    pub fn insert_with_metadata(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        metadata: impl Into<String>,
    ) -> DomainResult<()> {
        let key = key.into();
        if !is_token(&key) {
            return Err(DomainError::invalid_baggage(format!("invalid key {:?}", key)));
        }
        if !self.entries.contains_key(&key) && self.entries.len() >= MAX_BAGGAGE_ENTRIES {
            return Err(DomainError::invalid_baggage(format!(
                "more than {} entries",
                MAX_BAGGAGE_ENTRIES
            )));
        }

        self.entries.insert(
            key,
            BaggageEntry {
                value: value.into(),
                metadata: metadata.into(),
            },
        );
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(BaggageEntry::value)
    }

    pub fn entry(&self, key: &str) -> Option<&BaggageEntry> {
        self.entries.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<BaggageEntry> {
        self.entries.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &BaggageEntry)> {
        self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a `baggage` header value. Values are percent-decoded.
    pub fn parse(header: &str) -> DomainResult<Self> {
        if header.len() > MAX_BAGGAGE_BYTES {
            return Err(DomainError::invalid_baggage(format!(
                "header exceeds {} bytes",
                MAX_BAGGAGE_BYTES
            )));
        }

        let mut baggage = Baggage::new();
        for member in header.split(',').map(str::trim) {
            if member.is_empty() {
                continue;
            }

            let mut parts = member.split(';');
            let pair = parts.next().unwrap_or_default();
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| DomainError::invalid_baggage(format!("missing '=' in {}", member)))?;
            let value = urlencoding::decode(value.trim())
                .map_err(|_| DomainError::invalid_baggage(format!("value of {} is not UTF-8", key.trim())))?;
            let metadata = parts
                .map(str::trim)
                .filter(|property| !property.is_empty())
                .collect::<Vec<_>>()
                .join(";");

            baggage.insert_with_metadata(key.trim(), value.into_owned(), metadata)?;
        }

        Ok(baggage)
    }

    /// Header value with percent-encoded values.
    ///
    /// Entries that would push the header past the size limit are left out;
    /// see [`Baggage::encode`] for how many.
    pub fn header(&self) -> String {
        self.encode().0
    }

    /// Header value and the number of entries left out to stay within
    /// the size limit.
    pub fn encode(&self) -> (String, usize) {
        let mut header = String::new();
        let mut omitted = 0;
        for (key, entry) in &self.entries {
            let mut member = format!("{}={}", key, urlencoding::encode(&entry.value));
            if !entry.metadata.is_empty() {
                member.push(';');
                member.push_str(&entry.metadata);
            }

            let separator = usize::from(!header.is_empty());
            if header.len() + separator + member.len() > MAX_BAGGAGE_BYTES {
                omitted += 1;
                continue;
            }
            if separator == 1 {
                header.push(',');
            }
            header.push_str(&member);
        }
        (header, omitted)
    }
}

/// RFC 7230 token
fn is_token(key: &str) -> bool {
    !key.is_empty()
        && key.bytes().all(|b| {
            b.is_ascii_alphanumeric()
                || matches!(
                    b,
                    b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~'
                )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decodes_values_and_keeps_properties() {
        let baggage = Baggage::parse("userId=alice, serverNode=DF%2028 ;region=eu;hot").unwrap();
        assert_eq!(baggage.get("userId"), Some("alice"));
        assert_eq!(baggage.get("serverNode"), Some("DF 28"));
        assert_eq!(baggage.entry("serverNode").unwrap().metadata(), "region=eu;hot");
    }

    #[test]
    fn test_header_encodes_values() {
        let mut baggage = Baggage::new();
        baggage.insert("tenant", "acme corp").unwrap();
        baggage.insert_with_metadata("plan", "gold", "ttl=60").unwrap();
        assert_eq!(baggage.header(), "plan=gold;ttl=60,tenant=acme%20corp");
    }

    #[test]
    fn test_parse_rejects_malformed_members() {
        assert!(Baggage::parse("novalue").is_err());
        assert!(Baggage::parse("bad key=1").is_err());
        assert!(Baggage::parse("=1").is_err());
    }

    #[test]
    fn test_entry_limit() {
        let mut baggage = Baggage::new();
        for i in 0..MAX_BAGGAGE_ENTRIES {
            baggage.insert(format!("k{}", i), "v").unwrap();
        }
        assert!(baggage.insert("overflow", "v").is_err());
        // Replacing an existing key is still allowed
        assert!(baggage.insert("k0", "w").is_ok());
    }

    #[test]
    fn test_parse_rejects_oversized_header() {
        let header = format!("k={}", "v".repeat(MAX_BAGGAGE_BYTES));
        assert!(Baggage::parse(&header).is_err());
    }

    #[test]
    fn test_encode_leaves_out_entries_past_size_limit() {
        let mut baggage = Baggage::new();
        baggage.insert("a", "1").unwrap();
        baggage.insert("big", "x".repeat(MAX_BAGGAGE_BYTES)).unwrap();
        baggage.insert("c", "3").unwrap();

        let (header, omitted) = baggage.encode();
        assert_eq!(header, "a=1,c=3");
        assert_eq!(omitted, 1);
        assert_eq!(baggage.header(), header);
    }

    #[test]
    fn test_parse_rejects_non_utf8_values() {
        let err = Baggage::parse("k=%FF%FE").unwrap_err();
        assert!(matches!(err, DomainError::InvalidBaggage(_)));
        assert!(Baggage::parse("k=%C3%A9").is_ok());
    }

    #[test]
    fn test_empty_header_is_empty_baggage() {
        let baggage = Baggage::parse(" , ").unwrap();
        assert!(baggage.is_empty());
        assert_eq!(baggage.header(), "");
    }
}
