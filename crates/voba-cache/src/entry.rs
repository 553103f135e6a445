//! Entry file format: one JSON header line, then the raw payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CacheError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryHeader {
    pub created: f64,
    pub last: f64,
    /// Seconds after `created` at which the entry stops being served.
    pub ttl: Option<f64>,
    pub orig_key: String,
    pub extra_meta: Option<Map<String, Value>>,
}

impl EntryHeader {
    pub fn is_expired(&self, now: f64) -> bool {
        matches!(self.ttl, Some(ttl) if now > self.created + ttl)
    }
}

pub fn encode(header: &EntryHeader, payload: &str) -> Result<Vec<u8>, CacheError> {
    let mut out = serde_json::to_vec(header)?;
    out.push(b'\n');
    out.extend_from_slice(payload.as_bytes());
    Ok(out)
}

pub fn decode(bytes: &[u8]) -> Result<(EntryHeader, String), CacheError> {
    let split = bytes.iter().position(|&b| b == b'\n').unwrap_or(bytes.len());
    let header: EntryHeader = serde_json::from_slice(&bytes[..split])?;
    let rest = bytes.get(split + 1..).unwrap_or_default();
    let payload = String::from_utf8(rest.to_vec())
        .map_err(|e| CacheError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;
    Ok((header, payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(ttl: Option<f64>) -> EntryHeader {
        EntryHeader { created: 100.0, last: 100.0, ttl, orig_key: "Q".into(), extra_meta: None }
    }

    #[test]
    fn payload_may_contain_newlines() {
        let bytes = encode(&header(None), "line one\nline two\n").unwrap();
        let (h, payload) = decode(&bytes).unwrap();
        assert_eq!(h, header(None));
        assert_eq!(payload, "line one\nline two\n");
    }

    #[test]
    fn header_keys_match_file_format() {
        let bytes = encode(&header(Some(5.0)), "").unwrap();
        let v: Value = serde_json::from_slice(&bytes[..bytes.len() - 1]).unwrap();
        for k in ["created", "last", "ttl", "orig_key", "extra_meta"] { assert!(v.get(k).is_some(), "{k}"); }
    }

    #[test]
    fn expiry_is_strictly_after_ttl() {
        let h = header(Some(10.0));
        assert!(!h.is_expired(110.0));
        assert!(h.is_expired(110.5));
        assert!(!header(None).is_expired(1e12));
    }

    #[test]
    fn garbage_header_is_an_error() {
        assert!(decode(b"not json\npayload").is_err());
        assert!(decode(b"").is_err());
    }
}
