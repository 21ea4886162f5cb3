//! Shared types, error enum, and the input report for aircot-core.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// All errors produced by aircot-core.
///
/// Only table construction and dataset loading can fail. Classification
/// itself never returns an error.
#[derive(Debug, Error)]
pub enum AircotError {
    #[error("invalid hex address: {0:?}")]
    InvalidHex(String),
    #[error("address {0:#08X} is outside the 24-bit ICAO space")]
    AddressOutOfRange(u32),
    #[error("invalid range {low:06X}-{high:06X}: low is above high")]
    InvalidRange { low: u32, high: u32 },
    #[error("range table not sorted: entry {index} starts at {low:06X}, before its predecessor")]
    UnsortedRanges { index: usize, low: u32 },
    #[error("range table overlap: {first_low:06X}-{first_high:06X} intersects {second_low:06X}-{second_high:06X}")]
    OverlappingRanges {
        first_low: u32,
        first_high: u32,
        second_low: u32,
        second_high: u32,
    },
    #[error("invalid squawk code: {0:?}")]
    InvalidSquawk(String),
    #[error("invalid CoT type: {0:?}")]
    InvalidCotType(String),
    #[error("unknown airframe type: {0:?}")]
    UnknownAirframe(String),
    #[error("unknown {field} value: {value:?}")]
    UnknownValue { field: &'static str, value: String },
    #[error("malformed record {index} in {table}: {reason}")]
    MalformedRecord {
        table: &'static str,
        index: usize,
        reason: String,
    },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AircotError>;

// ---------------------------------------------------------------------------
// ICAO address helpers
// ---------------------------------------------------------------------------

/// Highest valid 24-bit ICAO address.
pub const MAX_ADDRESS: u32 = 0xFF_FFFF;

/// Parse a hex ICAO address.
///
/// Accepts an optional `0x` prefix and the `~` marker some aggregators put in
/// front of TIS-B / non-ICAO tracks. Case-insensitive.
pub fn parse_address(hex: &str) -> Result<u32> {
    let trimmed = hex.trim().trim_start_matches('~');
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() || digits.len() > 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(AircotError::InvalidHex(hex.to_string()));
    }
    u32::from_str_radix(digits, 16).map_err(|_| AircotError::InvalidHex(hex.to_string()))
}

/// Format an address as 6-char uppercase hex.
pub fn address_to_hex(addr: u32) -> String {
    format!("{addr:06X}")
}

/// True if the address fits in 24 bits.
pub fn is_valid_address(addr: u32) -> bool {
    addr <= MAX_ADDRESS
}

// ---------------------------------------------------------------------------
// Callsigns
// ---------------------------------------------------------------------------

/// ADS-B character set for callsign encoding (6 bits per character).
pub const CALLSIGN_CHARSET: &[u8; 64] =
    b"#ABCDEFGHIJKLMNOPQRSTUVWXYZ##### ###############0123456789######";

/// Flight IDs are limited to 8 characters in DO-260B.
pub const MAX_CALLSIGN_LEN: usize = 8;

/// Trim and uppercase a callsign.
///
/// Returns `None` if the result is empty, too long, or uses a character the
/// ADS-B identification message cannot encode.
pub fn normalize_callsign(raw: &str) -> Option<String> {
    let cs = raw.trim().to_ascii_uppercase();
    if cs.is_empty() || cs.len() > MAX_CALLSIGN_LEN {
        return None;
    }
    let encodable = cs
        .bytes()
        .all(|b| b != b'#' && CALLSIGN_CHARSET.contains(&b));
    encodable.then_some(cs)
}

// ---------------------------------------------------------------------------
// Squawk
// ---------------------------------------------------------------------------

/// A 4-digit octal transponder code, 0000-7777.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(into = "String")]
pub struct Squawk(u16);

impl Squawk {
    /// Parse a squawk from its 4-digit text form. Every digit must be 0-7.
    pub fn parse(text: &str) -> Result<Squawk> {
        let text = text.trim();
        if text.len() != 4 {
            return Err(AircotError::InvalidSquawk(text.to_string()));
        }
        let mut value = 0u16;
        for b in text.bytes() {
            if !(b'0'..=b'7').contains(&b) {
                return Err(AircotError::InvalidSquawk(text.to_string()));
            }
            value = value * 8 + u16::from(b - b'0');
        }
        Ok(Squawk(value))
    }

    /// Raw octal value (0o0000-0o7777).
    pub fn value(&self) -> u16 {
        self.0
    }
}

impl fmt::Display for Squawk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}

impl From<Squawk> for String {
    fn from(s: Squawk) -> String {
        s.to_string()
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// One surveillance report as handed over by the decoding side.
///
/// Every field is optional. Values are kept as supplied; the accessors
/// normalize them and drop anything invalid, so a bad field never blocks
/// classification of the rest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Report {
    #[serde(default, alias = "hex", alias = "icao_address", deserialize_with = "de_address")]
    pub icao: Option<u32>,
    #[serde(default, alias = "flight")]
    pub callsign: Option<String>,
    #[serde(default, deserialize_with = "de_code")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "de_squawk")]
    pub squawk: Option<String>,
    #[serde(default, alias = "reg")]
    pub registration: Option<String>,
}

impl Report {
    /// The ICAO address, if present and within 24 bits.
    pub fn address(&self) -> Option<u32> {
        self.icao.filter(|&a| is_valid_address(a))
    }

    /// Normalized callsign, if present and encodable.
    pub fn callsign(&self) -> Option<String> {
        self.callsign.as_deref().and_then(normalize_callsign)
    }

    /// Parsed squawk, if present and a valid octal code.
    pub fn squawk(&self) -> Option<Squawk> {
        self.squawk.as_deref().and_then(|s| Squawk::parse(s).ok())
    }

    /// Emitter category code, if present and non-blank.
    pub fn category(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Registration (tail number), trimmed and uppercased.
    pub fn registration(&self) -> Option<String> {
        self.registration
            .as_deref()
            .map(|r| r.trim().to_ascii_uppercase())
            .filter(|r| !r.is_empty())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumOrText {
    Num(u64),
    Text(String),
}

/// Addresses arrive as integers or hex strings. Anything unparseable is
/// treated as absent.
fn de_address<'de, D>(deserializer: D) -> std::result::Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumOrText>::deserialize(deserializer)? {
        Some(NumOrText::Num(v)) => u32::try_from(v).ok(),
        Some(NumOrText::Text(s)) => parse_address(&s).ok(),
        None => None,
    })
}

/// Squawks and GDL90 categories are sometimes sent as bare numbers.
fn de_code<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumOrText>::deserialize(deserializer)? {
        Some(NumOrText::Num(v)) => Some(v.to_string()),
        Some(NumOrText::Text(s)) => Some(s),
        None => None,
    })
}

/// A numeric squawk lost its leading zeros in transit; `400` is `0400`.
fn de_squawk<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<NumOrText>::deserialize(deserializer)? {
        Some(NumOrText::Num(v)) => Some(format!("{v:04}")),
        Some(NumOrText::Text(s)) => Some(s),
        None => None,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!(parse_address("4840D6").unwrap(), 0x4840D6);
        assert_eq!(parse_address("a61d00").unwrap(), 0xA61D00);
        assert_eq!(parse_address("0xAE2682").unwrap(), 0xAE2682);
        assert_eq!(parse_address("~A1B2C3").unwrap(), 0xA1B2C3);
        assert!(parse_address("").is_err());
        assert!(parse_address("ZZZZZZ").is_err());
        assert!(parse_address("1234567").is_err());
        assert!(parse_address("+A1B2").is_err());
        assert!(parse_address("-1").is_err());
        assert!(parse_address("0x+1").is_err());
    }

    #[test]
    fn test_address_to_hex() {
        assert_eq!(address_to_hex(0x4840D6), "4840D6");
        assert_eq!(address_to_hex(0x00400F), "00400F");
    }

    #[test]
    fn test_normalize_callsign() {
        assert_eq!(normalize_callsign(" ual2153 "), Some("UAL2153".into()));
        assert_eq!(normalize_callsign("N12 AB"), Some("N12 AB".into()));
        assert_eq!(normalize_callsign("   "), None);
        assert_eq!(normalize_callsign("TOOLONG123"), None);
        assert_eq!(normalize_callsign("AB-12"), None);
        assert_eq!(normalize_callsign("ÄB12"), None);
    }

    #[test]
    fn test_squawk_parse() {
        assert_eq!(Squawk::parse("7700").unwrap().value(), 0o7700);
        assert_eq!(Squawk::parse("0000").unwrap().value(), 0);
        assert_eq!(Squawk::parse("1200").unwrap().to_string(), "1200");
        assert!(Squawk::parse("7800").is_err());
        assert!(Squawk::parse("770").is_err());
        assert!(Squawk::parse("77000").is_err());
        assert!(Squawk::parse("77a0").is_err());
    }

    #[test]
    fn test_report_from_json() {
        let r: Report = serde_json::from_str(
            r#"{"hex": "a61d00", "flight": "UAL2153 ", "category": "A3", "squawk": 1200}"#,
        )
        .unwrap();
        assert_eq!(r.address(), Some(0xA61D00));
        assert_eq!(r.callsign(), Some("UAL2153".into()));
        assert_eq!(r.category(), Some("A3"));
        assert_eq!(r.squawk().unwrap().to_string(), "1200");
    }

    #[test]
    fn test_report_numeric_squawk_keeps_leading_zeros() {
        let r: Report = serde_json::from_str(r#"{"squawk": 400}"#).unwrap();
        assert_eq!(r.squawk().unwrap().value(), 0o400);
        assert_eq!(r.squawk().unwrap().to_string(), "0400");
        let r: Report = serde_json::from_str(r#"{"squawk": 7700}"#).unwrap();
        assert_eq!(r.squawk().unwrap().value(), 0o7700);
        let r: Report = serde_json::from_str(r#"{"squawk": 17}"#).unwrap();
        assert_eq!(r.squawk().unwrap().to_string(), "0017");
    }

    #[test]
    fn test_report_invalid_fields_are_absent() {
        let r: Report =
            serde_json::from_str(r#"{"icao": "nothex", "squawk": "9999", "category": " "}"#)
                .unwrap();
        assert_eq!(r.address(), None);
        assert_eq!(r.squawk(), None);
        assert_eq!(r.category(), None);
    }

    #[test]
    fn test_report_address_outside_24_bits() {
        let r = Report {
            icao: Some(0x1_000_000),
            ..Report::default()
        };
        assert_eq!(r.address(), None);
    }

    #[test]
    fn test_report_integer_address() {
        let r: Report = serde_json::from_str(r#"{"icao": 10624256}"#).unwrap();
        assert_eq!(r.address(), Some(0xA21D00));
    }
}
