//! Known-craft registry: per-aircraft overrides keyed by ICAO address or
//! registration.
//!
//! Records come from a curated list (JSON or CSV) and are the most specific
//! data the classifier has. Duplicate keys are resolved last-wins at load
//! time and counted; they never surface as errors.

use std::collections::HashMap;

use serde_json::Value;
use tracing::warn;

use crate::taxonomy::{AirframeClass, CotType};
use crate::types::{address_to_hex, is_valid_address, parse_address, AircotError, Result};

const TABLE: &str = "known_craft";

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// What the `TYPE` column says about the airframe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CraftType {
    Airframe(AirframeClass),
    /// Anything that isn't an airframe name is taken as an emitter category
    /// code and resolved through the category table.
    Category(String),
}

/// One curated aircraft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnownCraft {
    pub address: Option<u32>,
    pub registration: Option<String>,
    /// Full type override, used verbatim.
    pub cot: Option<CotType>,
    pub craft_type: Option<CraftType>,
    pub callsign: Option<String>,
}

impl KnownCraft {
    /// Build a record from loosely-typed fields.
    ///
    /// Keys are matched case-insensitively with the usual aliases
    /// (`hexid`/`hex`/`icao`, `reg`/`registration`/`tail`,
    /// `cot`/`type_cot`/`cottype`/`cot type`). Returns `Ok(None)` for rows
    /// carrying neither an address nor a registration.
    pub fn from_fields<'a, I>(fields: I, index: usize) -> Result<Option<KnownCraft>>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let malformed = |reason: String| AircotError::MalformedRecord {
            table: TABLE,
            index,
            reason,
        };
        let mut craft = KnownCraft::default();

        for (key, value) in fields {
            let value = clean(value);
            if value.is_empty() {
                continue;
            }
            match clean(key).to_ascii_lowercase().as_str() {
                "hexid" | "hex" | "icao" => {
                    let addr = parse_address(value).map_err(|e| malformed(e.to_string()))?;
                    if !is_valid_address(addr) {
                        return Err(malformed(format!("address {addr:#X} exceeds 24 bits")));
                    }
                    craft.address = Some(addr);
                }
                "reg" | "registration" | "tail" => {
                    craft.registration = Some(value.to_ascii_uppercase());
                }
                "cot" | "type_cot" | "cottype" | "cot type" => {
                    craft.cot = Some(CotType::parse(value).map_err(|e| malformed(e.to_string()))?);
                }
                "type" => {
                    craft.craft_type = Some(match AirframeClass::from_name(value) {
                        Ok(class) => CraftType::Airframe(class),
                        Err(_) => CraftType::Category(value.to_ascii_uppercase()),
                    });
                }
                "callsign" => craft.callsign = Some(value.to_string()),
                _ => {}
            }
        }

        if craft.address.is_none() && craft.registration.is_none() {
            return Ok(None);
        }
        Ok(Some(craft))
    }
}

fn clean(s: &str) -> &str {
    s.trim().trim_matches('"').trim()
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Hash-indexed known-craft table.
#[derive(Debug, Clone, Default)]
pub struct ExactTable {
    by_address: HashMap<u32, KnownCraft>,
    by_registration: HashMap<String, KnownCraft>,
    duplicates: usize,
}

impl ExactTable {
    pub fn new() -> Self {
        ExactTable::default()
    }

    /// Build from records in load order. Later records replace earlier ones
    /// with the same address or registration.
    pub fn from_records(records: impl IntoIterator<Item = KnownCraft>) -> ExactTable {
        let mut table = ExactTable::new();
        for craft in records {
            table.insert(craft);
        }
        table
    }

    /// Insert a record, replacing any previous holder of its keys.
    /// Returns true if a key was already taken.
    pub fn insert(&mut self, craft: KnownCraft) -> bool {
        let mut replaced = false;
        if let Some(addr) = craft.address {
            if self.by_address.insert(addr, craft.clone()).is_some() {
                warn!(icao = %address_to_hex(addr), "duplicate known-craft address, keeping later record");
                replaced = true;
            }
        }
        if let Some(reg) = craft.registration.clone() {
            if self.by_registration.insert(reg.clone(), craft).is_some() {
                warn!(registration = %reg, "duplicate known-craft registration, keeping later record");
                replaced = true;
            }
        }
        if replaced {
            self.duplicates += 1;
        }
        replaced
    }

    pub fn lookup(&self, addr: u32) -> Option<&KnownCraft> {
        self.by_address.get(&addr)
    }

    /// Registration lookup; case-insensitive.
    pub fn lookup_registration(&self, reg: &str) -> Option<&KnownCraft> {
        self.by_registration.get(&reg.trim().to_ascii_uppercase())
    }

    /// Number of records that replaced an earlier one during loading.
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Distinct addresses indexed.
    pub fn len(&self) -> usize {
        self.by_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty() && self.by_registration.is_empty()
    }

    pub fn registrations(&self) -> usize {
        self.by_registration.len()
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse known craft from JSON: either a bare array of objects or an object
/// with an `aircraft` array.
pub fn parse_json(text: &str) -> Result<Vec<KnownCraft>> {
    let value: Value = serde_json::from_str(text)?;
    let rows: &[Value] = match &value {
        Value::Array(rows) => rows.as_slice(),
        Value::Object(map) => match map.get("aircraft") {
            Some(Value::Array(rows)) => rows.as_slice(),
            _ => &[],
        },
        _ => &[],
    };

    let mut out = Vec::with_capacity(rows.len());
    for (index, row) in rows.iter().enumerate() {
        let Value::Object(map) = row else {
            return Err(AircotError::MalformedRecord {
                table: TABLE,
                index,
                reason: "expected an object".into(),
            });
        };
        let mut fields: Vec<(&str, String)> = Vec::with_capacity(map.len());
        for (k, v) in map {
            match v {
                Value::String(s) => fields.push((k.as_str(), s.clone())),
                // A numeric address is the decimal value of the 24-bit code.
                Value::Number(n) if is_address_key(k) => {
                    let addr = n
                        .as_u64()
                        .and_then(|v| u32::try_from(v).ok())
                        .filter(|a| is_valid_address(*a))
                        .ok_or_else(|| AircotError::MalformedRecord {
                            table: TABLE,
                            index,
                            reason: format!("address {n} is not a 24-bit value"),
                        })?;
                    fields.push((k.as_str(), address_to_hex(addr)));
                }
                Value::Number(n) => fields.push((k.as_str(), n.to_string())),
                _ => {}
            }
        }
        let pairs = fields.iter().map(|(k, v)| (*k, v.as_str()));
        match KnownCraft::from_fields(pairs, index)? {
            Some(craft) => out.push(craft),
            None => warn!(index, "known-craft record has no hex or registration, skipped"),
        }
    }
    Ok(out)
}

fn is_address_key(key: &str) -> bool {
    matches!(
        key.trim().to_ascii_lowercase().as_str(),
        "hexid" | "hex" | "icao"
    )
}

/// Parse known craft from CSV.
///
/// Blank lines and `#` comments are skipped. A comment that names both
/// `hexid` and `registration` supplies the header; otherwise the first data
/// line is the header.
pub fn parse_csv(text: &str) -> Result<Vec<KnownCraft>> {
    let mut header: Option<Vec<String>> = None;
    let mut out = Vec::new();
    let mut index = 0;

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() {
            continue;
        }
        if let Some(comment) = stripped.strip_prefix('#') {
            let lower = comment.to_ascii_lowercase();
            if header.is_none() && lower.contains("hexid") && lower.contains("registration") {
                header = Some(split_csv_line(comment.trim()));
            }
            continue;
        }

        let cols = split_csv_line(stripped);
        if header.is_none() {
            header = Some(cols);
            continue;
        }
        let names = header.as_deref().unwrap_or_default();

        let pairs = names
            .iter()
            .zip(cols.iter())
            .map(|(k, v)| (k.as_str(), v.as_str()));
        match KnownCraft::from_fields(pairs, index)? {
            Some(craft) => out.push(craft),
            None => warn!(index, "known-craft row has no hex or registration, skipped"),
        }
        index += 1;
    }
    Ok(out)
}

/// Split one CSV line. Handles double-quoted fields and `""` escapes.
pub(crate) fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                cur.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut cur).trim().to_string()),
            _ => cur.push(c),
        }
    }
    fields.push(cur.trim().to_string());
    fields
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
