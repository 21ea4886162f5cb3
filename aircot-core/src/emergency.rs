//! Emergency squawk overrides.
//!
//! Three codes are reserved worldwide: 7500 (unlawful interference), 7600
//! (radio failure) and 7700 (general emergency). A match changes the status
//! facet of a result only; it says nothing about the airframe.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::{AircotError, Result, Squawk};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmergencyStatus {
    Hijack,
    RadioFailure,
    Emergency,
}

impl EmergencyStatus {
    pub fn description(self) -> &'static str {
        match self {
            EmergencyStatus::Hijack => "Hijack",
            EmergencyStatus::RadioFailure => "Radio failure",
            EmergencyStatus::Emergency => "Emergency",
        }
    }
}

impl fmt::Display for EmergencyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl FromStr for EmergencyStatus {
    type Err = AircotError;

    fn from_str(s: &str) -> Result<EmergencyStatus> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "hijack" | "unlawful_interference" => Ok(EmergencyStatus::Hijack),
            "radio_failure" | "nordo" | "communications_failure" => {
                Ok(EmergencyStatus::RadioFailure)
            }
            "emergency" | "general_emergency" => Ok(EmergencyStatus::Emergency),
            _ => Err(AircotError::UnknownValue {
                field: "emergency status",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct EmergencyTable {
    codes: HashMap<Squawk, EmergencyStatus>,
}

impl EmergencyTable {
    pub fn new() -> Self {
        EmergencyTable::default()
    }

    /// The three reserved codes.
    pub fn standard() -> Self {
        let mut table = EmergencyTable::new();
        for (code, status) in [
            ("7500", EmergencyStatus::Hijack),
            ("7600", EmergencyStatus::RadioFailure),
            ("7700", EmergencyStatus::Emergency),
        ] {
            if let Ok(squawk) = Squawk::parse(code) {
                table.insert(squawk, status);
            }
        }
        table
    }

    pub fn insert(&mut self, squawk: Squawk, status: EmergencyStatus) -> bool {
        let replaced = self.codes.insert(squawk, status).is_some();
        if replaced {
            warn!(squawk = %squawk, "duplicate emergency squawk, keeping later status");
        }
        replaced
    }

    /// Exact match only; every other code, including 1200/2000/7000, is a miss.
    pub fn lookup(&self, squawk: Squawk) -> Option<EmergencyStatus> {
        self.codes.get(&squawk).copied()
    }

    pub fn len(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct EmergencyFile {
    emergency: Vec<EmergencyRecord>,
}

#[derive(Deserialize)]
struct EmergencyRecord {
    squawk: String,
    status: String,
}

/// Parse `{"version": "...", "emergency": [{"squawk": "7700", "status": "emergency"}]}`.
pub fn parse_json(text: &str) -> Result<EmergencyTable> {
    let file: EmergencyFile = serde_json::from_str(text)?;
    let mut table = EmergencyTable::new();
    for (index, rec) in file.emergency.into_iter().enumerate() {
        let malformed = |e: AircotError| AircotError::MalformedRecord {
            table: "emergency",
            index,
            reason: e.to_string(),
        };
        let squawk = Squawk::parse(&rec.squawk).map_err(malformed)?;
        let status: EmergencyStatus = rec.status.parse().map_err(malformed)?;
        table.insert(squawk, status);
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
