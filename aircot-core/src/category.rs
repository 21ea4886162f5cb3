//! Emitter category → generic airframe class.
//!
//! Accepts both DO-260B set/code pairs (`A1`..`D7`) and the GDL90 numeric
//! form (`1`..`39`). Lookup is total: a code with no entry is simply an
//! unknown airframe.

use std::collections::HashMap;

use serde::Deserialize;
use tracing::warn;

use crate::taxonomy::AirframeClass;
use crate::types::{AircotError, Result};

#[derive(Debug, Clone, Default)]
pub struct CategoryTable {
    classes: HashMap<String, AirframeClass>,
    duplicates: usize,
}

/// Trim and uppercase a category code.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

impl CategoryTable {
    pub fn new() -> Self {
        CategoryTable::default()
    }

    /// Add a mapping. A code seen before is replaced; returns true in that
    /// case.
    pub fn insert(&mut self, code: &str, class: AirframeClass) -> bool {
        let code = normalize_code(code);
        if code.is_empty() {
            return false;
        }
        let replaced = self.classes.insert(code.clone(), class).is_some();
        if replaced {
            warn!(code = %code, "duplicate category code, keeping later mapping");
            self.duplicates += 1;
        }
        replaced
    }

    /// The class for a code, if the table has an entry for it.
    pub fn get(&self, code: &str) -> Option<AirframeClass> {
        self.classes.get(&normalize_code(code)).copied()
    }

    /// Total lookup: codes without an entry map to `Unknown`.
    pub fn lookup(&self, code: &str) -> AirframeClass {
        self.get(code).unwrap_or(AirframeClass::Unknown)
    }

    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct CategoryFile {
    categories: Vec<CategoryRecord>,
}

#[derive(Deserialize)]
struct CategoryRecord {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    codes: Vec<String>,
    class: String,
}

/// Parse a category table:
/// `{"version": "...", "categories": [{"codes": ["7", "A7"], "class": "rotorcraft"}]}`.
pub fn parse_json(text: &str) -> Result<CategoryTable> {
    let file: CategoryFile = serde_json::from_str(text)?;
    let mut table = CategoryTable::new();

    for (index, rec) in file.categories.into_iter().enumerate() {
        let malformed = |reason: String| AircotError::MalformedRecord {
            table: "categories",
            index,
            reason,
        };
        let class = AirframeClass::from_key(&rec.class).map_err(|e| malformed(e.to_string()))?;
        let codes: Vec<&String> = rec.code.iter().chain(rec.codes.iter()).collect();
        if codes.is_empty() {
            return Err(malformed("no category codes".into()));
        }
        for code in codes {
            if normalize_code(code).is_empty() {
                return Err(malformed("blank category code".into()));
            }
            table.insert(code, class);
        }
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
