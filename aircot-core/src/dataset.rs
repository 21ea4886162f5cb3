//! Reference dataset loading.
//!
//! The four tables are built together into a `TableSet`, either from the
//! dataset compiled into the crate or from files supplied by the host. Any
//! load error aborts construction; a `TableSet` that exists is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::category::{self, CategoryTable};
use crate::emergency::{self, EmergencyTable};
use crate::exact::{self, ExactTable};
use crate::range::{self, RangeTable};
use crate::types::Result;

const EMBEDDED_RANGES: &str = include_str!("../data/icao_ranges.json");
const EMBEDDED_CATEGORIES: &str = include_str!("../data/categories.json");
const EMBEDDED_EMERGENCY: &str = include_str!("../data/emergency.json");
const EMBEDDED_KNOWN_CRAFT: &str = include_str!("../data/known_craft.json");

/// Where to read each table from. `None` means the embedded copy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetPaths {
    pub ranges: Option<PathBuf>,
    pub known_craft: Option<PathBuf>,
    pub categories: Option<PathBuf>,
    pub emergency: Option<PathBuf>,
}

/// Counts gathered while loading, for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    pub ranges: usize,
    pub known_addresses: usize,
    pub known_registrations: usize,
    pub known_duplicates: usize,
    pub categories: usize,
    pub category_duplicates: usize,
    pub emergency_codes: usize,
    pub ranges_version: Option<String>,
    pub known_craft_version: Option<String>,
    pub categories_version: Option<String>,
    pub emergency_version: Option<String>,
}

/// The immutable table set a classifier reads from.
#[derive(Debug, Clone, Default)]
pub struct TableSet {
    pub ranges: RangeTable,
    pub exact: ExactTable,
    pub categories: CategoryTable,
    pub emergency: EmergencyTable,
    versions: Versions,
}

#[derive(Debug, Clone, Default)]
struct Versions {
    ranges: Option<String>,
    known_craft: Option<String>,
    categories: Option<String>,
    emergency: Option<String>,
}

impl TableSet {
    /// Assemble a table set from already-built tables.
    pub fn new(
        ranges: RangeTable,
        exact: ExactTable,
        categories: CategoryTable,
        emergency: EmergencyTable,
    ) -> TableSet {
        TableSet {
            ranges,
            exact,
            categories,
            emergency,
            versions: Versions::default(),
        }
    }

    /// Build from the dataset compiled into this crate.
    pub fn embedded() -> Result<TableSet> {
        TableSet::load(&DatasetPaths::default())
    }

    /// Build from files, falling back to the embedded copy for any table
    /// without a path.
    pub fn load(paths: &DatasetPaths) -> Result<TableSet> {
        let ranges_src = Source::new(paths.ranges.as_deref(), EMBEDDED_RANGES)?;
        let ranges = if ranges_src.is_csv() {
            range::parse_csv(&ranges_src.text)?
        } else {
            range::parse_json(&ranges_src.text)?
        };

        let craft_src = Source::new(paths.known_craft.as_deref(), EMBEDDED_KNOWN_CRAFT)?;
        let records = if craft_src.is_csv() {
            exact::parse_csv(&craft_src.text)?
        } else {
            exact::parse_json(&craft_src.text)?
        };
        let exact = ExactTable::from_records(records);

        let cat_src = Source::new(paths.categories.as_deref(), EMBEDDED_CATEGORIES)?;
        let categories = category::parse_json(&cat_src.text)?;

        let em_src = Source::new(paths.emergency.as_deref(), EMBEDDED_EMERGENCY)?;
        let emergency = emergency::parse_json(&em_src.text)?;

        let tables = TableSet {
            ranges,
            exact,
            categories,
            emergency,
            versions: Versions {
                ranges: ranges_src.version(),
                known_craft: craft_src.version(),
                categories: cat_src.version(),
                emergency: em_src.version(),
            },
        };
        let stats = tables.stats();
        debug!(
            ranges = stats.ranges,
            known = stats.known_addresses,
            known_duplicates = stats.known_duplicates,
            categories = stats.categories,
            emergency = stats.emergency_codes,
            "reference tables loaded"
        );
        Ok(tables)
    }

    pub fn stats(&self) -> LoadStats {
        LoadStats {
            ranges: self.ranges.len(),
            known_addresses: self.exact.len(),
            known_registrations: self.exact.registrations(),
            known_duplicates: self.exact.duplicates(),
            categories: self.categories.len(),
            category_duplicates: self.categories.duplicates(),
            emergency_codes: self.emergency.len(),
            ranges_version: self.versions.ranges.clone(),
            known_craft_version: self.versions.known_craft.clone(),
            categories_version: self.versions.categories.clone(),
            emergency_version: self.versions.emergency.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

struct Source {
    text: String,
    csv: bool,
}

impl Source {
    fn new(path: Option<&Path>, embedded: &str) -> Result<Source> {
        match path {
            Some(p) => {
                let text = std::fs::read_to_string(p)?;
                let csv = p
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
                debug!(path = %p.display(), "reading reference table");
                Ok(Source { text, csv })
            }
            None => Ok(Source {
                text: embedded.to_string(),
                csv: false,
            }),
        }
    }

    fn is_csv(&self) -> bool {
        self.csv
    }

    /// The top-level `version` string of a JSON table, if it has one.
    fn version(&self) -> Option<String> {
        #[derive(Deserialize)]
        struct Header {
            version: Option<String>,
        }
        if self.csv {
            return None;
        }
        serde_json::from_str::<Header>(&self.text)
            .ok()
            .and_then(|h| h.version)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::types::AircotError;

    fn write_temp(suffix: &str, text: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        f.write_all(text.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_embedded_loads() {
        let tables = TableSet::embedded().unwrap();
        let stats = tables.stats();
        assert!(stats.ranges > 100);
        assert_eq!(stats.emergency_codes, 3);
        assert_eq!(stats.known_addresses, 2);
        assert_eq!(stats.known_duplicates, 0);
        assert!(stats.categories > 40);
        assert_eq!(stats.ranges_version.as_deref(), Some("2026.10.1"));
    }

    #[test]
    fn test_load_overrides_from_files() {
        let ranges = write_temp(
            ".json",
            r#"{"version": "fixture", "ranges": [
                {"start": "A00000", "end": "AFFFFF", "country": "United States"}
            ]}"#,
        );
        let craft = write_temp(".csv", "hex,reg,type\nA00001,N1,HELICOPTER\nA00001,N1,UAS\n");
        let paths = DatasetPaths {
            ranges: Some(ranges.path().to_path_buf()),
            known_craft: Some(craft.path().to_path_buf()),
            ..DatasetPaths::default()
        };
        let tables = TableSet::load(&paths).unwrap();
        let stats = tables.stats();
        assert_eq!(stats.ranges, 1);
        assert_eq!(stats.ranges_version.as_deref(), Some("fixture"));
        assert_eq!(stats.known_addresses, 1);
        assert_eq!(stats.known_duplicates, 1);
        assert_eq!(stats.known_craft_version, None);
        // Untouched tables still come from the embedded dataset.
        assert_eq!(stats.emergency_codes, 3);
    }

    #[test]
    fn test_overlapping_file_fails_construction() {
        let ranges = write_temp(
            ".json",
            r#"{"ranges": [
                {"start": "400000", "end": "43FFFF", "country": "United Kingdom"},
                {"start": "43C000", "end": "43CFFF", "country": "United Kingdom", "allocation": "military"}
            ]}"#,
        );
        let paths = DatasetPaths {
            ranges: Some(ranges.path().to_path_buf()),
            ..DatasetPaths::default()
        };
        assert!(matches!(
            TableSet::load(&paths),
            Err(AircotError::OverlappingRanges { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let paths = DatasetPaths {
            categories: Some(PathBuf::from("/nonexistent/aircot/categories.json")),
            ..DatasetPaths::default()
        };
        assert!(matches!(TableSet::load(&paths), Err(AircotError::Io(_))));
    }

    #[test]
    fn test_csv_ranges_by_extension() {
        let ranges = write_temp(".CSV", "start,end,country\nE40000,E7FFFF,Brazil\n");
        let paths = DatasetPaths {
            ranges: Some(ranges.path().to_path_buf()),
            ..DatasetPaths::default()
        };
        let tables = TableSet::load(&paths).unwrap();
        assert_eq!(tables.ranges.country(0xE40001), Some("Brazil"));
        assert_eq!(tables.stats().ranges_version, None);
    }
}
