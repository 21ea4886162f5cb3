//! Report → CoT type classification.
//!
//! Resolution order for the airframe facet is fixed: known craft, address
//! block, emitter category, default. The emergency table is consulted on
//! every report and only ever touches the status facet and display color.
//! Classification is a pure function of the report and the loaded tables.

use serde::Serialize;

use crate::callsign::{is_domestic_airline, is_sar_rotorcraft};
use crate::dataset::TableSet;
use crate::emergency::EmergencyStatus;
use crate::exact::{CraftType, KnownCraft};
use crate::taxonomy::{AirframeClass, Attitude, CotType, DisplayHint, Operator};
use crate::types::{address_to_hex, Report, Result};

// ---------------------------------------------------------------------------
// Result types
// ---------------------------------------------------------------------------

/// Which table decided the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Source {
    ExactId,
    Range,
    Category,
    EmergencyOverride,
    Default,
}

impl Source {
    pub fn as_str(self) -> &'static str {
        match self {
            Source::ExactId => "exact-id",
            Source::Range => "range",
            Source::Category => "category",
            Source::EmergencyOverride => "emergency-override",
            Source::Default => "default",
        }
    }
}

/// Ordinal confidence, one step per source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Minimal,
    Low,
    Medium,
    High,
    Highest,
}

impl From<Source> for Confidence {
    fn from(source: Source) -> Confidence {
        match source {
            Source::ExactId => Confidence::Highest,
            Source::Range => Confidence::High,
            Source::Category => Confidence::Medium,
            Source::EmergencyOverride => Confidence::Low,
            Source::Default => Confidence::Minimal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub type_string: CotType,
    pub display_hint: DisplayHint,
    pub source: Source,
    pub confidence: Confidence,
    pub attitude: Attitude,
    pub operator: Operator,
    pub airframe: AirframeClass,
    pub emergency: Option<EmergencyStatus>,
    pub country: Option<String>,
    pub label: Option<String>,
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Toggles for the callsign heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClassifierOptions {
    /// Domestic US airline callsigns make an unknown attitude neutral.
    pub domestic_callsigns: bool,
    /// Military `C6xx` callsigns are Coast Guard SAR helicopters.
    pub sar_callsigns: bool,
}

impl Default for ClassifierOptions {
    fn default() -> Self {
        ClassifierOptions {
            domestic_callsigns: true,
            sar_callsigns: true,
        }
    }
}

/// Owns a table set and classifies reports against it.
///
/// Immutable once built, so a single instance can be shared across any
/// number of threads (wrap it in an `Arc`).
#[derive(Debug, Clone)]
pub struct Classifier {
    tables: TableSet,
    options: ClassifierOptions,
}

impl Classifier {
    pub fn new(tables: TableSet, options: ClassifierOptions) -> Classifier {
        Classifier { tables, options }
    }

    /// Classifier over the embedded dataset with default options.
    pub fn embedded() -> Result<Classifier> {
        Ok(Classifier::new(
            TableSet::embedded()?,
            ClassifierOptions::default(),
        ))
    }

    pub fn tables(&self) -> &TableSet {
        &self.tables
    }

    pub fn options(&self) -> ClassifierOptions {
        self.options
    }

    /// Classify one report. Never fails: missing or invalid fields are
    /// treated as absent.
    pub fn classify(&self, report: &Report) -> ClassificationResult {
        let addr = report.address();
        let callsign = report.callsign();
        let registration = report.registration();

        let known = addr
            .and_then(|a| self.tables.exact.lookup(a))
            .or_else(|| {
                registration
                    .as_deref()
                    .and_then(|r| self.tables.exact.lookup_registration(r))
            });
        let block = addr.and_then(|a| self.tables.ranges.lookup(a));
        let country = addr
            .and_then(|a| self.tables.ranges.country(a))
            .map(str::to_string);
        let category = report.category().and_then(|c| self.tables.categories.get(c));
        let emergency = report
            .squawk()
            .and_then(|sq| self.tables.emergency.lookup(sq));

        let source = if known.is_some() {
            Source::ExactId
        } else if block.is_some() {
            Source::Range
        } else if category.is_some() {
            Source::Category
        } else if emergency.is_some() {
            Source::EmergencyOverride
        } else {
            Source::Default
        };

        let mut attitude = block.map_or(Attitude::Unknown, |b| b.attitude);
        let mut operator = block.map_or(Operator::Civil, |b| b.allocation.operator());
        let mut airframe = known
            .and_then(|k| self.known_airframe(k))
            .or(category)
            .unwrap_or(AirframeClass::Unknown);

        // A curated type string is final; the heuristics below only refine
        // types we composed ourselves.
        let verbatim = known.and_then(|k| k.cot.clone());

        let type_string = match verbatim {
            Some(cot) => {
                attitude = cot.attitude();
                operator = cot.operator().unwrap_or(operator);
                // The report category never overrides a curated type string.
                airframe = known
                    .and_then(|k| self.known_airframe(k))
                    .unwrap_or_else(|| cot.airframe());
                cot
            }
            None => {
                if airframe.forces_military() {
                    operator = Operator::Military;
                }
                if let Some(cs) = callsign.as_deref() {
                    if self.options.domestic_callsigns
                        && attitude == Attitude::Unknown
                        && is_domestic_airline(cs)
                    {
                        attitude = Attitude::Neutral;
                    }
                    if self.options.sar_callsigns
                        && is_sar_rotorcraft(cs, operator == Operator::Military)
                    {
                        attitude = Attitude::Friend;
                        airframe = AirframeClass::SearchAndRescue;
                    }
                }
                CotType::compose(attitude, operator, airframe)
            }
        };

        let label = known
            .and_then(|k| k.callsign.clone())
            .or(callsign)
            .or_else(|| addr.map(|a| format!("ICAO-{}", address_to_hex(a))));

        ClassificationResult {
            type_string,
            display_hint: DisplayHint::new(airframe, attitude, emergency.is_some()),
            source,
            confidence: source.into(),
            attitude,
            operator,
            airframe,
            emergency,
            country,
            label,
        }
    }

    fn known_airframe(&self, craft: &KnownCraft) -> Option<AirframeClass> {
        match craft.craft_type.as_ref()? {
            CraftType::Airframe(class) => Some(*class),
            CraftType::Category(code) => self.tables.categories.get(code),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category;
    use crate::emergency::EmergencyTable;
    use crate::exact::ExactTable;
    use crate::range::{Allocation, BlockClass, RangeEntry, RangeTable};
    use crate::taxonomy::{Color, Icon};
    use crate::types::AircotError;

    fn block(low: u32, high: u32, country: &str, allocation: Allocation, attitude: Attitude) -> RangeEntry {
        RangeEntry::new(
            low,
            high,
            BlockClass {
                country: country.to_string(),
                allocation,
                attitude,
            },
        )
        .unwrap()
    }

    fn fixture_tables() -> TableSet {
        let ranges = RangeTable::new(vec![
            block(0x3C0000, 0x3FFFFF, "Germany", Allocation::Civil, Attitude::Neutral),
            block(0xA00000, 0xADF7C7, "United States", Allocation::Civil, Attitude::Neutral),
            block(0xADF7C8, 0xAFFFFF, "United States", Allocation::Military, Attitude::Friend),
            block(0xF00000, 0xF07FFF, "ICAO (special)", Allocation::Reserved, Attitude::Unknown),
        ])
        .unwrap();
        let exact = ExactTable::from_records([
            // Military cargo outside every block.
            KnownCraft {
                address: Some(0x123456),
                cot: Some(CotType::parse("a-u-A-M-F-C").unwrap()),
                craft_type: Some(CraftType::Airframe(AirframeClass::Cargo)),
                ..KnownCraft::default()
            },
            // Also covered by the US military block.
            KnownCraft {
                address: Some(0xAE2682),
                registration: Some("C6540".into()),
                cot: Some(CotType::parse("a-f-A-M-H-H").unwrap()),
                craft_type: Some(CraftType::Airframe(AirframeClass::Rotorcraft)),
                callsign: Some("USCG 6540".into()),
            },
            // Type string only, no airframe name.
            KnownCraft {
                address: Some(0x654321),
                cot: Some(CotType::parse("a-f-A-M-H-H").unwrap()),
                ..KnownCraft::default()
            },
            KnownCraft {
                registration: Some("N12345".into()),
                craft_type: Some(CraftType::Category("B6".into())),
                ..KnownCraft::default()
            },
        ]);
        let categories = category::parse_json(include_str!("../data/categories.json")).unwrap();
        TableSet::new(ranges, exact, categories, EmergencyTable::standard())
    }

    fn classifier() -> Classifier {
        Classifier::new(fixture_tables(), ClassifierOptions::default())
    }

    fn report(icao: Option<u32>, callsign: Option<&str>, category: Option<&str>, squawk: Option<&str>) -> Report {
        Report {
            icao,
            callsign: callsign.map(String::from),
            category: category.map(String::from),
            squawk: squawk.map(String::from),
            registration: None,
        }
    }

    // --- Example scenarios ---

    #[test]
    fn test_exact_id_outside_ranges() {
        let r = classifier().classify(&report(Some(0x123456), None, None, None));
        assert_eq!(r.source, Source::ExactId);
        assert_eq!(r.confidence, Confidence::Highest);
        assert_eq!(r.airframe, AirframeClass::Cargo);
        assert_eq!(r.operator, Operator::Military);
        assert_eq!(r.type_string.as_str(), "a-u-A-M-F-C");
        assert_eq!(r.country, None);
    }

    #[test]
    fn test_range_with_category() {
        let r = classifier().classify(&report(Some(0x3C6586), Some("DLH4AB"), Some("A3"), None));
        assert_eq!(r.source, Source::Range);
        assert_eq!(r.airframe, AirframeClass::FixedWingLarge);
        assert_eq!(r.attitude, Attitude::Neutral);
        assert_eq!(r.type_string.as_str(), "a-n-A-C-F");
        assert_eq!(r.country.as_deref(), Some("Germany"));
        assert_eq!(r.label.as_deref(), Some("DLH4AB"));
    }

    #[test]
    fn test_emergency_without_airframe() {
        let r = classifier().classify(&report(None, None, None, Some("7700")));
        assert_eq!(r.source, Source::EmergencyOverride);
        assert_eq!(r.confidence, Confidence::Low);
        assert_eq!(r.emergency, Some(EmergencyStatus::Emergency));
        assert_eq!(r.airframe, AirframeClass::Unknown);
        assert_eq!(r.display_hint.color, Color::EMERGENCY);
        assert_eq!(r.type_string.as_str(), "a-u-A-C");
    }

    #[test]
    fn test_unknown_category_code() {
        let r = classifier().classify(&report(None, None, Some("zz"), None));
        assert_eq!(r.source, Source::Default);
        assert_eq!(r.airframe, AirframeClass::Unknown);
        assert_eq!(r.emergency, None);
    }

    #[test]
    fn test_overlapping_ranges_fail_before_classify() {
        let result = RangeTable::new(vec![
            block(0x400000, 0x43FFFF, "United Kingdom", Allocation::Civil, Attitude::Neutral),
            block(0x43C000, 0x43CFFF, "United Kingdom", Allocation::Military, Attitude::Friend),
        ]);
        assert!(matches!(result, Err(AircotError::OverlappingRanges { .. })));
    }

    // --- Properties ---

    #[test]
    fn test_empty_report_is_default() {
        let r = classifier().classify(&Report::default());
        assert_eq!(r.source, Source::Default);
        assert_eq!(r.confidence, Confidence::Minimal);
        assert_eq!(r.type_string.as_str(), "a-u-A-C");
        assert_eq!(r.emergency, None);
        assert_eq!(r.label, None);
        assert_eq!(r.display_hint.color, Color::Yellow);
    }

    #[test]
    fn test_deterministic() {
        let c = classifier();
        let reports = [
            Report::default(),
            report(Some(0xAE2682), Some("C6540"), Some("A7"), Some("7500")),
            report(Some(0xA12345), Some("UAL2153"), Some("A5"), Some("1200")),
            report(Some(0xE00000), None, Some("B6"), None),
        ];
        for r in &reports {
            assert_eq!(c.classify(r), c.classify(r));
        }
    }

    #[test]
    fn test_exact_beats_range() {
        // AE2682 is inside the US military block as well.
        let r = classifier().classify(&report(Some(0xAE2682), None, Some("A1"), None));
        assert_eq!(r.source, Source::ExactId);
        assert_eq!(r.type_string.as_str(), "a-f-A-M-H-H");
        assert_eq!(r.attitude, Attitude::Friend);
        assert_eq!(r.operator, Operator::Military);
        assert_eq!(r.airframe, AirframeClass::Rotorcraft);
        assert_eq!(r.label.as_deref(), Some("USCG 6540"));
        assert_eq!(r.country.as_deref(), Some("United States"));
    }

    #[test]
    fn test_emergency_independent_of_source() {
        let c = classifier();
        let cases = [
            (report(Some(0x123456), None, None, Some("7500")), Source::ExactId),
            (report(Some(0xA00001), None, None, Some("7500")), Source::Range),
            (report(None, None, Some("A7"), Some("7500")), Source::Category),
            (report(None, None, None, Some("7500")), Source::EmergencyOverride),
        ];
        for (rep, source) in cases {
            let r = c.classify(&rep);
            assert_eq!(r.source, source);
            assert_eq!(r.emergency, Some(EmergencyStatus::Hijack));
            assert_eq!(r.display_hint.color, Color::EMERGENCY);
        }
    }

    #[test]
    fn test_emergency_leaves_type_string_alone() {
        let c = classifier();
        let quiet = c.classify(&report(Some(0xA00001), None, Some("A3"), Some("1200")));
        let loud = c.classify(&report(Some(0xA00001), None, Some("A3"), Some("7600")));
        assert_eq!(quiet.type_string, loud.type_string);
        assert_eq!(quiet.emergency, None);
        assert_eq!(loud.emergency, Some(EmergencyStatus::RadioFailure));
    }

    // --- Facets ---

    #[test]
    fn test_category_only() {
        let r = classifier().classify(&report(None, None, Some("a7"), None));
        assert_eq!(r.source, Source::Category);
        assert_eq!(r.confidence, Confidence::Medium);
        assert_eq!(r.type_string.as_str(), "a-u-A-C-H");
    }

    #[test]
    fn test_forced_military_frames() {
        let c = classifier();
        let uav = c.classify(&report(Some(0xA00001), None, Some("B6"), None));
        assert_eq!(uav.type_string.as_str(), "a-n-A-M-F-Q");
        assert_eq!(uav.operator, Operator::Military);
        let fast = c.classify(&report(None, None, Some("A6"), None));
        assert_eq!(fast.type_string.as_str(), "a-u-A-M-F-F");
    }

    #[test]
    fn test_military_block_friendly() {
        let r = classifier().classify(&report(Some(0xADF7C8), None, Some("A5"), None));
        assert_eq!(r.type_string.as_str(), "a-f-A-M-F");
        assert_eq!(r.display_hint.color, Color::Cyan);
    }

    #[test]
    fn test_reserved_block_has_no_country() {
        let r = classifier().classify(&report(Some(0xF00001), None, None, None));
        assert_eq!(r.source, Source::Range);
        assert_eq!(r.attitude, Attitude::Unknown);
        assert_eq!(r.country, None);
        assert_eq!(r.label.as_deref(), Some("ICAO-F00001"));
    }

    #[test]
    fn test_surface_and_space() {
        let c = classifier();
        let truck = c.classify(&report(Some(0xA00001), None, Some("C1"), None));
        assert_eq!(truck.type_string.as_str(), "a-n-G-E-V-C-U");
        let rocket = c.classify(&report(None, None, Some("B7"), None));
        assert_eq!(rocket.type_string.as_str(), "a-u-P-C");
    }

    #[test]
    fn test_invalid_fields_are_ignored() {
        let r = classifier().classify(&Report {
            icao: Some(0x1_000_000),
            callsign: Some("bad/chars!".into()),
            category: Some("A3".into()),
            squawk: Some("7800".into()),
            registration: None,
        });
        assert_eq!(r.source, Source::Category);
        assert_eq!(r.emergency, None);
        assert_eq!(r.label, None);
    }

    // --- Known craft details ---

    #[test]
    fn test_registration_lookup() {
        let mut rep = report(None, None, None, None);
        rep.registration = Some(" n12345 ".into());
        let r = classifier().classify(&rep);
        assert_eq!(r.source, Source::ExactId);
        assert_eq!(r.airframe, AirframeClass::Uav);
        assert_eq!(r.type_string.as_str(), "a-u-A-M-F-Q");
    }

    #[test]
    fn test_verbatim_cot_sets_airframe_over_category() {
        let r = classifier().classify(&report(Some(0x654321), None, Some("A3"), None));
        assert_eq!(r.source, Source::ExactId);
        assert_eq!(r.type_string.as_str(), "a-f-A-M-H-H");
        assert_eq!(r.airframe, AirframeClass::SearchAndRescue);
        assert_eq!(r.display_hint.icon, Icon::Rotorcraft);
    }

    #[test]
    fn test_address_lookup_wins_over_registration() {
        let mut rep = report(Some(0x123456), None, None, None);
        rep.registration = Some("N12345".into());
        let r = classifier().classify(&rep);
        assert_eq!(r.airframe, AirframeClass::Cargo);
    }

    // --- Callsign rules ---

    #[test]
    fn test_domestic_airline_neutral() {
        let r = classifier().classify(&report(Some(0xE00000), Some("ual2153"), Some("A3"), None));
        assert_eq!(r.source, Source::Category);
        assert_eq!(r.attitude, Attitude::Neutral);
        assert_eq!(r.type_string.as_str(), "a-n-A-C-F");
        assert_eq!(r.label.as_deref(), Some("UAL2153"));
    }

    #[test]
    fn test_domestic_airline_does_not_downgrade_friend() {
        let r = classifier().classify(&report(Some(0xADF7C8), Some("UAL1"), None, None));
        assert_eq!(r.attitude, Attitude::Friend);
    }

    #[test]
    fn test_sar_callsign() {
        let r = classifier().classify(&report(Some(0xAE26BB), Some("C6604"), None, None));
        assert_eq!(r.source, Source::Range);
        assert_eq!(r.type_string.as_str(), "a-f-A-M-H-H");
        assert_eq!(r.airframe, AirframeClass::SearchAndRescue);
    }

    #[test]
    fn test_sar_needs_military_operator() {
        let r = classifier().classify(&report(Some(0xA00001), Some("C6604"), None, None));
        assert_eq!(r.type_string.as_str(), "a-n-A-C");
    }

    #[test]
    fn test_rules_can_be_disabled() {
        let c = Classifier::new(
            fixture_tables(),
            ClassifierOptions {
                domestic_callsigns: false,
                sar_callsigns: false,
            },
        );
        let airline = c.classify(&report(None, Some("UAL2153"), None, None));
        assert_eq!(airline.attitude, Attitude::Unknown);
        let sar = c.classify(&report(Some(0xAE26BB), Some("C6604"), None, None));
        assert_eq!(sar.type_string.as_str(), "a-f-A-M");
    }

    #[test]
    fn test_embedded_classifier() {
        let c = Classifier::embedded().unwrap();
        let r = c.classify(&report(Some(0xAE2682), None, None, None));
        assert_eq!(r.type_string.as_str(), "a-f-A-M-H-H");
        let r = c.classify(&report(Some(0x4840D6), None, Some("A3"), None));
        assert_eq!(r.type_string.as_str(), "a-n-A-C-F");
        assert_eq!(r.country.as_deref(), Some("Netherlands"));
    }

    #[test]
    fn test_result_serializes() {
        let r = classifier().classify(&report(None, None, None, Some("7700")));
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["type_string"], "a-u-A-C");
        assert_eq!(json["source"], "emergency-override");
        assert_eq!(json["emergency"], "emergency");
        assert_eq!(json["display_hint"]["color"], "magenta");
    }
}
