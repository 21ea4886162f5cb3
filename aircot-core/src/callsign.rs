//! Callsign-based refinements.
//!
//! Callsigns are free text set by the crew, so they never decide the
//! airframe on their own. They only nudge an otherwise unresolved attitude
//! and pick out one well-known special case.

// ---------------------------------------------------------------------------
// Domestic US airlines
// ---------------------------------------------------------------------------

/// Airline ICAO designators → operator name.
const DOMESTIC_US_AIRLINES: &[(&str, &str)] = &[
    ("AAL", "American Airlines"),
    ("UAL", "United Airlines"),
    ("FDX", "FedEx"),
    ("UPS", "UPS Airlines"),
    ("SWA", "Southwest Airlines"),
    ("DAL", "Delta Air Lines"),
    ("JBU", "JetBlue Airways"),
    ("ASA", "Alaska Airlines"),
    ("SKW", "SkyWest Airlines"),
    ("FFT", "Frontier Airlines"),
    ("NKS", "Spirit Airlines"),
    ("AAY", "Allegiant Air"),
    ("SWQ", "Swift Air"),
    ("FLG", "Endeavor Air"),
    ("CPZ", "Compass Airlines"),
    ("RPA", "Republic Airways"),
    ("ENY", "Envoy Air"),
    ("GJS", "GoJet Airlines"),
    ("JIA", "PSA Airlines"),
    ("PDT", "Piedmont Airlines"),
    ("CHQ", "Chautauqua Airlines"),
    ("EJA", "NetJets"),
    ("CSQ", "IBC Airways"),
    ("XOJ", "XOJET"),
];

/// Look up a domestic US operator from a normalized callsign.
pub fn domestic_operator(callsign: &str) -> Option<&'static str> {
    DOMESTIC_US_AIRLINES
        .iter()
        .find(|(prefix, _)| callsign.starts_with(prefix))
        .map(|(_, name)| *name)
}

/// True if the callsign belongs to a scheduled domestic US carrier.
pub fn is_domestic_airline(callsign: &str) -> bool {
    domestic_operator(callsign).is_some()
}

// ---------------------------------------------------------------------------
// Search and rescue
// ---------------------------------------------------------------------------

/// US Coast Guard MH-65 Dolphins fly with older ADS-B installs but use a
/// consistent `C6xxx` flight ID (e.g. C6540 / AE2682, C6604 / AE26BB).
const SAR_PREFIX: &str = "C6";

/// True if a military-operated track with this callsign is a Coast Guard
/// search-and-rescue helicopter.
pub fn is_sar_rotorcraft(callsign: &str, military: bool) -> bool {
    military && callsign.len() >= 3 && callsign.starts_with(SAR_PREFIX)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
