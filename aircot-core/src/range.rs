//! ICAO address-block table: country allocation and military blocks.
//!
//! Every aircraft has a unique 24-bit ICAO address assigned by its state of
//! registry. Addresses are allocated in blocks (e.g., 0xA00000-0xAFFFFF =
//! United States) and some states reserve a sub-block for military
//! airframes. The table holds one closed interval per block.
//!
//! Construction rejects unsorted or overlapping input, so at query time an
//! address matches at most one block.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::exact::split_csv_line;
use crate::taxonomy::{Attitude, Operator};
use crate::types::{is_valid_address, parse_address, AircotError, Result};

// ---------------------------------------------------------------------------
// Entries
// ---------------------------------------------------------------------------

/// What a block is allocated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Allocation {
    Civil,
    Military,
    /// Ground-vehicle transponders.
    Ground,
    /// Reserved or ICAO special use, no state of registry.
    Reserved,
}

impl Allocation {
    /// Attitude when the dataset does not name one.
    pub fn default_attitude(self) -> Attitude {
        match self {
            Allocation::Civil | Allocation::Ground => Attitude::Neutral,
            Allocation::Military | Allocation::Reserved => Attitude::Unknown,
        }
    }

    pub fn operator(self) -> Operator {
        match self {
            Allocation::Military => Operator::Military,
            _ => Operator::Civil,
        }
    }
}

impl FromStr for Allocation {
    type Err = AircotError;

    fn from_str(s: &str) -> Result<Allocation> {
        match s.trim().to_ascii_lowercase().as_str() {
            "civil" | "civ" => Ok(Allocation::Civil),
            "military" | "mil" => Ok(Allocation::Military),
            "ground" | "gnd" => Ok(Allocation::Ground),
            "reserved" | "unassigned" => Ok(Allocation::Reserved),
            _ => Err(AircotError::UnknownValue {
                field: "allocation",
                value: s.to_string(),
            }),
        }
    }
}

/// Classification attached to one address block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockClass {
    pub country: String,
    pub allocation: Allocation,
    pub attitude: Attitude,
}

/// One closed interval `[low, high]` of the address space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeEntry {
    pub low: u32,
    pub high: u32,
    pub class: BlockClass,
}

impl RangeEntry {
    /// Validates bounds: both within 24 bits and `low <= high`.
    pub fn new(low: u32, high: u32, class: BlockClass) -> Result<RangeEntry> {
        for addr in [low, high] {
            if !is_valid_address(addr) {
                return Err(AircotError::AddressOutOfRange(addr));
            }
        }
        if low > high {
            return Err(AircotError::InvalidRange { low, high });
        }
        Ok(RangeEntry { low, high, class })
    }

    pub fn contains(&self, addr: u32) -> bool {
        (self.low..=self.high).contains(&addr)
    }

    pub fn span(&self) -> u32 {
        self.high - self.low
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

/// Sorted interval table with O(log n) lookup.
#[derive(Debug, Clone, Default)]
pub struct RangeTable {
    entries: Vec<RangeEntry>,
    // reach[i] = max(high) over entries[..=i]; lets lookup stop scanning
    // backwards as soon as no earlier interval can contain the address.
    reach: Vec<u32>,
}

impl RangeTable {
    /// Build a table, rejecting input that is not sorted by `low` or that
    /// contains intersecting intervals.
    pub fn new(entries: Vec<RangeEntry>) -> Result<RangeTable> {
        for (index, pair) in entries.windows(2).enumerate() {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.low < prev.low {
                return Err(AircotError::UnsortedRanges {
                    index: index + 1,
                    low: next.low,
                });
            }
            if next.low <= prev.high {
                return Err(AircotError::OverlappingRanges {
                    first_low: prev.low,
                    first_high: prev.high,
                    second_low: next.low,
                    second_high: next.high,
                });
            }
        }
        Ok(RangeTable::from_sorted(entries))
    }

    /// Build a table without the overlap check.
    ///
    /// Entries are sorted by `low`. Where intervals overlap, lookup returns
    /// the tightest match. Use this only for data already known to be
    /// trusted; `new` is the loading path.
    pub fn new_unchecked(mut entries: Vec<RangeEntry>) -> RangeTable {
        entries.sort_by_key(|e| (e.low, e.high));
        RangeTable::from_sorted(entries)
    }

    fn from_sorted(entries: Vec<RangeEntry>) -> RangeTable {
        let mut reach = Vec::with_capacity(entries.len());
        let mut max_high = 0;
        for e in &entries {
            max_high = max_high.max(e.high);
            reach.push(max_high);
        }
        RangeTable { entries, reach }
    }

    /// Find the block containing `addr`.
    ///
    /// Returns `None` for addresses in a gap between blocks. If overlapping
    /// intervals exist, the one with the smallest span wins; equal spans
    /// resolve to the later-starting interval.
    pub fn lookup(&self, addr: u32) -> Option<&BlockClass> {
        self.lookup_entry(addr).map(|e| &e.class)
    }

    pub fn lookup_entry(&self, addr: u32) -> Option<&RangeEntry> {
        // Index of the last entry whose low <= addr.
        let end = self.entries.partition_point(|e| e.low <= addr);
        let mut best: Option<&RangeEntry> = None;
        for i in (0..end).rev() {
            if self.reach[i] < addr {
                break;
            }
            let e = &self.entries[i];
            if e.contains(addr) && best.is_none_or(|b| e.span() < b.span()) {
                best = Some(e);
            }
        }
        best
    }

    /// Country of registration for an address.
    pub fn country(&self, addr: u32) -> Option<&str> {
        self.lookup(addr)
            .filter(|c| c.allocation != Allocation::Reserved)
            .map(|c| c.country.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

const TABLE: &str = "ranges";

#[derive(Deserialize)]
#[serde(untagged)]
enum AddressValue {
    Num(u32),
    Hex(String),
}

#[derive(Deserialize)]
struct RangeFile {
    ranges: Vec<RangeRecord>,
}

#[derive(Deserialize)]
struct RangeRecord {
    start: AddressValue,
    end: AddressValue,
    country: String,
    #[serde(default)]
    allocation: Option<String>,
    #[serde(default)]
    attitude: Option<String>,
}

fn address(value: &AddressValue) -> Result<u32> {
    match value {
        AddressValue::Num(n) => Ok(*n),
        AddressValue::Hex(s) => parse_address(s),
    }
}

/// Turn one loosely-typed record into an entry. Missing allocation means
/// civil; missing attitude falls back to the allocation default.
fn entry_from_parts(
    index: usize,
    low: Result<u32>,
    high: Result<u32>,
    country: &str,
    allocation: Option<&str>,
    attitude: Option<&str>,
) -> Result<RangeEntry> {
    let malformed = |e: AircotError| AircotError::MalformedRecord {
        table: TABLE,
        index,
        reason: e.to_string(),
    };
    let country = country.trim();
    if country.is_empty() {
        return Err(malformed(AircotError::UnknownValue {
            field: "country",
            value: String::new(),
        }));
    }
    let allocation = match allocation.map(str::trim).filter(|a| !a.is_empty()) {
        Some(a) => a.parse::<Allocation>().map_err(malformed)?,
        None => Allocation::Civil,
    };
    let attitude = match attitude.map(str::trim).filter(|a| !a.is_empty()) {
        Some(a) => a.parse::<Attitude>().map_err(malformed)?,
        None => allocation.default_attitude(),
    };
    let class = BlockClass {
        country: country.to_string(),
        allocation,
        attitude,
    };
    RangeEntry::new(low.map_err(malformed)?, high.map_err(malformed)?, class).map_err(malformed)
}

/// Parse `{"version": "...", "ranges": [{"start": "A00000", "end": "ADF7C7",
/// "country": "United States", "allocation": "civil"}]}` and validate it.
///
/// Addresses may be hex strings or integers. Records must already be sorted;
/// the table is never re-ordered on load.
pub fn parse_json(text: &str) -> Result<RangeTable> {
    let file: RangeFile = serde_json::from_str(text)?;
    let entries = file
        .ranges
        .iter()
        .enumerate()
        .map(|(index, rec)| {
            entry_from_parts(
                index,
                address(&rec.start),
                address(&rec.end),
                &rec.country,
                rec.allocation.as_deref(),
                rec.attitude.as_deref(),
            )
        })
        .collect::<Result<Vec<_>>>()?;
    RangeTable::new(entries)
}

/// Parse a CSV range table with a `start,end,country[,allocation][,attitude]`
/// header. Addresses are hex.
pub fn parse_csv(text: &str) -> Result<RangeTable> {
    let mut lines = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'));
    let Some(header) = lines.next() else {
        return RangeTable::new(Vec::new());
    };
    let header: Vec<String> = split_csv_line(header)
        .into_iter()
        .map(|h| h.to_ascii_lowercase())
        .collect();
    let col = |name: &str| header.iter().position(|h| h == name);
    let (Some(start), Some(end), Some(country)) = (col("start"), col("end"), col("country")) else {
        return Err(AircotError::MalformedRecord {
            table: TABLE,
            index: 0,
            reason: "header must name start, end and country".into(),
        });
    };
    let (allocation, attitude) = (col("allocation"), col("attitude"));

    let mut entries = Vec::new();
    for (index, line) in lines.enumerate() {
        let cols = split_csv_line(line);
        let field = |i: usize| cols.get(i).map(String::as_str).unwrap_or("");
        entries.push(entry_from_parts(
            index,
            parse_address(field(start)),
            parse_address(field(end)),
            field(country),
            allocation.map(field),
            attitude.map(field),
        )?);
    }
    RangeTable::new(entries)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
