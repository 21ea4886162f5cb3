//! Cursor-on-Target type taxonomy and display hints.
//!
//! A CoT type is a dash-delimited path: `a-{attitude}-{dimension}-{operator}`
//! followed by zero or more function segments taken from MIL-STD-2525B, e.g.
//! `a-n-A-C-F` for a neutral civil fixed-wing aircraft. The layout is fixed by
//! the consuming TAK applications; this module only assembles it.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::types::{AircotError, Result};

// ---------------------------------------------------------------------------
// Facets
// ---------------------------------------------------------------------------

/// Standard identity ("attitude" in CoT terms).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Attitude {
    Friend,
    Hostile,
    Neutral,
    Unknown,
}

impl Attitude {
    pub fn as_char(self) -> char {
        match self {
            Attitude::Friend => 'f',
            Attitude::Hostile => 'h',
            Attitude::Neutral => 'n',
            Attitude::Unknown => 'u',
        }
    }

    pub fn from_char(c: char) -> Option<Attitude> {
        match c.to_ascii_lowercase() {
            'f' => Some(Attitude::Friend),
            'h' => Some(Attitude::Hostile),
            'n' => Some(Attitude::Neutral),
            'u' => Some(Attitude::Unknown),
            _ => None,
        }
    }
}

impl FromStr for Attitude {
    type Err = AircotError;

    /// Accepts the CoT letter or the full word.
    fn from_str(s: &str) -> Result<Attitude> {
        let unknown = || AircotError::UnknownValue {
            field: "attitude",
            value: s.to_string(),
        };
        match s.trim().to_ascii_lowercase().as_str() {
            "friend" | "friendly" => Ok(Attitude::Friend),
            "hostile" => Ok(Attitude::Hostile),
            "neutral" => Ok(Attitude::Neutral),
            "unknown" => Ok(Attitude::Unknown),
            other => {
                let mut chars = other.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Attitude::from_char(c).ok_or_else(unknown),
                    _ => Err(unknown()),
                }
            }
        }
    }
}

/// Operator of an air or space track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operator {
    Civil,
    Military,
}

impl Operator {
    pub fn as_char(self) -> char {
        match self {
            Operator::Civil => 'C',
            Operator::Military => 'M',
        }
    }
}

/// Generic airframe class, from the emitter category or a known-craft record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AirframeClass {
    /// Light, < 15,500 lb.
    FixedWingLight,
    /// Small, 15,500 to 75,000 lb.
    FixedWingSmall,
    /// Large, 75,000 to 300,000 lb.
    FixedWingLarge,
    FixedWingHighVortex,
    /// Heavy, > 300,000 lb.
    FixedWingHeavy,
    /// > 5g and > 400 kt.
    HighPerformance,
    Rotorcraft,
    SearchAndRescue,
    Cargo,
    Glider,
    LighterThanAir,
    Uav,
    SpaceVehicle,
    SurfaceVehicle,
    Obstacle,
    Unknown,
}

impl AirframeClass {
    /// Map a known-craft `TYPE` column onto an airframe class.
    pub fn from_name(name: &str) -> Result<AirframeClass> {
        let class = match name.trim().to_ascii_uppercase().as_str() {
            "FIXED WING" | "FIXED-WING" | "AIRPLANE" => AirframeClass::FixedWingSmall,
            "LIGHT" => AirframeClass::FixedWingLight,
            "LARGE" => AirframeClass::FixedWingLarge,
            "HEAVY" => AirframeClass::FixedWingHeavy,
            "HIGH PERFORMANCE" | "FIGHTER" => AirframeClass::HighPerformance,
            "HELICOPTER" | "ROTORCRAFT" => AirframeClass::Rotorcraft,
            "SAR" | "CSAR" => AirframeClass::SearchAndRescue,
            "CARGO" => AirframeClass::Cargo,
            "GLIDER" => AirframeClass::Glider,
            "BALLOON" | "LIGHTER THAN AIR" => AirframeClass::LighterThanAir,
            "UAS" | "UAV" | "DRONE" => AirframeClass::Uav,
            "SPACE" => AirframeClass::SpaceVehicle,
            "SURFACE" | "VEHICLE" => AirframeClass::SurfaceVehicle,
            "OBSTACLE" | "TOWER" => AirframeClass::Obstacle,
            "UNKNOWN" => AirframeClass::Unknown,
            _ => return Err(AircotError::UnknownAirframe(name.to_string())),
        };
        Ok(class)
    }

    /// Map an airframe class name as written in category tables
    /// (`fixed_wing_large`, `rotorcraft`, ...).
    pub fn from_key(key: &str) -> Result<AirframeClass> {
        let class = match key.trim().to_ascii_lowercase().as_str() {
            "fixed_wing_light" => AirframeClass::FixedWingLight,
            "fixed_wing_small" => AirframeClass::FixedWingSmall,
            "fixed_wing_large" => AirframeClass::FixedWingLarge,
            "fixed_wing_high_vortex" => AirframeClass::FixedWingHighVortex,
            "fixed_wing_heavy" => AirframeClass::FixedWingHeavy,
            "high_performance" => AirframeClass::HighPerformance,
            "rotorcraft" => AirframeClass::Rotorcraft,
            "search_and_rescue" => AirframeClass::SearchAndRescue,
            "cargo" => AirframeClass::Cargo,
            "glider" => AirframeClass::Glider,
            "lighter_than_air" => AirframeClass::LighterThanAir,
            "uav" => AirframeClass::Uav,
            "space_vehicle" => AirframeClass::SpaceVehicle,
            "surface_vehicle" => AirframeClass::SurfaceVehicle,
            "obstacle" => AirframeClass::Obstacle,
            "unknown" => AirframeClass::Unknown,
            _ => return Err(AircotError::UnknownAirframe(key.to_string())),
        };
        Ok(class)
    }

    /// Some 2525B air symbols only exist with a military frame, so TAK
    /// renders nothing for the civil variant.
    pub fn forces_military(self) -> bool {
        matches!(self, AirframeClass::HighPerformance | AirframeClass::Uav)
    }

    pub fn icon(self) -> Icon {
        match self {
            AirframeClass::FixedWingLight
            | AirframeClass::FixedWingSmall
            | AirframeClass::FixedWingLarge
            | AirframeClass::FixedWingHighVortex
            | AirframeClass::FixedWingHeavy
            | AirframeClass::Cargo => Icon::FixedWing,
            AirframeClass::HighPerformance => Icon::Fighter,
            AirframeClass::Rotorcraft | AirframeClass::SearchAndRescue => Icon::Rotorcraft,
            AirframeClass::Glider => Icon::Glider,
            AirframeClass::LighterThanAir => Icon::Balloon,
            AirframeClass::Uav => Icon::Uav,
            AirframeClass::SpaceVehicle => Icon::Space,
            AirframeClass::SurfaceVehicle => Icon::GroundVehicle,
            AirframeClass::Obstacle => Icon::Tower,
            AirframeClass::Unknown => Icon::Aircraft,
        }
    }
}

// ---------------------------------------------------------------------------
// CoT type
// ---------------------------------------------------------------------------

/// A validated CoT event type string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CotType(String);

impl CotType {
    /// Assemble a type from resolved facets.
    pub fn compose(attitude: Attitude, operator: Operator, airframe: AirframeClass) -> CotType {
        let operator = if airframe.forces_military() {
            Operator::Military
        } else {
            operator
        };
        let a = attitude.as_char();
        let o = operator.as_char();
        let s = match airframe {
            AirframeClass::FixedWingLight
            | AirframeClass::FixedWingSmall
            | AirframeClass::FixedWingLarge
            | AirframeClass::FixedWingHighVortex
            | AirframeClass::FixedWingHeavy
            | AirframeClass::Glider => format!("a-{a}-A-{o}-F"),
            AirframeClass::HighPerformance => format!("a-{a}-A-{o}-F-F"),
            AirframeClass::Cargo => format!("a-{a}-A-{o}-F-C"),
            AirframeClass::Rotorcraft => format!("a-{a}-A-{o}-H"),
            AirframeClass::SearchAndRescue => format!("a-{a}-A-{o}-H-H"),
            AirframeClass::LighterThanAir => format!("a-{a}-A-{o}-L"),
            AirframeClass::Uav => format!("a-{a}-A-{o}-F-Q"),
            AirframeClass::SpaceVehicle => format!("a-{a}-P-{o}"),
            AirframeClass::SurfaceVehicle => format!("a-{a}-G-E-V-C-U"),
            AirframeClass::Obstacle => format!("a-{a}-G-I-U-T-com-tow"),
            AirframeClass::Unknown => format!("a-{a}-A-{o}"),
        };
        CotType(s)
    }

    /// Validate a type string supplied by a dataset.
    ///
    /// Must be an atom (`a`), a known attitude letter, then at least a
    /// dimension segment. Segments are non-empty ASCII alphanumerics.
    pub fn parse(s: &str) -> Result<CotType> {
        let s = s.trim();
        let invalid = || AircotError::InvalidCotType(s.to_string());
        let segments: Vec<&str> = s.split('-').collect();
        if segments.len() < 3 || segments[0] != "a" {
            return Err(invalid());
        }
        if segments
            .iter()
            .any(|seg| seg.is_empty() || !seg.bytes().all(|b| b.is_ascii_alphanumeric()))
        {
            return Err(invalid());
        }
        let mut att = segments[1].chars();
        match (att.next(), att.next()) {
            (Some(c), None) if Attitude::from_char(c).is_some() => {}
            _ => return Err(invalid()),
        }
        Ok(CotType(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn attitude(&self) -> Attitude {
        self.0
            .split('-')
            .nth(1)
            .and_then(|seg| seg.chars().next())
            .and_then(Attitude::from_char)
            .unwrap_or(Attitude::Unknown)
    }

    /// Operator segment, for air and space types only.
    pub fn operator(&self) -> Option<Operator> {
        let mut segs = self.0.split('-').skip(2);
        match (segs.next(), segs.next()) {
            (Some("A" | "P"), Some("C")) => Some(Operator::Civil),
            (Some("A" | "P"), Some("M")) => Some(Operator::Military),
            _ => None,
        }
    }

    /// Airframe class implied by the dimension and function segments.
    /// Plain fixed-wing reads back as `FixedWingSmall`.
    pub fn airframe(&self) -> AirframeClass {
        let segs: Vec<&str> = self.0.split('-').skip(2).collect();
        match segs.as_slice() {
            ["P", ..] => AirframeClass::SpaceVehicle,
            ["G", "E", "V", ..] => AirframeClass::SurfaceVehicle,
            ["G", "I", ..] => AirframeClass::Obstacle,
            ["A", _, "F", "F", ..] => AirframeClass::HighPerformance,
            ["A", _, "F", "C", ..] => AirframeClass::Cargo,
            ["A", _, "F", "Q", ..] => AirframeClass::Uav,
            ["A", _, "F", ..] => AirframeClass::FixedWingSmall,
            ["A", _, "H", "H", ..] => AirframeClass::SearchAndRescue,
            ["A", _, "H", ..] => AirframeClass::Rotorcraft,
            ["A", _, "L", ..] => AirframeClass::LighterThanAir,
            _ => AirframeClass::Unknown,
        }
    }
}

impl fmt::Display for CotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for CotType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Display hints
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    Aircraft,
    FixedWing,
    Fighter,
    Rotorcraft,
    Glider,
    Balloon,
    Uav,
    Space,
    GroundVehicle,
    Tower,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Cyan,
    Green,
    Yellow,
    Red,
    Magenta,
}

impl Color {
    /// Affiliation colors as used by 2525B frames.
    pub fn for_attitude(attitude: Attitude) -> Color {
        match attitude {
            Attitude::Friend => Color::Cyan,
            Attitude::Neutral => Color::Green,
            Attitude::Unknown => Color::Yellow,
            Attitude::Hostile => Color::Red,
        }
    }

    /// Emergency tracks are always drawn in this color.
    pub const EMERGENCY: Color = Color::Magenta;
}

/// What the renderer needs to pick an icon without re-parsing the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayHint {
    pub icon: Icon,
    pub color: Color,
}

impl DisplayHint {
    pub fn new(airframe: AirframeClass, attitude: Attitude, emergency: bool) -> DisplayHint {
        let color = if emergency {
            Color::EMERGENCY
        } else {
            Color::for_attitude(attitude)
        };
        DisplayHint {
            icon: airframe.icon(),
            color,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
