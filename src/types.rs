//! Client-facing data model: logical displays, modes, positions, change
//! notifications.
//!
//! Everything here is plain data. The volatile adapter device name
//! (`"\\.\DISPLAY1"`) never leaves the engine boundary as an identifier;
//! clients address displays through the stable logical id (`"Display1"`).

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::{Add, Neg, Sub};
use std::str::FromStr;
use std::time::SystemTime;

use serde::Serialize;
use thiserror::Error;

/// Position of a display on the virtual desktop, in pixels.
///
/// The primary display sits at (0,0); coordinates of other displays may be
/// negative.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Add for Position {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Position {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y)
    }
}

impl Neg for Position {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.x, -self.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Display resolution in pixels.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A display mode: resolution plus refresh rate and color depth.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct DisplayMode {
    pub resolution: Resolution,
    pub refresh_hz: u32,
    pub bits_per_pixel: u32,
}

impl DisplayMode {
    pub fn new(width: u32, height: u32, refresh_hz: u32) -> Self {
        Self {
            resolution: Resolution::new(width, height),
            refresh_hz,
            bits_per_pixel: 32,
        }
    }
}

impl fmt::Display for DisplayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}Hz", self.resolution, self.refresh_hz)
    }
}

/// Display orientation.
///
/// The integer encoding {Landscape=0, Portrait=1, LandscapeFlipped=2,
/// PortraitFlipped=3} matches the devmode orientation values and is what
/// the state cache stores.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Orientation {
    #[default]
    Landscape,
    Portrait,
    LandscapeFlipped,
    PortraitFlipped,
}

impl Orientation {
    /// Integer encoding used by the devmode interface and the state cache.
    pub fn encode(self) -> u32 {
        match self {
            Orientation::Landscape => 0,
            Orientation::Portrait => 1,
            Orientation::LandscapeFlipped => 2,
            Orientation::PortraitFlipped => 3,
        }
    }

    pub fn from_encoded(value: u32) -> Option<Self> {
        match value {
            0 => Some(Orientation::Landscape),
            1 => Some(Orientation::Portrait),
            2 => Some(Orientation::LandscapeFlipped),
            3 => Some(Orientation::PortraitFlipped),
            _ => None,
        }
    }

    /// Whether the long edge runs vertically.
    pub fn is_portrait(self) -> bool {
        matches!(self, Orientation::Portrait | Orientation::PortraitFlipped)
    }
}

impl fmt::Display for Orientation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Orientation::Landscape => "Landscape",
            Orientation::Portrait => "Portrait",
            Orientation::LandscapeFlipped => "LandscapeFlipped",
            Orientation::PortraitFlipped => "PortraitFlipped",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Orientation {
    type Err = ParseOrientationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "landscape" | "default" => Ok(Orientation::Landscape),
            "portrait" => Ok(Orientation::Portrait),
            "landscapeflipped" | "upsidedown" => Ok(Orientation::LandscapeFlipped),
            "portraitflipped" => Ok(Orientation::PortraitFlipped),
            _ => Err(ParseOrientationError),
        }
    }
}

/// Error parsing an orientation name.
#[derive(Debug, Error)]
#[error("invalid orientation, expected Landscape, Portrait, LandscapeFlipped or PortraitFlipped")]
pub struct ParseOrientationError;

/// Mode capabilities of a display.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    /// The currently applied mode, if the display is enabled.
    pub current_mode: Option<DisplayMode>,
    /// All supported modes, deduplicated.
    pub modes: Vec<DisplayMode>,
    /// Supported refresh rates grouped by resolution.
    pub grouped_resolutions: BTreeMap<Resolution, BTreeSet<u32>>,
}

/// A display as exposed to clients.
///
/// The `logical_number` is stable across re-plug events as long as the set
/// of connected hardware does not change: it is derived from ranking the
/// hardware UIDs, not from the adapter slot the monitor happens to occupy.
#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct LogicalDisplay {
    pub logical_number: u32,
    pub logical_id: String,
    /// Volatile adapter slot name, for OS calls only.
    pub adapter_device_name: String,
    pub friendly_name: String,
    pub manufacturer: String,
    pub product: String,
    pub serial: String,
    pub edid_identifier: String,
    pub hardware_uid: u32,
    pub is_primary: bool,
    pub is_enabled: bool,
    pub is_attached: bool,
    pub position: Position,
    pub resolution: Resolution,
    pub refresh_hz: u32,
    pub bits_per_pixel: u32,
    pub orientation: Orientation,
    pub capabilities: Capabilities,
}

/// Format a logical number as the canonical client-facing id.
pub fn format_logical_id(logical_number: u32) -> String {
    format!("Display{}", logical_number)
}

/// Error parsing a logical display id.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid logical display id `{0}`, expected `Display<N>` or `\\\\.\\DISPLAY<N>`")]
pub struct ParseLogicalIdError(pub String);

/// Parse a logical display id.
///
/// Accepts the canonical `"Display<N>"` form and the legacy adapter-style
/// `"\\.\DISPLAY<N>"` form; both yield the same number. N must be >= 1.
pub fn parse_logical_id(id: &str) -> Result<u32, ParseLogicalIdError> {
    let digits = id
        .strip_prefix("Display")
        .or_else(|| id.strip_prefix(r"\\.\DISPLAY"));
    let number = digits
        .and_then(|d| d.parse::<u32>().ok())
        .filter(|&n| n >= 1);
    number.ok_or_else(|| ParseLogicalIdError(id.to_string()))
}

/// Kind of change observed between two enumeration passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeType {
    Added,
    Removed,
    StateChanged,
    ConfigurationChanged,
}

/// One observed display change, produced by diffing successive
/// `list_displays` results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeNotification {
    pub previous: Option<LogicalDisplay>,
    pub current: Option<LogicalDisplay>,
    pub change_type: ChangeType,
    pub timestamp: SystemTime,
}
