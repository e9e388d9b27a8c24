//! Mode catalog: the display modes an adapter device supports.
//!
//! Entries are purely descriptive. Appliers check a requested mode
//! against the catalog before any OS call is issued; a mode absent from
//! the catalog never reaches the driver.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::error::EngineError;
use crate::platform::constants::ENUM_CURRENT_SETTINGS;
use crate::platform::devmode::{enum_display_settings, DeviceMode};
use crate::types::{Capabilities, DisplayMode, Orientation, Position, Resolution};

/// Interpret one raw mode record, rejecting entries with missing
/// dimensions or refresh rate.
pub fn mode_from_devmode(devmode: &DeviceMode) -> Option<DisplayMode> {
    if devmode.pels_width == 0 || devmode.pels_height == 0 || devmode.display_frequency == 0 {
        return None;
    }
    Some(DisplayMode {
        resolution: Resolution::new(devmode.pels_width, devmode.pels_height),
        refresh_hz: devmode.display_frequency,
        bits_per_pixel: devmode.bits_per_pel,
    })
}

/// Walk the mode list of an adapter device until the enumeration ends.
///
/// Filtered and deduplicated; order of first appearance is preserved.
pub fn enumerate_modes(adapter_device_name: &str) -> Result<Vec<DisplayMode>, EngineError> {
    let mut modes: Vec<DisplayMode> = Vec::new();
    let mut index = 0;
    while let Some(devmode) = enum_display_settings(adapter_device_name, index) {
        if let Some(mode) = mode_from_devmode(&devmode) {
            if !modes.contains(&mode) {
                modes.push(mode);
            }
        }
        index += 1;
    }
    debug!("{}: {} supported mode(s)", adapter_device_name, modes.len());
    Ok(modes)
}

/// Current settings of an adapter device: mode, position and orientation.
pub fn current_settings(
    adapter_device_name: &str,
) -> Result<(DisplayMode, Position, Orientation), EngineError> {
    let devmode = enum_display_settings(adapter_device_name, ENUM_CURRENT_SETTINGS)
        .ok_or_else(|| EngineError::UnknownDisplay(adapter_device_name.to_string()))?;
    let mode = mode_from_devmode(&devmode).ok_or_else(|| EngineError::Unknown {
        source_name: "mode-catalog".to_string(),
        message: format!("{} reported an empty current mode", adapter_device_name),
    })?;
    let orientation =
        Orientation::from_encoded(devmode.display_orientation).unwrap_or_default();
    Ok((mode, devmode.desktop_position(), orientation))
}

/// The raw current devmode, for appliers that synthesize from it.
pub fn current_devmode(adapter_device_name: &str) -> Result<DeviceMode, EngineError> {
    enum_display_settings(adapter_device_name, ENUM_CURRENT_SETTINGS)
        .ok_or_else(|| EngineError::UnknownDisplay(adapter_device_name.to_string()))
}

/// Find the raw OS mode record exactly matching (width, height, refresh).
///
/// Preferred over synthesizing fields: the record round-trips driver
/// internals the engine does not model.
pub fn find_exact_devmode(
    adapter_device_name: &str,
    resolution: Resolution,
    refresh_hz: u32,
) -> Option<DeviceMode> {
    let mut index = 0;
    while let Some(devmode) = enum_display_settings(adapter_device_name, index) {
        if devmode.pels_width == resolution.width
            && devmode.pels_height == resolution.height
            && devmode.display_frequency == refresh_hz
        {
            return Some(devmode);
        }
        index += 1;
    }
    None
}

/// Group supported refresh rates by resolution.
pub fn group_resolutions(modes: &[DisplayMode]) -> BTreeMap<Resolution, BTreeSet<u32>> {
    let mut grouped: BTreeMap<Resolution, BTreeSet<u32>> = BTreeMap::new();
    for mode in modes {
        grouped.entry(mode.resolution).or_default().insert(mode.refresh_hz);
    }
    grouped
}

/// Capabilities record for a display.
pub fn capabilities(
    adapter_device_name: &str,
    enabled: bool,
) -> Result<Capabilities, EngineError> {
    let modes = enumerate_modes(adapter_device_name)?;
    let grouped_resolutions = group_resolutions(&modes);
    let current_mode = if enabled {
        current_settings(adapter_device_name).ok().map(|(m, _, _)| m)
    } else {
        None
    };
    Ok(Capabilities { current_mode, modes, grouped_resolutions })
}

/// Preferred modes for enabling a display with no cached state, most
/// desirable first.
const PREFERRED_ENABLE_MODES: [(u32, u32, u32); 4] = [
    (3840, 2160, 60),
    (1920, 1080, 60),
    (2560, 1440, 60),
    (1280, 720, 60),
];

/// Pick the best mode to enable a display with: the first preferred mode
/// present in the catalog, else the first catalog entry.
pub fn best_available_mode(modes: &[DisplayMode]) -> Option<DisplayMode> {
    for &(width, height, refresh) in &PREFERRED_ENABLE_MODES {
        let wanted = Resolution::new(width, height);
        if let Some(found) = modes
            .iter()
            .find(|m| m.resolution == wanted && m.refresh_hz == refresh)
        {
            return Some(*found);
        }
    }
    modes.first().copied()
}

/// Pre-flight check: is the requested mode in the catalog?
///
/// Distinguishes an unsupported resolution from an unsupported refresh
/// rate at a supported resolution.
pub fn check_mode_supported(modes: &[DisplayMode], wanted: DisplayMode) -> Result<(), EngineError> {
    let resolution_known = modes.iter().any(|m| m.resolution == wanted.resolution);
    if !resolution_known {
        return Err(EngineError::rejected(
            "resolution",
            wanted.resolution,
            "not in mode catalog",
        ));
    }
    let refresh_known = modes
        .iter()
        .any(|m| m.resolution == wanted.resolution && m.refresh_hz == wanted.refresh_hz);
    if !refresh_known {
        return Err(EngineError::rejected(
            "refresh",
            wanted.refresh_hz,
            "not in mode catalog",
        ));
    }
    Ok(())
}
