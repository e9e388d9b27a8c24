//! Single-display mode and orientation changes via the legacy
//! change-settings path, with test-before-commit.

use std::time::Duration;

use log::{debug, info};

use crate::error::{map_change_result, EngineError};
use crate::identity::DisplayMapping;
use crate::modes;
use crate::platform::constants::{CDS_TEST, CDS_UPDATEREGISTRY};
use crate::platform::devmode::{change_display_settings, DeviceMode};
use crate::types::{DisplayMode, Orientation};

/// Synthesize a devmode from the current one plus the target fields.
///
/// Resolution fields enter the mask only when the resolution actually
/// changes; refresh and orientation are always explicit.
fn build_apply_devmode(
    current: &DeviceMode,
    mode: DisplayMode,
    orientation: Orientation,
) -> DeviceMode {
    let mut devmode = *current;
    devmode.fields = 0;
    if current.resolution() != mode.resolution {
        devmode.set_resolution(mode.resolution);
    }
    devmode.set_refresh(mode.refresh_hz);
    devmode.set_orientation(orientation.encode());
    devmode
}

/// Apply a mode and orientation to one display.
///
/// The mode must exist in the catalog; an exact catalog record is
/// preferred over a synthesized one so driver-internal fields round-trip
/// untouched. The change is tested before it is committed.
pub(crate) fn apply_display_mode(
    mapping: &DisplayMapping,
    mode: DisplayMode,
    orientation: Orientation,
) -> Result<(), EngineError> {
    let device = &mapping.adapter_device_name;
    let catalog = modes::enumerate_modes(device)?;
    modes::check_mode_supported(&catalog, mode)?;

    let current = modes::current_devmode(device)?;
    let devmode = match modes::find_exact_devmode(device, mode.resolution, mode.refresh_hz) {
        Some(mut exact) => {
            exact.set_orientation(orientation.encode());
            exact.set_position(current.desktop_position());
            exact
        }
        None => build_apply_devmode(&current, mode, orientation),
    };

    debug!(
        "{}: applying {} {} (fields={:#x})",
        mapping.logical_id, mode, orientation, devmode.fields
    );
    map_change_result(change_display_settings(Some(device), Some(&devmode), CDS_TEST))?;
    map_change_result(change_display_settings(
        Some(device),
        Some(&devmode),
        CDS_UPDATEREGISTRY,
    ))?;
    info!("{}: mode {} {} committed", mapping.logical_id, mode, orientation);
    Ok(())
}

/// Change only the orientation, keeping the current mode.
pub(crate) fn apply_display_orientation(
    mapping: &DisplayMapping,
    orientation: Orientation,
) -> Result<(), EngineError> {
    let (current_mode, _, _) = modes::current_settings(&mapping.adapter_device_name)?;
    apply_display_mode(mapping, current_mode, orientation)
}

/// Apply a mode, hold it, then revert to the previous settings.
///
/// The revert runs even when the apply failed; a failed revert is the
/// error the caller sees.
pub(crate) fn test_display_mode(
    mapping: &DisplayMapping,
    mode: DisplayMode,
    orientation: Orientation,
    hold: Duration,
) -> Result<(), EngineError> {
    let (previous_mode, _, previous_orientation) =
        modes::current_settings(&mapping.adapter_device_name)?;

    let applied = apply_display_mode(mapping, mode, orientation);
    if applied.is_ok() {
        std::thread::sleep(hold);
    }
    let reverted = apply_display_mode(mapping, previous_mode, previous_orientation);
    applied.and(reverted)
}
