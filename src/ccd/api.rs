//! Raw CCD calls: topology query, topology apply, target name lookup.

#[cfg(windows)]
use log::debug;

use super::types::*;
#[cfg(windows)]
use crate::error::driver_error;
use crate::error::EngineError;
#[cfg(windows)]
use crate::platform::constants::DEVICE_INFO_GET_TARGET_NAME;

/// A path/mode buffer pair returned by one topology query.
///
/// Snapshots are consumed within a single apply transaction and never
/// retained across calls; mode indices are only meaningful against the
/// arrays they were queried with.
#[derive(Debug, Clone, Default)]
pub struct TopologySnapshot {
    pub paths: Vec<PathInfo>,
    pub modes: Vec<ModeInfo>,
}

/// Query the display topology with the two-call buffer-size pattern.
///
/// The same flag value is passed to both calls, as the interface requires.
#[cfg(windows)]
pub fn query_display_config(flags: u32) -> Result<TopologySnapshot, EngineError> {
    use windows_sys::Win32::Devices::Display::{
        GetDisplayConfigBufferSizes, QueryDisplayConfig,
    };

    let mut path_count: u32 = 0;
    let mut mode_count: u32 = 0;

    let result = unsafe { GetDisplayConfigBufferSizes(flags, &mut path_count, &mut mode_count) };
    if result != 0 {
        return Err(EngineError::BufferSizeFailed(result));
    }

    let mut paths = vec![PathInfo::default(); path_count as usize];
    let mut modes = vec![ModeInfo::default(); mode_count as usize];

    let result = unsafe {
        QueryDisplayConfig(
            flags,
            &mut path_count,
            paths.as_mut_ptr() as *mut _,
            &mut mode_count,
            modes.as_mut_ptr() as *mut _,
            std::ptr::null_mut(),
        )
    };
    if result != 0 {
        return Err(EngineError::QueryFailed(result));
    }

    // The query may report fewer entries than the sizing call allocated.
    paths.truncate(path_count as usize);
    modes.truncate(mode_count as usize);

    debug!(
        "topology query (flags={:#x}): {} paths, {} modes",
        flags,
        paths.len(),
        modes.len()
    );
    Ok(TopologySnapshot { paths, modes })
}

/// Commit a supplied path/mode configuration.
#[cfg(windows)]
pub fn set_display_config(
    paths: &mut [PathInfo],
    modes: &mut [ModeInfo],
    flags: u32,
) -> Result<(), EngineError> {
    use windows_sys::Win32::Devices::Display::SetDisplayConfig;

    let result = unsafe {
        SetDisplayConfig(
            paths.len() as u32,
            paths.as_mut_ptr() as *mut _,
            modes.len() as u32,
            modes.as_mut_ptr() as *mut _,
            flags,
        )
    };
    if result != 0 {
        debug!("SetDisplayConfig(flags={:#x}) failed with {}", flags, result);
        return Err(driver_error(result));
    }
    Ok(())
}

/// Commit with no supplied configuration (topology-keyword and
/// mode-enumeration applies).
#[cfg(windows)]
pub fn set_display_config_empty(flags: u32) -> Result<(), EngineError> {
    use windows_sys::Win32::Devices::Display::SetDisplayConfig;

    let result =
        unsafe { SetDisplayConfig(0, std::ptr::null_mut(), 0, std::ptr::null_mut(), flags) };
    if result != 0 {
        debug!("SetDisplayConfig(flags={:#x}, empty) failed with {}", flags, result);
        return Err(driver_error(result));
    }
    Ok(())
}

/// Fetch the friendly name, EDID ids and device path of a target.
///
/// Returns `None` on failure; callers fall back to the GDI device string.
#[cfg(windows)]
pub fn query_target_name(adapter_id: Luid, target_id: u32) -> Option<TargetDeviceName> {
    use windows_sys::Win32::Devices::Display::DisplayConfigGetDeviceInfo;

    let mut request = TargetDeviceName::default();
    request.header.info_type = DEVICE_INFO_GET_TARGET_NAME;
    request.header.size = std::mem::size_of::<TargetDeviceName>() as u32;
    request.header.adapter_id = adapter_id;
    request.header.id = target_id;

    let result = unsafe { DisplayConfigGetDeviceInfo(&mut request as *mut _ as *mut _) };
    (result == 0).then_some(request)
}

// Non-Windows stubs, mirroring the devmode layer.

#[cfg(not(windows))]
pub fn query_display_config(_flags: u32) -> Result<TopologySnapshot, EngineError> {
    Err(EngineError::Unsupported)
}

#[cfg(not(windows))]
pub fn set_display_config(
    _paths: &mut [PathInfo],
    _modes: &mut [ModeInfo],
    _flags: u32,
) -> Result<(), EngineError> {
    Err(EngineError::Unsupported)
}

#[cfg(not(windows))]
pub fn set_display_config_empty(_flags: u32) -> Result<(), EngineError> {
    Err(EngineError::Unsupported)
}

#[cfg(not(windows))]
pub fn query_target_name(_adapter_id: Luid, _target_id: u32) -> Option<TargetDeviceName> {
    None
}
