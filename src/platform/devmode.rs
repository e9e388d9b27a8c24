//! Devmode-level display interface: device enumeration, mode records and
//! the legacy change-settings call.
//!
//! The structures match the exact memory layout expected by the OS. Only
//! the display member of the devmode union is declared; it is the same
//! size as the printer member it shadows.

use crate::platform::constants::*;
use crate::types::{Position, Resolution};

pub const DM_SPECVERSION: u16 = 0x0401;

/// Signed point (`POINTL` layout), shared with the topology types.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointL {
    pub x: i32,
    pub y: i32,
}

/// Convert a Rust string to a null-terminated UTF-16 buffer.
pub fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Read a null-terminated UTF-16 buffer into a Rust string.
pub fn from_wide(buffer: &[u16]) -> String {
    let end = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
    String::from_utf16_lossy(&buffer[..end])
}

/// Display mode record (`DEVMODEW` layout, display union member).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceMode {
    pub device_name: [u16; 32],
    pub spec_version: u16,
    pub driver_version: u16,
    pub size: u16,
    pub driver_extra: u16,
    pub fields: u32,
    pub position: PointL,
    pub display_orientation: u32,
    pub display_fixed_output: u32,
    pub color: i16,
    pub duplex: i16,
    pub y_resolution: i16,
    pub tt_option: i16,
    pub collate: i16,
    pub form_name: [u16; 32],
    pub log_pixels: u16,
    pub bits_per_pel: u32,
    pub pels_width: u32,
    pub pels_height: u32,
    pub display_flags: u32,
    pub display_frequency: u32,
    pub icm_method: u32,
    pub icm_intent: u32,
    pub media_type: u32,
    pub dither_type: u32,
    pub reserved1: u32,
    pub reserved2: u32,
    pub panning_width: u32,
    pub panning_height: u32,
}

impl DeviceMode {
    /// An empty record with the size header filled in, ready for OS calls.
    pub fn for_query() -> Self {
        Self {
            spec_version: DM_SPECVERSION,
            size: std::mem::size_of::<DeviceMode>() as u16,
            ..Default::default()
        }
    }

    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.pels_width, self.pels_height)
    }

    pub fn desktop_position(&self) -> Position {
        Position::new(self.position.x, self.position.y)
    }

    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.pels_width = resolution.width;
        self.pels_height = resolution.height;
        self.fields |= DM_PELSWIDTH | DM_PELSHEIGHT;
    }

    pub fn set_refresh(&mut self, refresh_hz: u32) {
        self.display_frequency = refresh_hz;
        self.fields |= DM_DISPLAYFREQUENCY | DM_DISPLAYFLAGS;
    }

    pub fn set_position(&mut self, position: Position) {
        self.position = PointL { x: position.x, y: position.y };
        self.fields |= DM_POSITION;
    }

    pub fn set_orientation(&mut self, orientation_code: u32) {
        self.display_orientation = orientation_code;
        self.fields |= DM_DISPLAYORIENTATION;
    }
}

/// Display device record (`DISPLAY_DEVICEW` layout).
///
/// Enumerated per adapter (device = None) or per monitor on an adapter
/// (device = adapter name).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct DisplayDeviceW {
    pub cb: u32,
    pub device_name: [u16; 32],
    pub device_string: [u16; 128],
    pub state_flags: u32,
    pub device_id: [u16; 128],
    pub device_key: [u16; 128],
}

impl Default for DisplayDeviceW {
    fn default() -> Self {
        Self {
            cb: std::mem::size_of::<DisplayDeviceW>() as u32,
            device_name: [0; 32],
            device_string: [0; 128],
            state_flags: 0,
            device_id: [0; 128],
            device_key: [0; 128],
        }
    }
}

impl DisplayDeviceW {
    pub fn device_name(&self) -> String {
        from_wide(&self.device_name)
    }

    pub fn device_string(&self) -> String {
        from_wide(&self.device_string)
    }

    pub fn device_id(&self) -> String {
        from_wide(&self.device_id)
    }

    pub fn is_attached_to_desktop(&self) -> bool {
        self.state_flags & DISPLAY_DEVICE_ATTACHED_TO_DESKTOP != 0
    }

    pub fn is_mirroring(&self) -> bool {
        self.state_flags & DISPLAY_DEVICE_MIRRORING_DRIVER != 0
    }

    pub fn is_primary(&self) -> bool {
        self.state_flags & DISPLAY_DEVICE_PRIMARY_DEVICE != 0
    }
}

/// Enumerate one display device.
///
/// With `device = None` walks adapters by index; with an adapter name
/// walks the monitors attached to that adapter. Returns `None` when the
/// index is past the end of the enumeration.
#[cfg(windows)]
pub fn enum_display_device(device: Option<&str>, index: u32, flags: u32) -> Option<DisplayDeviceW> {
    use windows_sys::Win32::Graphics::Gdi::EnumDisplayDevicesW;

    let wide = device.map(to_wide);
    let name_ptr = wide
        .as_ref()
        .map_or(std::ptr::null(), |w| w.as_ptr());

    let mut record = DisplayDeviceW::default();
    let ok = unsafe { EnumDisplayDevicesW(name_ptr, index, &mut record as *mut _ as *mut _, flags) };
    (ok != 0).then_some(record)
}

/// Enumerate one mode record of a display device.
///
/// `mode_index` walks the mode list from zero; `ENUM_CURRENT_SETTINGS`
/// fetches the currently applied mode. Returns `None` when the index is
/// past the end of the mode list.
#[cfg(windows)]
pub fn enum_display_settings(device: &str, mode_index: u32) -> Option<DeviceMode> {
    use windows_sys::Win32::Graphics::Gdi::EnumDisplaySettingsW;

    let wide = to_wide(device);
    let mut mode = DeviceMode::for_query();
    let ok = unsafe { EnumDisplaySettingsW(wide.as_ptr(), mode_index, &mut mode as *mut _ as *mut _) };
    (ok != 0).then_some(mode)
}

/// Commit (or test) a mode record via the legacy change-settings call.
///
/// Returns the raw `DISP_CHANGE_*` result for the caller to translate.
#[cfg(windows)]
pub fn change_display_settings(device: Option<&str>, mode: Option<&DeviceMode>, flags: u32) -> i32 {
    use windows_sys::Win32::Graphics::Gdi::ChangeDisplaySettingsExW;

    let wide = device.map(to_wide);
    let name_ptr = wide
        .as_ref()
        .map_or(std::ptr::null(), |w| w.as_ptr());
    let mode_ptr = mode.map_or(std::ptr::null(), |m| m as *const _ as *const _);

    unsafe {
        ChangeDisplaySettingsExW(
            name_ptr,
            mode_ptr,
            std::ptr::null_mut(),
            flags,
            std::ptr::null(),
        )
    }
}

/// Global settings reset: null device, null mode, no flags. Applies any
/// registry-staged changes committed with `CDS_NORESET`.
#[cfg(windows)]
pub fn reset_display_settings() -> i32 {
    use windows_sys::Win32::Graphics::Gdi::ChangeDisplaySettingsExW;

    unsafe {
        ChangeDisplaySettingsExW(
            std::ptr::null(),
            std::ptr::null(),
            std::ptr::null_mut(),
            0,
            std::ptr::null(),
        )
    }
}

// Non-Windows stubs so the crate compiles and pure logic stays testable
// everywhere.

#[cfg(not(windows))]
pub fn enum_display_device(_device: Option<&str>, _index: u32, _flags: u32) -> Option<DisplayDeviceW> {
    None
}

#[cfg(not(windows))]
pub fn enum_display_settings(_device: &str, _mode_index: u32) -> Option<DeviceMode> {
    None
}

#[cfg(not(windows))]
pub fn change_display_settings(_device: Option<&str>, _mode: Option<&DeviceMode>, _flags: u32) -> i32 {
    DISP_CHANGE_FAILED
}

#[cfg(not(windows))]
pub fn reset_display_settings() -> i32 {
    DISP_CHANGE_FAILED
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_string_round_trip() {
        let wide = to_wide(r"\\.\DISPLAY1");
        assert_eq!(*wide.last().unwrap(), 0);
        assert_eq!(from_wide(&wide), r"\\.\DISPLAY1");
    }

    #[test]
    fn from_wide_stops_at_terminator() {
        let mut buffer = [0u16; 8];
        for (i, c) in "abc".encode_utf16().enumerate() {
            buffer[i] = c;
        }
        buffer[5] = 'x' as u16; // junk past the terminator
        assert_eq!(from_wide(&buffer), "abc");
    }

    #[test]
    fn setters_accumulate_field_masks() {
        let mut mode = DeviceMode::for_query();
        mode.set_resolution(Resolution::new(1920, 1080));
        mode.set_refresh(60);
        mode.set_position(Position::new(-1920, 0));
        mode.set_orientation(1);

        assert_eq!(mode.pels_width, 1920);
        assert_eq!(mode.pels_height, 1080);
        assert_eq!(mode.display_frequency, 60);
        assert_eq!(mode.position.x, -1920);
        assert_eq!(mode.display_orientation, 1);
        let expected = DM_PELSWIDTH
            | DM_PELSHEIGHT
            | DM_DISPLAYFREQUENCY
            | DM_DISPLAYFLAGS
            | DM_POSITION
            | DM_DISPLAYORIENTATION;
        assert_eq!(mode.fields, expected);
    }

    #[test]
    fn query_record_carries_size_header() {
        let mode = DeviceMode::for_query();
        assert_eq!(mode.size as usize, std::mem::size_of::<DeviceMode>());
        assert_eq!(mode.spec_version, DM_SPECVERSION);
    }
}
