//! Bounds detector: rectangles of the active monitors on the virtual
//! desktop, keyed by adapter device name.

use std::collections::HashMap;

use serde::Serialize;

use crate::error::EngineError;
use crate::types::Position;

/// An active monitor's rectangle on the virtual desktop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DisplayBounds {
    pub position: Position,
    pub width: u32,
    pub height: u32,
    pub is_primary: bool,
}

/// Rectangle in virtual-desktop coordinates (`RECT` layout).
#[cfg(windows)]
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
struct RectL {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

/// `MONITORINFOEXW` layout.
#[cfg(windows)]
#[repr(C)]
#[derive(Clone, Copy)]
struct MonitorInfoEx {
    cb_size: u32,
    rc_monitor: RectL,
    rc_work: RectL,
    flags: u32,
    device: [u16; 32],
}

#[cfg(windows)]
const MONITORINFOF_PRIMARY: u32 = 0x0000_0001;

/// Enumerate the rectangles of all active monitors.
///
/// Only enabled displays produce a record; a display missing from the map
/// is not part of the desktop. The callback collector never escapes the
/// enumeration call.
#[cfg(windows)]
pub fn enumerate_monitor_bounds() -> Result<HashMap<String, DisplayBounds>, EngineError> {
    use windows_sys::Win32::Foundation::{LPARAM, RECT};
    use windows_sys::Win32::Graphics::Gdi::{
        EnumDisplayMonitors, GetMonitorInfoW, HDC, HMONITOR,
    };

    use crate::platform::devmode::from_wide;

    unsafe extern "system" fn collect(
        monitor: HMONITOR,
        _hdc: HDC,
        _rect: *mut RECT,
        data: LPARAM,
    ) -> i32 {
        let out = unsafe { &mut *(data as *mut HashMap<String, DisplayBounds>) };

        let mut info = MonitorInfoEx {
            cb_size: std::mem::size_of::<MonitorInfoEx>() as u32,
            rc_monitor: RectL::default(),
            rc_work: RectL::default(),
            flags: 0,
            device: [0; 32],
        };
        if unsafe { GetMonitorInfoW(monitor, &mut info as *mut _ as *mut _) } == 0 {
            return 1; // skip this monitor, continue enumeration
        }

        let rect = info.rc_monitor;
        out.insert(
            from_wide(&info.device),
            DisplayBounds {
                position: Position::new(rect.left, rect.top),
                width: (rect.right - rect.left).max(0) as u32,
                height: (rect.bottom - rect.top).max(0) as u32,
                is_primary: info.flags & MONITORINFOF_PRIMARY != 0,
            },
        );
        1
    }

    let mut bounds: HashMap<String, DisplayBounds> = HashMap::new();
    let ok = unsafe {
        EnumDisplayMonitors(
            std::ptr::null_mut(),
            std::ptr::null(),
            Some(collect),
            &mut bounds as *mut _ as LPARAM,
        )
    };
    if ok == 0 {
        return Err(EngineError::Unknown {
            source_name: "bounds-detector".to_string(),
            message: "monitor enumeration failed".to_string(),
        });
    }
    Ok(bounds)
}

#[cfg(not(windows))]
pub fn enumerate_monitor_bounds() -> Result<HashMap<String, DisplayBounds>, EngineError> {
    Err(EngineError::Unsupported)
}
