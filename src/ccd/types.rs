//! CCD topology type declarations.
//!
//! These types must match the exact memory layout expected by the display
//! configuration calls. Adapter LUIDs change across restarts and re-plug
//! events; nothing in the engine identifies a display by LUID alone.

use crate::platform::constants::{
    DISPLAYCONFIG_PATH_ACTIVE, MODE_INFO_TYPE_SOURCE, MODE_INFO_TYPE_TARGET,
};

/// Locally unique identifier for a display adapter.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Luid {
    pub low_part: u32,
    pub high_part: u32,
}

/// Rational number (refresh rates, sync frequencies).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rational {
    pub numerator: u32,
    pub denominator: u32,
}

/// 2D region size.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Region2D {
    pub cx: u32,
    pub cy: u32,
}

pub use crate::platform::devmode::PointL;

/// Source (adapter-side) endpoint of a path.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct PathSourceInfo {
    pub adapter_id: Luid,
    pub id: u32,
    pub mode_info_idx: u32,
    pub status_flags: u32,
}

/// Target (monitor-side) endpoint of a path.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct PathTargetInfo {
    pub adapter_id: Luid,
    pub id: u32,
    pub mode_info_idx: u32,
    pub output_technology: u32,
    pub rotation: u32,
    pub scaling: u32,
    pub refresh_rate: Rational,
    pub scan_line_ordering: u32,
    /// BOOL: whether the target is physically reachable.
    pub target_available: u32,
    pub status_flags: u32,
}

/// One source→target edge in the topology graph.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct PathInfo {
    pub source_info: PathSourceInfo,
    pub target_info: PathTargetInfo,
    pub flags: u32,
}

impl PathInfo {
    /// Whether this edge is part of the current desktop.
    pub fn is_active(&self) -> bool {
        self.flags & DISPLAYCONFIG_PATH_ACTIVE != 0
    }

    /// Mark the edge active and its target reachable, the rewrite every
    /// CCD enable strategy performs before applying.
    pub fn activate(&mut self) {
        self.flags |= DISPLAYCONFIG_PATH_ACTIVE;
        self.target_info.target_available = 1;
    }

    /// Whether the path carries any addressable identifier at all.
    pub fn has_usable_ids(&self) -> bool {
        self.source_info.id != 0 || self.target_info.id != 0
    }
}

/// Video signal timings of a target mode.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoSignalInfo {
    pub pixel_rate: u64,
    pub h_sync_freq: Rational,
    pub v_sync_freq: Rational,
    pub active_size: Region2D,
    pub total_size: Region2D,
    pub video_standard: u32,
    pub scan_line_ordering: u32,
}

/// Monitor-side mode entry.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct TargetMode {
    pub target_video_signal_info: VideoSignalInfo,
}

/// Adapter-side mode entry: the desktop rectangle a source renders.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceMode {
    pub width: u32,
    pub height: u32,
    pub pixel_format: u32,
    pub position: PointL,
}

/// One entry of the mode array. In C this is a union; either the source
/// or the target interpretation is valid, selected by `info_type`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ModeInfo {
    pub info_type: u32,
    pub id: u32,
    pub adapter_id: Luid,
    /// Union storage, sized to the larger (target) member.
    pub mode_data: [u8; 48],
}

impl Default for ModeInfo {
    fn default() -> Self {
        Self {
            info_type: 0,
            id: 0,
            adapter_id: Luid::default(),
            mode_data: [0u8; 48],
        }
    }
}

impl ModeInfo {
    pub fn is_source(&self) -> bool {
        self.info_type == MODE_INFO_TYPE_SOURCE
    }

    /// Interpret the union as a source mode. Only valid when
    /// `info_type == MODE_INFO_TYPE_SOURCE`.
    pub fn as_source_mode(&self) -> &SourceMode {
        unsafe { &*(self.mode_data.as_ptr() as *const SourceMode) }
    }

    /// Interpret the union as a target mode. Only valid when
    /// `info_type == MODE_INFO_TYPE_TARGET`.
    pub fn as_target_mode(&self) -> &TargetMode {
        unsafe { &*(self.mode_data.as_ptr() as *const TargetMode) }
    }

    pub fn set_source_mode(&mut self, mode: &SourceMode) {
        self.info_type = MODE_INFO_TYPE_SOURCE;
        self.mode_data = [0u8; 48];
        let bytes = unsafe {
            std::slice::from_raw_parts(
                mode as *const _ as *const u8,
                std::mem::size_of::<SourceMode>(),
            )
        };
        self.mode_data[..bytes.len()].copy_from_slice(bytes);
    }

    pub fn set_target_mode(&mut self, mode: &TargetMode) {
        self.info_type = MODE_INFO_TYPE_TARGET;
        let bytes = unsafe {
            std::slice::from_raw_parts(
                mode as *const _ as *const u8,
                std::mem::size_of::<TargetMode>(),
            )
        };
        self.mode_data.copy_from_slice(bytes);
    }

    /// Rewrite the position of a source-mode entry in place.
    pub fn set_source_position(&mut self, x: i32, y: i32) {
        debug_assert!(self.is_source());
        let mut source = *self.as_source_mode();
        source.position = PointL { x, y };
        self.set_source_mode(&source);
    }
}

/// Header of a device-info request packet.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceInfoHeader {
    pub info_type: u32,
    pub size: u32,
    pub adapter_id: Luid,
    pub id: u32,
}

/// Target name request packet: friendly name, EDID ids, device path.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct TargetDeviceName {
    pub header: DeviceInfoHeader,
    pub flags: u32,
    pub output_technology: u32,
    pub edid_manufacture_id: u16,
    pub edid_product_code_id: u16,
    pub connector_instance: u32,
    pub monitor_friendly_device_name: [u16; 64],
    pub monitor_device_path: [u16; 128],
}

impl Default for TargetDeviceName {
    fn default() -> Self {
        Self {
            header: DeviceInfoHeader::default(),
            flags: 0,
            output_technology: 0,
            edid_manufacture_id: 0,
            edid_product_code_id: 0,
            connector_instance: 0,
            monitor_friendly_device_name: [0u16; 64],
            monitor_device_path: [0u16; 128],
        }
    }
}

impl TargetDeviceName {
    pub fn friendly_name(&self) -> String {
        crate::platform::devmode::from_wide(&self.monitor_friendly_device_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_union_round_trips_source() {
        let mut entry = ModeInfo::default();
        entry.set_source_mode(&SourceMode {
            width: 2560,
            height: 1440,
            pixel_format: 4,
            position: PointL { x: -2560, y: 0 },
        });
        assert!(entry.is_source());
        let back = entry.as_source_mode();
        assert_eq!(back.width, 2560);
        assert_eq!(back.height, 1440);
        assert_eq!(back.position.x, -2560);
    }

    #[test]
    fn mode_union_round_trips_target() {
        let mut entry = ModeInfo::default();
        let mut target = TargetMode::default();
        target.target_video_signal_info.active_size = Region2D { cx: 3840, cy: 2160 };
        target.target_video_signal_info.v_sync_freq = Rational { numerator: 60, denominator: 1 };
        entry.set_target_mode(&target);
        assert_eq!(entry.info_type, MODE_INFO_TYPE_TARGET);
        let back = entry.as_target_mode();
        assert_eq!(back.target_video_signal_info.active_size.cx, 3840);
        assert_eq!(back.target_video_signal_info.v_sync_freq.numerator, 60);
    }

    #[test]
    fn source_position_rewrite() {
        let mut entry = ModeInfo::default();
        entry.set_source_mode(&SourceMode {
            width: 1920,
            height: 1080,
            pixel_format: 4,
            position: PointL { x: 0, y: 0 },
        });
        entry.set_source_position(1920, -540);
        let source = entry.as_source_mode();
        assert_eq!((source.position.x, source.position.y), (1920, -540));
        assert_eq!(source.width, 1920);
    }

    #[test]
    fn path_activation_sets_flag_and_availability() {
        let mut path = PathInfo::default();
        assert!(!path.is_active());
        path.activate();
        assert!(path.is_active());
        assert_eq!(path.target_info.target_available, 1);
    }
}
