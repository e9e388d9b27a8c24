//! Flag groups and value ranges of the display configuration interface.
//!
//! Declared locally so the engine's logic and tests never depend on the
//! Windows-only crates being present.

// --- QueryDisplayConfig flags -------------------------------------------

pub const QDC_ALL_PATHS: u32 = 0x0000_0001;
pub const QDC_ONLY_ACTIVE_PATHS: u32 = 0x0000_0002;
pub const QDC_DATABASE_CURRENT: u32 = 0x0000_0004;

// --- SetDisplayConfig flags ---------------------------------------------

pub const SDC_TOPOLOGY_EXTEND: u32 = 0x0000_0004;
pub const SDC_USE_SUPPLIED_DISPLAY_CONFIG: u32 = 0x0000_0020;
pub const SDC_VALIDATE: u32 = 0x0000_0040;
pub const SDC_APPLY: u32 = 0x0000_0080;
pub const SDC_NO_OPTIMIZATION: u32 = 0x0000_0100;
pub const SDC_SAVE_TO_DATABASE: u32 = 0x0000_0200;
pub const SDC_ALLOW_CHANGES: u32 = 0x0000_0400;
pub const SDC_FORCE_MODE_ENUMERATION: u32 = 0x0000_1000;
pub const SDC_ALLOW_PATH_ORDER_CHANGES: u32 = 0x0000_2000;

/// The flag set used whenever a supplied path/mode configuration is
/// committed.
pub const SDC_APPLY_SUPPLIED: u32 =
    SDC_APPLY | SDC_USE_SUPPLIED_DISPLAY_CONFIG | SDC_ALLOW_CHANGES | SDC_SAVE_TO_DATABASE;

// --- ChangeDisplaySettingsEx flags --------------------------------------

pub const CDS_UPDATEREGISTRY: u32 = 0x0000_0001;
pub const CDS_TEST: u32 = 0x0000_0002;
pub const CDS_SET_PRIMARY: u32 = 0x0000_0010;
pub const CDS_NORESET: u32 = 0x1000_0000;
pub const CDS_RESET: u32 = 0x4000_0000;

// --- ChangeDisplaySettingsEx results ------------------------------------

pub const DISP_CHANGE_SUCCESSFUL: i32 = 0;
pub const DISP_CHANGE_RESTART: i32 = 1;
pub const DISP_CHANGE_FAILED: i32 = -1;
pub const DISP_CHANGE_BADMODE: i32 = -2;
pub const DISP_CHANGE_NOTUPDATED: i32 = -3;
pub const DISP_CHANGE_BADFLAGS: i32 = -4;
pub const DISP_CHANGE_BADPARAM: i32 = -5;
pub const DISP_CHANGE_BADDUALVIEW: i32 = -6;

// --- Devmode field masks ------------------------------------------------

pub const DM_POSITION: u32 = 0x0000_0020;
pub const DM_DISPLAYORIENTATION: u32 = 0x0000_0080;
pub const DM_BITSPERPEL: u32 = 0x0004_0000;
pub const DM_PELSWIDTH: u32 = 0x0008_0000;
pub const DM_PELSHEIGHT: u32 = 0x0010_0000;
pub const DM_DISPLAYFLAGS: u32 = 0x0020_0000;
pub const DM_DISPLAYFREQUENCY: u32 = 0x0040_0000;

// --- Display device state flags -----------------------------------------

/// Adapter: part of the desktop. Monitor: active.
pub const DISPLAY_DEVICE_ATTACHED_TO_DESKTOP: u32 = 0x0000_0001;
/// Monitor: attached to its adapter.
pub const DISPLAY_DEVICE_ATTACHED: u32 = 0x0000_0002;
pub const DISPLAY_DEVICE_PRIMARY_DEVICE: u32 = 0x0000_0004;
pub const DISPLAY_DEVICE_MIRRORING_DRIVER: u32 = 0x0000_0008;

/// `EnumDisplayDevices` flag: report the device interface path in
/// `DeviceID`, which carries the hardware UID segment.
pub const EDD_GET_DEVICE_INTERFACE_NAME: u32 = 0x0000_0001;

// --- EnumDisplaySettings mode indices -----------------------------------

pub const ENUM_CURRENT_SETTINGS: u32 = u32::MAX;

// --- Topology path flags and mode kinds ---------------------------------

/// Path flag: the source→target edge is part of the current desktop.
pub const DISPLAYCONFIG_PATH_ACTIVE: u32 = 0x0000_0001;

pub const MODE_INFO_TYPE_SOURCE: u32 = 1;
pub const MODE_INFO_TYPE_TARGET: u32 = 2;

/// 32 bits-per-pixel source pixel format.
pub const PIXELFORMAT_32BPP: u32 = 4;

/// Progressive scan-line ordering for synthesized target modes.
pub const SCANLINE_ORDERING_PROGRESSIVE: u32 = 1;

/// "Other" video standard for synthesized target modes.
pub const VIDEO_STANDARD_OTHER: u32 = 255;

/// `DisplayConfigGetDeviceInfo` request: target friendly name and device
/// path.
pub const DEVICE_INFO_GET_TARGET_NAME: u32 = 2;

// --- Virtual desktop coordinate range -----------------------------------

pub const COORDINATE_MIN: i32 = -32768;
pub const COORDINATE_MAX: i32 = 32767;
