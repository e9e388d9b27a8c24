//! Hardware inventory: one record per attached monitor, pulled from the
//! device interface paths the adapter enumeration reports.
//!
//! The interesting field is the hardware UID. Interface paths look like
//! `\\?\DISPLAY#GSM59F2#5&1e57fd3&0&UID4352#{...}`: the `UID<digits>`
//! segment survives re-plug events and slot changes, unlike the adapter
//! device name, which is why all stable identity derives from it.

use log::{debug, warn};
use serde::Serialize;

use crate::error::EngineError;
use crate::platform::constants::{DISPLAY_DEVICE_ATTACHED, EDD_GET_DEVICE_INTERFACE_NAME};
use crate::platform::devmode::enum_display_device;

/// One attached monitor as the hardware database reports it.
///
/// Every string field may be empty; only the walk itself failing is an
/// error.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MonitorHardwareRecord {
    /// Hardware UID parsed from the interface path, if present.
    pub uid: Option<u32>,
    /// Full device instance path.
    pub instance_id: String,
    /// Three-letter PnP manufacturer code (e.g. `GSM`).
    pub manufacturer: String,
    /// Product part of the EDID identifier.
    pub product: String,
    /// Monitor description string.
    pub friendly_name: String,
    /// Serial number, when the platform exposes one.
    pub serial: String,
}

/// Parse the `UID<digits>` segment out of a device interface path.
pub fn extract_uid(device_path: &str) -> Option<u32> {
    let start = device_path.find("UID")? + 3;
    let digits: String = device_path[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Parse the EDID identifier segment (`GSM59F2` in the example above).
pub fn extract_edid_identifier(device_path: &str) -> String {
    device_path
        .trim_start_matches(r"\\?\")
        .split('#')
        .nth(1)
        .unwrap_or_default()
        .to_string()
}

/// Split an EDID identifier into the PnP manufacturer code and product.
pub fn split_edid_identifier(edid: &str) -> (String, String) {
    if edid.len() >= 3 && edid.chars().take(3).all(|c| c.is_ascii_alphabetic()) {
        (edid[..3].to_string(), edid[3..].to_string())
    } else {
        (String::new(), edid.to_string())
    }
}

fn record_from_path(device_path: &str, description: &str) -> MonitorHardwareRecord {
    let edid = extract_edid_identifier(device_path);
    let (manufacturer, product) = split_edid_identifier(&edid);
    MonitorHardwareRecord {
        uid: extract_uid(device_path),
        instance_id: device_path.to_string(),
        manufacturer,
        product,
        friendly_name: description.to_string(),
        serial: String::new(),
    }
}

/// Walk every monitor attached to every adapter and collect its record.
///
/// Missing individual monitors produce an empty list, not an error;
/// `HardwareInventoryUnavailable` is reserved for the walk itself failing.
pub fn query_inventory() -> Result<Vec<MonitorHardwareRecord>, EngineError> {
    if cfg!(not(windows)) {
        return Err(EngineError::HardwareInventoryUnavailable(
            "hardware database requires Windows".to_string(),
        ));
    }

    let mut records = Vec::new();
    let mut adapter_index = 0;
    while let Some(adapter) = enum_display_device(None, adapter_index, 0) {
        adapter_index += 1;
        if adapter.is_mirroring() {
            continue;
        }
        let adapter_name = adapter.device_name();

        let mut monitor_index = 0;
        while let Some(monitor) =
            enum_display_device(Some(&adapter_name), monitor_index, EDD_GET_DEVICE_INTERFACE_NAME)
        {
            monitor_index += 1;
            if monitor.state_flags & DISPLAY_DEVICE_ATTACHED == 0 {
                continue;
            }
            let path = monitor.device_id();
            let record = record_from_path(&path, &monitor.device_string());
            if record.uid.is_none() {
                warn!("monitor on {} has no UID segment in {:?}", adapter_name, path);
            }
            records.push(record);
        }
    }

    debug!("hardware inventory: {} monitor record(s)", records.len());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LG_PATH: &str = r"\\?\DISPLAY#GSM59F2#5&1e57fd3&0&UID4352#{e6f07b5f-ee97-4a90-b076-33f57bf4eaa7}";

    #[test]
    fn uid_extraction() {
        assert_eq!(extract_uid(LG_PATH), Some(4352));
        assert_eq!(extract_uid(r"\\?\DISPLAY#DEL40A9#5&0&UID176389#{guid}"), Some(176389));
        assert_eq!(extract_uid(r"\\?\DISPLAY#DEL40A9#5&0&NOUID#{guid}"), None);
        assert_eq!(extract_uid("UIDx12"), None);
    }

    #[test]
    fn edid_identifier_extraction() {
        assert_eq!(extract_edid_identifier(LG_PATH), "GSM59F2");
        assert_eq!(extract_edid_identifier("no-separators"), "");
    }

    #[test]
    fn edid_identifier_split() {
        assert_eq!(
            split_edid_identifier("GSM59F2"),
            ("GSM".to_string(), "59F2".to_string())
        );
        assert_eq!(split_edid_identifier(""), (String::new(), String::new()));
        assert_eq!(
            split_edid_identifier("1234"),
            (String::new(), "1234".to_string())
        );
    }

    #[test]
    fn record_tolerates_sparse_paths() {
        let record = record_from_path(r"\\?\DISPLAY#ABC0001#1&0&UID100#{guid}", "");
        assert_eq!(record.uid, Some(100));
        assert_eq!(record.manufacturer, "ABC");
        assert_eq!(record.product, "0001");
        assert_eq!(record.friendly_name, "");
        assert_eq!(record.serial, "");
    }
}
