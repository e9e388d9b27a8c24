//! Identity resolver: stable logical display numbers from volatile
//! adapter enumeration.
//!
//! The adapter slot (`"\\.\DISPLAY3"`) a monitor occupies changes across
//! re-plug events; the hardware UID in its interface path does not.
//! Logical numbers are therefore assigned by ranking the distinct UIDs
//! ascending, which reproduces hardware-introduction order and stays put
//! as long as the connected hardware set is unchanged.

use log::{debug, warn};
use serde::Serialize;

use crate::error::EngineError;
use crate::hardware::{self, MonitorHardwareRecord};
use crate::platform::constants::EDD_GET_DEVICE_INTERFACE_NAME;
use crate::platform::devmode::enum_display_device;
use crate::types::format_logical_id;

/// One correlated display: hardware identity joined with the adapter
/// position it currently occupies.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DisplayMapping {
    pub logical_number: u32,
    pub logical_id: String,
    /// Volatile adapter slot, used only for OS calls.
    pub adapter_device_name: String,
    /// Index of the monitor on its adapter.
    pub monitor_index: u32,
    pub uid: u32,
    pub edid_identifier: String,
    pub friendly_name: String,
    pub manufacturer: String,
    pub product: String,
    pub serial: String,
    pub instance_id: String,
    /// Adapter state: part of the desktop right now.
    pub attached_to_desktop: bool,
    pub is_primary_adapter: bool,
}

/// Raw correlation entry before logical numbers exist.
#[derive(Debug, Clone, Default)]
pub struct CorrelatedMonitor {
    pub adapter_device_name: String,
    pub monitor_index: u32,
    pub uid: u32,
    pub edid_identifier: String,
    pub attached_to_desktop: bool,
    pub is_primary_adapter: bool,
    pub record: Option<MonitorHardwareRecord>,
}

/// Assign logical numbers by ranking distinct UIDs ascending.
///
/// Pure: the numbering depends only on the UID set, never on enumeration
/// order, which is what makes the ids stable across re-plugs.
pub fn assign_logical_numbers(correlated: Vec<CorrelatedMonitor>) -> Vec<DisplayMapping> {
    let mut uids: Vec<u32> = correlated.iter().map(|c| c.uid).collect();
    uids.sort_unstable();
    uids.dedup();

    let mut mappings: Vec<DisplayMapping> = correlated
        .into_iter()
        .map(|c| {
            // UIDs are unique per hardware, so the rank lookup cannot miss.
            let rank = uids.binary_search(&c.uid).unwrap_or(0) as u32;
            let logical_number = rank + 1;
            let record = c.record.unwrap_or_default();
            DisplayMapping {
                logical_number,
                logical_id: format_logical_id(logical_number),
                adapter_device_name: c.adapter_device_name,
                monitor_index: c.monitor_index,
                uid: c.uid,
                edid_identifier: c.edid_identifier,
                friendly_name: record.friendly_name,
                manufacturer: record.manufacturer,
                product: record.product,
                serial: record.serial,
                instance_id: record.instance_id,
                attached_to_desktop: c.attached_to_desktop,
                is_primary_adapter: c.is_primary_adapter,
            }
        })
        .collect();
    mappings.sort_by_key(|m| m.logical_number);
    mappings
}

/// Walk adapters and monitors, correlate with the inventory, and number
/// the result.
///
/// Partial correlation (a monitor without an inventory record) is logged
/// and kept; only a completely empty result is an error.
pub fn resolve_mappings(
    inventory: &[MonitorHardwareRecord],
) -> Result<Vec<DisplayMapping>, EngineError> {
    let mut correlated = Vec::new();

    let mut adapter_index = 0;
    while let Some(adapter) = enum_display_device(None, adapter_index, 0) {
        adapter_index += 1;
        if adapter.is_mirroring() {
            continue;
        }
        let adapter_name = adapter.device_name();
        let attached = adapter.is_attached_to_desktop();
        let primary = adapter.is_primary();

        let mut monitor_index = 0;
        while let Some(monitor) =
            enum_display_device(Some(&adapter_name), monitor_index, EDD_GET_DEVICE_INTERFACE_NAME)
        {
            let path = monitor.device_id();
            let Some(uid) = hardware::extract_uid(&path) else {
                warn!(
                    "monitor {} on {} has no parseable UID, skipping",
                    monitor_index, adapter_name
                );
                monitor_index += 1;
                continue;
            };

            let record = inventory.iter().find(|r| r.uid == Some(uid)).cloned();
            if record.is_none() {
                warn!("no inventory record for UID {}, continuing without one", uid);
            }
            correlated.push(CorrelatedMonitor {
                adapter_device_name: adapter_name.clone(),
                monitor_index,
                uid,
                edid_identifier: hardware::extract_edid_identifier(&path),
                attached_to_desktop: attached,
                is_primary_adapter: primary,
                record,
            });
            monitor_index += 1;
        }
    }

    if correlated.is_empty() {
        return Err(EngineError::NoDisplaysFound);
    }

    let mappings = assign_logical_numbers(correlated);
    debug!(
        "identity: {} display(s) mapped: {}",
        mappings.len(),
        mappings
            .iter()
            .map(|m| format!("{}={} ({})", m.logical_id, m.adapter_device_name, m.uid))
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(mappings)
}

/// Look up a mapping by logical number.
pub fn mapping_for_number(
    mappings: &[DisplayMapping],
    logical_number: u32,
) -> Result<&DisplayMapping, EngineError> {
    mappings
        .iter()
        .find(|m| m.logical_number == logical_number)
        .ok_or_else(|| EngineError::UnknownDisplay(format_logical_id(logical_number)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn correlated(adapter: &str, uid: u32) -> CorrelatedMonitor {
        CorrelatedMonitor {
            adapter_device_name: adapter.to_string(),
            uid,
            record: Some(MonitorHardwareRecord {
                uid: Some(uid),
                friendly_name: format!("Monitor {}", uid),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn numbering_follows_sorted_uids() {
        let mappings = assign_logical_numbers(vec![
            correlated(r"\\.\DISPLAY1", 176389),
            correlated(r"\\.\DISPLAY2", 100),
            correlated(r"\\.\DISPLAY3", 220),
        ]);
        let pairs: Vec<(u32, u32)> =
            mappings.iter().map(|m| (m.logical_number, m.uid)).collect();
        assert_eq!(pairs, vec![(1, 100), (2, 220), (3, 176389)]);
        assert_eq!(mappings[2].logical_id, "Display3");
        assert_eq!(mappings[2].adapter_device_name, r"\\.\DISPLAY1");
    }

    #[test]
    fn numbering_is_permutation_invariant() {
        let forward = assign_logical_numbers(vec![
            correlated("a", 7),
            correlated("b", 3),
            correlated("c", 900),
        ]);
        let backward = assign_logical_numbers(vec![
            correlated("c", 900),
            correlated("b", 3),
            correlated("a", 7),
        ]);
        let key = |ms: &[DisplayMapping]| -> Vec<(u32, u32)> {
            ms.iter().map(|m| (m.logical_number, m.uid)).collect()
        };
        assert_eq!(key(&forward), key(&backward));
    }

    proptest::proptest! {
        #[test]
        fn numbering_ignores_enumeration_order(
            uid_set in proptest::collection::hash_set(1u32..1_000_000, 1..8)
        ) {
            let uids: Vec<u32> = uid_set.into_iter().collect();
            let forward: Vec<CorrelatedMonitor> =
                uids.iter().map(|&u| correlated("slot", u)).collect();
            let mut reversed = forward.clone();
            reversed.reverse();

            let key = |ms: &[DisplayMapping]| -> Vec<(u32, u32)> {
                ms.iter().map(|m| (m.logical_number, m.uid)).collect()
            };
            proptest::prop_assert_eq!(
                key(&assign_logical_numbers(forward)),
                key(&assign_logical_numbers(reversed))
            );
        }
    }

    #[test]
    fn missing_record_still_maps() {
        let mut entry = correlated("x", 50);
        entry.record = None;
        let mappings = assign_logical_numbers(vec![entry]);
        assert_eq!(mappings[0].logical_number, 1);
        assert_eq!(mappings[0].friendly_name, "");
    }

    #[test]
    fn mapping_lookup_by_number() {
        let mappings = assign_logical_numbers(vec![
            correlated("a", 100),
            correlated("b", 176389),
            correlated("c", 220),
        ]);
        assert_eq!(mapping_for_number(&mappings, 3).unwrap().uid, 176389);
        assert!(mapping_for_number(&mappings, 2).is_ok());
        assert!(matches!(
            mapping_for_number(&mappings, 9),
            Err(EngineError::UnknownDisplay(id)) if id == "Display9"
        ));
    }
}
