//! Pure display-set diffing for the observer feed.
//!
//! An external poller compares successive `list_displays` results; the
//! engine only supplies this function. Notification kinds are reported in
//! priority order: additions first, then removals, then enable-state
//! flips, then configuration changes.

use std::time::SystemTime;

use crate::types::{ChangeNotification, ChangeType, LogicalDisplay};

fn configuration_differs(previous: &LogicalDisplay, current: &LogicalDisplay) -> bool {
    previous.position != current.position
        || previous.resolution != current.resolution
        || previous.refresh_hz != current.refresh_hz
        || previous.orientation != current.orientation
        || previous.is_primary != current.is_primary
}

/// Diff two enumeration passes into change notifications.
pub fn detect_changes(
    previous: &[LogicalDisplay],
    current: &[LogicalDisplay],
) -> Vec<ChangeNotification> {
    let timestamp = SystemTime::now();
    let mut changes = Vec::new();

    for display in current {
        if !previous.iter().any(|p| p.logical_id == display.logical_id) {
            changes.push(ChangeNotification {
                previous: None,
                current: Some(display.clone()),
                change_type: ChangeType::Added,
                timestamp,
            });
        }
    }

    for display in previous {
        if !current.iter().any(|c| c.logical_id == display.logical_id) {
            changes.push(ChangeNotification {
                previous: Some(display.clone()),
                current: None,
                change_type: ChangeType::Removed,
                timestamp,
            });
        }
    }

    for display in previous {
        let Some(now) = current.iter().find(|c| c.logical_id == display.logical_id) else {
            continue;
        };
        if display.is_enabled != now.is_enabled {
            changes.push(ChangeNotification {
                previous: Some(display.clone()),
                current: Some(now.clone()),
                change_type: ChangeType::StateChanged,
                timestamp,
            });
        } else if configuration_differs(display, now) {
            changes.push(ChangeNotification {
                previous: Some(display.clone()),
                current: Some(now.clone()),
                change_type: ChangeType::ConfigurationChanged,
                timestamp,
            });
        }
    }

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{format_logical_id, Position, Resolution};

    fn display(n: u32, enabled: bool) -> LogicalDisplay {
        LogicalDisplay {
            logical_number: n,
            logical_id: format_logical_id(n),
            is_enabled: enabled,
            resolution: Resolution::new(1920, 1080),
            refresh_hz: 60,
            ..Default::default()
        }
    }

    #[test]
    fn addition_is_detected() {
        let previous = [display(1, true), display(2, false)];
        let current = [display(1, true), display(2, true), display(3, true)];
        let changes = detect_changes(&previous, &current);

        assert_eq!(changes[0].change_type, ChangeType::Added);
        assert_eq!(changes[0].current.as_ref().unwrap().logical_id, "Display3");
        // Display2 flipping on is also reported, after the addition.
        assert_eq!(changes[1].change_type, ChangeType::StateChanged);
        assert_eq!(changes.len(), 2);
    }

    #[test]
    fn removal_is_detected() {
        let previous = [display(1, true), display(2, true)];
        let current = [display(1, true)];
        let changes = detect_changes(&previous, &current);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeType::Removed);
        assert!(changes[0].current.is_none());
    }

    #[test]
    fn state_change_outranks_configuration_change() {
        let mut before = display(1, false);
        before.position = Position::new(0, 0);
        let mut after = display(1, true);
        after.position = Position::new(1920, 0);
        let changes = detect_changes(&[before], &[after]);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeType::StateChanged);
    }

    #[test]
    fn configuration_change_when_geometry_moves() {
        let before = display(1, true);
        let mut after = display(1, true);
        after.position = Position::new(-1920, 0);
        let changes = detect_changes(&[before.clone()], &[after]);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].change_type, ChangeType::ConfigurationChanged);

        let unchanged = detect_changes(&[before.clone()], &[before]);
        assert!(unchanged.is_empty());
    }

    #[test]
    fn priority_ordering_added_removed_state_config() {
        let mut moved = display(1, true);
        moved.refresh_hz = 120;
        let previous = [display(1, true), display(2, true), display(4, false)];
        let current = [moved, display(3, true), display(4, true)];
        let changes = detect_changes(&previous, &current);
        let kinds: Vec<ChangeType> = changes.iter().map(|c| c.change_type).collect();
        assert_eq!(
            kinds,
            vec![
                ChangeType::Added,
                ChangeType::Removed,
                ChangeType::StateChanged,
                ChangeType::ConfigurationChanged,
            ]
        );
    }
}
