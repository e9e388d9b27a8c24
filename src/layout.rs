//! Multi-display positioning: primary-centered compaction, coordinate
//! range enforcement, and the atomic topology apply.
//!
//! Designating a primary is never a flag flip. The primary defines the
//! origin of the virtual desktop, so every other display must shift with
//! it; exposing a flag-only path would leave displays overlapping the new
//! origin. Clients therefore always go through compaction plus one
//! all-positions apply.

use log::{debug, warn};
use serde::Serialize;

use crate::ccd::api::set_display_config;
use crate::ccd::paths::find_display_path;
use crate::ccd::query::query_active_paths;
use crate::error::EngineError;
use crate::identity::DisplayMapping;
use crate::platform::constants::{COORDINATE_MAX, COORDINATE_MIN, SDC_APPLY_SUPPLIED};
use crate::types::{Position, Resolution};

/// A display with a requested position, plus the geometry needed to
/// compact and range-check the set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionedDisplay {
    pub logical_id: String,
    pub position: Position,
    pub resolution: Resolution,
    pub is_primary: bool,
}

fn translate(items: &mut [PositionedDisplay], offset: Position) {
    for item in items.iter_mut() {
        item.position = item.position + offset;
    }
}

/// Shift one axis back into the addressable range, if possible.
///
/// Returns the offset to add, or `None` when both ends cannot be
/// satisfied at once.
fn range_shift(min: i32, max_end: i32) -> Option<i32> {
    let span = i64::from(max_end) - i64::from(min);
    if span > i64::from(COORDINATE_MAX) - i64::from(COORDINATE_MIN) {
        return None;
    }
    if min < COORDINATE_MIN {
        Some(COORDINATE_MIN - min)
    } else if max_end > COORDINATE_MAX {
        Some(COORDINATE_MAX - max_end)
    } else {
        Some(0)
    }
}

/// Compact a position set.
///
/// With exactly one primary the whole set translates so the primary lands
/// at (0,0); otherwise the first display becomes the origin. Both axes
/// are then shifted by the smallest offset that restores the addressable
/// coordinate range. Fails only when no shift can satisfy both ends.
pub fn compact_positions(
    items: &[PositionedDisplay],
) -> Result<Vec<PositionedDisplay>, EngineError> {
    if items.is_empty() {
        return Ok(Vec::new());
    }
    let mut compacted = items.to_vec();

    let primaries: Vec<&PositionedDisplay> = items.iter().filter(|d| d.is_primary).collect();
    let origin = match primaries.as_slice() {
        [single] => single.position,
        _ => items[0].position,
    };
    translate(&mut compacted, -origin);

    let min_x = compacted.iter().map(|d| d.position.x).min().unwrap_or(0);
    let max_x_end = compacted
        .iter()
        .map(|d| d.position.x + d.resolution.width as i32)
        .max()
        .unwrap_or(0);
    let min_y = compacted.iter().map(|d| d.position.y).min().unwrap_or(0);
    let max_y_end = compacted
        .iter()
        .map(|d| d.position.y + d.resolution.height as i32)
        .max()
        .unwrap_or(0);

    let shift_x = range_shift(min_x, max_x_end).ok_or_else(|| {
        EngineError::rejected("position", format!("x span {}", max_x_end - min_x), "exceeds the addressable coordinate range")
    })?;
    let shift_y = range_shift(min_y, max_y_end).ok_or_else(|| {
        EngineError::rejected("position", format!("y span {}", max_y_end - min_y), "exceeds the addressable coordinate range")
    })?;
    if shift_x != 0 || shift_y != 0 {
        debug!("compaction: range shift by ({}, {})", shift_x, shift_y);
        translate(&mut compacted, Position::new(shift_x, shift_y));
    }
    Ok(compacted)
}

/// Commit a compacted position set atomically: one topology apply rewrites
/// every source-mode position, so all positions land or none do.
pub(crate) fn apply_positions_atomic(
    items: &[PositionedDisplay],
    mappings: &[DisplayMapping],
) -> Result<(), EngineError> {
    if items.is_empty() {
        return Ok(());
    }
    let mut snapshot = query_active_paths()?;

    for item in items {
        let mapping = crate::types::parse_logical_id(&item.logical_id)
            .ok()
            .and_then(|n| mappings.iter().find(|m| m.logical_number == n));
        let Some(mapping) = mapping else {
            warn!("apply positions: unknown display {}, skipping", item.logical_id);
            continue;
        };
        let found = find_display_path(
            &snapshot.paths,
            mapping.logical_number,
            Some(mapping.uid),
            Some(mapping.uid),
        )?;
        let mode_index = found.path.source_info.mode_info_idx as usize;
        let valid = snapshot
            .modes
            .get(mode_index)
            .map(|m| m.is_source())
            .unwrap_or(false);
        if !valid {
            return Err(EngineError::InvalidPath);
        }
        snapshot.modes[mode_index].set_source_position(item.position.x, item.position.y);
        debug!("{} -> {}", item.logical_id, item.position);
    }

    set_display_config(&mut snapshot.paths, &mut snapshot.modes, SDC_APPLY_SUPPLIED)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn display(id: &str, x: i32, y: i32, w: u32, h: u32, primary: bool) -> PositionedDisplay {
        PositionedDisplay {
            logical_id: id.to_string(),
            position: Position::new(x, y),
            resolution: Resolution::new(w, h),
            is_primary: primary,
        }
    }

    fn overlaps(a: &PositionedDisplay, b: &PositionedDisplay) -> bool {
        let (ax1, ay1) = (a.position.x, a.position.y);
        let (ax2, ay2) = (
            ax1 + a.resolution.width as i32,
            ay1 + a.resolution.height as i32,
        );
        let (bx1, by1) = (b.position.x, b.position.y);
        let (bx2, by2) = (
            bx1 + b.resolution.width as i32,
            by1 + b.resolution.height as i32,
        );
        ax1 < bx2 && bx1 < ax2 && ay1 < by2 && by1 < ay2
    }

    #[test]
    fn empty_input_empty_output() {
        assert_eq!(compact_positions(&[]).unwrap(), Vec::new());
    }

    #[test]
    fn single_primary_lands_at_origin() {
        let compacted = compact_positions(&[
            display("Display1", -1920, 0, 1920, 1080, false),
            display("Display2", 0, 0, 1920, 1080, false),
            display("Display3", 1920, 0, 1920, 1080, true),
        ])
        .unwrap();
        assert_eq!(compacted[2].position, Position::new(0, 0));
        assert_eq!(compacted[0].position, Position::new(-3840, 0));
        assert_eq!(compacted[1].position, Position::new(-1920, 0));
    }

    #[test]
    fn no_primary_first_display_becomes_origin() {
        let compacted = compact_positions(&[
            display("Display1", 500, 300, 1920, 1080, false),
            display("Display2", 2420, 300, 1920, 1080, false),
        ])
        .unwrap();
        assert_eq!(compacted[0].position, Position::new(0, 0));
        assert_eq!(compacted[1].position, Position::new(1920, 0));
    }

    #[test]
    fn two_primaries_fall_back_to_first_display() {
        let compacted = compact_positions(&[
            display("Display1", 100, 0, 1920, 1080, true),
            display("Display2", 2020, 0, 1920, 1080, true),
        ])
        .unwrap();
        assert_eq!(compacted[0].position, Position::new(0, 0));
    }

    #[test]
    fn primary_translation_keeps_relative_layout() {
        // The set from the far left: after centering on the primary the
        // relative offsets survive and the range check passes untouched.
        let compacted = compact_positions(&[
            display("D1", -35000, 0, 3840, 2160, true),
            display("D2", -31160, 0, 1920, 1080, false),
        ])
        .unwrap();
        assert_eq!(compacted[0].position, Position::new(0, 0));
        assert_eq!(compacted[1].position, Position::new(3840, 0));
    }

    #[test]
    fn right_overflow_shifts_back_into_range() {
        // Right edge 34000 + 1920 = 35920, 3153 past the limit. No
        // primary, and the first display is already at the origin, so the
        // origin translation is a no-op and only the range shift applies.
        let compacted = compact_positions(&[
            display("D1", 0, 0, 1920, 1080, false),
            display("D2", 34000, 0, 1920, 1080, false),
        ])
        .unwrap();
        assert_eq!(compacted[1].position.x + 1920, COORDINATE_MAX);
        assert_eq!(compacted[1].position.x, 34000 - 3153);
        assert_eq!(compacted[0].position.x, -3153);
    }

    #[test]
    fn left_overflow_shifts_right() {
        let compacted = compact_positions(&[
            display("D1", 0, 0, 1920, 1080, false),
            display("D2", -40000, 0, 1920, 1080, false),
        ])
        .unwrap();
        let min_x = compacted.iter().map(|d| d.position.x).min().unwrap();
        assert_eq!(min_x, COORDINATE_MIN);
    }

    #[test]
    fn vertical_axis_is_enforced_too() {
        let compacted = compact_positions(&[
            display("D1", 0, 0, 1920, 1080, false),
            display("D2", 0, 32500, 1920, 1080, false),
        ])
        .unwrap();
        let max_y_end = compacted
            .iter()
            .map(|d| d.position.y + d.resolution.height as i32)
            .max()
            .unwrap();
        assert!(max_y_end <= COORDINATE_MAX);
    }

    #[test]
    fn unsatisfiable_span_fails() {
        let result = compact_positions(&[
            display("D1", -40000, 0, 1920, 1080, false),
            display("D2", 40000, 0, 1920, 1080, false),
        ]);
        assert!(matches!(
            result,
            Err(EngineError::ConfigurationFailed { setting, .. }) if setting == "position"
        ));
    }

    #[test]
    fn compaction_preserves_no_overlap() {
        let input = [
            display("D1", -1920, 0, 1920, 1080, false),
            display("D2", 0, 0, 1920, 1080, true),
            display("D3", 1920, -540, 2560, 1440, false),
        ];
        for a in 0..input.len() {
            for b in a + 1..input.len() {
                assert!(!overlaps(&input[a], &input[b]));
            }
        }
        let compacted = compact_positions(&input).unwrap();
        for a in 0..compacted.len() {
            for b in a + 1..compacted.len() {
                assert!(!overlaps(&compacted[a], &compacted[b]));
            }
        }
    }

    #[test]
    fn set_primary_scenario_three_side_by_side() {
        // A is the old primary on the left, C becomes primary: everything
        // shifts left by C's offset and nothing overlaps.
        let compacted = compact_positions(&[
            display("A", -1920, 0, 1920, 1080, false),
            display("B", 0, 0, 1920, 1080, false),
            display("C", 1920, 0, 1920, 1080, true),
        ])
        .unwrap();
        assert_eq!(compacted[0].position, Position::new(-3840, 0));
        assert_eq!(compacted[1].position, Position::new(-1920, 0));
        assert_eq!(compacted[2].position, Position::new(0, 0));
    }
}
