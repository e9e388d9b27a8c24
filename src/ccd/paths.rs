//! Layered path resolution: map a logical display onto one edge of the
//! topology graph.
//!
//! Adapter slots move around across re-plug events, so no single lookup is
//! reliable. The finder tries a fixed ladder of strategies and takes the
//! first that yields a candidate:
//!
//! 1. ranked hardware UID matched against target ids (preferring paths
//!    whose source id equals `logical_number - 1`),
//! 2. source id `logical_number - 1`, exact-target matches sorted first
//!    when a target hint exists,
//! 3. target hint alone,
//! 4. `logical_number - 1` as a direct index into the path array,
//! 5. the same index wrapped modulo the array length.
//!
//! Ties resolve to the earliest index.

use log::debug;

use super::types::PathInfo;
use crate::error::EngineError;

/// A located path and its index within the queried array.
#[derive(Debug, Clone, Copy)]
pub struct PathMatch {
    pub index: usize,
    pub path: PathInfo,
}

/// Whether a path looks inactive (not part of the desktop, or target gone).
fn looks_inactive(path: &PathInfo) -> bool {
    path.flags == 0 || path.target_info.target_available == 0
}

/// Tier 1: the UID derived from the logical number's rank, matched against
/// target ids. Among matches, a path whose source id lines up with the
/// logical number wins.
fn by_ranked_uid(paths: &[PathInfo], source_id: u32, ranked_uid: Option<u32>) -> Option<usize> {
    let uid = ranked_uid?;
    let mut first_match = None;
    for (index, path) in paths.iter().enumerate() {
        if path.target_info.id != uid {
            continue;
        }
        if path.source_info.id == source_id {
            return Some(index);
        }
        if first_match.is_none() {
            first_match = Some(index);
        }
    }
    first_match
}

/// Tier 2: source id match; exact-target matches first when hinted.
fn by_source_id(paths: &[PathInfo], source_id: u32, target_hint: Option<u32>) -> Option<usize> {
    let mut fallback = None;
    for (index, path) in paths.iter().enumerate() {
        if path.source_info.id != source_id {
            continue;
        }
        match target_hint {
            Some(hint) if path.target_info.id == hint => return Some(index),
            _ => {
                if fallback.is_none() {
                    fallback = Some(index);
                }
            }
        }
    }
    fallback
}

/// Tier 3: target hint alone.
fn by_target_hint(paths: &[PathInfo], target_hint: Option<u32>) -> Option<usize> {
    let hint = target_hint?;
    paths.iter().position(|p| p.target_info.id == hint)
}

/// Tier 4: the logical number as a direct index.
fn by_direct_index(paths: &[PathInfo], source_id: u32) -> Option<usize> {
    let index = source_id as usize;
    (index < paths.len()).then_some(index)
}

/// Tier 5: wrapped index, the last-resort mapping.
fn by_wrapped_index(paths: &[PathInfo], source_id: u32) -> Option<usize> {
    if paths.is_empty() {
        None
    } else {
        Some(source_id as usize % paths.len())
    }
}

fn run_tiers(
    paths: &[PathInfo],
    logical_number: u32,
    ranked_uid: Option<u32>,
    target_hint: Option<u32>,
) -> Option<(usize, &'static str)> {
    // Logical numbers are 1-based; source ids are 0-based.
    let source_id = logical_number.saturating_sub(1);
    by_ranked_uid(paths, source_id, ranked_uid)
        .map(|i| (i, "uid-target"))
        .or_else(|| by_source_id(paths, source_id, target_hint).map(|i| (i, "source-id")))
        .or_else(|| by_target_hint(paths, target_hint).map(|i| (i, "target-hint")))
        .or_else(|| by_direct_index(paths, source_id).map(|i| (i, "direct-index")))
        .or_else(|| by_wrapped_index(paths, source_id).map(|i| (i, "wrapped-index")))
}

/// Find the path for a logical display.
///
/// `ranked_uid` is the hardware UID the identity resolver ranks at this
/// logical number; `target_hint` is a previously observed target id, if
/// any. Either may be absent.
pub fn find_display_path(
    paths: &[PathInfo],
    logical_number: u32,
    ranked_uid: Option<u32>,
    target_hint: Option<u32>,
) -> Result<PathMatch, EngineError> {
    if paths.is_empty() {
        return Err(EngineError::NoPaths);
    }
    let (index, tier) = run_tiers(paths, logical_number, ranked_uid, target_hint)
        .ok_or(EngineError::InvalidPath)?;
    debug!(
        "path finder: display {} resolved to path[{}] via {}",
        logical_number, index, tier
    );
    Ok(PathMatch { index, path: paths[index] })
}

/// Find the path for a display that is expected to be inactive.
///
/// Runs the same ladder but, within every tier, candidates with
/// `flags == 0` or `target_available == 0` sort first. Enabling an
/// already-active edge is a no-op; the inactive one is the edge worth
/// rewriting.
pub fn find_inactive_display_path(
    paths: &[PathInfo],
    logical_number: u32,
    ranked_uid: Option<u32>,
    target_hint: Option<u32>,
) -> Result<PathMatch, EngineError> {
    if paths.is_empty() {
        return Err(EngineError::NoPaths);
    }

    // Stable partition: inactive candidates keep their relative order and
    // are tried first, so tier ordering and tie-breaks are preserved
    // within each half.
    let mut reordered: Vec<usize> = (0..paths.len())
        .filter(|&i| looks_inactive(&paths[i]))
        .collect();
    reordered.extend((0..paths.len()).filter(|&i| !looks_inactive(&paths[i])));

    let view: Vec<PathInfo> = reordered.iter().map(|&i| paths[i]).collect();
    let (view_index, tier) = run_tiers(&view, logical_number, ranked_uid, target_hint)
        .ok_or(EngineError::InvalidPath)?;
    let index = reordered[view_index];
    debug!(
        "path finder: inactive display {} resolved to path[{}] via {}",
        logical_number, index, tier
    );
    Ok(PathMatch { index, path: paths[index] })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::constants::DISPLAYCONFIG_PATH_ACTIVE;

    fn path(source_id: u32, target_id: u32, flags: u32, available: u32) -> PathInfo {
        let mut p = PathInfo::default();
        p.source_info.id = source_id;
        p.target_info.id = target_id;
        p.target_info.target_available = available;
        p.flags = flags;
        p
    }

    const ACTIVE: u32 = DISPLAYCONFIG_PATH_ACTIVE;

    #[test]
    fn empty_array_is_no_paths() {
        assert!(matches!(
            find_display_path(&[], 1, Some(100), None),
            Err(EngineError::NoPaths)
        ));
    }

    #[test]
    fn tier1_uid_wins_and_prefers_matching_source() {
        // Two paths share the target UID; the one with source id 2 must win
        // for logical display 3 even though it comes later.
        let paths = [
            path(0, 100, ACTIVE, 1),
            path(7, 176389, 0, 0),
            path(2, 176389, 0, 0),
        ];
        let found = find_display_path(&paths, 3, Some(176389), None).unwrap();
        assert_eq!(found.index, 2);
    }

    #[test]
    fn tier1_falls_back_to_first_uid_match() {
        let paths = [path(5, 220, 0, 0), path(9, 220, 0, 0)];
        let found = find_display_path(&paths, 3, Some(220), None).unwrap();
        assert_eq!(found.index, 0);
    }

    #[test]
    fn tier2_source_id_with_target_hint_sorting() {
        // No path carries the ranked UID, so tier 1 misses. Two paths have
        // source id 1; the hint promotes the exact target match.
        let paths = [
            path(1, 300, ACTIVE, 1),
            path(1, 400, 0, 0),
            path(0, 500, ACTIVE, 1),
        ];
        let found = find_display_path(&paths, 2, Some(999), Some(400)).unwrap();
        assert_eq!(found.index, 1);

        // Without the hint the earliest source match wins.
        let found = find_display_path(&paths, 2, Some(999), None).unwrap();
        assert_eq!(found.index, 0);
    }

    #[test]
    fn tier3_target_hint_alone() {
        // Neither the UID nor the source id resolves; only the hint does.
        let paths = [path(8, 300, ACTIVE, 1), path(9, 400, 0, 0)];
        let found = find_display_path(&paths, 3, Some(111), Some(400)).unwrap();
        assert_eq!(found.index, 1);
    }

    #[test]
    fn tier4_direct_index() {
        let paths = [path(8, 0, 0, 0), path(9, 0, 0, 0), path(10, 0, 0, 0)];
        let found = find_display_path(&paths, 2, None, None).unwrap();
        assert_eq!(found.index, 1);
    }

    #[test]
    fn tier5_wrapped_index() {
        let paths = [path(8, 0, 0, 0), path(9, 0, 0, 0)];
        // logical 5 -> source id 4 -> 4 % 2 == 0
        let found = find_display_path(&paths, 5, None, None).unwrap();
        assert_eq!(found.index, 0);
    }

    #[test]
    fn inactive_variant_prefers_dormant_paths() {
        // Both paths match the UID, but the active one comes first; the
        // inactive finder must pick the dormant edge.
        let paths = [path(2, 176389, ACTIVE, 1), path(2, 176389, 0, 0)];
        let found = find_inactive_display_path(&paths, 3, Some(176389), None).unwrap();
        assert_eq!(found.index, 1);

        let plain = find_display_path(&paths, 3, Some(176389), None).unwrap();
        assert_eq!(plain.index, 0);
    }

    #[test]
    fn inactive_variant_still_finds_active_when_nothing_dormant() {
        let paths = [path(0, 100, ACTIVE, 1), path(1, 200, ACTIVE, 1)];
        let found = find_inactive_display_path(&paths, 2, Some(200), None).unwrap();
        assert_eq!(found.index, 1);
    }

    #[test]
    fn scenario_enable_third_display() {
        // Inventory UIDs {100, 176389, 220} sorted ascending put 176389
        // last, so it is logical display 3. Its path reports source id 2,
        // flags 0 and an unavailable target.
        let paths = [
            path(0, 100, ACTIVE, 1),
            path(1, 220, ACTIVE, 1),
            path(2, 176389, 0, 0),
        ];
        let found = find_inactive_display_path(&paths, 3, Some(176389), Some(176389)).unwrap();
        assert_eq!(found.index, 2);
        assert!(!found.path.is_active());
    }
}
