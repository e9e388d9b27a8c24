//! Property tests over the pure engine surface: logical-id parsing and
//! position compaction.

use multimon::{compact_positions, parse_logical_id, Position, PositionedDisplay, Resolution};
use proptest::prelude::*;

fn display(id: String, x: i32, y: i32, w: u32, h: u32, primary: bool) -> PositionedDisplay {
    PositionedDisplay {
        logical_id: id,
        position: Position::new(x, y),
        resolution: Resolution::new(w, h),
        is_primary: primary,
    }
}

/// Strategy: a row of up to five side-by-side displays (never
/// overlapping), whose absolute offset may push them out of range.
fn display_row() -> impl Strategy<Value = (Vec<PositionedDisplay>, usize)> {
    (
        prop::collection::vec((640u32..4000, 480u32..3000), 1..5),
        -40_000i32..40_000,
        -20_000i32..20_000,
    )
        .prop_flat_map(|(sizes, base_x, base_y)| {
            let count = sizes.len();
            (Just(sizes), Just(base_x), Just(base_y), 0..count)
        })
        .prop_map(|(sizes, base_x, base_y, primary_index)| {
            let mut displays = Vec::new();
            let mut x = base_x;
            for (i, (w, h)) in sizes.iter().enumerate() {
                displays.push(display(
                    format!("Display{}", i + 1),
                    x,
                    base_y,
                    *w,
                    *h,
                    i == primary_index,
                ));
                x += *w as i32;
            }
            (displays, primary_index)
        })
}

fn overlaps(a: &PositionedDisplay, b: &PositionedDisplay) -> bool {
    a.position.x < b.position.x + b.resolution.width as i32
        && b.position.x < a.position.x + a.resolution.width as i32
        && a.position.y < b.position.y + b.resolution.height as i32
        && b.position.y < a.position.y + a.resolution.height as i32
}

proptest! {
    #[test]
    fn logical_id_parse_round_trips(n in 1u32..100_000) {
        prop_assert_eq!(parse_logical_id(&format!("Display{}", n)).unwrap(), n);
        prop_assert_eq!(parse_logical_id(&format!(r"\\.\DISPLAY{}", n)).unwrap(), n);
    }

    #[test]
    fn compaction_centers_the_primary((displays, primary_index) in display_row()) {
        let compacted = compact_positions(&displays).unwrap();
        prop_assert_eq!(compacted[primary_index].position, Position::new(0, 0));
    }

    #[test]
    fn compaction_restores_the_coordinate_range((displays, _) in display_row()) {
        let compacted = compact_positions(&displays).unwrap();
        for d in &compacted {
            prop_assert!(d.position.x >= -32768);
            prop_assert!(d.position.x + d.resolution.width as i32 <= 32767);
            prop_assert!(d.position.y >= -32768);
            prop_assert!(d.position.y + d.resolution.height as i32 <= 32767);
        }
    }

    #[test]
    fn compaction_preserves_no_overlap((displays, _) in display_row()) {
        let compacted = compact_positions(&displays).unwrap();
        for a in 0..compacted.len() {
            for b in a + 1..compacted.len() {
                prop_assert!(!overlaps(&compacted[a], &compacted[b]));
            }
        }
    }

    #[test]
    fn compaction_keeps_relative_offsets((displays, _) in display_row()) {
        let compacted = compact_positions(&displays).unwrap();
        for window in 0..displays.len().saturating_sub(1) {
            let before = displays[window + 1].position - displays[window].position;
            let after = compacted[window + 1].position - compacted[window].position;
            prop_assert_eq!(before, after);
        }
    }
}
