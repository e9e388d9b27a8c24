//! Last-known display state, captured at disable time so a later enable
//! can restore the configuration the user had.

use std::collections::HashMap;

use log::debug;
use serde::Serialize;

use crate::types::{Position, Resolution};

/// Configuration preserved across a disable/enable cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PreservedState {
    pub resolution: Resolution,
    pub refresh_hz: u32,
    /// Orientation in its integer encoding.
    pub orientation: u32,
    pub position: Position,
}

/// Per-display state cache, keyed by logical id. Written on disable, read
/// on enable, no expiry.
#[derive(Debug, Default)]
pub struct StateCache {
    entries: HashMap<String, PreservedState>,
}

impl StateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn save(&mut self, logical_id: &str, state: PreservedState) {
        debug!(
            "state cache: {} <- {}@{} at {}",
            logical_id, state.resolution, state.refresh_hz, state.position
        );
        self.entries.insert(logical_id.to_string(), state);
    }

    pub fn get(&self, logical_id: &str) -> Option<PreservedState> {
        self.entries.get(logical_id).copied()
    }

    pub fn clear(&mut self, logical_id: &str) {
        self.entries.remove(logical_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> PreservedState {
        PreservedState {
            resolution: Resolution::new(2560, 1440),
            refresh_hz: 144,
            orientation: 1,
            position: Position::new(-2560, 0),
        }
    }

    #[test]
    fn save_get_clear_round_trip() {
        let mut cache = StateCache::new();
        cache.save("Display2", state());
        assert_eq!(cache.get("Display2"), Some(state()));
        assert_eq!(cache.get("Display1"), None);
        cache.clear("Display2");
        assert_eq!(cache.get("Display2"), None);
    }

    #[test]
    fn save_overwrites() {
        let mut cache = StateCache::new();
        cache.save("Display1", state());
        let mut newer = state();
        newer.refresh_hz = 60;
        cache.save("Display1", newer);
        assert_eq!(cache.get("Display1").unwrap().refresh_hz, 60);
    }
}
