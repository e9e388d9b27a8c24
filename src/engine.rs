//! The engine handle: every state-mutating operation goes through one
//! `Engine` value, serializing access to the display interface, which is
//! not safely reentrant.

use std::collections::HashMap;
use std::time::Duration;

use log::{debug, warn};

use crate::apply;
use crate::ccd::api::{query_display_config, query_target_name, TopologySnapshot};
use crate::diff;
use crate::enable::{self, tracking::PerformanceTracker, ValidationSignals};
use crate::enable::tracking::{StrategyInsight, StrategyResult};
use crate::error::EngineError;
use crate::hardware;
use crate::identity::{self, DisplayMapping};
use crate::layout::{self, compact_positions, PositionedDisplay};
use crate::modes;
use crate::platform::constants::QDC_ALL_PATHS;
use crate::platform::monitors::{enumerate_monitor_bounds, DisplayBounds};
use crate::state_cache::StateCache;
use crate::types::{
    parse_logical_id, ChangeNotification, DisplayMode, LogicalDisplay, Orientation, Position,
};

/// Tunables of the engine. The defaults match interactive use.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Post-application validation probes per strategy.
    pub validation_attempts: u32,
    /// Delay between validation probes.
    pub validation_delay: Duration,
    /// How long `test_mode` holds the new mode before reverting.
    pub test_mode_duration: Duration,
    /// Capacity of the strategy-result ring.
    pub history_capacity: usize,
    /// Treat "CCD says active but the desktop has no rectangle" as
    /// disabled.
    pub trust_bounds_over_ccd: bool,
    /// Whether strategy telemetry is recorded from the start.
    pub performance_tracking: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            validation_attempts: 5,
            validation_delay: Duration::from_millis(500),
            test_mode_duration: Duration::from_secs(15),
            history_capacity: 500,
            trust_bounds_over_ccd: true,
            performance_tracking: false,
        }
    }
}

/// Per-item results of a best-effort batch operation.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub successes: Vec<String>,
    pub failures: Vec<(String, EngineError)>,
}

/// The display control engine.
///
/// Mutating operations take `&mut self`: callers are expected to hold one
/// engine and serialize changes through it. Reads (`list_displays`, the
/// diagnostics surface) are `&self` and safe to call from an observer.
pub struct Engine {
    config: EngineConfig,
    cache: StateCache,
    tracker: PerformanceTracker,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let tracker = PerformanceTracker::new(config.history_capacity, config.performance_tracking);
        Self { config, cache: StateCache::new(), tracker }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fresh identity mappings. Never cached across operations: the
    /// adapter slot a display occupies may have changed since the last
    /// call.
    fn mappings(&self) -> Result<Vec<DisplayMapping>, EngineError> {
        let inventory = hardware::query_inventory()?;
        identity::resolve_mappings(&inventory)
    }

    fn mapping_for_id<'a>(
        mappings: &'a [DisplayMapping],
        logical_id: &str,
    ) -> Result<&'a DisplayMapping, EngineError> {
        let number = parse_logical_id(logical_id)?;
        identity::mapping_for_number(mappings, number)
    }

    // --- Enumeration ----------------------------------------------------

    /// All displays, enabled and disabled.
    pub fn list_displays(&self) -> Result<Vec<LogicalDisplay>, EngineError> {
        let mappings = self.mappings()?;
        let bounds = enumerate_monitor_bounds().ok();
        let topology = query_display_config(QDC_ALL_PATHS).ok();

        Ok(mappings
            .iter()
            .map(|m| self.build_display(m, bounds.as_ref(), topology.as_ref()))
            .collect())
    }

    fn build_display(
        &self,
        mapping: &DisplayMapping,
        bounds: Option<&HashMap<String, DisplayBounds>>,
        topology: Option<&TopologySnapshot>,
    ) -> LogicalDisplay {
        let device_bounds = bounds.and_then(|map| map.get(&mapping.adapter_device_name));
        let source_id = mapping.logical_number.saturating_sub(1);

        let signals = ValidationSignals {
            bounds: bounds.map(|map| map.contains_key(&mapping.adapter_device_name)),
            adapter: Some(mapping.attached_to_desktop),
            topology: topology.map(|snapshot| {
                snapshot.paths.iter().any(|p| {
                    p.source_info.id == source_id
                        && p.is_active()
                        && p.target_info.target_available == 1
                })
            }),
        };
        let is_enabled =
            enable::effective_state(&signals, self.config.trust_bounds_over_ccd).unwrap_or(false);

        let mut display = LogicalDisplay {
            logical_number: mapping.logical_number,
            logical_id: mapping.logical_id.clone(),
            adapter_device_name: mapping.adapter_device_name.clone(),
            friendly_name: mapping.friendly_name.clone(),
            manufacturer: mapping.manufacturer.clone(),
            product: mapping.product.clone(),
            serial: mapping.serial.clone(),
            edid_identifier: mapping.edid_identifier.clone(),
            hardware_uid: mapping.uid,
            is_primary: device_bounds.map(|b| b.is_primary).unwrap_or(false),
            is_enabled,
            is_attached: true,
            bits_per_pixel: 32,
            ..Default::default()
        };

        // The CCD target name is the one users recognize; the GDI device
        // string is usually a generic placeholder.
        if let Some(snapshot) = topology {
            if let Some(name) = ccd_friendly_name(snapshot, mapping.uid) {
                if !name.is_empty() {
                    display.friendly_name = name;
                }
            }
        }

        if is_enabled {
            if let Ok((mode, position, orientation)) =
                modes::current_settings(&mapping.adapter_device_name)
            {
                display.resolution = mode.resolution;
                display.refresh_hz = mode.refresh_hz;
                display.bits_per_pixel = mode.bits_per_pixel;
                display.position = position;
                display.orientation = orientation;
            }
        } else if let Some(cached) = self.cache.get(&mapping.logical_id) {
            // Last-known values, so clients can preview what re-enabling
            // would restore.
            display.resolution = cached.resolution;
            display.refresh_hz = cached.refresh_hz;
            display.position = cached.position;
            display.orientation =
                Orientation::from_encoded(cached.orientation).unwrap_or_default();
        }

        match modes::capabilities(&mapping.adapter_device_name, is_enabled) {
            Ok(capabilities) => display.capabilities = capabilities,
            Err(err) => debug!("{}: no mode catalog: {}", mapping.logical_id, err),
        }

        display
    }

    // --- Enable / disable ----------------------------------------------

    /// Enable or disable a display.
    ///
    /// A request matching the current state is a no-op. Enabling runs the
    /// strategy ladder; disabling captures the display's state first so a
    /// later enable restores it.
    pub fn set_enabled(&mut self, logical_id: &str, enabled: bool) -> Result<(), EngineError> {
        let mappings = self.mappings()?;
        let mapping = Self::mapping_for_id(&mappings, logical_id)?.clone();

        let signals = enable::gather_signals(&mapping);
        let current = enable::effective_state(&signals, self.config.trust_bounds_over_ccd);
        if current == Some(enabled) {
            debug!(
                "{} already {}, nothing to do",
                mapping.logical_id,
                if enabled { "enabled" } else { "disabled" }
            );
            return Ok(());
        }

        if enabled {
            enable::enable_display(&mapping, &mut self.cache, &self.tracker, &self.config)
        } else {
            enable::disable_display(&mapping, &mut self.cache)
        }
    }

    // --- Mode and orientation ------------------------------------------

    pub fn apply_mode(
        &mut self,
        logical_id: &str,
        mode: DisplayMode,
        orientation: Orientation,
    ) -> Result<(), EngineError> {
        let mappings = self.mappings()?;
        let mapping = Self::mapping_for_id(&mappings, logical_id)?;
        apply::apply_display_mode(mapping, mode, orientation)
    }

    pub fn set_orientation(
        &mut self,
        logical_id: &str,
        orientation: Orientation,
    ) -> Result<(), EngineError> {
        let mappings = self.mappings()?;
        let mapping = Self::mapping_for_id(&mappings, logical_id)?;
        apply::apply_display_orientation(mapping, orientation)
    }

    /// Apply a mode, hold it for the configured test duration, revert,
    /// then invoke `on_complete`.
    pub fn test_mode<F: FnOnce()>(
        &mut self,
        logical_id: &str,
        mode: DisplayMode,
        orientation: Orientation,
        on_complete: F,
    ) -> Result<(), EngineError> {
        let mappings = self.mappings()?;
        let mapping = Self::mapping_for_id(&mappings, logical_id)?;
        let result =
            apply::test_display_mode(mapping, mode, orientation, self.config.test_mode_duration);
        on_complete();
        result
    }

    // --- Positioning ----------------------------------------------------

    /// Move one display; runs the full compaction pipeline with a
    /// single-element change.
    pub fn set_position(&mut self, logical_id: &str, position: Position) -> Result<(), EngineError> {
        parse_logical_id(logical_id)?;
        self.apply_positions(&[(logical_id.to_string(), position)])
    }

    /// Position several displays at once. Unknown ids are skipped with a
    /// warning; the remaining set is compacted and applied atomically.
    pub fn apply_positions(
        &mut self,
        requests: &[(String, Position)],
    ) -> Result<(), EngineError> {
        let displays = self.list_displays()?;
        let mut items = Vec::new();
        for (logical_id, position) in requests {
            // Accept the legacy adapter-style id form by matching on the
            // parsed number rather than the literal string.
            let display = parse_logical_id(logical_id)
                .ok()
                .and_then(|n| displays.iter().find(|d| d.logical_number == n));
            match display {
                Some(display) => items.push(PositionedDisplay {
                    logical_id: display.logical_id.clone(),
                    position: *position,
                    resolution: display.resolution,
                    is_primary: display.is_primary,
                }),
                None => warn!("apply positions: unknown display {}, skipping", logical_id),
            }
        }
        self.apply_positions_with_info(&items)
    }

    /// Position displays using caller-supplied geometry.
    pub fn apply_positions_with_info(
        &mut self,
        items: &[PositionedDisplay],
    ) -> Result<(), EngineError> {
        let compacted = compact_positions(items)?;
        if compacted.is_empty() {
            return Ok(());
        }
        let mappings = self.mappings()?;
        layout::apply_positions_atomic(&compacted, &mappings)
    }

    /// Make a display the primary.
    ///
    /// Every enabled display is repositioned in the same transaction so
    /// the new primary lands at (0,0) without overlaps.
    pub fn set_primary(&mut self, logical_id: &str) -> Result<(), EngineError> {
        let number = parse_logical_id(logical_id)?;
        let displays = self.list_displays()?;
        let target = displays
            .iter()
            .find(|d| d.logical_number == number)
            .ok_or_else(|| EngineError::UnknownDisplay(logical_id.to_string()))?;
        if !target.is_enabled {
            return Err(EngineError::rejected(
                "primary",
                logical_id,
                "display is not enabled",
            ));
        }

        let items: Vec<PositionedDisplay> = displays
            .iter()
            .filter(|d| d.is_enabled)
            .map(|d| PositionedDisplay {
                logical_id: d.logical_id.clone(),
                position: d.position,
                resolution: d.resolution,
                is_primary: d.logical_number == number,
            })
            .collect();
        self.apply_positions_with_info(&items)
    }

    // --- Batch helpers --------------------------------------------------

    /// Best-effort batch enable/disable; never short-circuits.
    pub fn batch_set_enabled(&mut self, requests: &[(String, bool)]) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for (logical_id, enabled) in requests {
            match self.set_enabled(logical_id, *enabled) {
                Ok(()) => outcome.successes.push(logical_id.clone()),
                Err(err) => outcome.failures.push((logical_id.clone(), err)),
            }
        }
        outcome
    }

    pub fn batch_apply_modes(
        &mut self,
        requests: &[(String, DisplayMode, Orientation)],
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for (logical_id, mode, orientation) in requests {
            match self.apply_mode(logical_id, *mode, *orientation) {
                Ok(()) => outcome.successes.push(logical_id.clone()),
                Err(err) => outcome.failures.push((logical_id.clone(), err)),
            }
        }
        outcome
    }

    pub fn batch_apply_orientations(
        &mut self,
        requests: &[(String, Orientation)],
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for (logical_id, orientation) in requests {
            match self.set_orientation(logical_id, *orientation) {
                Ok(()) => outcome.successes.push(logical_id.clone()),
                Err(err) => outcome.failures.push((logical_id.clone(), err)),
            }
        }
        outcome
    }

    // --- Observer feed --------------------------------------------------

    /// Diff two enumeration passes. Pure; exposed for the external
    /// change-notification poller.
    pub fn detect_changes(
        previous: &[LogicalDisplay],
        current: &[LogicalDisplay],
    ) -> Vec<ChangeNotification> {
        diff::detect_changes(previous, current)
    }

    // --- Diagnostics ----------------------------------------------------

    pub fn enable_performance_tracking(&self, enabled: bool) {
        self.tracker.set_enabled(enabled);
    }

    pub fn performance_tracking_enabled(&self) -> bool {
        self.tracker.is_enabled()
    }

    /// Multi-line report over the recorded strategy telemetry.
    pub fn generate_performance_report(&self) -> String {
        self.tracker.report()
    }

    pub fn strategy_history(&self) -> Vec<StrategyResult> {
        self.tracker.snapshot()
    }

    pub fn strategy_insights(&self) -> Vec<StrategyInsight> {
        self.tracker.insights()
    }

    pub fn export_history_json(&self) -> Result<String, EngineError> {
        self.tracker.export_history_json()
    }

    pub fn purge_history(&self) {
        self.tracker.purge();
    }
}

/// The friendly name CCD reports for a hardware UID, if the topology
/// knows the target.
fn ccd_friendly_name(snapshot: &TopologySnapshot, uid: u32) -> Option<String> {
    let path = snapshot.paths.iter().find(|p| p.target_info.id == uid)?;
    let name = query_target_name(path.target_info.adapter_id, uid)?;
    Some(name.friendly_name())
}
