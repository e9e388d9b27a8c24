//! The enablement state machine.
//!
//! Enabling a display that Windows reports as "connected but off" is not
//! one API call; drivers disagree about which one works. The machine runs
//! an ordered set of strategies, validates the observable state after
//! each, records the outcome, and stops at the first strategy whose side
//! effect both applied cleanly and validated.

pub mod strategies;
pub mod tracking;

use std::time::{Instant, SystemTime};

use log::{debug, info, warn};

use crate::ccd::api::{query_display_config, set_display_config};
use crate::ccd::paths::find_display_path;
use crate::ccd::query::query_active_paths;
use crate::engine::EngineConfig;
use crate::error::{map_change_result, EngineError};
use crate::identity::DisplayMapping;
use crate::modes;
use crate::platform::constants::*;
use crate::platform::devmode::{
    change_display_settings, enum_display_device, reset_display_settings, DeviceMode,
};
use crate::platform::monitors::enumerate_monitor_bounds;
use crate::state_cache::{PreservedState, StateCache};
use strategies::StrategyContext;
use tracking::{PerformanceTracker, StrategyResult};

/// The three independent views of whether a display is enabled. `None`
/// means the signal could not be obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationSignals {
    /// The bounds detector has a rectangle for the device.
    pub bounds: Option<bool>,
    /// Adapter enumeration reports the device attached to the desktop.
    pub adapter: Option<bool>,
    /// An active topology path with the display's source id exists.
    pub topology: Option<bool>,
}

/// Majority vote over the available signals.
///
/// A lone signal is taken as the truth. A 1-1 split does not confirm the
/// display as enabled.
pub fn consensus(signals: &ValidationSignals) -> Option<bool> {
    let votes: Vec<bool> = [signals.bounds, signals.adapter, signals.topology]
        .into_iter()
        .flatten()
        .collect();
    if votes.is_empty() {
        return None;
    }
    let trues = votes.iter().filter(|&&v| v).count();
    Some(trues * 2 > votes.len())
}

/// Consensus with the bounds override applied.
///
/// CCD will happily report a path as active while the desktop has no
/// rectangle for the device; when `trust_bounds_over_ccd` is set, that
/// combination reads as disabled regardless of the vote.
pub fn effective_state(signals: &ValidationSignals, trust_bounds_over_ccd: bool) -> Option<bool> {
    if trust_bounds_over_ccd
        && signals.topology == Some(true)
        && signals.bounds == Some(false)
    {
        return Some(false);
    }
    consensus(signals)
}

/// Probe all three signal sources for one display.
pub(crate) fn gather_signals(mapping: &DisplayMapping) -> ValidationSignals {
    let bounds = match enumerate_monitor_bounds() {
        Ok(map) => Some(map.contains_key(&mapping.adapter_device_name)),
        Err(_) => None,
    };

    let adapter = {
        let mut index = 0;
        let mut seen_any = false;
        let mut found = None;
        while let Some(device) = enum_display_device(None, index, 0) {
            seen_any = true;
            if device.device_name() == mapping.adapter_device_name {
                found = Some(device.is_attached_to_desktop());
                break;
            }
            index += 1;
        }
        match (seen_any, found) {
            (false, _) => None,
            (true, Some(attached)) => Some(attached),
            (true, None) => Some(false),
        }
    };

    let topology = match query_display_config(QDC_ALL_PATHS) {
        Ok(snapshot) => {
            let source_id = mapping.logical_number.saturating_sub(1);
            Some(snapshot.paths.iter().any(|p| {
                p.source_info.id == source_id
                    && p.is_active()
                    && p.target_info.target_available == 1
            }))
        }
        Err(_) => None,
    };

    ValidationSignals { bounds, adapter, topology }
}

/// Poll the consensus until it confirms the display enabled or the
/// configured attempts run out.
pub(crate) fn validate_enabled(mapping: &DisplayMapping, config: &EngineConfig) -> bool {
    for attempt in 0..config.validation_attempts {
        let signals = gather_signals(mapping);
        let state = effective_state(&signals, config.trust_bounds_over_ccd);
        debug!(
            "validate {} attempt {}: bounds={:?} adapter={:?} topology={:?} -> {:?}",
            mapping.logical_id, attempt, signals.bounds, signals.adapter, signals.topology, state
        );
        if state == Some(true) {
            return true;
        }
        if attempt + 1 < config.validation_attempts {
            std::thread::sleep(config.validation_delay);
        }
    }
    false
}

/// Run the strategy ladder until one enables the display.
pub(crate) fn enable_display(
    mapping: &DisplayMapping,
    cache: &mut StateCache,
    tracker: &PerformanceTracker,
    config: &EngineConfig,
) -> Result<(), EngineError> {
    let order = tracker.recommended_order();
    let ctx = StrategyContext { mapping, cached: cache.get(&mapping.logical_id) };
    let mut failures: Vec<(String, String)> = Vec::new();

    for (attempt_index, strategy) in order.into_iter().enumerate() {
        let started = Instant::now();
        let outcome = strategies::execute(strategy, &ctx);

        let (success, error) = match outcome {
            Ok(()) => {
                if validate_enabled(mapping, config) {
                    (true, None)
                } else {
                    (false, Some("applied cleanly but validation did not confirm the display".to_string()))
                }
            }
            Err(err) => (false, Some(err.to_string())),
        };

        tracker.record(StrategyResult {
            strategy,
            operation: "enable".to_string(),
            logical_id: mapping.logical_id.clone(),
            success,
            duration: started.elapsed(),
            error: error.clone(),
            attempt_index: attempt_index as u32,
            timestamp: SystemTime::now(),
        });

        if success {
            info!("{} enabled via {}", mapping.logical_id, strategy);
            cache.clear(&mapping.logical_id);
            return Ok(());
        }
        let message = error.unwrap_or_default();
        warn!("enable {}: {} failed: {}", mapping.logical_id, strategy, message);
        failures.push((strategy.name().to_string(), message));
    }

    Err(EngineError::AllStrategiesExhausted(failures))
}

/// Disable a display, capturing its state first so a later enable can
/// restore it.
pub(crate) fn disable_display(
    mapping: &DisplayMapping,
    cache: &mut StateCache,
) -> Result<(), EngineError> {
    match modes::current_settings(&mapping.adapter_device_name) {
        Ok((mode, position, orientation)) => {
            cache.save(
                &mapping.logical_id,
                PreservedState {
                    resolution: mode.resolution,
                    refresh_hz: mode.refresh_hz,
                    orientation: orientation.encode(),
                    position,
                },
            );
        }
        Err(err) => {
            warn!("{}: could not capture state before disable: {}", mapping.logical_id, err);
        }
    }

    let snapshot = query_active_paths()?;
    let found = find_display_path(
        &snapshot.paths,
        mapping.logical_number,
        Some(mapping.uid),
        Some(mapping.uid),
    )?;

    // Preferred: drop the path from the active set entirely.
    let mut kept: Vec<_> = snapshot
        .paths
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != found.index)
        .map(|(_, p)| *p)
        .collect();
    let mut kept_modes = snapshot.modes.clone();
    match set_display_config(&mut kept, &mut kept_modes, SDC_APPLY_SUPPLIED) {
        Ok(()) => {
            info!("{} disabled (path removed from active set)", mapping.logical_id);
            return Ok(());
        }
        Err(err) => {
            warn!("disable {}: path removal failed: {}", mapping.logical_id, err);
        }
    }

    // Fallback: keep the path but clear its flags.
    let mut paths = snapshot.paths.clone();
    let mut modes_copy = snapshot.modes.clone();
    paths[found.index].flags = 0;
    match set_display_config(&mut paths, &mut modes_copy, SDC_APPLY_SUPPLIED) {
        Ok(()) => {
            info!("{} disabled (path flags cleared)", mapping.logical_id);
            return Ok(());
        }
        Err(err) => {
            warn!("disable {}: flag clearing failed: {}", mapping.logical_id, err);
        }
    }

    // Last resort: the legacy detach, a mode with no dimensions staged in
    // the registry followed by a global reset.
    let mut devmode = DeviceMode::for_query();
    devmode.fields = DM_PELSWIDTH | DM_PELSHEIGHT | DM_POSITION;
    map_change_result(change_display_settings(
        Some(&mapping.adapter_device_name),
        Some(&devmode),
        CDS_UPDATEREGISTRY | CDS_NORESET,
    ))?;
    map_change_result(reset_display_settings())?;
    info!("{} disabled (legacy detach)", mapping.logical_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(
        bounds: Option<bool>,
        adapter: Option<bool>,
        topology: Option<bool>,
    ) -> ValidationSignals {
        ValidationSignals { bounds, adapter, topology }
    }

    #[test]
    fn no_signals_means_no_verdict() {
        assert_eq!(consensus(&signals(None, None, None)), None);
    }

    #[test]
    fn single_signal_is_the_truth() {
        assert_eq!(consensus(&signals(Some(true), None, None)), Some(true));
        assert_eq!(consensus(&signals(None, Some(false), None)), Some(false));
    }

    #[test]
    fn two_of_three_majority() {
        assert_eq!(
            consensus(&signals(Some(true), Some(true), Some(false))),
            Some(true)
        );
        assert_eq!(
            consensus(&signals(Some(false), Some(false), Some(true))),
            Some(false)
        );
    }

    #[test]
    fn split_pair_does_not_confirm() {
        assert_eq!(consensus(&signals(Some(true), Some(false), None)), Some(false));
    }

    #[test]
    fn bounds_override_beats_ccd_optimism() {
        // CCD and adapter both claim active; bounds has no rectangle. The
        // majority says enabled, the override says no.
        let s = signals(Some(false), Some(true), Some(true));
        assert_eq!(consensus(&s), Some(true));
        assert_eq!(effective_state(&s, true), Some(false));
        assert_eq!(effective_state(&s, false), Some(true));
    }

    #[test]
    fn override_needs_both_signals_present() {
        let s = signals(None, Some(true), Some(true));
        assert_eq!(effective_state(&s, true), Some(true));
    }
}
