//! The enable strategies.
//!
//! Every strategy takes the same input and reports a typed result; the
//! state machine owns ordering, validation and bookkeeping. A strategy
//! returning `Ok` only means its side effect executed cleanly - the
//! display is not considered enabled until validation agrees.

use std::time::Duration;

use log::{debug, warn};

use super::tracking::EnableStrategy;
use crate::ccd::api::{set_display_config, set_display_config_empty, TopologySnapshot};
use crate::ccd::paths::{find_display_path, find_inactive_display_path, PathMatch};
use crate::ccd::query::query_all_paths;
use crate::ccd::types::{ModeInfo, PointL, Rational, Region2D, SourceMode, TargetMode};
use crate::error::{map_change_result, EngineError};
use crate::identity::DisplayMapping;
use crate::modes;
use crate::platform::constants::*;
use crate::platform::devmode::{change_display_settings, reset_display_settings, DeviceMode};
use crate::platform::monitors::enumerate_monitor_bounds;
use crate::state_cache::PreservedState;
use crate::types::{DisplayMode, Position};

/// Input shared by all strategies.
pub(crate) struct StrategyContext<'a> {
    pub mapping: &'a DisplayMapping,
    /// State captured when the display was last disabled, if any.
    pub cached: Option<PreservedState>,
}

/// Run one strategy.
pub(crate) fn execute(strategy: EnableStrategy, ctx: &StrategyContext<'_>) -> Result<(), EngineError> {
    debug!("enable {}: running {}", ctx.mapping.logical_id, strategy);
    match strategy {
        EnableStrategy::CcdTargeted => ccd_targeted(ctx),
        EnableStrategy::CcdModePopulation => ccd_mode_population(ctx),
        EnableStrategy::CcdMinimalPaths => ccd_minimal_paths(ctx),
        EnableStrategy::CcdDirectPath => ccd_direct_path(ctx),
        EnableStrategy::CcdTopologyExtend => ccd_topology_extend(),
        EnableStrategy::DevmodeDirect => devmode_direct(ctx),
        EnableStrategy::DevmodeWithReset => devmode_with_reset(ctx),
        EnableStrategy::HardwareReset => hardware_reset(),
        EnableStrategy::DisplaySwitchFallback => display_switch_fallback(),
    }
}

fn locate_inactive(
    snapshot: &TopologySnapshot,
    mapping: &DisplayMapping,
) -> Result<PathMatch, EngineError> {
    find_inactive_display_path(
        &snapshot.paths,
        mapping.logical_number,
        Some(mapping.uid),
        Some(mapping.uid),
    )
}

/// Activate the located path within the full queried arrays and commit.
fn ccd_targeted(ctx: &StrategyContext<'_>) -> Result<(), EngineError> {
    let mut snapshot = query_all_paths()?;
    let found = locate_inactive(&snapshot, ctx.mapping)?;
    snapshot.paths[found.index].activate();
    set_display_config(&mut snapshot.paths, &mut snapshot.modes, SDC_APPLY_SUPPLIED)
}

/// Like `ccd_targeted`, but first inject source and target mode records
/// for the path, so the driver is not asked to invent them.
fn ccd_mode_population(ctx: &StrategyContext<'_>) -> Result<(), EngineError> {
    let mut snapshot = query_all_paths()?;
    let found = locate_inactive(&snapshot, ctx.mapping)?;

    let mode = pick_enable_mode(ctx)?;
    let position = ctx
        .cached
        .map(|c| c.position)
        .unwrap_or_else(next_free_position);
    let (source_index, target_index) =
        inject_path_modes(&mut snapshot, found.index, mode, position);
    debug!(
        "mode population: injected source mode[{}] and target mode[{}] ({})",
        source_index, target_index, mode
    );

    snapshot.paths[found.index].activate();
    set_display_config(&mut snapshot.paths, &mut snapshot.modes, SDC_APPLY_SUPPLIED)
}

/// Commit a minimal path array: the currently active paths plus the
/// activated target path, nothing else.
fn ccd_minimal_paths(ctx: &StrategyContext<'_>) -> Result<(), EngineError> {
    let snapshot = query_all_paths()?;
    let found = locate_inactive(&snapshot, ctx.mapping)?;

    let mut kept: Vec<_> = snapshot
        .paths
        .iter()
        .enumerate()
        .filter(|(i, p)| *i == found.index || p.is_active())
        .map(|(_, p)| *p)
        .collect();
    for path in &mut kept {
        if path.target_info.id == found.path.target_info.id
            && path.source_info.id == found.path.source_info.id
        {
            path.activate();
        }
    }
    let mut modes = snapshot.modes;
    set_display_config(&mut kept, &mut modes, SDC_APPLY_SUPPLIED)
}

/// Activate whichever path the plain finder resolves, verbatim.
fn ccd_direct_path(ctx: &StrategyContext<'_>) -> Result<(), EngineError> {
    let mut snapshot = query_all_paths()?;
    let found = find_display_path(
        &snapshot.paths,
        ctx.mapping.logical_number,
        Some(ctx.mapping.uid),
        Some(ctx.mapping.uid),
    )?;
    snapshot.paths[found.index].activate();
    set_display_config(&mut snapshot.paths, &mut snapshot.modes, SDC_APPLY_SUPPLIED)
}

/// Ask the OS to extend the desktop topology on its own terms.
fn ccd_topology_extend() -> Result<(), EngineError> {
    set_display_config_empty(SDC_APPLY | SDC_TOPOLOGY_EXTEND | SDC_ALLOW_CHANGES)
}

/// Restore the cached state (or a best catalog mode) via the legacy
/// change-settings call.
fn devmode_direct(ctx: &StrategyContext<'_>) -> Result<(), EngineError> {
    let devmode = build_enable_devmode(ctx)?;
    let result = change_display_settings(
        Some(&ctx.mapping.adapter_device_name),
        Some(&devmode),
        CDS_UPDATEREGISTRY,
    );
    map_change_result(result)
}

/// Test the mode, stage it in the registry, then issue a global reset.
fn devmode_with_reset(ctx: &StrategyContext<'_>) -> Result<(), EngineError> {
    let devmode = build_enable_devmode(ctx)?;
    let device = Some(ctx.mapping.adapter_device_name.as_str());

    map_change_result(change_display_settings(device, Some(&devmode), CDS_TEST))?;
    map_change_result(change_display_settings(
        device,
        Some(&devmode),
        CDS_UPDATEREGISTRY | CDS_NORESET,
    ))?;
    map_change_result(reset_display_settings())
}

/// Force the adapter to re-enumerate modes, then give it time to settle.
fn hardware_reset() -> Result<(), EngineError> {
    set_display_config_empty(SDC_APPLY | SDC_FORCE_MODE_ENUMERATION | SDC_ALLOW_CHANGES)?;
    std::thread::sleep(Duration::from_secs(2));
    Ok(())
}

/// Last resort: hand the job to the system display utility.
fn display_switch_fallback() -> Result<(), EngineError> {
    use std::process::Command;

    let mut child = Command::new("DisplaySwitch.exe")
        .arg("/extend")
        .spawn()
        .map_err(|e| EngineError::Unknown {
            source_name: "DisplaySwitch.exe".to_string(),
            message: e.to_string(),
        })?;

    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    let status = loop {
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) if std::time::Instant::now() < deadline => {
                std::thread::sleep(Duration::from_millis(100));
            }
            Ok(None) => {
                warn!("DisplaySwitch.exe did not exit within 5s");
                let _ = child.kill();
                return Err(EngineError::ValidationTimeout);
            }
            Err(e) => {
                return Err(EngineError::Unknown {
                    source_name: "DisplaySwitch.exe".to_string(),
                    message: e.to_string(),
                })
            }
        }
    };
    if !status.success() {
        return Err(EngineError::Unknown {
            source_name: "DisplaySwitch.exe".to_string(),
            message: format!("exited with {}", status),
        });
    }
    // Give the desktop time to re-arrange before validation probes it.
    std::thread::sleep(Duration::from_secs(3));
    Ok(())
}

/// The mode a strategy should enable the display with: cached state
/// first, then the catalog's best pick.
fn pick_enable_mode(ctx: &StrategyContext<'_>) -> Result<DisplayMode, EngineError> {
    if let Some(cached) = ctx.cached {
        return Ok(DisplayMode {
            resolution: cached.resolution,
            refresh_hz: cached.refresh_hz,
            bits_per_pixel: 32,
        });
    }
    let catalog = modes::enumerate_modes(&ctx.mapping.adapter_device_name)?;
    modes::best_available_mode(&catalog).ok_or_else(|| {
        EngineError::rejected("mode", &ctx.mapping.logical_id, "mode catalog is empty")
    })
}

/// Position for a display being enabled without cached state: directly to
/// the right of the rightmost enabled display, or the origin when nothing
/// is enabled.
fn next_free_position() -> Position {
    match enumerate_monitor_bounds() {
        Ok(bounds) if !bounds.is_empty() => {
            let right_edge = bounds
                .values()
                .map(|b| b.position.x + b.width as i32)
                .max()
                .unwrap_or(0);
            Position::new(right_edge, 0)
        }
        _ => Position::new(0, 0),
    }
}

/// Append source and target mode entries for a path and point the path's
/// mode indices at them.
fn inject_path_modes(
    snapshot: &mut TopologySnapshot,
    path_index: usize,
    mode: DisplayMode,
    position: Position,
) -> (usize, usize) {
    let path = snapshot.paths[path_index];
    let width = mode.resolution.width;
    let height = mode.resolution.height;

    let mut source_entry = ModeInfo {
        id: path.source_info.id,
        adapter_id: path.source_info.adapter_id,
        ..Default::default()
    };
    source_entry.set_source_mode(&SourceMode {
        width,
        height,
        pixel_format: PIXELFORMAT_32BPP,
        position: PointL { x: position.x, y: position.y },
    });

    let mut target_entry = ModeInfo {
        id: path.target_info.id,
        adapter_id: path.target_info.adapter_id,
        ..Default::default()
    };
    target_entry.set_target_mode(&TargetMode {
        target_video_signal_info: crate::ccd::types::VideoSignalInfo {
            pixel_rate: u64::from(width) * u64::from(height) * u64::from(mode.refresh_hz),
            h_sync_freq: Rational {
                numerator: mode.refresh_hz * height,
                denominator: 1,
            },
            v_sync_freq: Rational { numerator: mode.refresh_hz, denominator: 1 },
            active_size: Region2D { cx: width, cy: height },
            total_size: Region2D { cx: width, cy: height },
            video_standard: VIDEO_STANDARD_OTHER,
            scan_line_ordering: SCANLINE_ORDERING_PROGRESSIVE,
        },
    });

    let source_index = snapshot.modes.len();
    snapshot.modes.push(source_entry);
    let target_index = snapshot.modes.len();
    snapshot.modes.push(target_entry);

    let path = &mut snapshot.paths[path_index];
    path.source_info.mode_info_idx = source_index as u32;
    path.target_info.mode_info_idx = target_index as u32;
    (source_index, target_index)
}

/// Devmode used by both legacy strategies: the cached state when one
/// exists, else the best catalog mode placed on free desktop space.
fn build_enable_devmode(ctx: &StrategyContext<'_>) -> Result<DeviceMode, EngineError> {
    let mut devmode = DeviceMode::for_query();
    match ctx.cached {
        Some(cached) => {
            devmode.set_resolution(cached.resolution);
            devmode.set_refresh(cached.refresh_hz);
            devmode.set_position(cached.position);
            devmode.set_orientation(cached.orientation);
        }
        None => {
            let mode = pick_enable_mode(ctx)?;
            devmode.set_resolution(mode.resolution);
            devmode.set_refresh(mode.refresh_hz);
            devmode.set_position(next_free_position());
        }
    }
    Ok(devmode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ccd::types::PathInfo;

    fn snapshot_with_path(source_id: u32, target_id: u32) -> TopologySnapshot {
        let mut path = PathInfo::default();
        path.source_info.id = source_id;
        path.target_info.id = target_id;
        TopologySnapshot { paths: vec![path], modes: Vec::new() }
    }

    #[test]
    fn injected_modes_are_linked_to_the_path() {
        let mut snapshot = snapshot_with_path(2, 176389);
        let (source_index, target_index) = inject_path_modes(
            &mut snapshot,
            0,
            DisplayMode::new(1920, 1080, 60),
            Position::new(3840, 0),
        );

        assert_eq!(snapshot.modes.len(), 2);
        let path = &snapshot.paths[0];
        assert_eq!(path.source_info.mode_info_idx, source_index as u32);
        assert_eq!(path.target_info.mode_info_idx, target_index as u32);

        let source = &snapshot.modes[source_index];
        assert!(source.is_source());
        assert_eq!(source.id, 2);
        let sm = source.as_source_mode();
        assert_eq!((sm.width, sm.height), (1920, 1080));
        assert_eq!(sm.position.x, 3840);

        let target = &snapshot.modes[target_index];
        assert_eq!(target.info_type, MODE_INFO_TYPE_TARGET);
        assert_eq!(target.id, 176389);
        let signal = &target.as_target_mode().target_video_signal_info;
        assert_eq!(signal.v_sync_freq.numerator, 60);
        assert_eq!(signal.active_size.cx, 1920);
    }

    #[test]
    fn cached_state_drives_the_enable_mode() {
        let mapping = DisplayMapping {
            logical_number: 2,
            logical_id: "Display2".to_string(),
            ..Default::default()
        };
        let ctx = StrategyContext {
            mapping: &mapping,
            cached: Some(PreservedState {
                resolution: crate::types::Resolution::new(2560, 1440),
                refresh_hz: 144,
                orientation: 0,
                position: Position::new(-2560, 0),
            }),
        };
        let mode = pick_enable_mode(&ctx).unwrap();
        assert_eq!(mode.resolution, crate::types::Resolution::new(2560, 1440));
        assert_eq!(mode.refresh_hz, 144);

        let devmode = build_enable_devmode(&ctx).unwrap();
        assert_eq!(devmode.pels_width, 2560);
        assert_eq!(devmode.position.x, -2560);
        let expected = DM_PELSWIDTH
            | DM_PELSHEIGHT
            | DM_DISPLAYFREQUENCY
            | DM_DISPLAYFLAGS
            | DM_POSITION
            | DM_DISPLAYORIENTATION;
        assert_eq!(devmode.fields, expected);
    }
}
