//! Validated topology queries.
//!
//! The raw two-call query can succeed while returning nothing usable
//! (zero paths, or paths whose ids are all zero). The wrappers here turn
//! those cases into typed errors before any path-finding runs on them.

use log::warn;

use super::api::{query_display_config, TopologySnapshot};
use super::types::PathInfo;
use crate::error::EngineError;
use crate::platform::constants::{QDC_ALL_PATHS, QDC_ONLY_ACTIVE_PATHS};

/// Reject snapshots that cannot be addressed by the path finder.
pub fn validate_snapshot(snapshot: &TopologySnapshot) -> Result<(), EngineError> {
    if snapshot.paths.is_empty() {
        return Err(EngineError::NoPaths);
    }
    if !snapshot.paths.iter().any(PathInfo::has_usable_ids) {
        return Err(EngineError::InvalidPathData);
    }
    Ok(())
}

/// Query and validate the topology.
pub fn query_topology(flags: u32) -> Result<TopologySnapshot, EngineError> {
    let snapshot = query_display_config(flags)?;
    if let Err(err) = validate_snapshot(&snapshot) {
        warn!("topology query (flags={:#x}) rejected: {}", flags, err);
        return Err(err);
    }
    Ok(snapshot)
}

/// All paths, including inactive ones (disabled displays appear here).
pub fn query_all_paths() -> Result<TopologySnapshot, EngineError> {
    query_topology(QDC_ALL_PATHS)
}

/// Only the paths that are part of the current desktop.
pub fn query_active_paths() -> Result<TopologySnapshot, EngineError> {
    query_topology(QDC_ONLY_ACTIVE_PATHS)
}
