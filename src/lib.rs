//! multimon - Windows multi-monitor control engine.
//!
//! Discovers connected displays (including ones that are connected but
//! off), assigns them stable logical identifiers anchored to hardware
//! UIDs, and mutates the desktop topology through the CCD interface:
//! enable/disable with a multi-strategy state machine, mode and
//! orientation changes, and atomic multi-display positioning with
//! primary-centered compaction.
//!
//! All mutations go through a single [`Engine`] handle:
//!
//! ```no_run
//! use multimon::{Engine, Position};
//!
//! let mut engine = Engine::new();
//! for display in engine.list_displays()? {
//!     println!("{} {} enabled={}", display.logical_id, display.friendly_name, display.is_enabled);
//! }
//! engine.set_enabled("Display3", true)?;
//! engine.set_primary("Display2")?;
//! engine.set_position("Display1", Position::new(-1920, 0))?;
//! # Ok::<(), multimon::EngineError>(())
//! ```

mod apply;
mod ccd;
mod diff;
mod enable;
mod engine;
mod error;
mod hardware;
mod identity;
mod layout;
mod modes;
pub mod platform;
mod state_cache;
mod types;

pub use diff::detect_changes;
pub use enable::tracking::{
    EnableStrategy, InsightKind, StrategyInsight, StrategyResult, StrategyStats,
};
pub use enable::{consensus, effective_state, ValidationSignals};
pub use engine::{BatchOutcome, Engine, EngineConfig};
pub use error::{describe_driver_code, driver_error, EngineError};
pub use layout::{compact_positions, PositionedDisplay};
pub use state_cache::PreservedState;
pub use types::{
    format_logical_id, parse_logical_id, Capabilities, ChangeNotification, ChangeType,
    DisplayMode, LogicalDisplay, Orientation, ParseLogicalIdError, ParseOrientationError,
    Position, Resolution,
};
