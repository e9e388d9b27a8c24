//! Typed access to the Windows display configuration interface.
//!
//! Structure layouts and flag values are declared here so that every layer
//! above compiles (and is testable) on any host; the actual OS calls are
//! gated behind `cfg(windows)` with stub fallbacks, as the rest of the
//! crate expects.

pub mod constants;
pub mod devmode;
pub mod monitors;
