//! Error taxonomy for the display engine.
//!
//! OS calls surface their raw numeric results; known driver codes are
//! translated into short, actionable phrasings via [`EngineError::user_message`].

use thiserror::Error;

use crate::types::ParseLogicalIdError;

/// All errors produced by the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A topology path is missing the identifiers required to address it.
    #[error("display path is missing required identifiers")]
    InvalidPath,

    /// The topology query returned zero paths.
    #[error("the system returned no display paths")]
    NoPaths,

    /// The topology query returned paths, none of which carry usable ids.
    #[error("display topology contains no usable path data")]
    InvalidPathData,

    /// `GetDisplayConfigBufferSizes` failed.
    #[error("display configuration buffer size query failed with code {0}")]
    BufferSizeFailed(i32),

    /// `QueryDisplayConfig` failed.
    #[error("display configuration query failed with code {0}")]
    QueryFailed(i32),

    #[error(transparent)]
    BadLogicalId(#[from] ParseLogicalIdError),

    /// No display with the given logical id exists in the current mapping.
    #[error("unknown display `{0}`")]
    UnknownDisplay(String),

    /// The hardware inventory query itself failed (missing individual
    /// records is not an error).
    #[error("hardware inventory unavailable: {0}")]
    HardwareInventoryUnavailable(String),

    /// No monitor device could be correlated with the hardware inventory.
    #[error("no displays could be correlated with the hardware inventory")]
    NoDisplaysFound,

    /// Validation never converged on the display being enabled.
    #[error("display hardware did not respond to any enable strategy")]
    HardwareNotResponding,

    /// Non-success result from an OS call, with the known-code translation.
    #[error("driver error {code}: {description}")]
    DriverError { code: i32, description: String },

    /// Post-application validation could not obtain a consensus in the
    /// allotted attempts.
    #[error("validation could not confirm the display state in time")]
    ValidationTimeout,

    /// The operation requires elevation.
    #[error("permission denied")]
    PermissionDenied,

    /// A pre-flight check rejected the requested configuration before any
    /// OS call was issued.
    #[error("configuration rejected for {setting}={value}: {reason}")]
    ConfigurationFailed {
        setting: String,
        value: String,
        reason: String,
    },

    /// The display device is busy.
    #[error("display device is busy")]
    DeviceBusy,

    /// Every strategy in the ordered set failed; carries the last error
    /// recorded per strategy.
    #[error("all {} enable strategies exhausted", .0.len())]
    AllStrategiesExhausted(Vec<(String, String)>),

    /// An unexpected platform failure not covered by the taxonomy.
    #[error("unexpected error in {source_name}: {message}")]
    Unknown {
        source_name: String,
        message: String,
    },

    /// The engine only drives the Windows display stack.
    #[error("display control is only supported on Windows")]
    Unsupported,
}

impl EngineError {
    /// Short, actionable phrasing for surfacing to end users.
    pub fn user_message(&self) -> String {
        match self {
            EngineError::PermissionDenied => "Access denied. Run as administrator.".to_string(),
            EngineError::DeviceBusy => {
                "The display device is busy. Close other display utilities and retry.".to_string()
            }
            EngineError::HardwareNotResponding => {
                "The display did not respond. Check its cable and power state.".to_string()
            }
            EngineError::AllStrategiesExhausted(_) => {
                "The display could not be enabled. Check its cable and input selection.".to_string()
            }
            EngineError::ConfigurationFailed { setting, value, reason } => {
                format!("Cannot apply {} = {}: {}.", setting, value, reason)
            }
            EngineError::DriverError { description, .. } => description.clone(),
            other => other.to_string(),
        }
    }

    /// Pre-flight rejection helper, used before issuing any OS call.
    pub(crate) fn rejected(setting: &str, value: impl ToString, reason: &str) -> Self {
        EngineError::ConfigurationFailed {
            setting: setting.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Translate a Win32 error code into the taxonomy.
///
/// Access-denied and busy conditions get their own kinds; the rest become
/// `DriverError` with the known-code description.
pub fn driver_error(code: i32) -> EngineError {
    match code {
        5 => EngineError::PermissionDenied,
        170 => EngineError::DeviceBusy,
        _ => EngineError::DriverError {
            code,
            description: describe_driver_code(code).to_string(),
        },
    }
}

/// Human description for the driver error codes the engine knows about.
pub fn describe_driver_code(code: i32) -> &'static str {
    match code {
        5 => "Access denied. Run as administrator.",
        87 => "A parameter passed to the display driver was invalid.",
        170 => "The requested display resource is busy.",
        1004 => "Invalid flags were passed to the display configuration call.",
        1169 => "The display device was not found.",
        1219 => "Multiple connections to the display device conflict.",
        1359 => "An internal display driver error occurred.",
        1450 => "Insufficient system resources to complete the display change.",
        _ => "Unknown display driver error.",
    }
}

/// Human description for a `ChangeDisplaySettingsEx` result code.
pub fn describe_change_result(code: i32) -> &'static str {
    use crate::platform::constants::*;
    match code {
        DISP_CHANGE_SUCCESSFUL => "The settings change was successful.",
        DISP_CHANGE_RESTART => "The computer must be restarted for the mode to work.",
        DISP_CHANGE_FAILED => "The display driver failed the specified graphics mode.",
        DISP_CHANGE_BADMODE => "The graphics mode is not supported.",
        DISP_CHANGE_NOTUPDATED => "Unable to write settings to the registry.",
        DISP_CHANGE_BADFLAGS => "An invalid set of flags was passed in.",
        DISP_CHANGE_BADPARAM => "An invalid parameter was passed in.",
        DISP_CHANGE_BADDUALVIEW => "The settings change was unsuccessful because the system is DualView capable.",
        _ => "Unknown display settings result.",
    }
}

/// Map a `ChangeDisplaySettingsEx` result to the taxonomy.
///
/// `DISP_CHANGE_RESTART` counts as success: the mode was accepted and only
/// takes full effect after a reboot.
pub fn map_change_result(code: i32) -> Result<(), EngineError> {
    use crate::platform::constants::*;
    match code {
        DISP_CHANGE_SUCCESSFUL | DISP_CHANGE_RESTART => Ok(()),
        _ => Err(EngineError::DriverError {
            code,
            description: describe_change_result(code).to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::constants::*;

    #[test]
    fn known_driver_codes_translate() {
        assert!(matches!(driver_error(5), EngineError::PermissionDenied));
        assert!(matches!(driver_error(170), EngineError::DeviceBusy));
        match driver_error(1169) {
            EngineError::DriverError { code, description } => {
                assert_eq!(code, 1169);
                assert!(description.contains("not found"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn restart_counts_as_success() {
        assert!(map_change_result(DISP_CHANGE_SUCCESSFUL).is_ok());
        assert!(map_change_result(DISP_CHANGE_RESTART).is_ok());
        assert!(map_change_result(DISP_CHANGE_BADMODE).is_err());
        assert!(map_change_result(DISP_CHANGE_FAILED).is_err());
    }

    #[test]
    fn user_messages_are_actionable() {
        assert_eq!(
            driver_error(5).user_message(),
            "Access denied. Run as administrator."
        );
        let err = EngineError::rejected("refresh", "75", "not in mode catalog");
        assert_eq!(err.user_message(), "Cannot apply refresh = 75: not in mode catalog.");
    }
}
