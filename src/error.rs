//! Error types for the auto-calibration engine

/// Errors surfaced by the autotuner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutotuneError {
    /// No frequency sample arrived within the error timeout
    NoSignal,
    /// Measured frequency failed the octave-doubling check
    VcoNotTracking,
    /// Another channel is already calibrating
    CalibrationBusy,
    /// Channel index out of range
    InvalidChannel,
    /// Configuration parameters are invalid
    InvalidConfiguration,
}

#[cfg(feature = "std")]
impl std::fmt::Display for AutotuneError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AutotuneError::NoSignal => {
                write!(f, "No signal from the frequency meter")
            }
            AutotuneError::VcoNotTracking => {
                write!(f, "VCO is not tracking the octave steps")
            }
            AutotuneError::CalibrationBusy => {
                write!(f, "Another channel is already calibrating")
            }
            AutotuneError::InvalidChannel => {
                write!(f, "Channel index out of range")
            }
            AutotuneError::InvalidConfiguration => {
                write!(f, "Invalid tuner configuration")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for AutotuneError {}
