//! Engine constants and per-channel tuner configuration

/// Octave spans covered by the calibration range (-3 V through +7 V).
pub const OCTAVES: usize = 10;

/// Calibration points including both endpoints.
pub const CALIBRATION_POINTS: usize = OCTAVES + 1;

/// Index of the 0 V point within the calibration range.
pub const ZERO_VOLT_STEP: usize = 3;

/// Depth of the scrolling history of settled frequency readings.
pub const HISTORY_DEPTH: usize = 10;

/// Nominal averaging window in ISR ticks.
pub const FREQ_MEASURE_TIMEOUT: u32 = 512;

/// Ticks without a fresh frequency sample before an error is latched.
pub const ERROR_TIMEOUT: u32 = FREQ_MEASURE_TIMEOUT * 16;

/// Per-step cap on convergence-loop passes.
pub const MAX_NUM_PASSES: u16 = 1500;

/// Fine-grained corrections required in each direction before a step
/// counts as converged.
pub const CONVERGE_PASSES: u8 = 5;

/// Starting value of the halving factor in the successive-approximation
/// search.
pub const INITIAL_FACTOR: u8 = 0xFF;

/// Ticks between calibration-table writes while committing.
pub const COMMIT_INTERVAL: u32 = 2000;

/// DAC channels driven by one host.
pub const NUM_CHANNELS: usize = 4;

/// Configuration for one autotuner channel
///
/// The defaults match the shipped hardware; `timer_hz` is the rate of
/// the timer the frequency meter counts VCO periods with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TunerConfig {
    /// Rate of the period-counting timer, in Hz
    pub timer_hz: f32,
    /// Nominal averaging window, in ticks
    pub measure_window: u32,
    /// Ticks without a fresh sample before an error is latched
    pub error_timeout: u32,
    /// Per-step convergence-loop cap
    pub max_passes: u16,
    /// Fine corrections per direction required for convergence
    pub converge_passes: u8,
    /// Starting halving factor
    pub initial_factor: u8,
    /// Ticks between table writes during commit
    pub commit_interval: u32,
}

impl Default for TunerConfig {
    fn default() -> Self {
        Self {
            timer_hz: 16_000_000.0,
            measure_window: FREQ_MEASURE_TIMEOUT,
            error_timeout: ERROR_TIMEOUT,
            max_passes: MAX_NUM_PASSES,
            converge_passes: CONVERGE_PASSES,
            initial_factor: INITIAL_FACTOR,
            commit_interval: COMMIT_INTERVAL,
        }
    }
}

impl TunerConfig {
    /// Create a new configuration with validation
    pub fn new(timer_hz: f32) -> Result<Self, crate::AutotuneError> {
        if timer_hz <= 0.0 {
            return Err(crate::AutotuneError::InvalidConfiguration);
        }

        Ok(Self { timer_hz, ..Default::default() })
    }

    /// Averaging window while the search is still coarse
    pub fn coarse_window(&self) -> u32 {
        self.measure_window >> 2
    }

    /// Widened averaging window once the search reached unit steps
    pub fn fine_window(&self) -> u32 {
        self.measure_window << 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = TunerConfig::default();
        assert!(config.timer_hz > 0.0);
        assert_eq!(config.error_timeout, config.measure_window * 16);
    }

    #[test]
    fn test_config_validation() {
        assert!(TunerConfig::new(16_000_000.0).is_ok());
        assert!(TunerConfig::new(0.0).is_err());
        assert!(TunerConfig::new(-1.0).is_err());
    }

    #[test]
    fn test_window_ratio() {
        let config = TunerConfig::default();
        // Fine tuning widens the window 16x to cut variance near the target.
        assert_eq!(config.fine_window(), config.coarse_window() * 16);
    }
}
