//! DAC driver seam

/// Which per-channel calibration table is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationVariant {
    /// Factory table shipped with the module.
    Default,
    /// Table learned by the autotuner.
    Auto,
}

/// Hardware seam for the quad pitch DAC.
///
/// The autotuner drives raw codes and the per-channel calibration
/// tables exclusively through this trait; it never reads or writes
/// calibration memory itself. Each table entry is a single word-sized
/// store, so the normal output path tolerates mid-commit updates.
pub trait DacDriver {
    /// Unbuffered write of a raw code to one channel.
    fn set(&mut self, channel: usize, code: i32);

    /// Factory-calibrated code for one octave anchor.
    fn default_calibrated_code(&self, channel: usize, octave: usize) -> i32;

    /// Select the factory table as the live calibration.
    fn set_default_channel_calibration(&mut self, channel: usize);

    /// Select the learned table as the live calibration.
    fn set_auto_channel_calibration(&mut self, channel: usize);

    /// Mutate one entry of the learned table.
    fn update_auto_channel_calibration(&mut self, channel: usize, octave: usize, code: i32);

    /// Which table is currently live.
    fn calibration_data_used(&self, channel: usize) -> CalibrationVariant;
}
