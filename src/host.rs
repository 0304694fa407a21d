//! Four-channel autotuner host

use crate::channel::{AutotunerChannel, ChannelStatus};
use crate::config::{NUM_CHANNELS, TunerConfig};
use crate::dac::DacDriver;
use crate::error::AutotuneError;
use crate::freq_meter::FrequencyMeter;
use crate::settings::ChannelSettings;

/// Owns the per-channel autotuners and routes the ISR tick.
///
/// The frequency meter is a process-wide singleton; the host keeps it
/// exclusive to the active calibration by refusing to arm a second
/// channel while any channel is non-idle. One host value lives in the
/// application container and is passed by reference into the ISR.
pub struct AutotunerHost {
    channels: [AutotunerChannel; NUM_CHANNELS],
}

impl AutotunerHost {
    pub fn new(config: TunerConfig) -> Self {
        Self { channels: core::array::from_fn(|index| AutotunerChannel::new(index, config)) }
    }

    /// ISR tick. The normal pitch-output path for all channels runs in
    /// the container before this; here only the (at most one) active
    /// autotuner gets its averager and state-machine turn.
    pub fn tick(&mut self, dac: &mut impl DacDriver, meter: &mut impl FrequencyMeter) {
        if let Some(channel) = self.channels.iter_mut().find(|c| !c.is_idle()) {
            channel.tick(dac, meter);
        }
    }

    /// Ready a channel for calibration. Fails while any channel is
    /// still calibrating, which keeps the frequency meter exclusive.
    pub fn arm(&mut self, channel: usize) -> Result<(), AutotuneError> {
        self.check(channel)?;
        if self.channels.iter().any(|c| !c.is_idle()) {
            return Err(AutotuneError::CalibrationBusy);
        }
        self.channels[channel].arm();
        Ok(())
    }

    /// Start the armed channel's measurement sequence.
    pub fn run(&mut self, channel: usize) -> Result<(), AutotuneError> {
        self.check(channel)?;
        self.channels[channel].run();
        Ok(())
    }

    /// Abort a calibration and clear the channel back to idle.
    pub fn abort(&mut self, channel: usize) -> Result<(), AutotuneError> {
        self.check(channel)?;
        self.channels[channel].reset();
        Ok(())
    }

    /// UI-facing snapshot. Fields are independent word-sized reads;
    /// a concurrent ISR may tear between fields but not within one.
    pub fn status(&self, channel: usize) -> Result<ChannelStatus, AutotuneError> {
        self.check(channel)?;
        Ok(self.channels[channel].status())
    }

    /// Snapshot taken inside a critical section, for callers that want
    /// field-coherent status across the ISR boundary.
    #[cfg(feature = "cortex-m")]
    #[cfg_attr(docsrs, doc(cfg(feature = "cortex-m")))]
    pub fn status_locked(&self, channel: usize) -> Result<ChannelStatus, AutotuneError> {
        cortex_m::interrupt::free(|_| self.status(channel))
    }

    /// Route the persisted per-channel settings into the engine; only
    /// the voltage scaling matters to calibration.
    pub fn apply_settings(
        &mut self,
        channel: usize,
        settings: &ChannelSettings,
    ) -> Result<(), AutotuneError> {
        self.check(channel)?;
        self.channels[channel].set_scaling(settings.scaling);
        Ok(())
    }

    pub fn channel(&self, channel: usize) -> Result<&AutotunerChannel, AutotuneError> {
        self.check(channel)?;
        Ok(&self.channels[channel])
    }

    fn check(&self, channel: usize) -> Result<(), AutotuneError> {
        if channel >= NUM_CHANNELS {
            return Err(AutotuneError::InvalidChannel);
        }
        Ok(())
    }
}
