//! Per-channel calibration state machine

use crate::averager::FrequencyAverager;
use crate::config::{CALIBRATION_POINTS, HISTORY_DEPTH, OCTAVES, TunerConfig, ZERO_VOLT_STEP};
use crate::dac::DacDriver;
use crate::error::AutotuneError;
use crate::freq_meter::FrequencyMeter;
use crate::sar::{SarController, SarStep};
use crate::scaling::{VoltageScaling, build_targets};

/// Calibration progress of one channel.
///
/// Once running, the state advances strictly forward; only `reset` or
/// a latched error leaves the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TunerState {
    /// Normal pitch output, autotuner inactive.
    Idle,
    /// Primed and waiting for the run command.
    Armed,
    /// Measuring the 0 V reference frequency.
    Baseline,
    /// Closed-loop correction for one calibration point (0 is -3 V).
    Octave(u8),
    /// Writing the learned table out through the DAC driver.
    Commit,
    /// Calibration finished, learned table live.
    Done,
    /// Latched fault; reset required.
    Error,
}

/// UI-facing snapshot of one channel.
///
/// Every field is a single word, so reads from outside the ISR may
/// tear between fields but never within one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelStatus {
    pub state: TunerState,
    /// Calibration point being worked, 0 is -3 V.
    pub step: u8,
    /// Latest averaged frequency, Hz.
    pub frequency: f32,
    /// Target frequency of the current step, Hz.
    pub target: f32,
    pub error: Option<AutotuneError>,
    pub completed: bool,
}

/// One channel's autotuner: frequency averager, convergence controller
/// and the arm/baseline/octaves/commit sequencing around them.
///
/// All mutable state is owned by the ISR path; the UI interacts through
/// `arm`/`run`/`reset` and the `status` snapshot.
pub struct AutotunerChannel {
    channel: usize,
    config: TunerConfig,
    scaling: VoltageScaling,
    state: TunerState,
    averager: FrequencyAverager,
    sar: SarController,
    targets: [f32; CALIBRATION_POINTS],
    corrections: [i32; CALIBRATION_POINTS],
    frequency: f32,
    last_frequency: f32,
    baseline_emits: u8,
    restore_defaults: bool,
    commit_step: usize,
    commit_ticks: u32,
    error: Option<AutotuneError>,
    completed: bool,
}

impl AutotunerChannel {
    pub fn new(channel: usize, config: TunerConfig) -> Self {
        Self {
            channel,
            config,
            scaling: VoltageScaling::default(),
            state: TunerState::Idle,
            averager: FrequencyAverager::new(config),
            sar: SarController::new(&config),
            targets: [0.0; CALIBRATION_POINTS],
            corrections: [0; CALIBRATION_POINTS],
            frequency: 0.0,
            last_frequency: 0.0,
            baseline_emits: 0,
            restore_defaults: false,
            commit_step: 0,
            commit_ticks: 0,
            error: None,
            completed: false,
        }
    }

    pub fn channel(&self) -> usize {
        self.channel
    }

    pub fn state(&self) -> TunerState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == TunerState::Idle
    }

    /// Voltage scaling used for the target table; takes effect at the
    /// next baseline.
    pub fn set_scaling(&mut self, scaling: VoltageScaling) {
        self.scaling = scaling;
    }

    pub fn scaling(&self) -> VoltageScaling {
        self.scaling
    }

    /// Learned correction for one calibration point.
    pub fn correction(&self, step: usize) -> i32 {
        self.corrections[step]
    }

    pub fn corrections(&self) -> &[i32; CALIBRATION_POINTS] {
        &self.corrections
    }

    pub fn targets(&self) -> &[f32; CALIBRATION_POINTS] {
        &self.targets
    }

    /// Latest averaged frequency, Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Settled reading of the previously completed step, Hz.
    pub fn last_frequency(&self) -> f32 {
        self.last_frequency
    }

    /// Correction being trialled on the current step.
    pub fn offset(&self) -> i32 {
        self.sar.offset()
    }

    pub fn error(&self) -> Option<AutotuneError> {
        self.error
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    /// Ready the channel for calibration.
    ///
    /// The controller is primed to unit steps so the averaging window
    /// widens immediately; an immediate run then measures a clean
    /// baseline before any aggressive correction.
    pub fn arm(&mut self) {
        self.reset();
        self.sar.prime();
        self.state = TunerState::Armed;
        #[cfg(feature = "debug-logging")]
        log::debug!("channel {} armed", self.channel);
    }

    /// Start the measurement sequence; no-op unless armed.
    pub fn run(&mut self) {
        if self.state == TunerState::Armed {
            self.baseline_emits = 0;
            self.restore_defaults = true;
            self.averager.reset();
            self.state = TunerState::Baseline;
            #[cfg(feature = "debug-logging")]
            log::debug!("channel {} baseline started", self.channel);
        }
    }

    /// Abort and clear: scratch, learned corrections, frequencies,
    /// error and completion flags all return to power-on state.
    ///
    /// A reset during commit leaves partially written learned entries
    /// in the driver; the live-table pointer only ever flips to auto on
    /// a completed run, so a cancelled commit reverts cleanly.
    pub fn reset(&mut self) {
        self.state = TunerState::Idle;
        self.averager.reset();
        self.sar.reset_scratch();
        self.targets = [0.0; CALIBRATION_POINTS];
        self.corrections = [0; CALIBRATION_POINTS];
        self.frequency = 0.0;
        self.last_frequency = 0.0;
        self.baseline_emits = 0;
        self.restore_defaults = false;
        self.commit_step = 0;
        self.commit_ticks = 0;
        self.error = None;
        self.completed = false;
    }

    /// Snapshot for the UI layer.
    pub fn status(&self) -> ChannelStatus {
        let step = match self.state {
            TunerState::Octave(k) => k,
            TunerState::Commit | TunerState::Done => OCTAVES as u8,
            _ => 0,
        };
        ChannelStatus {
            state: self.state,
            step,
            frequency: self.frequency,
            target: self.targets[usize::from(step)],
            error: self.error,
            completed: self.completed,
        }
    }

    /// One ISR tick. Work is bounded: at most one DAC write, one meter
    /// poll and one controller pass.
    pub fn tick(&mut self, dac: &mut impl DacDriver, meter: &mut impl FrequencyMeter) {
        match self.state {
            TunerState::Idle | TunerState::Done | TunerState::Error => {}
            TunerState::Armed => self.tick_armed(dac, meter),
            TunerState::Baseline => self.tick_baseline(dac, meter),
            TunerState::Octave(step) => self.tick_octave(step, dac, meter),
            TunerState::Commit => self.tick_commit(dac),
        }
    }

    fn tick_armed(&mut self, dac: &mut impl DacDriver, meter: &mut impl FrequencyMeter) {
        dac.set(self.channel, dac.default_calibrated_code(self.channel, ZERO_VOLT_STEP));
        self.averager.set_fine(self.sar.fine());
        // Measure and discard: keeps the averager warm while waiting
        // for the run command.
        let _ = self.averager.tick(meter);
    }

    fn tick_baseline(&mut self, dac: &mut impl DacDriver, meter: &mut impl FrequencyMeter) {
        if self.restore_defaults {
            dac.set_default_channel_calibration(self.channel);
            self.restore_defaults = false;
        }
        dac.set(self.channel, dac.default_calibrated_code(self.channel, ZERO_VOLT_STEP));
        self.averager.set_fine(self.sar.fine());

        match self.averager.tick(meter) {
            Some(frequency) => {
                self.frequency = frequency;
                self.baseline_emits += 1;
                if usize::from(self.baseline_emits) >= HISTORY_DEPTH {
                    let f0 = 0.5 * (frequency + self.averager.history_mean());
                    self.last_frequency = f0;
                    self.targets = build_targets(f0, self.scaling);
                    self.sar.reset_scratch();
                    self.averager.reset();
                    self.state = TunerState::Octave(0);
                    #[cfg(feature = "debug-logging")]
                    log::debug!("channel {} baseline {f0} Hz", self.channel);
                }
            }
            None => {
                if self.averager.signal_lost() {
                    self.latch_error(AutotuneError::NoSignal);
                }
            }
        }
    }

    fn tick_octave(&mut self, step: u8, dac: &mut impl DacDriver, meter: &mut impl FrequencyMeter) {
        let index = usize::from(step);
        // The write for this tick reflects the offset selected on an
        // earlier emit; the controller below only affects later ticks.
        dac.set(
            self.channel,
            dac.default_calibrated_code(self.channel, index) + self.sar.offset(),
        );
        self.averager.set_fine(self.sar.fine());

        let Some(frequency) = self.averager.tick(meter) else {
            if self.averager.signal_lost() {
                self.latch_error(AutotuneError::NoSignal);
            }
            return;
        };
        self.frequency = frequency;

        match self.sar.update(frequency, self.targets[index]) {
            SarStep::Adjusted => {}
            SarStep::Settled => self.finish_octave(step, frequency),
        }
    }

    fn finish_octave(&mut self, step: u8, frequency: f32) {
        // Between octave steps the measured frequency must roughly
        // double; 1.25 leaves slack for jitter. The first voltage step
        // has no predecessor to compare against.
        if step >= 1 && self.last_frequency * 1.25 > frequency {
            self.latch_error(AutotuneError::VcoNotTracking);
            return;
        }

        let index = usize::from(step);
        self.last_frequency = 0.5 * (frequency + self.averager.history_mean());
        self.corrections[index] = self.sar.offset();
        self.sar.reset_scratch();
        self.averager.reset();

        if index == OCTAVES {
            self.commit_step = 0;
            self.commit_ticks = 0;
            self.state = TunerState::Commit;
        } else {
            self.state = TunerState::Octave(step + 1);
        }
        #[cfg(feature = "debug-logging")]
        log::debug!(
            "channel {} step {step} settled at {frequency} Hz, correction {}",
            self.channel,
            self.corrections[index]
        );
    }

    fn tick_commit(&mut self, dac: &mut impl DacDriver) {
        self.commit_ticks += 1;
        if self.commit_ticks < self.config.commit_interval {
            return;
        }
        self.commit_ticks = 0;

        if self.commit_step < CALIBRATION_POINTS {
            let code = dac.default_calibrated_code(self.channel, self.commit_step)
                + self.corrections[self.commit_step];
            dac.set(self.channel, code);
            dac.update_auto_channel_calibration(self.channel, self.commit_step, code);
            self.commit_step += 1;
        } else {
            dac.set_auto_channel_calibration(self.channel);
            self.completed = true;
            self.state = TunerState::Done;
            #[cfg(feature = "debug-logging")]
            log::debug!("channel {} calibration committed", self.channel);
        }
    }

    fn latch_error(&mut self, error: AutotuneError) {
        self.error = Some(error);
        self.state = TunerState::Error;
        #[cfg(feature = "debug-logging")]
        log::warn!("channel {} autotune error: {error:?}", self.channel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{SimDac, SimMeter, SimVco};

    fn test_config() -> TunerConfig {
        TunerConfig { max_passes: 200, ..Default::default() }
    }

    fn tick_n(
        channel: &mut AutotunerChannel,
        dac: &mut SimDac,
        vco: &SimVco,
        meter: &mut SimMeter,
        ticks: u32,
    ) {
        for _ in 0..ticks {
            meter.capture(vco.frequency(dac.output_volts(channel.channel())));
            channel.tick(dac, meter);
        }
    }

    #[test]
    fn test_idle_channel_ignores_ticks() {
        let mut channel = AutotunerChannel::new(0, test_config());
        let mut dac = SimDac::new();
        let mut meter = SimMeter::new(test_config().timer_hz);

        meter.capture(100.0);
        channel.tick(&mut dac, &mut meter);
        assert_eq!(channel.state(), TunerState::Idle);
        assert_eq!(channel.frequency(), 0.0);
    }

    #[test]
    fn test_arm_primes_and_discards_samples() {
        let config = test_config();
        let mut channel = AutotunerChannel::new(0, config);
        let mut dac = SimDac::new();
        let vco = SimVco::new(100.0, 1.0);
        let mut meter = SimMeter::new(config.timer_hz);

        channel.arm();
        assert_eq!(channel.state(), TunerState::Armed);

        // Plenty of emits happen while armed, none of them surface.
        tick_n(&mut channel, &mut dac, &vco, &mut meter, config.fine_window() * 4);
        assert_eq!(channel.state(), TunerState::Armed);
        assert_eq!(channel.frequency(), 0.0);
    }

    #[test]
    fn test_run_requires_arm() {
        let mut channel = AutotunerChannel::new(0, test_config());
        channel.run();
        assert_eq!(channel.state(), TunerState::Idle);
    }

    #[test]
    fn test_baseline_builds_target_table() {
        let config = test_config();
        let mut channel = AutotunerChannel::new(0, config);
        let mut dac = SimDac::new();
        let vco = SimVco::new(100.0, 1.0);
        let mut meter = SimMeter::new(config.timer_hz);

        channel.arm();
        channel.run();
        // Ten emits on the widened window end the baseline.
        tick_n(&mut channel, &mut dac, &vco, &mut meter, (config.fine_window() + 1) * 11);

        assert_eq!(channel.state(), TunerState::Octave(0));
        assert_eq!(channel.targets()[ZERO_VOLT_STEP], 100.0);
        assert_eq!(channel.targets()[0], 12.5);
        assert_eq!(channel.targets()[OCTAVES], 12_800.0);
    }

    #[test]
    fn test_reset_restores_power_on_state() {
        let config = test_config();
        let mut channel = AutotunerChannel::new(0, config);
        let mut dac = SimDac::new();
        let vco = SimVco::new(100.0, 1.0);
        let mut meter = SimMeter::new(config.timer_hz);

        channel.arm();
        channel.run();
        tick_n(&mut channel, &mut dac, &vco, &mut meter, (config.fine_window() + 1) * 20);
        channel.reset();

        assert_eq!(channel.state(), TunerState::Idle);
        assert_eq!(channel.corrections(), &[0; CALIBRATION_POINTS]);
        assert_eq!(channel.frequency(), 0.0);
        assert_eq!(channel.last_frequency(), 0.0);
        assert_eq!(channel.error(), None);
        assert!(!channel.completed());
    }
}
