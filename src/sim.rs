//! Simulation models for host-side tests and demos

use crate::config::{CALIBRATION_POINTS, NUM_CHANNELS, ZERO_VOLT_STEP};
use crate::dac::{CalibrationVariant, DacDriver};
use crate::freq_meter::FrequencyMeter;

/// Quad DAC model with a linear factory table.
pub struct SimDac {
    codes: [i32; NUM_CHANNELS],
    auto_table: [[i32; CALIBRATION_POINTS]; NUM_CHANNELS],
    live: [CalibrationVariant; NUM_CHANNELS],
    pub steps_per_octave: i32,
}

impl SimDac {
    pub fn new() -> Self {
        Self {
            codes: [0; NUM_CHANNELS],
            auto_table: [[0; CALIBRATION_POINTS]; NUM_CHANNELS],
            live: [CalibrationVariant::Default; NUM_CHANNELS],
            steps_per_octave: 500,
        }
    }

    pub fn code(&self, channel: usize) -> i32 {
        self.codes[channel]
    }

    pub fn output_volts(&self, channel: usize) -> f32 {
        let zero = ZERO_VOLT_STEP as i32 * self.steps_per_octave;
        (self.codes[channel] - zero) as f32 / self.steps_per_octave as f32
    }

    pub fn auto_entry(&self, channel: usize, octave: usize) -> i32 {
        self.auto_table[channel][octave]
    }
}

impl Default for SimDac {
    fn default() -> Self {
        Self::new()
    }
}

impl DacDriver for SimDac {
    fn set(&mut self, channel: usize, code: i32) {
        self.codes[channel] = code;
    }

    fn default_calibrated_code(&self, channel: usize, octave: usize) -> i32 {
        let _ = channel;
        octave as i32 * self.steps_per_octave
    }

    fn set_default_channel_calibration(&mut self, channel: usize) {
        self.live[channel] = CalibrationVariant::Default;
    }

    fn set_auto_channel_calibration(&mut self, channel: usize) {
        self.live[channel] = CalibrationVariant::Auto;
    }

    fn update_auto_channel_calibration(&mut self, channel: usize, octave: usize, code: i32) {
        self.auto_table[channel][octave] = code;
    }

    fn calibration_data_used(&self, channel: usize) -> CalibrationVariant {
        self.live[channel]
    }
}

/// Exponential V-to-f law, optionally with gain error or a dead core.
pub struct SimVco {
    pub f0: f32,
    pub volts_per_octave: f32,
    pub gain: f32,
    pub tracking: bool,
}

impl SimVco {
    pub fn new(f0: f32, volts_per_octave: f32) -> Self {
        Self { f0, volts_per_octave, gain: 1.0, tracking: true }
    }

    pub fn frequency(&self, volts: f32) -> f32 {
        if !self.tracking {
            return self.f0;
        }
        self.f0 * libm::powf(2.0, volts * self.gain / self.volts_per_octave)
    }
}

/// Period meter model; quantizes the VCO period to whole timer counts.
pub struct SimMeter {
    timer_hz: f32,
    counts: u32,
    ready: bool,
    silent: bool,
}

impl SimMeter {
    pub fn new(timer_hz: f32) -> Self {
        Self { timer_hz, counts: 0, ready: false, silent: false }
    }

    /// A meter whose input is disconnected; never produces a sample.
    pub fn silent(timer_hz: f32) -> Self {
        Self { silent: true, ..Self::new(timer_hz) }
    }

    /// Capture the current VCO frequency as one period sample.
    pub fn capture(&mut self, frequency: f32) {
        if self.silent || frequency <= 0.0 {
            return;
        }
        self.counts = (self.timer_hz / frequency + 0.5) as u32;
        self.ready = true;
    }
}

impl FrequencyMeter for SimMeter {
    fn available(&self) -> bool {
        self.ready
    }

    fn read(&mut self) -> u32 {
        self.ready = false;
        self.counts
    }
}
