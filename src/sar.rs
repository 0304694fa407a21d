//! Successive-approximation convergence controller

use crate::config::TunerConfig;

/// Outcome of one controller pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SarStep {
    /// A correction was applied (or the reading sat exactly on target);
    /// the step keeps hunting.
    Adjusted,
    /// The pass budget is exhausted. The caller stores the offset and
    /// advances to the next octave step.
    Settled,
}

/// Per-step binary-search state.
///
/// Each sign reversal of the frequency error halves the step magnitude
/// until it floors at one DAC code; from there, dithering around the
/// target is counted in both directions. Requiring several unit
/// corrections each way proves the result straddles the target instead
/// of overshooting monotonically.
#[derive(Debug, Clone, Copy)]
pub struct SarController {
    offset_error: i32,
    factor: u8,
    direction: bool,
    pos_passes: u8,
    neg_passes: u8,
    pass_count: u16,
    max_passes: u16,
    converge_passes: u8,
    initial_factor: u8,
}

impl SarController {
    pub fn new(config: &TunerConfig) -> Self {
        Self {
            offset_error: 0,
            factor: config.initial_factor,
            direction: false,
            pos_passes: 0,
            neg_passes: 0,
            pass_count: 0,
            max_passes: config.max_passes,
            converge_passes: config.converge_passes,
            initial_factor: config.initial_factor,
        }
    }

    /// Current signed DAC correction for the step.
    #[inline(always)]
    pub fn offset(&self) -> i32 {
        self.offset_error
    }

    /// True once the step magnitude reached unit resolution.
    #[inline(always)]
    pub fn fine(&self) -> bool {
        self.factor == 1
    }

    /// Passes spent on the current step.
    pub fn passes(&self) -> u16 {
        self.pass_count
    }

    /// Clamp the factor to unit steps so the averaging window widens
    /// immediately. Used while armed, before any correction runs.
    pub fn prime(&mut self) {
        self.factor = 1;
    }

    /// Fresh scratch for the next octave step. The offset, factor,
    /// direction and dither counters all restart; stored correction and
    /// target tables are untouched by design of the caller.
    pub fn reset_scratch(&mut self) {
        self.offset_error = 0;
        self.factor = self.initial_factor;
        self.direction = false;
        self.pos_passes = 0;
        self.neg_passes = 0;
        self.pass_count = 0;
    }

    /// One pass of the closed loop against the step target.
    pub fn update(&mut self, frequency: f32, target: f32) -> SarStep {
        if self.pass_count > self.max_passes {
            return SarStep::Settled;
        }

        if frequency < target {
            if !self.direction {
                self.factor = (self.factor >> 1) | 1;
            }
            self.direction = true;
            self.offset_error += i32::from(self.factor);
            if self.factor == 1 {
                self.pos_passes = self.pos_passes.saturating_add(1);
            }
        } else if frequency > target {
            if self.direction {
                self.factor = (self.factor >> 1) | 1;
            }
            self.direction = false;
            self.offset_error -= i32::from(self.factor);
            if self.factor == 1 {
                self.neg_passes = self.neg_passes.saturating_add(1);
            }
        }

        self.pass_count = self.pass_count.saturating_add(1);

        if self.pos_passes > self.converge_passes && self.neg_passes > self.converge_passes {
            // Dither straddles the target; take the settle path on the
            // next emit.
            self.pass_count = self.max_passes.saturating_add(1);
        }

        SarStep::Adjusted
    }
}
