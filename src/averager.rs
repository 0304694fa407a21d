//! Frequency averager fed by the period meter

use crate::config::{HISTORY_DEPTH, TunerConfig};
use crate::freq_meter::FrequencyMeter;
use crate::history::ScrollingHistory;

/// Accumulates raw period counts from the frequency meter and emits one
/// smoothed frequency per averaging window.
///
/// Runs once per ISR tick. The window is dynamic: while the
/// convergence search is coarse the averager emits quickly, and once
/// the search reaches unit steps the window widens 16x to cut variance
/// near the target.
pub struct FrequencyAverager {
    config: TunerConfig,
    sum: u64,
    count: u32,
    ticks_since_emit: u32,
    fine: bool,
    history: ScrollingHistory<HISTORY_DEPTH>,
}

impl FrequencyAverager {
    pub fn new(config: TunerConfig) -> Self {
        Self {
            config,
            sum: 0,
            count: 0,
            ticks_since_emit: 0,
            fine: false,
            history: ScrollingHistory::new(),
        }
    }

    /// Switch between the coarse and the widened fine-tuning window.
    pub fn set_fine(&mut self, fine: bool) {
        self.fine = fine;
    }

    fn window(&self) -> u32 {
        if self.fine { self.config.fine_window() } else { self.config.coarse_window() }
    }

    /// Poll the meter, accumulate, and emit a smoothed frequency once
    /// per window.
    pub fn tick(&mut self, meter: &mut impl FrequencyMeter) -> Option<f32> {
        self.ticks_since_emit = self.ticks_since_emit.saturating_add(1);

        if meter.available() {
            self.sum += u64::from(meter.read());
            self.count += 1;
        }

        if self.count >= 1 && self.ticks_since_emit > self.window() {
            // A zero-length period is a meter glitch; never divide by it.
            let mean_counts = (self.sum / u64::from(self.count)).max(1);
            let frequency = self.config.timer_hz / mean_counts as f32;
            self.history.push(frequency);
            self.sum = 0;
            self.count = 0;
            self.ticks_since_emit = 0;
            return Some(frequency);
        }

        None
    }

    /// True when no emit happened within the error timeout.
    pub fn signal_lost(&self) -> bool {
        self.ticks_since_emit > self.config.error_timeout
    }

    /// Mean of the scrolling history of emitted frequencies.
    pub fn history_mean(&self) -> f32 {
        self.history.mean()
    }

    /// Clear accumulation and history; called at state transitions.
    pub fn reset(&mut self) {
        self.sum = 0;
        self.count = 0;
        self.ticks_since_emit = 0;
        self.fine = false;
        self.history.clear();
    }
}
