//! Voltage scaling modes and octave target tables

use crate::config::CALIBRATION_POINTS;

/// Volt-per-octave convention of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoltageScaling {
    /// 1 V per octave
    #[default]
    V1,
    /// 1.2 V per octave (Buchla)
    V1_2,
    /// 2 V per octave
    V2,
}

/// Calibration-point voltages, -3 V through +7 V.
pub const OCTAVE_VOLTS: [i32; CALIBRATION_POINTS] = [-3, -2, -1, 0, 1, 2, 3, 4, 5, 6, 7];

// 2^(v / scale) for each calibration point, unrolled so the baseline
// snapshot never calls powf.
const MULTIPLIERS_1V: [f32; CALIBRATION_POINTS] =
    [0.125, 0.25, 0.5, 1.0, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0, 128.0];
const MULTIPLIERS_1V2: [f32; CALIBRATION_POINTS] = [
    0.176776695,
    0.314980262,
    0.561231024,
    1.0,
    1.78179744,
    3.1748021,
    5.65685425,
    10.0793684,
    17.9593928,
    32.0,
    57.017518,
];
const MULTIPLIERS_2V: [f32; CALIBRATION_POINTS] = [
    0.353553391,
    0.5,
    0.707106781,
    1.0,
    1.41421356,
    2.0,
    2.82842712,
    4.0,
    5.65685425,
    8.0,
    11.3137085,
];

impl VoltageScaling {
    /// Volts spanning one octave in this mode.
    pub fn volts_per_octave(self) -> f32 {
        match self {
            VoltageScaling::V1 => 1.0,
            VoltageScaling::V1_2 => 1.2,
            VoltageScaling::V2 => 2.0,
        }
    }

    /// Display label used on the settings screen.
    pub fn label(self) -> &'static str {
        match self {
            VoltageScaling::V1 => "1V/oct",
            VoltageScaling::V1_2 => "1.2V/oct",
            VoltageScaling::V2 => "2V/oct",
        }
    }

    /// Position within the settings label list.
    pub fn index(self) -> usize {
        match self {
            VoltageScaling::V1 => 0,
            VoltageScaling::V1_2 => 1,
            VoltageScaling::V2 => 2,
        }
    }

    /// Inverse of [`VoltageScaling::index`].
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(VoltageScaling::V1),
            1 => Some(VoltageScaling::V1_2),
            2 => Some(VoltageScaling::V2),
            _ => None,
        }
    }

    fn multipliers(self) -> &'static [f32; CALIBRATION_POINTS] {
        match self {
            VoltageScaling::V1 => &MULTIPLIERS_1V,
            VoltageScaling::V1_2 => &MULTIPLIERS_1V2,
            VoltageScaling::V2 => &MULTIPLIERS_2V,
        }
    }
}

/// Fill the per-step target frequencies from the measured 0 V frequency.
///
/// `target[k] = f0 * 2^(v_k / scale)` for the eleven calibration-point
/// voltages.
pub fn build_targets(f0: f32, scaling: VoltageScaling) -> [f32; CALIBRATION_POINTS] {
    let multipliers = scaling.multipliers();
    let mut targets = [0.0; CALIBRATION_POINTS];
    for (target, multiplier) in targets.iter_mut().zip(multipliers) {
        *target = f0 * multiplier;
    }
    targets
}
