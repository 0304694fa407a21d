#![cfg_attr(not(feature = "std"), no_std)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core modules
pub mod config;
pub mod error;
pub mod scaling;
pub mod settings;

// Calibration engine
pub mod averager;
pub mod channel;
pub mod history;
pub mod host;
pub mod sar;

// Hardware seams
pub mod dac;
pub mod freq_meter;

// UI surface
pub mod ui;

// Simulation support for host-side tests and demos
pub mod sim;

// Re-export main API
pub use channel::{AutotunerChannel, ChannelStatus, TunerState};
pub use config::TunerConfig;
pub use dac::{CalibrationVariant, DacDriver};
pub use error::AutotuneError;
pub use freq_meter::FrequencyMeter;
pub use host::AutotunerHost;
pub use scaling::{VoltageScaling, build_targets};
pub use settings::ChannelSettings;
