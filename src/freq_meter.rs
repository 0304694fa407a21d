//! Poll-style interface to the period-counting frequency meter

/// Hardware seam for the VCO frequency meter.
///
/// The meter counts timer ticks between zero crossings of the external
/// VCO signal. The autotuner polls `available` from the ISR and drains
/// one period sample per `read`. The meter is a process-wide singleton;
/// the host keeps it exclusive to the single active channel.
pub trait FrequencyMeter {
    /// A fresh period sample is ready.
    fn available(&self) -> bool;

    /// Consume the latest period, in timer ticks per VCO cycle.
    fn read(&mut self) -> u32;
}
