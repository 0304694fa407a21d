//! Full auto-calibration run against the simulated VCO rig.
//!
//! Run with: cargo run --example calibrate_sim --features std

use vco_autotune::sim::{SimDac, SimMeter, SimVco};
use vco_autotune::{AutotunerHost, TunerConfig, TunerState};

const CH: usize = 0;

fn main() {
    let config = TunerConfig { max_passes: 400, ..Default::default() };
    let mut host = AutotunerHost::new(config);
    let mut dac = SimDac::new();
    let mut meter = SimMeter::new(config.timer_hz);
    let mut vco = SimVco::new(100.0, 1.0);
    // Three codes of gain drift per octave for the engine to learn out.
    vco.gain = 1.0 + 3.0 / dac.steps_per_octave as f32;

    host.arm(CH).expect("arm");
    host.run(CH).expect("run");

    let mut ticks = 0u64;
    loop {
        meter.capture(vco.frequency(dac.output_volts(CH)));
        host.tick(&mut dac, &mut meter);
        ticks += 1;

        if ticks % 100_000 == 0 {
            let status = host.status(CH).unwrap();
            println!(
                "t={ticks:>8} {:?} step {} f={:.2} Hz target={:.2} Hz",
                status.state, status.step, status.frequency, status.target
            );
        }

        match host.status(CH).unwrap().state {
            TunerState::Done => break,
            TunerState::Error => {
                eprintln!("autotune error: {:?}", host.status(CH).unwrap().error);
                return;
            }
            _ => {}
        }
        if ticks > 50_000_000 {
            eprintln!("calibration did not finish");
            return;
        }
    }

    println!("calibration complete after {ticks} ticks");
    println!("learned corrections:");
    let channel = host.channel(CH).unwrap();
    for (octave, correction) in channel.corrections().iter().enumerate() {
        println!("  step {octave:>2}: {correction:+} codes");
    }
}
