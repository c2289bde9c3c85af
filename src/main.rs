//! Swept-frequency test signal generator for the Raspberry Pi Pico.
//!
//! GPIO21 (GPOUT0) carries the swept RF signal. GPIO4 carries a PWM ramp that,
//! through an RC low-pass, drives the X axis of an oscilloscope in step with
//! the sweep. The on-board LED blinks once per step.

#![no_std]
#![no_main]

use defmt::*;
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::{
    clocks::{self, GpoutSrc},
    gpio::{Level, Output},
};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};
use panic_probe as _;
use wobbulator::{
    clock::gpout::GpoutClock,
    config::{SweepBand, SweepConfig, RP2040_CLK_SYS_HZ},
    dac::pwm::{PwmRamp, DEFAULT_PRESCALE},
    sweep::SweepController,
    time::ticker::StepTicker,
};

const SWEEP: SweepConfig = SweepConfig::new(SweepBand::AUDIO, RP2040_CLK_SYS_HZ);
// const SWEEP: SweepConfig = SweepConfig::new(SweepBand::AM_IF, RP2040_CLK_SYS_HZ);
// const SWEEP: SweepConfig = SweepConfig::new(SweepBand::FM_IF, RP2040_CLK_SYS_HZ);
// const SWEEP: SweepConfig = SweepConfig::new(SweepBand::AM_BROADCAST, RP2040_CLK_SYS_HZ);

/// Nothing signals this today; the sweep runs until reset.
static STOP: Signal<CriticalSectionRawMutex, ()> = Signal::new();

#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Start");
    let p = embassy_rp::init(Default::default());

    let clk_sys_hz = clocks::clk_sys_freq();
    if clk_sys_hz != SWEEP.reference_clock_hz {
        defmt::panic!(
            "clk_sys is {}Hz, sweep is configured for {}Hz",
            clk_sys_hz,
            SWEEP.reference_clock_hz
        );
    }

    let clock = GpoutClock::new(p.PIN_21, GpoutSrc::Sys);
    let ramp = PwmRamp::new(p.PWM_CH2, p.PIN_4, DEFAULT_PRESCALE, SWEEP.step_count);
    let led = Output::new(p.PIN_25, Level::Low);
    let ticker = StepTicker::every(SWEEP.pacing_interval);

    let mut sweep = unwrap!(SweepController::new(&SWEEP, clock, ramp, led, ticker));
    let report = unwrap!(sweep.run(&STOP).await);
    info!("Sweep ended: {}", report);
}
