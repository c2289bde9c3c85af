use embassy_sync::{blocking_mutex::raw::RawMutex, signal::Signal};
use snafu::prelude::ensure;

use super::{StepIndex, SweepRange};
use crate::{
    config::SweepConfig,
    divider::{DividerValue, Encoded, Saturation},
    error::{ConfigError, RampTooShortSnafu, SweepError},
    gpio::Heartbeat,
    peripheral::{Pacer, RampGenerator, RefClockGenerator},
};

/// What a single step pushed to the hardware.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepOutcome {
    pub index: u16,
    pub frequency_khz: f64,
    pub divider: DividerValue,
    pub saturation: Option<Saturation>,
}

/// Counters accumulated while sweeping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SweepReport {
    /// Steps completed, pacing included
    pub steps: u32,
    /// Full passes over the range
    pub cycles: u32,
    /// Steps whose divider had to be clamped
    pub saturated_steps: u32,
}

/// Walks the step index over the sweep range, keeping the clock divider and
/// the ramp duty cycle in lock-step.
///
/// The ramp is driven by the step index itself, not by the frequency, so the
/// ramp is linear in the step no matter how the divider behaves.
///
/// There is no recovery path. Configuration faults are refused by
/// [`SweepController::new`]; at runtime an out of range divider is clamped
/// and counted, and a divider the generator rejects ends [`run`](Self::run)
/// with the error.
///
/// [`SweepController::new`] only accepts ranges whose endpoints are both
/// representable, and frequencies between them are too, so a controller built
/// that way never clamps.
pub struct SweepController<C, R, H, P> {
    range: SweepRange,
    reference_clock_hz: u32,
    step: StepIndex,
    report: SweepReport,
    clock: C,
    ramp: R,
    heartbeat: H,
    pacer: P,
}

impl<C, R, H, P> SweepController<C, R, H, P>
where
    C: RefClockGenerator,
    R: RampGenerator,
    H: Heartbeat,
    P: Pacer,
{
    pub fn new(
        config: &SweepConfig,
        clock: C,
        ramp: R,
        heartbeat: H,
        pacer: P,
    ) -> Result<Self, ConfigError> {
        let range = config.validate(C::FORMAT)?;
        let period = ramp.period();
        ensure!(
            period >= range.step_count(),
            RampTooShortSnafu {
                step_count: range.step_count(),
                period,
            }
        );

        Ok(Self {
            range,
            reference_clock_hz: config.reference_clock_hz,
            step: StepIndex::new(range.step_count()),
            report: SweepReport::default(),
            clock,
            ramp,
            heartbeat,
            pacer,
        })
    }

    pub fn range(&self) -> &SweepRange {
        &self.range
    }

    /// Index of the step the next call to [`step`](Self::step) will output.
    pub fn current_step(&self) -> u16 {
        self.step.value()
    }

    pub fn report(&self) -> SweepReport {
        self.report
    }

    pub fn into_parts(self) -> (C, R, H, P) {
        (self.clock, self.ramp, self.heartbeat, self.pacer)
    }

    /// Programs the low endpoint and enables the clock output. The step index
    /// goes back to zero.
    pub fn start(&mut self) -> Result<(), SweepError> {
        info!(
            "Sweeping {} - {} kHz in {} steps",
            self.range.low_khz(),
            self.range.high_khz(),
            self.range.step_count()
        );
        self.step.reset();

        let divider = self.encode(self.range.low_khz()).divider;
        self.write_divider(divider)?;
        self.clock.enable();
        Ok(())
    }

    /// Outputs the current step and waits out the pacing interval.
    ///
    /// The divider is written before the ramp, and both before the wait, so an
    /// observer sampling after the wait sees a matching pair.
    pub async fn step(&mut self) -> Result<StepOutcome, SweepError> {
        let index = self.step.value();
        let frequency_khz = self.range.frequency_khz(index);
        let Encoded {
            divider,
            saturation,
        } = self.encode(frequency_khz);

        self.write_divider(divider)?;
        self.ramp.set_step(index);
        self.heartbeat.beat();
        trace!(
            "step {}: {} kHz, divider {}",
            index,
            frequency_khz,
            divider.word()
        );

        self.pacer.pace().await;

        self.report.steps = self.report.steps.wrapping_add(1);
        if saturation.is_some() {
            self.report.saturated_steps = self.report.saturated_steps.wrapping_add(1);
        }
        if self.step.advance() {
            self.report.cycles = self.report.cycles.wrapping_add(1);
            debug!("Sweep cycle {} complete", self.report.cycles);
        }

        Ok(StepOutcome {
            index,
            frequency_khz,
            divider,
            saturation,
        })
    }

    /// Starts the sweep and steps until `stop` is signaled. The signal is only
    /// checked between steps, and is left set.
    pub async fn run<M: RawMutex>(
        &mut self,
        stop: &Signal<M, ()>,
    ) -> Result<SweepReport, SweepError> {
        self.start()?;
        while !stop.signaled() {
            self.step().await?;
        }

        info!(
            "Sweep stopped after {} steps, {} cycles, {} saturated",
            self.report.steps,
            self.report.cycles,
            self.report.saturated_steps
        );
        Ok(self.report)
    }

    fn encode(&self, frequency_khz: f64) -> Encoded {
        let encoded = C::FORMAT.encode_saturating(self.reference_clock_hz, frequency_khz);
        if let Some(saturation) = encoded.saturation {
            warn!(
                "{} kHz is out of divider range, clamped to {} ({})",
                frequency_khz,
                encoded.divider.word(),
                saturation
            );
        }
        encoded
    }

    fn write_divider(&mut self, divider: DividerValue) -> Result<(), SweepError> {
        self.clock.set_divider(divider).map_err(|e| {
            error!("Divider {} rejected", divider.word());
            e
        })
    }
}
