//! Sweep arithmetic: the frequency range, the cyclic step index, and the
//! controller that walks one against the other.

pub mod controller;

use snafu::prelude::ensure;

pub use self::controller::{StepOutcome, SweepController, SweepReport};
use crate::error::*;

/// Validated frequency range, in kHz, split into `step_count` steps.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SweepRange {
    low_khz: f64,
    high_khz: f64,
    step_count: u16,
}

impl SweepRange {
    /// Equal endpoints are allowed and give a fixed frequency output.
    pub fn new(low_khz: f64, high_khz: f64, step_count: u16) -> Result<Self, ConfigError> {
        ensure!(step_count > 0, ZeroStepsSnafu);
        for khz in [low_khz, high_khz] {
            ensure!(khz.is_finite() && khz > 0.0, InvalidFrequencySnafu { khz });
        }
        ensure!(
            low_khz <= high_khz,
            InvertedRangeSnafu { low_khz, high_khz }
        );
        Ok(Self {
            low_khz,
            high_khz,
            step_count,
        })
    }

    pub fn low_khz(&self) -> f64 {
        self.low_khz
    }

    pub fn high_khz(&self) -> f64 {
        self.high_khz
    }

    pub fn step_count(&self) -> u16 {
        self.step_count
    }

    /// Target frequency of `step`. Step zero is exactly the low endpoint; the
    /// last step sits one step short of the high endpoint.
    pub fn frequency_khz(&self, step: u16) -> f64 {
        self.low_khz
            + (self.high_khz - self.low_khz) * f64::from(step) / f64::from(self.step_count)
    }

    /// Frequency distance between neighbouring steps.
    pub fn step_khz(&self) -> f64 {
        (self.high_khz - self.low_khz) / f64::from(self.step_count)
    }
}

/// Position within a sweep. Wraps to zero after the last step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepIndex {
    value: u16,
    count: u16,
}

impl StepIndex {
    pub fn new(count: u16) -> Self {
        Self { value: 0, count }
    }

    pub fn value(&self) -> u16 {
        self.value
    }

    pub fn reset(&mut self) {
        self.value = 0;
    }

    /// Moves to the next step, returning `true` if the sweep wrapped around.
    pub fn advance(&mut self) -> bool {
        self.value += 1;
        if self.value >= self.count {
            self.value = 0;
            true
        } else {
            false
        }
    }
}
