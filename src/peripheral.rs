//! The hardware the sweep drives, as seen by the controller.

use crate::{
    divider::{DividerFormat, DividerValue},
    error::SweepError,
};

/// Fractional-N clock generator producing the swept signal.
///
/// Implementations must write the divider to the hardware in one access so the
/// peripheral never sees a half-updated word.
pub trait RefClockGenerator {
    /// Divider layout this generator understands.
    const FORMAT: DividerFormat;

    fn set_divider(&mut self, divider: DividerValue) -> Result<(), SweepError>;

    fn enable(&mut self);
}

/// Duty-cycle output that becomes the X-axis ramp once filtered.
pub trait RampGenerator {
    /// Number of duty-cycle units in one PWM period.
    fn period(&self) -> u16;

    /// Sets the duty cycle to `step / period`. Values above the period are
    /// clamped.
    fn set_step(&mut self, step: u16);
}

/// Waits out the interval between sweep steps.
pub trait Pacer {
    #[allow(async_fn_in_trait)]
    async fn pace(&mut self);
}
