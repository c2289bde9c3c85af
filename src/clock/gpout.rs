use defmt::Display2Format;
use embassy_rp::{
    clocks::{Gpout, GpoutPin, GpoutSrc},
    Peripheral,
};
use fixed::types::U24F8;
use snafu::prelude::ensure;

use crate::{
    divider::{DividerFormat, DividerValue},
    error::{DividerRejectedSnafu, SweepError},
    peripheral::RefClockGenerator,
};

/// One of the RP2040 GPOUT clock outputs, used as the swept signal source.
///
/// GPOUT0 is on GPIO21.
pub struct GpoutClock<'d, T: GpoutPin> {
    gpout: Gpout<'d, T>,
}

impl<'d, T: GpoutPin> GpoutClock<'d, T> {
    /// Routes `source` to the output pin. The output stays disabled until
    /// [`RefClockGenerator::enable`].
    pub fn new(pin: impl Peripheral<P = T> + 'd, source: GpoutSrc) -> Self {
        let gpout = Gpout::new(pin);
        gpout.disable();
        gpout.set_src(source);
        Self { gpout }
    }

    /// Output frequency in Hz, as computed by the clock block from its
    /// source and divider.
    pub fn output_hz(&self) -> u32 {
        self.gpout.get_freq()
    }
}

impl<'d, T: GpoutPin> RefClockGenerator for GpoutClock<'d, T> {
    const FORMAT: DividerFormat = DividerFormat::GPOUT;

    fn set_divider(&mut self, divider: DividerValue) -> Result<(), SweepError> {
        ensure!(
            divider.format() == Self::FORMAT,
            DividerRejectedSnafu {
                word: divider.word()
            }
        );

        // INT and FRAC share the DIV register and go out in a single write
        self.gpout.set_div(divider.integer(), divider.fraction() as u8);
        trace!(
            "GPOUT divider {}",
            Display2Format(&U24F8::from_bits(divider.word()))
        );
        Ok(())
    }

    fn enable(&mut self) {
        self.gpout.enable();
    }
}
