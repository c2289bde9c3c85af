use embassy_time::Duration;
use snafu::prelude::ensure;

use crate::{
    divider::{DividerError, DividerFormat},
    error::*,
    sweep::SweepRange,
};

/// `clk_sys` of an RP2040 running the default embassy clock tree.
pub const RP2040_CLK_SYS_HZ: u32 = 125_000_000;

pub const DEFAULT_STEP_COUNT: u16 = 100;

/// Time spent on each step. Also the heartbeat LED blink rate.
pub const DEFAULT_PACING_INTERVAL: Duration = Duration::from_millis(100);

/// Frequency endpoints of a sweep, in kHz.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SweepBand {
    pub low_khz: f64,
    pub high_khz: f64,
}

impl SweepBand {
    /// Audio band, 1 - 20 kHz
    pub const AUDIO: SweepBand = SweepBand::new(1.0, 20.0);

    /// AM IF alignment, 455 kHz +/- 30 kHz
    pub const AM_IF: SweepBand = SweepBand::new(425.0, 485.0);

    /// FM IF alignment, 10.7 MHz +/- 100 kHz
    pub const FM_IF: SweepBand = SweepBand::new(10_600.0, 10_800.0);

    /// Broadcast AM band, 535 - 1605 kHz
    pub const AM_BROADCAST: SweepBand = SweepBand::new(535.0, 1605.0);

    pub const fn new(low_khz: f64, high_khz: f64) -> Self {
        Self { low_khz, high_khz }
    }
}

/// Build-time sweep settings.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SweepConfig {
    pub band: SweepBand,
    pub step_count: u16,
    pub pacing_interval: Duration,
    /// Rate of the oscillator feeding the clock generator. A property of the
    /// board, not something to tune at runtime.
    pub reference_clock_hz: u32,
}

impl SweepConfig {
    pub const fn new(band: SweepBand, reference_clock_hz: u32) -> Self {
        Self {
            band,
            step_count: DEFAULT_STEP_COUNT,
            pacing_interval: DEFAULT_PACING_INTERVAL,
            reference_clock_hz,
        }
    }

    pub const fn with_step_count(self, step_count: u16) -> Self {
        Self { step_count, ..self }
    }

    pub const fn with_pacing_interval(self, pacing_interval: Duration) -> Self {
        Self {
            pacing_interval,
            ..self
        }
    }

    /// Checks that every step of the sweep maps onto a divider `format` can
    /// represent.
    pub fn validate(&self, format: DividerFormat) -> Result<SweepRange, ConfigError> {
        ensure!(self.reference_clock_hz > 0, ZeroReferenceClockSnafu);
        let range = SweepRange::new(self.band.low_khz, self.band.high_khz, self.step_count)?;

        // The low endpoint needs the largest divider, the high endpoint the smallest.
        let low_khz = range.low_khz();
        ensure!(
            !matches!(
                format.encode(self.reference_clock_hz, low_khz),
                Err(DividerError::TooLarge { .. })
            ),
            LowOutOfRangeSnafu {
                low_khz,
                lowest_khz: format.lowest_khz(self.reference_clock_hz),
            }
        );
        let high_khz = range.high_khz();
        ensure!(
            !matches!(
                format.encode(self.reference_clock_hz, high_khz),
                Err(DividerError::TooSmall { .. })
            ),
            HighOutOfRangeSnafu {
                high_khz,
                highest_khz: format.highest_khz(self.reference_clock_hz),
            }
        );

        Ok(range)
    }
}
