use snafu::prelude::Snafu;

/// Configuration faults detected before the sweep is allowed to start.
#[derive(Debug, Snafu, PartialEq)]
#[snafu(visibility(pub(crate)))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    #[snafu(display("sweep needs at least one step"))]
    ZeroSteps,

    #[snafu(display("reference clock rate is zero"))]
    ZeroReferenceClock,

    #[snafu(display("{khz} kHz is not a usable sweep endpoint"))]
    InvalidFrequency { khz: f64 },

    #[snafu(display("low endpoint {low_khz} kHz is above high endpoint {high_khz} kHz"))]
    InvertedRange { low_khz: f64, high_khz: f64 },

    #[snafu(display("low endpoint {low_khz} kHz is below the lowest reachable {lowest_khz} kHz"))]
    LowOutOfRange { low_khz: f64, lowest_khz: f64 },

    #[snafu(display("high endpoint {high_khz} kHz is above the highest reachable {highest_khz} kHz"))]
    HighOutOfRange { high_khz: f64, highest_khz: f64 },

    #[snafu(display("ramp period {period} is shorter than {step_count} steps"))]
    RampTooShort { step_count: u16, period: u16 },
}

/// Faults that end a running sweep.
#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SweepError {
    #[snafu(display("reference clock rejected divider word {word:#x}"))]
    DividerRejected { word: u32 },
}
