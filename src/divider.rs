//! Fractional-N divider encoding.
//!
//! A clock generator derives its output from a fixed reference by dividing it
//! by `integer + fraction / 2^fractional_bits`. The divider word packs both
//! fields, integer part in the upper bits.

use snafu::prelude::{ensure, Snafu};

/// Bit layout and scale of a divider word.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DividerFormat {
    pub integer_bits: u8,
    pub fractional_bits: u8,
    /// Word units per unit of `reference / output`. Equal to
    /// `2^fractional_bits` divided by any fixed post-divider of the output stage.
    pub scale: f64,
}

impl DividerFormat {
    /// RP2040 GPOUT clock output: 24-bit integer, 8-bit fraction.
    pub const GPOUT: DividerFormat = DividerFormat::new(24, 8, 256.0);

    /// Reference oscillator with a 15-bit divisor, 9-bit trim and a fixed /2
    /// output stage.
    pub const REFO: DividerFormat = DividerFormat::new(15, 9, 256.0);

    /// # Panics
    ///
    /// If `integer_bits` is zero or the word is wider than 32 bits. In a const
    /// context this is a compile error.
    pub const fn new(integer_bits: u8, fractional_bits: u8, scale: f64) -> Self {
        assert!(
            integer_bits >= 1 && integer_bits as u32 + fractional_bits as u32 <= 32,
            "divider word must fit in 32 bits with at least one integer bit"
        );
        Self {
            integer_bits,
            fractional_bits,
            scale,
        }
    }

    /// Smallest word the generator accepts (integer part of one).
    pub const fn min_word(&self) -> u32 {
        1 << self.fractional_bits
    }

    pub const fn max_word(&self) -> u32 {
        ((1u64 << (self.integer_bits as u32 + self.fractional_bits as u32)) - 1) as u32
    }

    /// Unrounded divider word for `khz`.
    pub fn exact_word(&self, reference_clock_hz: u32, khz: f64) -> f64 {
        reference_clock_hz as f64 / 1000.0 * self.scale / khz
    }

    /// Divider word for `khz`, rounded half-up.
    ///
    /// Float to int casts saturate, so `khz -> 0` lands on `u64::MAX` and a
    /// negative or NaN frequency lands on zero. Both fail the range check.
    pub fn nearest_word(&self, reference_clock_hz: u32, khz: f64) -> u64 {
        (self.exact_word(reference_clock_hz, khz) + 0.5) as u64
    }

    pub fn encode(&self, reference_clock_hz: u32, khz: f64) -> Result<DividerValue, DividerError> {
        DividerValue::new(self.nearest_word(reference_clock_hz, khz), *self)
    }

    /// Like [`encode`](Self::encode), but clamps out of range words to the
    /// nearest representable divider instead of failing.
    pub fn encode_saturating(&self, reference_clock_hz: u32, khz: f64) -> Encoded {
        match self.encode(reference_clock_hz, khz) {
            Ok(divider) => Encoded {
                divider,
                saturation: None,
            },
            Err(DividerError::TooLarge { .. }) => Encoded {
                divider: DividerValue {
                    word: self.max_word(),
                    format: *self,
                },
                saturation: Some(Saturation::Maximum),
            },
            Err(DividerError::TooSmall { .. }) => Encoded {
                divider: DividerValue {
                    word: self.min_word(),
                    format: *self,
                },
                saturation: Some(Saturation::Minimum),
            },
        }
    }

    /// Lowest output frequency in kHz, reached with the largest divider.
    pub fn lowest_khz(&self, reference_clock_hz: u32) -> f64 {
        decode_khz(reference_clock_hz, self.scale, self.max_word())
    }

    /// Highest output frequency in kHz, reached with the smallest divider.
    pub fn highest_khz(&self, reference_clock_hz: u32) -> f64 {
        decode_khz(reference_clock_hz, self.scale, self.min_word())
    }
}

/// A divider word known to be representable in its format.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DividerValue {
    word: u32,
    format: DividerFormat,
}

impl DividerValue {
    pub fn new(word: u64, format: DividerFormat) -> Result<Self, DividerError> {
        let max = format.max_word();
        let min = format.min_word();
        ensure!(word <= u64::from(max), TooLargeSnafu { word, max });
        ensure!(word >= u64::from(min), TooSmallSnafu { word, min });
        Ok(Self {
            word: word as u32,
            format,
        })
    }

    pub fn word(&self) -> u32 {
        self.word
    }

    pub fn format(&self) -> DividerFormat {
        self.format
    }

    /// Integer divisor field.
    pub fn integer(&self) -> u32 {
        self.word >> self.format.fractional_bits
    }

    /// Fractional divisor field.
    pub fn fraction(&self) -> u32 {
        self.word & ((1 << self.format.fractional_bits) - 1)
    }

    /// `reference / output` as a real number.
    pub fn ratio(&self) -> f64 {
        self.word as f64 / self.format.scale
    }

    /// Output frequency this divider produces, in kHz.
    pub fn frequency_khz(&self, reference_clock_hz: u32) -> f64 {
        decode_khz(reference_clock_hz, self.format.scale, self.word)
    }
}

fn decode_khz(reference_clock_hz: u32, scale: f64, word: u32) -> f64 {
    reference_clock_hz as f64 / 1000.0 * scale / word as f64
}

/// Result of a saturating encode.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Encoded {
    pub divider: DividerValue,
    pub saturation: Option<Saturation>,
}

/// Which end of the divider range a clamped word was pinned to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Saturation {
    /// Requested frequency was too low; the divider sits at its maximum.
    Maximum,
    /// Requested frequency was too high; the divider sits at its minimum.
    Minimum,
}

#[derive(Debug, Snafu, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DividerError {
    #[snafu(display("divider word {word} exceeds maximum {max}"))]
    TooLarge { word: u64, max: u32 },

    #[snafu(display("divider word {word} is below minimum {min}"))]
    TooSmall { word: u64, min: u32 },
}
