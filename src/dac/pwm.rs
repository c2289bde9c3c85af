use defmt::Display2Format;
use embassy_rp::{
    pwm::{Channel, Config, Pwm, PwmPinA},
    Peripheral,
};
use fixed::types::U12F4;
use fixed_macro::fixed;

use crate::peripheral::RampGenerator;

/// Slice clock prescale for the ramp PWM. At 125 MHz and 100 steps this gives
/// a ~156 kHz carrier, well above the RC filter corner.
pub const DEFAULT_PRESCALE: U12F4 = fixed!(8: U12F4);

/// Voltage ramp built from a PWM channel and an external RC low-pass filter.
///
/// The duty cycle is `step / period`, so with `period` equal to the sweep step
/// count the filtered output climbs linearly from 0 V and drops back at wrap.
pub struct PwmRamp<'d, T: Channel> {
    pwm: Pwm<'d, T>,
    config: Config,
    period: u16,
}

impl<'d, T: Channel> PwmRamp<'d, T> {
    pub fn new(
        slice: impl Peripheral<P = T> + 'd,
        pin: impl Peripheral<P = impl PwmPinA<T>> + 'd,
        prescale: U12F4,
        period: u16,
    ) -> Self {
        let config = {
            let mut c = Config::default();
            c.divider = prescale;
            // The counter runs 0..=top, so `top + 1` units per PWM period
            c.top = period.saturating_sub(1);
            c.compare_a = 0;
            c
        };
        let pwm = Pwm::new_output_a(slice, pin, config.clone());
        info!(
            "Ramp PWM: prescale {}, period {}",
            Display2Format(&prescale),
            period
        );

        Self {
            pwm,
            config,
            period,
        }
    }
}

impl<'d, T: Channel> RampGenerator for PwmRamp<'d, T> {
    fn period(&self) -> u16 {
        self.period
    }

    fn set_step(&mut self, step: u16) {
        let step = if step > self.period {
            warn!("Ramp step {} above period {}, clamped", step, self.period);
            self.period
        } else {
            step
        };

        // Compare values live in one 32-bit CC register, written whole
        self.config.compare_a = step;
        self.pwm.set_config(&self.config);
    }
}
