use embedded_hal_1::digital::StatefulOutputPin;

/// Indicator flipped once per sweep step.
pub trait Heartbeat {
    fn beat(&mut self);
}

impl<P: StatefulOutputPin> Heartbeat for P {
    fn beat(&mut self) {
        if self.toggle().is_err() {
            warn!("heartbeat toggle failed");
        }
    }
}
