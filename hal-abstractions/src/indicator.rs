//! Status indicator abstraction
//!
//! The firmware shows link state on a single light: blinking while
//! waiting for a central, solid while connected.

use embedded_hal::digital::{PinState, StatefulOutputPin};

/// A two-state status light
pub trait StatusIndicator {
    /// Drive the light on or off
    fn set(&mut self, on: bool);

    /// Invert the light
    fn toggle(&mut self);
}

/// Adapts any `embedded-hal` stateful output pin into a [`StatusIndicator`]
///
/// Pin errors are dropped: a failed LED write is not worth interrupting
/// timekeeping for, and GPIO outputs on supported boards are infallible.
pub struct PinIndicator<P> {
    pin: P,
    active_low: bool,
}

impl<P: StatefulOutputPin> PinIndicator<P> {
    /// LED lit when the pin is high
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            active_low: false,
        }
    }

    /// LED lit when the pin is low (common on development kits)
    pub fn active_low(pin: P) -> Self {
        Self {
            pin,
            active_low: true,
        }
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: StatefulOutputPin> StatusIndicator for PinIndicator<P> {
    fn set(&mut self, on: bool) {
        let _ = self.pin.set_state(PinState::from(on != self.active_low));
    }

    fn toggle(&mut self) {
        let _ = self.pin.toggle();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorType, OutputPin};

    struct FakePin {
        high: bool,
    }

    impl ErrorType for FakePin {
        type Error = Infallible;
    }

    impl OutputPin for FakePin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = true;
            Ok(())
        }
    }

    impl StatefulOutputPin for FakePin {
        fn is_set_high(&mut self) -> Result<bool, Infallible> {
            Ok(self.high)
        }

        fn is_set_low(&mut self) -> Result<bool, Infallible> {
            Ok(!self.high)
        }
    }

    #[test]
    fn test_active_high_indicator() {
        let mut led = PinIndicator::new(FakePin { high: false });
        led.set(true);
        assert!(led.pin.high);
        led.toggle();
        assert!(!led.pin.high);
    }

    #[test]
    fn test_active_low_indicator() {
        let mut led = PinIndicator::active_low(FakePin { high: true });
        led.set(true);
        assert!(!led.release().high);
    }
}
