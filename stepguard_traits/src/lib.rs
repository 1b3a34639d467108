//! Collaborator seams for the stepguard controller.
//!
//! Everything the regulation engine talks to (ranging sensor, stepper driver,
//! alert output, status display, command decoder) sits behind one of these
//! traits so the core stays hardware-agnostic and can be driven by scripted
//! fakes in tests.
pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

use std::time::Duration;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// External ranging sensor (trigger pulse out, echo pulse width in).
pub trait Ranger {
    /// Fire one measurement and wait at most `timeout` for the echo.
    ///
    /// Returns the echo pulse width, or `None` when no echo arrived in time.
    fn ping(&mut self, timeout: Duration) -> Result<Option<Duration>, BoxError>;
}

/// Rotation sense for the actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

impl Direction {
    #[inline]
    pub fn signum(self) -> i32 {
        match self {
            Direction::Forward => 1,
            Direction::Reverse => -1,
        }
    }
}

/// Stepper driver that moves a small increment per call rather than running
/// autonomously; callers must keep issuing `step` while motion is wanted.
pub trait Stepper {
    fn set_speed(&mut self, rpm: f32) -> Result<(), BoxError>;
    /// Move `steps` steps; the sign selects the direction.
    fn step(&mut self, steps: i32) -> Result<(), BoxError>;
    /// De-energize the coils.
    fn release(&mut self) -> Result<(), BoxError>;
}

/// Single binary alert indicator (LED, buzzer).
pub trait AlertOutput {
    fn set(&mut self, on: bool) -> Result<(), BoxError>;
}

/// Two-line character display.
pub trait StatusDisplay {
    fn show(&mut self, line1: &str, line2: &str) -> Result<(), BoxError>;
}

/// Non-blocking source of decoded remote-control codes.
pub trait CommandSource {
    /// Next pending code, if any. Must not block.
    fn poll(&mut self) -> Option<u32>;
}

impl<T: Ranger + ?Sized> Ranger for Box<T> {
    fn ping(&mut self, timeout: Duration) -> Result<Option<Duration>, BoxError> {
        (**self).ping(timeout)
    }
}

impl<T: Stepper + ?Sized> Stepper for Box<T> {
    fn set_speed(&mut self, rpm: f32) -> Result<(), BoxError> {
        (**self).set_speed(rpm)
    }
    fn step(&mut self, steps: i32) -> Result<(), BoxError> {
        (**self).step(steps)
    }
    fn release(&mut self) -> Result<(), BoxError> {
        (**self).release()
    }
}

impl<T: AlertOutput + ?Sized> AlertOutput for Box<T> {
    fn set(&mut self, on: bool) -> Result<(), BoxError> {
        (**self).set(on)
    }
}

impl<T: StatusDisplay + ?Sized> StatusDisplay for Box<T> {
    fn show(&mut self, line1: &str, line2: &str) -> Result<(), BoxError> {
        (**self).show(line1, line2)
    }
}

impl<T: CommandSource + ?Sized> CommandSource for Box<T> {
    fn poll(&mut self) -> Option<u32> {
        (**self).poll()
    }
}
