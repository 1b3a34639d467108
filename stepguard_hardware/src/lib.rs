//! Collaborators for the regulation loop: simulated by default, GPIO-backed
//! under the `hardware` feature.

pub mod error;
pub mod util;

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use stepguard_traits::clock::{Clock, MonotonicClock};
use stepguard_traits::{AlertOutput, BoxError, Ranger, StatusDisplay, Stepper};

use crate::error::HwError;

/// Round-trip echo time per centimetre at 343 m/s, in microseconds.
const ECHO_US_PER_CM: f64 = 20_000.0 / 343.0;
/// Beyond this the simulated sensor reports no echo, like an HC-SR04 at ~4 m.
pub const SIM_MAX_RANGE_CM: f32 = 400.0;

/// Simulated ultrasonic ranger: an obstacle approaching at constant speed.
///
/// Distance starts at `start_cm` and shrinks by `speed_cm_s` per second of
/// clock time until it reaches `floor_cm`, where it stays.
pub struct SimulatedRanger {
    clock: Arc<dyn Clock + Send + Sync>,
    origin: Instant,
    start_cm: f32,
    speed_cm_s: f32,
    floor_cm: f32,
    pings: u64,
}

impl SimulatedRanger {
    pub fn new(start_cm: f32, speed_cm_s: f32) -> Self {
        Self::with_clock(start_cm, speed_cm_s, Arc::new(MonotonicClock::new()))
    }

    pub fn with_clock(start_cm: f32, speed_cm_s: f32, clock: Arc<dyn Clock + Send + Sync>) -> Self {
        let origin = clock.now();
        Self {
            clock,
            origin,
            start_cm,
            speed_cm_s,
            floor_cm: 1.0,
            pings: 0,
        }
    }

    /// Closest distance the obstacle reaches.
    pub fn with_floor(mut self, floor_cm: f32) -> Self {
        self.floor_cm = floor_cm;
        self
    }

    /// Obstacle distance at the current clock time.
    pub fn distance_cm(&self) -> f32 {
        let t = self.clock.now().saturating_duration_since(self.origin).as_secs_f32();
        (self.start_cm - self.speed_cm_s * t).max(self.floor_cm)
    }

    pub fn pings(&self) -> u64 {
        self.pings
    }
}

impl Ranger for SimulatedRanger {
    fn ping(&mut self, timeout: Duration) -> Result<Option<Duration>, BoxError> {
        self.pings += 1;
        let cm = self.distance_cm();
        if !(cm.is_finite() && cm > 0.0) || cm > SIM_MAX_RANGE_CM {
            return Ok(None);
        }
        // rounded up so a whole-centimetre distance reads back unchanged
        let width = Duration::from_micros((f64::from(cm) * ECHO_US_PER_CM).ceil() as u64);
        if width > timeout {
            tracing::trace!(cm, "simulated echo beyond timeout");
            return Ok(None);
        }
        Ok(Some(width))
    }
}

/// Shared view of a [`SimulatedStepper`], kept by tests and the CLI summary.
#[derive(Debug, Clone, Default)]
pub struct StepperProbe {
    position: Arc<AtomicI64>,
    released: Arc<AtomicBool>,
    rpm: Arc<Mutex<f32>>,
}

impl StepperProbe {
    /// Net steps issued (reverse counts negative).
    pub fn position(&self) -> i64 {
        self.position.load(Ordering::Relaxed)
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Relaxed)
    }

    pub fn rpm(&self) -> f32 {
        self.rpm.lock().map(|r| *r).unwrap_or(0.0)
    }
}

/// Simulated stepper: counts steps, never blocks.
#[derive(Default)]
pub struct SimulatedStepper {
    probe: StepperProbe,
}

impl SimulatedStepper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn probe(&self) -> StepperProbe {
        self.probe.clone()
    }
}

impl Stepper for SimulatedStepper {
    fn set_speed(&mut self, rpm: f32) -> Result<(), BoxError> {
        if !rpm.is_finite() || rpm < 0.0 {
            return Err(Box::new(HwError::Gpio(format!("invalid stepper rate {rpm}"))));
        }
        if let Ok(mut r) = self.probe.rpm.lock() {
            *r = rpm;
        }
        self.probe.released.store(false, Ordering::Relaxed);
        tracing::debug!(rpm, "simulated stepper rate");
        Ok(())
    }

    fn step(&mut self, steps: i32) -> Result<(), BoxError> {
        self.probe.position.fetch_add(i64::from(steps), Ordering::Relaxed);
        Ok(())
    }

    fn release(&mut self) -> Result<(), BoxError> {
        if let Ok(mut r) = self.probe.rpm.lock() {
            *r = 0.0;
        }
        self.probe.released.store(true, Ordering::Relaxed);
        tracing::debug!(position = self.probe.position(), "simulated stepper released");
        Ok(())
    }
}

/// Simulated alert LED: logs transitions.
#[derive(Debug, Default)]
pub struct SimulatedAlert {
    on: bool,
}

impl SimulatedAlert {
    pub fn is_on(&self) -> bool {
        self.on
    }
}

impl AlertOutput for SimulatedAlert {
    fn set(&mut self, on: bool) -> Result<(), BoxError> {
        if self.on != on {
            tracing::info!(on, "alert led (simulated)");
        }
        self.on = on;
        Ok(())
    }
}

/// Status display that emits each frame as a log event.
#[derive(Debug, Default)]
pub struct LogDisplay {
    last: Option<(String, String)>,
}

impl LogDisplay {
    pub fn last_frame(&self) -> Option<&(String, String)> {
        self.last.as_ref()
    }
}

impl StatusDisplay for LogDisplay {
    fn show(&mut self, line1: &str, line2: &str) -> Result<(), BoxError> {
        tracing::info!(target: "stepguard::display", "[{line1}] [{line2}]");
        self.last = Some((line1.to_string(), line2.to_string()));
        Ok(())
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod hardware {
    //! Raspberry Pi GPIO collaborators (rppal).

    use std::time::{Duration, Instant};

    use rppal::gpio::{Gpio, InputPin, OutputPin};
    use stepguard_traits::{AlertOutput, BoxError, Ranger, Stepper};

    use crate::error::{HwError, Result};
    use crate::util::{step_interval, wait_for_level};

    /// HC-SR04 style ranger: 10 us trigger pulse, echo pulse width is the answer.
    pub struct Hcsr04 {
        trigger: OutputPin,
        echo: InputPin,
    }

    impl Hcsr04 {
        pub fn new(gpio: &Gpio, trigger_pin: u8, echo_pin: u8) -> Result<Self> {
            let mut trigger = gpio.get(trigger_pin)?.into_output();
            trigger.set_low();
            let echo = gpio.get(echo_pin)?.into_input();
            Ok(Self { trigger, echo })
        }

        fn measure(&mut self, timeout: Duration) -> Result<Option<Duration>> {
            let started = Instant::now();
            self.trigger.set_high();
            spin_for(Duration::from_micros(10));
            self.trigger.set_low();

            let echo = &self.echo;
            let rise = match wait_for_level(|| echo.is_high(), true, timeout, Duration::ZERO) {
                Ok(t) => t,
                Err(HwError::EchoTimeout) => return Ok(None),
                Err(e) => return Err(e),
            };
            let remaining = timeout.saturating_sub(started.elapsed());
            match wait_for_level(|| echo.is_high(), false, remaining, Duration::ZERO) {
                Ok(fall) => Ok(Some(fall.saturating_duration_since(rise))),
                // echo still high at the deadline: out of range
                Err(HwError::EchoTimeout) => Ok(None),
                Err(e) => Err(e),
            }
        }
    }

    impl Ranger for Hcsr04 {
        fn ping(&mut self, timeout: Duration) -> std::result::Result<Option<Duration>, BoxError> {
            Ok(self.measure(timeout)?)
        }
    }

    /// Step/dir driver with an optional active-low enable line.
    pub struct GpioStepper {
        step: OutputPin,
        dir: OutputPin,
        enable: Option<OutputPin>,
        steps_per_rev: u32,
        interval: Option<Duration>,
        last_pulse: Option<Instant>,
    }

    impl GpioStepper {
        pub fn new(
            gpio: &Gpio,
            step_pin: u8,
            dir_pin: u8,
            enable_pin: Option<u8>,
            steps_per_rev: u32,
        ) -> Result<Self> {
            let mut step = gpio.get(step_pin)?.into_output();
            step.set_low();
            let dir = gpio.get(dir_pin)?.into_output();
            let enable = match enable_pin {
                Some(p) => {
                    let mut pin = gpio.get(p)?.into_output();
                    pin.set_high();
                    Some(pin)
                }
                None => None,
            };
            Ok(Self {
                step,
                dir,
                enable,
                steps_per_rev,
                interval: None,
                last_pulse: None,
            })
        }
    }

    impl Stepper for GpioStepper {
        fn set_speed(&mut self, rpm: f32) -> std::result::Result<(), BoxError> {
            self.interval = step_interval(rpm, self.steps_per_rev);
            if let Some(en) = self.enable.as_mut() {
                en.set_low();
            }
            Ok(())
        }

        /// Emit `|steps|` pulses, paced so the motor never exceeds the set rate.
        fn step(&mut self, steps: i32) -> std::result::Result<(), BoxError> {
            let Some(interval) = self.interval else {
                return Ok(());
            };
            if steps < 0 {
                self.dir.set_low();
            } else {
                self.dir.set_high();
            }
            for _ in 0..steps.unsigned_abs() {
                if let Some(last) = self.last_pulse {
                    let wait = interval.saturating_sub(last.elapsed());
                    if !wait.is_zero() {
                        std::thread::sleep(wait);
                    }
                }
                self.step.set_high();
                spin_for(Duration::from_micros(2));
                self.step.set_low();
                self.last_pulse = Some(Instant::now());
            }
            Ok(())
        }

        fn release(&mut self) -> std::result::Result<(), BoxError> {
            self.interval = None;
            self.step.set_low();
            if let Some(en) = self.enable.as_mut() {
                en.set_high();
            }
            Ok(())
        }
    }

    pub struct GpioAlert {
        pin: OutputPin,
    }

    impl GpioAlert {
        pub fn new(gpio: &Gpio, pin: u8) -> Result<Self> {
            let mut pin = gpio.get(pin)?.into_output();
            pin.set_low();
            Ok(Self { pin })
        }
    }

    impl AlertOutput for GpioAlert {
        fn set(&mut self, on: bool) -> std::result::Result<(), BoxError> {
            if on {
                self.pin.set_high();
            } else {
                self.pin.set_low();
            }
            Ok(())
        }
    }

    /// Open the GPIO controller.
    pub fn open_gpio() -> Result<Gpio> {
        Ok(Gpio::new()?)
    }

    #[inline]
    fn spin_for(d: Duration) {
        let until = Instant::now() + d;
        while Instant::now() < until {
            std::hint::spin_loop();
        }
    }
}
