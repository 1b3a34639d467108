//! Test and helper mocks for stepguard_core.
//!
//! Scripted collaborators for deterministic loop tests, plus `NoRanger` for
//! driving the controller with externally acquired samples.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use stepguard_traits::{AlertOutput, BoxError, CommandSource, Ranger, StatusDisplay, Stepper};

use crate::distance::echo_for_cm;

/// A ranger that never answers; used when samples arrive via `step_with_sample`.
pub struct NoRanger;

impl Ranger for NoRanger {
    fn ping(&mut self, _timeout: Duration) -> Result<Option<Duration>, BoxError> {
        Ok(None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Echo {
    Cm(u32),
    Silent,
    Fault,
}

/// Replays a fixed sequence of distances; silent once exhausted.
pub struct ScriptedRanger {
    script: VecDeque<Echo>,
    repeat_last: bool,
    last: Echo,
    timeouts: Arc<Mutex<Vec<Duration>>>,
}

impl ScriptedRanger {
    /// `Some(cm)` answers with an echo for `cm`, `None` stays silent.
    pub fn new(distances: impl IntoIterator<Item = Option<u32>>) -> Self {
        Self::from_echoes(
            distances
                .into_iter()
                .map(|d| d.map_or(Echo::Silent, Echo::Cm)),
        )
    }

    pub fn from_echoes(echoes: impl IntoIterator<Item = Echo>) -> Self {
        Self {
            script: echoes.into_iter().collect(),
            repeat_last: false,
            last: Echo::Silent,
            timeouts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Append a failing ping to the script.
    pub fn then_fault(mut self) -> Self {
        self.script.push_back(Echo::Fault);
        self
    }

    /// Keep answering with the final entry once the script runs out.
    pub fn repeat_last(mut self) -> Self {
        self.repeat_last = true;
        self
    }

    /// Shared log of the timeouts passed to `ping`.
    pub fn timeouts(&self) -> Arc<Mutex<Vec<Duration>>> {
        self.timeouts.clone()
    }
}

impl Ranger for ScriptedRanger {
    fn ping(&mut self, timeout: Duration) -> Result<Option<Duration>, BoxError> {
        if let Ok(mut t) = self.timeouts.lock() {
            t.push(timeout);
        }
        let echo = match self.script.pop_front() {
            Some(e) => {
                self.last = e;
                e
            }
            None if self.repeat_last => self.last,
            None => Echo::Silent,
        };
        match echo {
            Echo::Cm(cm) => Ok(Some(echo_for_cm(cm))),
            Echo::Silent => Ok(None),
            Echo::Fault => Err(Box::new(std::io::Error::other("scripted ranger fault"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepperCall {
    SetSpeed(f32),
    Step(i32),
    Release,
}

/// Records every driver call.
#[derive(Default, Clone)]
pub struct SpyStepper {
    calls: Arc<Mutex<Vec<StepperCall>>>,
    fail: bool,
}

impl SpyStepper {
    /// A stepper whose every call errors.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Arc<Mutex<Vec<StepperCall>>> {
        self.calls.clone()
    }

    fn record(&mut self, call: StepperCall) -> Result<(), BoxError> {
        if self.fail {
            return Err(Box::new(std::io::Error::other("stepper driver fault")));
        }
        if let Ok(mut c) = self.calls.lock() {
            c.push(call);
        }
        Ok(())
    }
}

impl Stepper for SpyStepper {
    fn set_speed(&mut self, rpm: f32) -> Result<(), BoxError> {
        self.record(StepperCall::SetSpeed(rpm))
    }
    fn step(&mut self, steps: i32) -> Result<(), BoxError> {
        self.record(StepperCall::Step(steps))
    }
    fn release(&mut self) -> Result<(), BoxError> {
        self.record(StepperCall::Release)
    }
}

/// Records every alert write.
#[derive(Default, Clone)]
pub struct RecordingAlert {
    writes: Arc<Mutex<Vec<bool>>>,
    fail: bool,
}

impl RecordingAlert {
    /// An alert output whose every write errors.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn writes(&self) -> Arc<Mutex<Vec<bool>>> {
        self.writes.clone()
    }
}

impl AlertOutput for RecordingAlert {
    fn set(&mut self, on: bool) -> Result<(), BoxError> {
        if self.fail {
            return Err(Box::new(std::io::Error::other("alert pin fault")));
        }
        if let Ok(mut w) = self.writes.lock() {
            w.push(on);
        }
        Ok(())
    }
}

/// Records every rendered pair of lines.
#[derive(Default, Clone)]
pub struct RecordingDisplay {
    frames: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingDisplay {
    pub fn frames(&self) -> Arc<Mutex<Vec<(String, String)>>> {
        self.frames.clone()
    }
}

impl StatusDisplay for RecordingDisplay {
    fn show(&mut self, line1: &str, line2: &str) -> Result<(), BoxError> {
        if let Ok(mut f) = self.frames.lock() {
            f.push((line1.to_string(), line2.to_string()));
        }
        Ok(())
    }
}

/// Queue of decoded codes; clones share the queue so tests can push mid-run.
#[derive(Default, Clone)]
pub struct ScriptedCommands {
    queue: Arc<Mutex<VecDeque<u32>>>,
}

impl ScriptedCommands {
    pub fn new(codes: impl IntoIterator<Item = u32>) -> Self {
        Self {
            queue: Arc::new(Mutex::new(codes.into_iter().collect())),
        }
    }

    pub fn push(&self, code: u32) {
        if let Ok(mut q) = self.queue.lock() {
            q.push_back(code);
        }
    }
}

impl CommandSource for ScriptedCommands {
    fn poll(&mut self) -> Option<u32> {
        self.queue.lock().ok()?.pop_front()
    }
}
