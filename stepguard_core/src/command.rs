//! Command register: remote codes to a validated commanded level.

use std::collections::HashMap;

use stepguard_config::{KeyBinding, NEC_REPEAT_CODE, default_keymap};
use stepguard_traits::CommandSource;

use crate::level::Level;

/// What happened to one decoded code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Accepted { previous: Level, level: Level },
    /// Code not present in the keymap.
    Unknown(u32),
    /// Code maps to a value outside `[0, 9]`.
    OutOfRange { code: u32, mapped: i32 },
}

/// Holds the last valid commanded level. Invalid input leaves it untouched.
#[derive(Debug, Clone)]
pub struct CommandRegister {
    keymap: HashMap<u32, i32>,
    level: Level,
}

impl Default for CommandRegister {
    fn default() -> Self {
        Self::new(default_keymap())
    }
}

impl CommandRegister {
    pub fn new(bindings: impl IntoIterator<Item = KeyBinding>) -> Self {
        Self {
            keymap: bindings.into_iter().map(|b| (b.code, b.level)).collect(),
            level: Level::STOP,
        }
    }

    #[inline]
    pub fn level(&self) -> Level {
        self.level
    }

    pub fn lookup(&self, code: u32) -> Option<i32> {
        self.keymap.get(&code).copied()
    }

    /// Map `code` through the keymap and store the level if it is in range.
    pub fn apply(&mut self, code: u32) -> CommandOutcome {
        let Some(mapped) = self.lookup(code) else {
            tracing::warn!(code = format_args!("{code:#X}"), "ignoring unknown command code");
            return CommandOutcome::Unknown(code);
        };
        match Level::new(mapped) {
            Some(level) => {
                let previous = self.level;
                self.level = level;
                if previous != level {
                    tracing::info!(from = %previous, to = %level, "commanded level changed");
                }
                CommandOutcome::Accepted { previous, level }
            }
            None => {
                tracing::warn!(
                    code = format_args!("{code:#X}"),
                    mapped,
                    "ignoring command mapped outside 0..=9"
                );
                CommandOutcome::OutOfRange { code, mapped }
            }
        }
    }
}

/// Decoder-side filter that drops NEC repeat frames before they reach the register.
pub struct RepeatFilter<S> {
    inner: S,
    dropped: u64,
}

impl<S: CommandSource> RepeatFilter<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, dropped: 0 }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl<S: CommandSource> CommandSource for RepeatFilter<S> {
    fn poll(&mut self) -> Option<u32> {
        loop {
            match self.inner.poll()? {
                NEC_REPEAT_CODE => {
                    self.dropped += 1;
                    tracing::trace!("dropping repeat frame");
                }
                code => return Some(code),
            }
        }
    }
}
