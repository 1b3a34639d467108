//! Speed tiers 0 (stop) through 9 (maximum).

use std::fmt;

/// A speed tier guaranteed to lie in `[0, 9]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Level(u8);

impl Level {
    pub const STOP: Level = Level(0);
    pub const MAX: Level = Level(9);

    /// Validated construction; `None` when `v` is outside `[0, 9]`.
    pub fn new(v: i32) -> Option<Self> {
        u8::try_from(v)
            .ok()
            .filter(|&v| v <= Self::MAX.0)
            .map(Level)
    }

    /// Saturating construction for computed values.
    pub fn clamped(v: i64) -> Self {
        Level(v.clamp(0, i64::from(Self::MAX.0)) as u8)
    }

    #[inline]
    pub fn get(self) -> u8 {
        self.0
    }

    #[inline]
    pub fn is_stop(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Level> for u8 {
    fn from(l: Level) -> u8 {
        l.0
    }
}
