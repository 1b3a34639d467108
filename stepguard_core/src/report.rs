//! Status reporter: two fixed-width lines for a 16x2 character display.

use crate::distance::DistanceSample;
use crate::level::Level;

pub const LINE_WIDTH: usize = 16;
/// Largest distance the first line can show.
pub const MAX_SHOWN_CM: u32 = 999;

pub const OBSTACLE_LINE: &str = "OBSTACLE! SLOW";
pub const NORMAL_LINE: &str = "Mode: normal";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLines {
    pub line1: String,
    pub line2: String,
}

/// Pad with spaces or truncate to exactly [`LINE_WIDTH`] characters.
pub fn fit_line(s: &str) -> String {
    let mut out: String = s.chars().take(LINE_WIDTH).collect();
    let len = out.chars().count();
    out.extend(std::iter::repeat_n(' ', LINE_WIDTH - len));
    out
}

/// Render the commanded level, effective level and distance.
///
/// Line 1 reads `C:<cmd> E:<eff> D:<cm>cm` with `NoEcho` shown as 0. Line 2
/// flags an obstacle when the sample is valid and below `alert_on_cm`.
pub fn format_status(
    commanded: Level,
    effective: Level,
    sample: DistanceSample,
    alert_on_cm: u32,
) -> StatusLines {
    let shown = sample.display_cm().min(MAX_SHOWN_CM);
    let line1 = fit_line(&format!("C:{commanded} E:{effective} D:{shown:>3}cm"));
    let obstacle = sample.cm().is_some_and(|d| d < alert_on_cm);
    let line2 = fit_line(if obstacle { OBSTACLE_LINE } else { NORMAL_LINE });
    StatusLines { line1, line2 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lvl(v: i32) -> Level {
        Level::new(v).unwrap()
    }

    #[test]
    fn lines_are_always_sixteen_chars() {
        for sample in [
            DistanceSample::NoEcho,
            DistanceSample::Cm(2),
            DistanceSample::Cm(55),
            DistanceSample::Cm(123_456),
        ] {
            let s = format_status(lvl(9), lvl(3), sample, 20);
            assert_eq!(s.line1.chars().count(), LINE_WIDTH);
            assert_eq!(s.line2.chars().count(), LINE_WIDTH);
        }
    }

    #[test]
    fn renders_levels_and_distance() {
        let s = format_status(lvl(5), lvl(3), DistanceSample::Cm(20), 20);
        assert_eq!(s.line1, "C:5 E:3 D: 20cm ");
        assert_eq!(s.line2.trim_end(), NORMAL_LINE);
    }

    #[test]
    fn no_echo_renders_zero_and_normal_mode() {
        let s = format_status(lvl(4), lvl(4), DistanceSample::NoEcho, 20);
        assert_eq!(s.line1, "C:4 E:4 D:  0cm ");
        assert_eq!(s.line2.trim_end(), NORMAL_LINE);
    }

    #[test]
    fn obstacle_below_alert_threshold() {
        let s = format_status(lvl(4), lvl(1), DistanceSample::Cm(19), 20);
        assert_eq!(s.line2, "OBSTACLE! SLOW  ");
        assert_eq!(s.line1, "C:4 E:1 D: 19cm ");
    }

    #[test]
    fn large_distances_are_capped() {
        let s = format_status(lvl(1), lvl(1), DistanceSample::Cm(4000), 20);
        assert_eq!(s.line1, "C:1 E:1 D:999cm ");
    }
}
