#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema and remote keymap parsing for the stepguard controller.
//!
//! - `Config` and its sections are deserialized from TOML and validated.
//! - The keymap CSV loader enforces exact headers and accepts decimal or
//!   `0x`-prefixed hex codes.
use serde::Deserialize;

/// NEC repeat frame emitted while a remote key is held down.
pub const NEC_REPEAT_CODE: u32 = 0xFFFF_FFFF;

/// One remote button binding: decoded code to speed level.
///
/// `level` is deliberately signed and unbounded here; the command register
/// decides what is acceptable.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    pub code: u32,
    pub level: i32,
}

/// Digit keys 0-9 of the common 21-key NEC remote.
pub fn default_keymap() -> Vec<KeyBinding> {
    const DIGITS: [u32; 10] = [
        0xFF_6897, 0xFF_30CF, 0xFF_18E7, 0xFF_7A85, 0xFF_10EF, 0xFF_38C7, 0xFF_5AA5, 0xFF_42BD,
        0xFF_4AB5, 0xFF_52AD,
    ];
    DIGITS
        .iter()
        .zip(0..)
        .map(|(&code, level)| KeyBinding { code, level })
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct Pins {
    pub trigger: u8,
    pub echo: u8,
    pub step: u8,
    pub dir: u8,
    pub enable: Option<u8>,
    pub alert_led: Option<u8>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RegulationCfg {
    /// Clear distance required at level 0 (cm)
    pub base_safe_cm: u32,
    /// Extra clear distance per commanded level (cm)
    pub per_level_cm: u32,
    /// Readings below this are clamped up to it; also the zero-speed point (cm)
    pub min_clamp_cm: u32,
    /// Band above the safe threshold where regulation holds its last decision (cm)
    pub hysteresis_cm: u32,
}

impl Default for RegulationCfg {
    fn default() -> Self {
        Self {
            base_safe_cm: 10,
            per_level_cm: 5,
            min_clamp_cm: 2,
            hysteresis_cm: 5,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Forward,
    Reverse,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RateCfg {
    pub level1_rpm: f32,
    pub level9_rpm: f32,
    pub direction: Direction,
    pub steps_per_rev: u32,
    /// Steps issued per control loop pass while moving
    pub steps_per_pass: u32,
}

impl Default for RateCfg {
    fn default() -> Self {
        Self {
            level1_rpm: 2.0,
            level9_rpm: 15.0,
            direction: Direction::Forward,
            steps_per_rev: 2048,
            steps_per_pass: 1,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct AlertCfg {
    /// Alert turns on below this distance (cm)
    pub on_cm: u32,
    /// Alert turns off above this distance (cm)
    pub off_cm: u32,
}

impl Default for AlertCfg {
    fn default() -> Self {
        Self {
            on_cm: 20,
            off_cm: 25,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SamplingMode {
    /// Ping the ranger inside the control loop on the sampling cadence
    #[default]
    Direct,
    /// A sampler thread owns the ranger and publishes the latest sample
    Background,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SamplingCfg {
    pub period_ms: u64,
    /// Max wait for an echo; also accepts "timeout_ms"
    #[serde(alias = "timeout_ms")]
    pub echo_timeout_ms: u64,
    pub mode: SamplingMode,
}

impl Default for SamplingCfg {
    fn default() -> Self {
        Self {
            period_ms: 100,
            echo_timeout_ms: 30,
            mode: SamplingMode::Direct,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DisplayCfg {
    pub refresh_ms: u64,
}

impl Default for DisplayCfg {
    fn default() -> Self {
        Self { refresh_ms: 500 }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct KeymapCfg {
    /// Inline bindings; empty means the NEC digit defaults
    pub bindings: Vec<KeyBinding>,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub pins: Pins,
    #[serde(default)]
    pub regulation: RegulationCfg,
    #[serde(default)]
    pub rate: RateCfg,
    #[serde(default)]
    pub alert: AlertCfg,
    #[serde(default)]
    pub sampling: SamplingCfg,
    #[serde(default)]
    pub display: DisplayCfg,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub keymap: KeymapCfg,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    /// Inline keymap if configured, otherwise the NEC digit defaults.
    pub fn effective_keymap(&self) -> Vec<KeyBinding> {
        if self.keymap.bindings.is_empty() {
            default_keymap()
        } else {
            self.keymap.bindings.clone()
        }
    }

    pub fn validate(&self) -> eyre::Result<()> {
        // Regulation
        let r = &self.regulation;
        if r.base_safe_cm <= r.min_clamp_cm {
            eyre::bail!("regulation.base_safe_cm must be > regulation.min_clamp_cm");
        }
        if r.base_safe_cm > 1000 || r.per_level_cm > 100 {
            eyre::bail!("regulation distances are unreasonably large (>10m)");
        }
        if r.hysteresis_cm > 500 {
            eyre::bail!("regulation.hysteresis_cm is unreasonably large (>5m)");
        }

        // Rate
        if !(self.rate.level1_rpm.is_finite() && self.rate.level1_rpm > 0.0) {
            eyre::bail!("rate.level1_rpm must be > 0");
        }
        if !self.rate.level9_rpm.is_finite() || self.rate.level9_rpm < self.rate.level1_rpm {
            eyre::bail!("rate.level9_rpm must be >= rate.level1_rpm");
        }
        if self.rate.steps_per_rev == 0 {
            eyre::bail!("rate.steps_per_rev must be >= 1");
        }
        if self.rate.steps_per_pass == 0 {
            eyre::bail!("rate.steps_per_pass must be >= 1");
        }

        // Alert
        if self.alert.on_cm >= self.alert.off_cm {
            eyre::bail!("alert.on_cm must be < alert.off_cm");
        }

        // Sampling
        if self.sampling.period_ms == 0 {
            eyre::bail!("sampling.period_ms must be >= 1");
        }
        if self.sampling.echo_timeout_ms == 0 {
            eyre::bail!("sampling.echo_timeout_ms must be >= 1");
        }
        if self.sampling.echo_timeout_ms > 1000 {
            eyre::bail!("sampling.echo_timeout_ms is unreasonably large (>1s)");
        }

        // Display
        if self.display.refresh_ms == 0 {
            eyre::bail!("display.refresh_ms must be >= 1");
        }

        // Keymap: levels are range-checked by the command register, codes must be unique
        let bindings = &self.keymap.bindings;
        for (i, b) in bindings.iter().enumerate() {
            if b.code == NEC_REPEAT_CODE {
                eyre::bail!("keymap.bindings[{i}] uses the reserved repeat code 0xFFFFFFFF");
            }
            if bindings[..i].iter().any(|p| p.code == b.code) {
                eyre::bail!("keymap.bindings has duplicate code {:#X}", b.code);
            }
        }

        Ok(())
    }
}

/// Parse a remote code written as decimal or `0x` hex.
pub fn parse_code(s: &str) -> eyre::Result<u32> {
    let t = s.trim();
    let parsed = match t.strip_prefix("0x").or_else(|| t.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => t.parse::<u32>(),
    };
    parsed.map_err(|e| eyre::eyre!("invalid remote code {t:?}: {e}"))
}

#[derive(Debug, Deserialize)]
struct KeymapRow {
    code: String,
    level: i32,
}

/// Load a keymap CSV with exact headers `code,level`.
///
/// Example:
/// code,level
/// 0xFF6897,0
/// 16724175,1
pub fn load_keymap_csv(path: &std::path::Path) -> eyre::Result<Vec<KeyBinding>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| eyre::eyre!("open keymap CSV {:?}: {}", path, e))?;

    let headers = rdr
        .headers()
        .map_err(|e| eyre::eyre!("read CSV headers {:?}: {}", path, e))?
        .clone();
    let expected = ["code", "level"];
    let actual: Vec<String> = headers.iter().map(|s| s.to_string()).collect();
    if actual != expected {
        eyre::bail!(
            "keymap CSV must have headers 'code,level', got: {}",
            actual.join(",")
        );
    }

    let mut out: Vec<KeyBinding> = Vec::new();
    for (idx, rec) in rdr.deserialize::<KeymapRow>().enumerate() {
        let row = rec.map_err(|e| eyre::eyre!("invalid CSV row {}: {}", idx + 2, e))?;
        let code = parse_code(&row.code).map_err(|e| eyre::eyre!("CSV row {}: {}", idx + 2, e))?;
        if code == NEC_REPEAT_CODE {
            eyre::bail!(
                "keymap CSV row {} uses the reserved repeat code 0xFFFFFFFF",
                idx + 2
            );
        }
        if out.iter().any(|b| b.code == code) {
            eyre::bail!("keymap CSV row {} repeats code {:#X}", idx + 2, code);
        }
        out.push(KeyBinding {
            code,
            level: row.level,
        });
    }
    if out.is_empty() {
        eyre::bail!("keymap CSV {:?} has no bindings", path);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_keymap_covers_digits_in_order() {
        let km = default_keymap();
        assert_eq!(km.len(), 10);
        assert_eq!(km[0], KeyBinding { code: 0xFF6897, level: 0 });
        assert_eq!(km[9], KeyBinding { code: 0xFF52AD, level: 9 });
    }

    #[test]
    fn parse_code_accepts_hex_and_decimal() {
        assert_eq!(parse_code("0xFF30CF").unwrap(), 0xFF30CF);
        assert_eq!(parse_code(" 16724175 ").unwrap(), 16_724_175);
        assert!(parse_code("0xZZ").is_err());
        assert!(parse_code("-3").is_err());
    }
}
