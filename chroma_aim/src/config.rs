// THEORY:
// Runtime configuration for the tracker. Every field has a default; the shell
// binary lets `CHROMA_AIM_*` environment variables override them. Values are
// checked here, before any tracker state is built from them.

use crate::control::{
    DEFAULT_SENSITIVITY, DEFAULT_TARGET_COLOR, DEFAULT_THRESHOLD, SENSITIVITY_MAX, SENSITIVITY_MIN,
};
use crate::core_modules::color::Color;
use crate::error::ConfigError;
use std::time::Duration;

/// Roughly 100 ticks per second.
pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_millis(10);
pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_millis(50);
pub const DEFAULT_MOVE_DURATION: Duration = Duration::from_millis(10);
pub const DEFAULT_ACTIVATION_MODE: &str = "Normal AimAssist";

/// Tunable behavior of the tracker and its shell.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Fixed interval between tick starts.
    pub tick_period: Duration,
    /// Upper bound on one frame capture; exceeding it fails the tick.
    pub capture_timeout: Duration,
    /// Duration hint passed with every pointer move.
    pub move_duration: Duration,
    pub target_color: Color,
    pub threshold: i32,
    pub sensitivity: f64,
    /// Mode label the shell activates with.
    pub mode: String,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tick_period: DEFAULT_TICK_PERIOD,
            capture_timeout: DEFAULT_CAPTURE_TIMEOUT,
            move_duration: DEFAULT_MOVE_DURATION,
            target_color: DEFAULT_TARGET_COLOR,
            threshold: DEFAULT_THRESHOLD,
            sensitivity: DEFAULT_SENSITIVITY,
            mode: DEFAULT_ACTIVATION_MODE.to_string(),
        }
    }
}

impl TrackerConfig {
    /// Reads `CHROMA_AIM_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a config from any variable source; unset variables keep defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = var("CHROMA_AIM_TICK_MS") {
            config.tick_period = parse_millis("CHROMA_AIM_TICK_MS", &v)?;
        }
        if let Some(v) = var("CHROMA_AIM_CAPTURE_TIMEOUT_MS") {
            config.capture_timeout = parse_millis("CHROMA_AIM_CAPTURE_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = var("CHROMA_AIM_MOVE_MS") {
            // Zero is allowed here: it means "move instantly".
            let ms: u64 = parse_number("CHROMA_AIM_MOVE_MS", &v)?;
            config.move_duration = Duration::from_millis(ms);
        }
        if let Some(v) = var("CHROMA_AIM_COLOR") {
            config.target_color = Color::from_hex(&v)?;
        }
        if let Some(v) = var("CHROMA_AIM_THRESHOLD") {
            config.threshold = parse_number("CHROMA_AIM_THRESHOLD", &v)?;
        }
        if let Some(v) = var("CHROMA_AIM_SENSITIVITY") {
            let percent: u32 = parse_number("CHROMA_AIM_SENSITIVITY", &v)?;
            config.sensitivity = percent as f64 / 100.0;
            if !(SENSITIVITY_MIN..=SENSITIVITY_MAX).contains(&config.sensitivity) {
                return Err(ConfigError::InvalidVar {
                    name: "CHROMA_AIM_SENSITIVITY",
                    reason: format!("{percent}% is outside 10..=100"),
                });
            }
        }
        if let Some(v) = var("CHROMA_AIM_MODE") {
            config.mode = v.trim().to_string();
        }

        Ok(config)
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidVar {
        name,
        reason: format!("'{value}': {e}"),
    })
}

fn parse_millis(name: &'static str, value: &str) -> Result<Duration, ConfigError> {
    let ms: u64 = parse_number(name, value)?;
    if ms == 0 {
        return Err(ConfigError::InvalidVar {
            name,
            reason: "must be at least 1 ms".into(),
        });
    }
    Ok(Duration::from_millis(ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn empty_environment_gives_defaults() {
        let config = TrackerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, TrackerConfig::default());
        assert_eq!(config.tick_period, Duration::from_millis(10));
    }

    #[test]
    fn overrides_are_applied() {
        let config = TrackerConfig::from_lookup(lookup(&[
            ("CHROMA_AIM_TICK_MS", "25"),
            ("CHROMA_AIM_CAPTURE_TIMEOUT_MS", "80"),
            ("CHROMA_AIM_MOVE_MS", "0"),
            ("CHROMA_AIM_COLOR", "#00ff00"),
            ("CHROMA_AIM_THRESHOLD", "60"),
            ("CHROMA_AIM_SENSITIVITY", "50"),
            ("CHROMA_AIM_MODE", " Lite AimAssist "),
        ]))
        .unwrap();

        assert_eq!(config.tick_period, Duration::from_millis(25));
        assert_eq!(config.capture_timeout, Duration::from_millis(80));
        assert_eq!(config.move_duration, Duration::ZERO);
        assert_eq!(config.target_color, Color::new(0, 255, 0));
        assert_eq!(config.threshold, 60);
        assert_eq!(config.sensitivity, 0.5);
        assert_eq!(config.mode, "Lite AimAssist");
    }

    #[test]
    fn malformed_values_are_errors() {
        assert!(TrackerConfig::from_lookup(lookup(&[("CHROMA_AIM_TICK_MS", "fast")])).is_err());
        assert!(TrackerConfig::from_lookup(lookup(&[("CHROMA_AIM_TICK_MS", "0")])).is_err());
        assert!(TrackerConfig::from_lookup(lookup(&[("CHROMA_AIM_COLOR", "purple")])).is_err());
        assert!(TrackerConfig::from_lookup(lookup(&[("CHROMA_AIM_SENSITIVITY", "150")])).is_err());
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = TrackerConfig::from_lookup(lookup(&[("CHROMA_AIM_THRESHOLD", "  ")])).unwrap();
        assert_eq!(config.threshold, DEFAULT_THRESHOLD);
    }
}
