//! Selector configuration.
//!
//! Configuration is resolved once at startup: built-in defaults, then an
//! optional JSON config file named by the `SELECTOR_CONFIG` environment
//! variable, then per-field `SELECTOR_*` environment overrides, then
//! validation. The periodic-passthrough period uses a small grammar,
//! `<integer><unit>` with unit `d`, `h`, `m`, or `s`; anything else is
//! rejected before a selector is ever constructed.

use anyhow::{anyhow, Result};
use log::LevelFilter;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_MIN_CONFIDENCE: f32 = 0.5;
const DEFAULT_MIN_WIDTH: f32 = 10.0;
const DEFAULT_MIN_HEIGHT: f32 = 10.0;
const DEFAULT_MAX_DETECTIONS: usize = 4;
const DEFAULT_TIME_PAST: &str = "1d";
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Info;

/// Construction-time configuration failure.
///
/// Fatal and non-retryable: the configuration has to be fixed before the
/// stage can run.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unsupported period format {value:?}, expected <integer><d|h|m|s>")]
    UnsupportedPeriod { value: String },

    #[error("period magnitude in {value:?} is not an integer")]
    InvalidMagnitude { value: String },
}

#[derive(Debug, Deserialize, Default)]
struct SelectorConfigFile {
    min_confidence: Option<f32>,
    min_width: Option<f32>,
    min_height: Option<f32>,
    max_detections: Option<usize>,
    time_past: Option<String>,
    log_level: Option<String>,
}

/// Resolved selector configuration. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct SelectorConfig {
    /// Detections below this confidence contribute to a forward verdict.
    pub min_confidence: f32,
    /// Detections narrower than this contribute to a forward verdict.
    pub min_width: f32,
    /// Detections shorter than this contribute to a forward verdict.
    pub min_height: f32,
    /// Detection counts strictly above this contribute to a forward verdict.
    pub max_detections: usize,
    /// Period string for the forced-forward timer, e.g. "1d", "5h", "30m", "10s".
    pub time_past: String,
    /// Diagnostic verbosity. No effect on filtering.
    pub log_level: LevelFilter,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            min_width: DEFAULT_MIN_WIDTH,
            min_height: DEFAULT_MIN_HEIGHT,
            max_detections: DEFAULT_MAX_DETECTIONS,
            time_past: DEFAULT_TIME_PAST.to_string(),
            log_level: DEFAULT_LOG_LEVEL,
        }
    }
}

impl SelectorConfig {
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("SELECTOR_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default())?;
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: SelectorConfigFile) -> Result<Self> {
        let log_level = match file.log_level {
            Some(raw) => parse_log_level(&raw)?,
            None => DEFAULT_LOG_LEVEL,
        };
        Ok(Self {
            min_confidence: file.min_confidence.unwrap_or(DEFAULT_MIN_CONFIDENCE),
            min_width: file.min_width.unwrap_or(DEFAULT_MIN_WIDTH),
            min_height: file.min_height.unwrap_or(DEFAULT_MIN_HEIGHT),
            max_detections: file.max_detections.unwrap_or(DEFAULT_MAX_DETECTIONS),
            time_past: file
                .time_past
                .unwrap_or_else(|| DEFAULT_TIME_PAST.to_string()),
            log_level,
        })
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(raw) = std::env::var("SELECTOR_MIN_CONFIDENCE") {
            self.min_confidence = raw
                .parse()
                .map_err(|_| anyhow!("SELECTOR_MIN_CONFIDENCE must be a number"))?;
        }
        if let Ok(raw) = std::env::var("SELECTOR_MIN_WIDTH") {
            self.min_width = raw
                .parse()
                .map_err(|_| anyhow!("SELECTOR_MIN_WIDTH must be a number"))?;
        }
        if let Ok(raw) = std::env::var("SELECTOR_MIN_HEIGHT") {
            self.min_height = raw
                .parse()
                .map_err(|_| anyhow!("SELECTOR_MIN_HEIGHT must be a number"))?;
        }
        if let Ok(raw) = std::env::var("SELECTOR_MAX_DETECTIONS") {
            self.max_detections = raw
                .parse()
                .map_err(|_| anyhow!("SELECTOR_MAX_DETECTIONS must be an integer"))?;
        }
        if let Ok(raw) = std::env::var("SELECTOR_TIME_PAST") {
            if !raw.trim().is_empty() {
                self.time_past = raw;
            }
        }
        if let Ok(raw) = std::env::var("SELECTOR_LOG_LEVEL") {
            if !raw.trim().is_empty() {
                self.log_level = parse_log_level(&raw)?;
            }
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(anyhow!(
                "min_confidence must be within 0.0..=1.0, got {}",
                self.min_confidence
            ));
        }
        parse_period(&self.time_past)?;
        Ok(())
    }
}

/// Parses a forced-forward period such as `"1d"`, `"5h"`, `"30m"`, or `"10s"`.
///
/// Exactly one trailing unit character and an integer magnitude; no fractional
/// or compound periods.
pub fn parse_period(period: &str) -> Result<Duration, ConfigError> {
    let (magnitude, unit_secs) = if let Some(value) = period.strip_suffix('d') {
        (value, 86_400)
    } else if let Some(value) = period.strip_suffix('h') {
        (value, 3_600)
    } else if let Some(value) = period.strip_suffix('m') {
        (value, 60)
    } else if let Some(value) = period.strip_suffix('s') {
        (value, 1)
    } else {
        return Err(ConfigError::UnsupportedPeriod {
            value: period.to_string(),
        });
    };
    let magnitude: u64 = magnitude
        .parse()
        .map_err(|_| ConfigError::InvalidMagnitude {
            value: period.to_string(),
        })?;
    Ok(Duration::from_secs(magnitude.saturating_mul(unit_secs)))
}

fn parse_log_level(raw: &str) -> Result<LevelFilter> {
    raw.trim()
        .parse()
        .map_err(|_| anyhow!("unknown log level: {}", raw))
}

fn read_config_file(path: &Path) -> Result<SelectorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_unit() {
        assert_eq!(parse_period("1d").unwrap(), Duration::from_secs(86_400));
        assert_eq!(parse_period("5h").unwrap(), Duration::from_secs(18_000));
        assert_eq!(parse_period("30m").unwrap(), Duration::from_secs(1_800));
        assert_eq!(parse_period("10s").unwrap(), Duration::from_secs(10));
    }

    #[test]
    fn rejects_unknown_unit() {
        assert!(matches!(
            parse_period("1x"),
            Err(ConfigError::UnsupportedPeriod { .. })
        ));
        assert!(matches!(
            parse_period(""),
            Err(ConfigError::UnsupportedPeriod { .. })
        ));
        assert!(matches!(
            parse_period("12"),
            Err(ConfigError::UnsupportedPeriod { .. })
        ));
    }

    #[test]
    fn rejects_non_integer_magnitude() {
        assert!(matches!(
            parse_period("d"),
            Err(ConfigError::InvalidMagnitude { .. })
        ));
        assert!(matches!(
            parse_period("1.5h"),
            Err(ConfigError::InvalidMagnitude { .. })
        ));
        assert!(matches!(
            parse_period("1h30m"),
            Err(ConfigError::InvalidMagnitude { .. })
        ));
        assert!(matches!(
            parse_period("-2d"),
            Err(ConfigError::InvalidMagnitude { .. })
        ));
    }

    #[test]
    fn default_config_validates() {
        assert!(SelectorConfig::default().validate().is_ok());
    }

    #[test]
    fn out_of_range_confidence_fails_validation() {
        let cfg = SelectorConfig {
            min_confidence: 1.5,
            ..SelectorConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn bad_period_fails_validation() {
        let cfg = SelectorConfig {
            time_past: "soon".to_string(),
            ..SelectorConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
