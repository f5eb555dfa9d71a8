//! Configuration loading and management.
//!
//! Configuration is an explicit immutable value threaded through every
//! stage; there is no global state, so runs with different presets can
//! execute concurrently without interference.

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::core::{Error, Result};

/// Detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Minimum window length (in statements) for a pair to be considered.
    pub min_lines: usize,
    /// Minimum overall similarity for a pair to be accepted (inclusive).
    pub threshold: f64,
    /// Named preset folding threshold/min_lines to common profiles.
    pub preset: Preset,
    /// Weights combining the three component scores.
    pub weights: Weights,
    /// Comparison scope.
    pub scope: Scope,
    /// Widen the effective scope to the whole project.
    pub cross_file_comparison: bool,
    /// Confidence bucket cutoffs for cluster recommendations.
    pub confidence: ConfidenceThresholds,
    /// Overall time budget; once exceeded, remaining pair comparisons are
    /// truncated and the run proceeds with what was already accepted.
    pub time_budget_ms: Option<u64>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_lines: 5,
            threshold: 0.75,
            preset: Preset::Default,
            weights: Weights::default(),
            scope: Scope::File,
            cross_file_comparison: false,
            confidence: ConfidenceThresholds::default(),
            time_budget_ms: None,
        }
    }
}

impl DetectionConfig {
    /// Load configuration from an explicit file path.
    ///
    /// Errors if the file does not exist. Env vars with `DOPPEL_` prefix
    /// override file values. The preset, if not `default`, is applied over
    /// `threshold`/`min_lines` before validation.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file_exact(path))
            .merge(Env::prefixed("DOPPEL_").split("__"))
            .extract()
            .map_err(|e| Error::config(e.to_string()))?;
        let config = config.resolved();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a directory, looking for `doppel.toml` or
    /// `.doppel/doppel.toml`. Missing files are silently skipped.
    pub fn load_default(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let config: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(dir.join("doppel.toml")))
            .merge(Toml::file(dir.join(".doppel/doppel.toml")))
            .merge(Env::prefixed("DOPPEL_").split("__"))
            .extract()
            .map_err(|e| Error::config(e.to_string()))?;
        let config = config.resolved();
        config.validate()?;
        Ok(config)
    }

    /// Strict preset: fewer, higher-confidence findings.
    pub fn strict() -> Self {
        Self {
            preset: Preset::Strict,
            ..Self::default()
        }
        .resolved()
    }

    /// Lenient preset: more candidates, shorter windows.
    pub fn lenient() -> Self {
        Self {
            preset: Preset::Lenient,
            ..Self::default()
        }
        .resolved()
    }

    /// Fold the preset's values over `threshold` and `min_lines`.
    pub fn resolved(mut self) -> Self {
        match self.preset {
            Preset::Default => {}
            Preset::Strict => {
                self.threshold = 0.90;
                self.min_lines = 7;
            }
            Preset::Lenient => {
                self.threshold = 0.60;
                self.min_lines = 3;
            }
        }
        self
    }

    /// The scope actually used for pairing.
    pub fn effective_scope(&self) -> Scope {
        if self.cross_file_comparison {
            Scope::Project
        } else {
            self.scope
        }
    }

    /// Validate the configuration. Rejection here is eager and fatal; it is
    /// the only hard failure in the core.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(Error::config(format!(
                "threshold must be within [0.0, 1.0], got {}",
                self.threshold
            )));
        }
        if self.min_lines < 1 {
            return Err(Error::config("min_lines must be at least 1"));
        }
        self.weights.validate()?;
        self.confidence.validate()?;
        Ok(())
    }

    /// Create default config file content.
    pub fn default_toml() -> &'static str {
        include_str!("default_config.toml")
    }
}

/// Named detection profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// threshold 0.75, min_lines 5.
    #[default]
    Default,
    /// threshold 0.90, min_lines 7.
    Strict,
    /// threshold 0.60, min_lines 3.
    Lenient,
}

/// Weights combining the LCS, Levenshtein, and structural scores into the
/// overall score. Must be non-negative and sum to 1.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Weights {
    pub lcs: f64,
    pub levenshtein: f64,
    pub structural: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            lcs: 1.0 / 3.0,
            levenshtein: 1.0 / 3.0,
            structural: 1.0 / 3.0,
        }
    }
}

impl Weights {
    fn validate(&self) -> Result<()> {
        if self.lcs < 0.0 || self.levenshtein < 0.0 || self.structural < 0.0 {
            return Err(Error::config("similarity weights must be non-negative"));
        }
        let sum = self.lcs + self.levenshtein + self.structural;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(Error::config(format!(
                "similarity weights must sum to 1.0, got {sum}"
            )));
        }
        Ok(())
    }
}

/// Comparison scope. Cross-file comparison is O(N²) in candidate count, so
/// the scope bounds which pairs are formed at all.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Only windows from the same method body.
    Method,
    /// Only windows from the same file.
    #[default]
    File,
    /// Every candidate pair in the run.
    Project,
}

/// Cutoffs mapping a cluster's mean similarity to a confidence bucket.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceThresholds {
    /// Mean overall score at or above this is HIGH.
    pub high: f64,
    /// Mean overall score at or above this (but below `high`) is MEDIUM.
    pub medium: f64,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            high: 0.90,
            medium: 0.75,
        }
    }
}

impl ConfidenceThresholds {
    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.high) || !(0.0..=1.0).contains(&self.medium) {
            return Err(Error::config(
                "confidence thresholds must be within [0.0, 1.0]",
            ));
        }
        if self.high < self.medium {
            return Err(Error::config(
                "confidence.high must not be below confidence.medium",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        let config = DetectionConfig::default();
        assert_eq!(config.min_lines, 5);
        assert!((config.threshold - 0.75).abs() < f64::EPSILON);
        assert_eq!(config.scope, Scope::File);
        assert!(!config.cross_file_comparison);
        assert!(config.time_budget_ms.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_presets() {
        let strict = DetectionConfig::strict();
        assert!((strict.threshold - 0.90).abs() < f64::EPSILON);
        assert_eq!(strict.min_lines, 7);

        let lenient = DetectionConfig::lenient();
        assert!((lenient.threshold - 0.60).abs() < f64::EPSILON);
        assert_eq!(lenient.min_lines, 3);
    }

    #[test]
    fn test_effective_scope() {
        let config = DetectionConfig::default();
        assert_eq!(config.effective_scope(), Scope::File);

        let config = DetectionConfig {
            cross_file_comparison: true,
            ..DetectionConfig::default()
        };
        assert_eq!(config.effective_scope(), Scope::Project);
    }

    #[test]
    fn test_validate_rejects_bad_threshold() {
        let config = DetectionConfig {
            threshold: 1.5,
            ..DetectionConfig::default()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("threshold"), "unexpected error: {err}");
    }

    #[test]
    fn test_validate_rejects_zero_min_lines() {
        let config = DetectionConfig {
            min_lines: 0,
            ..DetectionConfig::default()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("min_lines"), "unexpected error: {err}");
    }

    #[test]
    fn test_validate_rejects_bad_weights() {
        let config = DetectionConfig {
            weights: Weights {
                lcs: 0.9,
                levenshtein: 0.9,
                structural: 0.9,
            },
            ..DetectionConfig::default()
        };
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("sum to 1.0"), "unexpected error: {err}");

        let config = DetectionConfig {
            weights: Weights {
                lcs: -0.5,
                levenshtein: 0.75,
                structural: 0.75,
            },
            ..DetectionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_confidence() {
        let config = DetectionConfig {
            confidence: ConfidenceThresholds {
                high: 0.5,
                medium: 0.8,
            },
            ..DetectionConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        Jail::expect_with(|jail| {
            jail.create_file("doppel.toml", "threshold = 0.8\nmin_lines = 4")?;
            let config = DetectionConfig::from_file("doppel.toml").unwrap();
            assert!((config.threshold - 0.8).abs() < f64::EPSILON);
            assert_eq!(config.min_lines, 4);
            Ok(())
        });
    }

    #[test]
    fn test_from_file_errors_on_missing_file() {
        let result = DetectionConfig::from_file("/nonexistent/path/doppel.toml");
        assert!(result.is_err());
        let err = result.unwrap_err().to_string();
        assert!(err.contains("not found"), "expected 'not found' in: {err}");
    }

    #[test]
    fn test_from_file_rejects_invalid_values_eagerly() {
        Jail::expect_with(|jail| {
            jail.create_file("doppel.toml", "threshold = 2.0")?;
            assert!(DetectionConfig::from_file("doppel.toml").is_err());
            Ok(())
        });
    }

    #[test]
    fn test_file_preset_overrides_numbers() {
        Jail::expect_with(|jail| {
            jail.create_file("doppel.toml", "preset = \"strict\"")?;
            let config = DetectionConfig::from_file("doppel.toml").unwrap();
            assert!((config.threshold - 0.90).abs() < f64::EPSILON);
            assert_eq!(config.min_lines, 7);
            Ok(())
        });
    }

    #[test]
    fn test_load_default_doppel_toml() {
        Jail::expect_with(|jail| {
            jail.create_file("doppel.toml", "cross_file_comparison = true")?;
            let config = DetectionConfig::load_default(".").unwrap();
            assert!(config.cross_file_comparison);
            Ok(())
        });
    }

    #[test]
    fn test_load_default_dot_doppel() {
        Jail::expect_with(|jail| {
            std::fs::create_dir(jail.directory().join(".doppel")).unwrap();
            jail.create_file(".doppel/doppel.toml", "min_lines = 9")?;
            let config = DetectionConfig::load_default(".").unwrap();
            assert_eq!(config.min_lines, 9);
            Ok(())
        });
    }

    #[test]
    fn test_load_default_no_file() {
        Jail::expect_with(|_jail| {
            let config = DetectionConfig::load_default(".").unwrap();
            assert_eq!(config.min_lines, 5);
            Ok(())
        });
    }

    #[test]
    fn test_env_var_overrides_file_value() {
        Jail::expect_with(|jail| {
            jail.create_file("doppel.toml", "min_lines = 4")?;
            jail.set_env("DOPPEL_MIN_LINES", "6");
            let config = DetectionConfig::from_file("doppel.toml").unwrap();
            assert_eq!(config.min_lines, 6);
            Ok(())
        });
    }

    #[test]
    fn test_env_var_nested_weights() {
        Jail::expect_with(|jail| {
            jail.set_env("DOPPEL_WEIGHTS__LCS", "0.5");
            jail.set_env("DOPPEL_WEIGHTS__LEVENSHTEIN", "0.25");
            jail.set_env("DOPPEL_WEIGHTS__STRUCTURAL", "0.25");
            let config = DetectionConfig::load_default(".").unwrap();
            assert!((config.weights.lcs - 0.5).abs() < f64::EPSILON);
            Ok(())
        });
    }

    #[test]
    fn test_scope_from_toml() {
        Jail::expect_with(|jail| {
            jail.create_file("doppel.toml", "scope = \"method\"")?;
            let config = DetectionConfig::load_default(".").unwrap();
            assert_eq!(config.scope, Scope::Method);
            Ok(())
        });
    }

    #[test]
    fn test_config_serialization() {
        let config = DetectionConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("threshold"));
        assert!(json.contains("levenshtein"));
    }

    #[test]
    fn test_default_toml_non_empty() {
        assert!(!DetectionConfig::default_toml().is_empty());
    }
}
