use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

#[derive(Debug, Default, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub smoothing: SmoothingConfig,
    #[serde(default)]
    pub training: TrainingConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct ClassifierConfig {
    /// 採用する最小コサイン類似度 (-1.0〜1.0)
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// 返す候補の最大数
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct SmoothingConfig {
    /// ラベルを出力するまでに必要な連続フレーム数
    #[serde(default = "default_required_streak_length")]
    pub required_streak_length: u32,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TrainingConfig {
    /// 技ごとのサブディレクトリを持つ学習データのルート
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// 学習済みアーキタイプの保存先
    #[serde(default = "default_archetype_path")]
    pub archetype_path: PathBuf,
}

fn default_threshold() -> f64 { 0.98 }
fn default_max_results() -> usize { 1 }
fn default_required_streak_length() -> u32 { 3 }
fn default_data_dir() -> PathBuf { PathBuf::from("data/poses/training") }
fn default_archetype_path() -> PathBuf { PathBuf::from("data/archetypes.json") }

impl ClassifierConfig {
    pub fn new(threshold: f64, max_results: usize) -> Result<Self, ConfigError> {
        let config = Self { threshold, max_results };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_threshold(self.threshold)?;
        if self.max_results == 0 {
            return Err(ConfigError::ZeroMaxResults);
        }
        Ok(())
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            max_results: default_max_results(),
        }
    }
}

impl SmoothingConfig {
    pub fn new(required_streak_length: u32) -> Result<Self, ConfigError> {
        let config = Self { required_streak_length };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.required_streak_length == 0 {
            return Err(ConfigError::ZeroStreakLength);
        }
        Ok(())
    }
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            required_streak_length: default_required_streak_length(),
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            archetype_path: default_archetype_path(),
        }
    }
}

pub(crate) fn validate_threshold(threshold: f64) -> Result<(), ConfigError> {
    if !threshold.is_finite() {
        return Err(ConfigError::NonFiniteThreshold);
    }
    if !(-1.0..=1.0).contains(&threshold) {
        return Err(ConfigError::ThresholdOutOfRange(threshold));
    }
    Ok(())
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Self::from_toml(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 読み込みに失敗した場合は警告を出してデフォルト設定を使う
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path.as_ref()) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{:#}; using default configuration", e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.classifier.validate()?;
        self.smoothing.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.classifier.threshold, 0.98);
        assert_eq!(config.classifier.max_results, 1);
        assert_eq!(config.smoothing.required_streak_length, 3);
        assert_eq!(config.training.data_dir, PathBuf::from("data/poses/training"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = Config::from_toml(
            "[classifier]\nthreshold = 0.9\n\n[smoothing]\nrequired_streak_length = 5\n",
        )
        .unwrap();
        assert_eq!(config.classifier.threshold, 0.9);
        assert_eq!(config.classifier.max_results, 1);
        assert_eq!(config.smoothing.required_streak_length, 5);
    }

    #[test]
    fn test_rejects_out_of_range_threshold() {
        assert_eq!(
            ClassifierConfig::new(1.5, 1),
            Err(ConfigError::ThresholdOutOfRange(1.5))
        );
        assert_eq!(
            ClassifierConfig::new(-1.01, 1),
            Err(ConfigError::ThresholdOutOfRange(-1.01))
        );
        assert_eq!(ClassifierConfig::new(f64::NAN, 1), Err(ConfigError::NonFiniteThreshold));
        assert!(Config::from_toml("[classifier]\nthreshold = 2.0\n").is_err());
    }

    #[test]
    fn test_threshold_bounds_inclusive() {
        assert!(ClassifierConfig::new(1.0, 1).is_ok());
        assert!(ClassifierConfig::new(-1.0, 1).is_ok());
    }

    #[test]
    fn test_rejects_zero_counts() {
        assert_eq!(ClassifierConfig::new(0.5, 0), Err(ConfigError::ZeroMaxResults));
        assert_eq!(SmoothingConfig::new(0), Err(ConfigError::ZeroStreakLength));
        assert!(Config::from_toml("[smoothing]\nrequired_streak_length = 0\n").is_err());
    }

    #[test]
    fn test_negative_count_fails_to_parse() {
        assert!(Config::from_toml("[classifier]\nmax_results = -1\n").is_err());
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let config = Config::load_or_default("/nonexistent/mt_trainer/config.toml");
        assert_eq!(config, Config::default());
    }
}
