use std::path::Path;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::types::Sex;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Policy knobs of a ranking run. Every field has a default, so a config
/// file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    /// Results with a known distance below this are ignored.
    pub min_distance_km: f64,
    /// Speeds at or above this are treated as measurement errors.
    pub speed_ceiling_kph: f64,
    /// Upper bound on concurrent per-athlete lookups.
    pub workers: usize,
    /// Results season queried on bases.athle.fr.
    pub season: i32,
    /// Hard stop for the entrant pager.
    pub max_roster_pages: u32,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            min_distance_km: 5.0,
            speed_ceiling_kph: 25.0,
            workers: 8,
            season: current_year(),
            max_roster_pages: 1000,
        }
    }
}

impl RankingConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(self) -> Result<Self, ConfigError> {
        if !(self.min_distance_km.is_finite() && self.min_distance_km >= 0.0) {
            return Err(ConfigError::Invalid(format!(
                "Minimum distance must be a non-negative number, got {}",
                self.min_distance_km
            )));
        }
        if !(self.speed_ceiling_kph.is_finite() && self.speed_ceiling_kph > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "Speed ceiling must be positive, got {}",
                self.speed_ceiling_kph
            )));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid(
                "Worker count must be greater than 0".to_string(),
            ));
        }
        if self.max_roster_pages == 0 {
            return Err(ConfigError::Invalid(
                "Roster page limit must be greater than 0".to_string(),
            ));
        }
        Ok(self)
    }
}

/// Per-run parameters supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingRequest {
    /// Race link or bare race reference.
    pub race: String,
    pub course_id: String,
    pub min_age: u32,
    pub max_age: u32,
    pub sex: Option<Sex>,
}

pub fn current_year() -> i32 {
    chrono::Local::now().year()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RankingConfig::default();
        assert_eq!(config.min_distance_km, 5.0);
        assert_eq!(config.speed_ceiling_kph, 25.0);
        assert_eq!(config.season, current_year());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = RankingConfig::from_json(r#"{"speed_ceiling_kph": 22.5, "workers": 2}"#)
            .expect("Failed to parse config");
        assert_eq!(config.speed_ceiling_kph, 22.5);
        assert_eq!(config.workers, 2);
        assert_eq!(config.min_distance_km, 5.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_workers = RankingConfig {
            workers: 0,
            ..Default::default()
        };
        assert!(zero_workers.validate().is_err());

        let no_ceiling = RankingConfig {
            speed_ceiling_kph: 0.0,
            ..Default::default()
        };
        assert!(no_ceiling.validate().is_err());

        let negative_distance = RankingConfig {
            min_distance_km: -1.0,
            ..Default::default()
        };
        assert!(negative_distance.validate().is_err());
    }

    #[test]
    fn test_invalid_json_is_rejected() {
        assert!(RankingConfig::from_json("not json").is_err());
    }
}
