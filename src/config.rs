use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::games::DEFAULT_REVERSAL_PROBABILITY;
use crate::market::DRIFT_PERIOD;
use crate::mining::ACCRUAL_PERIOD;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    /// Seed phrase for a replayable session; entropy when unset.
    pub seed: Option<String>,
    pub accrual_period: Duration,
    pub drift_period: Duration,
    pub reversal_probability: f64,
    pub log_filter: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".minecasino"),
            seed: None,
            accrual_period: ACCRUAL_PERIOD,
            drift_period: DRIFT_PERIOD,
            reversal_probability: DEFAULT_REVERSAL_PROBABILITY,
            log_filter: "info".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let defaults = Config::default();

        let data_dir = env_map
            .get("MINECASINO_DATA_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let seed = env_map
            .get("MINECASINO_SEED")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let accrual_period =
            parse_period(&env_map, "MINECASINO_ACCRUAL_MS")?.unwrap_or(defaults.accrual_period);
        let drift_period =
            parse_period(&env_map, "MINECASINO_DRIFT_MS")?.unwrap_or(defaults.drift_period);

        let reversal_probability = match env_map.get("MINECASINO_REVERSAL_P") {
            Some(raw) => {
                let p = raw.trim().parse::<f64>().map_err(|_| {
                    ConfigError::InvalidValue(
                        "MINECASINO_REVERSAL_P".to_string(),
                        "must be a number".to_string(),
                    )
                })?;
                if !(0.0..=1.0).contains(&p) {
                    return Err(ConfigError::InvalidValue(
                        "MINECASINO_REVERSAL_P".to_string(),
                        format!("must be within [0, 1], got {}", p),
                    ));
                }
                p
            }
            None => defaults.reversal_probability,
        };

        let log_filter = env_map
            .get("MINECASINO_LOG")
            .cloned()
            .unwrap_or(defaults.log_filter);

        Ok(Config {
            data_dir,
            seed,
            accrual_period,
            drift_period,
            reversal_probability,
            log_filter,
        })
    }
}

fn parse_period(
    env_map: &HashMap<String, String>,
    key: &str,
) -> Result<Option<Duration>, ConfigError> {
    let Some(raw) = env_map.get(key) else {
        return Ok(None);
    };
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Some(Duration::from_millis(ms))),
        _ => Err(ConfigError::InvalidValue(
            key.to_string(),
            "must be a positive number of milliseconds".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(HashMap::new()).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.accrual_period, Duration::from_secs(3));
        assert_eq!(config.drift_period, Duration::from_secs(5));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_env_map(env(&[
            ("MINECASINO_DATA_DIR", "/tmp/vault"),
            ("MINECASINO_SEED", " genesis "),
            ("MINECASINO_ACCRUAL_MS", "250"),
            ("MINECASINO_REVERSAL_P", "0"),
            ("MINECASINO_LOG", "minecasino=debug"),
        ]))
        .unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/tmp/vault"));
        assert_eq!(config.seed.as_deref(), Some("genesis"));
        assert_eq!(config.accrual_period, Duration::from_millis(250));
        assert_eq!(config.reversal_probability, 0.0);
        assert_eq!(config.log_filter, "minecasino=debug");
    }

    #[test]
    fn test_blank_seed_means_entropy() {
        let config = Config::from_env_map(env(&[("MINECASINO_SEED", "  ")])).unwrap();
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_invalid_period() {
        for raw in ["0", "-5", "soon"] {
            match Config::from_env_map(env(&[("MINECASINO_DRIFT_MS", raw)])) {
                Err(ConfigError::InvalidValue(key, _)) => assert_eq!(key, "MINECASINO_DRIFT_MS"),
                other => panic!("Expected InvalidValue error, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_reversal_out_of_range() {
        let result = Config::from_env_map(env(&[("MINECASINO_REVERSAL_P", "1.5")]));
        assert!(matches!(result, Err(ConfigError::InvalidValue(_, _))));
    }
}
