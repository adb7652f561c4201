use crate::domain::Address;
use std::collections::HashMap;
use thiserror::Error;

const DEFAULT_DIVERSIFIER_FACTORY: &str = "0xfe7800f67b3e42ddb004057169603feadeed31b0";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub events_path: String,
    pub ordering_mode: OrderingMode,
    pub start_block: u64,
    pub diversifier_factory: Address,
}

/// How the indexer treats events at or below its watermark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingMode {
    /// Sort each replay batch; skip already-processed events.
    Sort,
    /// Trust delivery order; reject any regression.
    Strict,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let events_path = env_map
            .get("EVENTS_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("EVENTS_PATH".to_string()))?;

        let ordering_mode = match env_map
            .get("ORDERING_MODE")
            .map(|s| s.as_str())
            .unwrap_or("sort")
        {
            "sort" => OrderingMode::Sort,
            "strict" => OrderingMode::Strict,
            other => {
                return Err(ConfigError::InvalidValue(
                    "ORDERING_MODE".to_string(),
                    format!("must be sort or strict, got {}", other),
                ))
            }
        };

        let start_block = env_map
            .get("START_BLOCK")
            .map(|s| s.as_str())
            .unwrap_or("0")
            .parse::<u64>()
            .map_err(|_| {
                ConfigError::InvalidValue(
                    "START_BLOCK".to_string(),
                    "must be a valid u64".to_string(),
                )
            })?;

        let diversifier_factory = Address::parse(
            env_map
                .get("DIVERSIFIER_FACTORY_ADDRESS")
                .map(|s| s.as_str())
                .unwrap_or(DEFAULT_DIVERSIFIER_FACTORY),
        )
        .map_err(|e| {
            ConfigError::InvalidValue("DIVERSIFIER_FACTORY_ADDRESS".to_string(), e.to_string())
        })?;

        Ok(Config {
            database_path,
            events_path,
            ordering_mode,
            start_block,
            diversifier_factory,
        })
    }

    /// Config for in-process use where no files are involved.
    pub fn in_memory() -> Self {
        Config {
            database_path: ":memory:".to_string(),
            events_path: String::new(),
            ordering_mode: OrderingMode::Sort,
            start_block: 0,
            diversifier_factory: Address::new(DEFAULT_DIVERSIFIER_FACTORY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_required_env() -> HashMap<String, String> {
        let mut map = HashMap::new();
        map.insert("DATABASE_PATH".to_string(), "/tmp/test.db".to_string());
        map.insert("EVENTS_PATH".to_string(), "/tmp/events.jsonl".to_string());
        map
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_env_map(setup_required_env()).unwrap();
        assert_eq!(config.ordering_mode, OrderingMode::Sort);
        assert_eq!(config.start_block, 0);
        assert_eq!(
            config.diversifier_factory.as_str(),
            DEFAULT_DIVERSIFIER_FACTORY
        );
    }

    #[test]
    fn test_missing_database_path() {
        let mut env_map = setup_required_env();
        env_map.remove("DATABASE_PATH");
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "DATABASE_PATH"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_missing_events_path() {
        let mut env_map = setup_required_env();
        env_map.remove("EVENTS_PATH");
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::MissingEnv(s)) => assert_eq!(s, "EVENTS_PATH"),
            _ => panic!("Expected MissingEnv error"),
        }
    }

    #[test]
    fn test_strict_ordering_mode() {
        let mut env_map = setup_required_env();
        env_map.insert("ORDERING_MODE".to_string(), "strict".to_string());
        let config = Config::from_env_map(env_map).unwrap();
        assert_eq!(config.ordering_mode, OrderingMode::Strict);
    }

    #[test]
    fn test_invalid_ordering_mode() {
        let mut env_map = setup_required_env();
        env_map.insert("ORDERING_MODE".to_string(), "random".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "ORDERING_MODE"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_start_block() {
        let mut env_map = setup_required_env();
        env_map.insert("START_BLOCK".to_string(), "-5".to_string());
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "START_BLOCK"),
            _ => panic!("Expected InvalidValue error"),
        }
    }

    #[test]
    fn test_invalid_diversifier_factory() {
        let mut env_map = setup_required_env();
        env_map.insert(
            "DIVERSIFIER_FACTORY_ADDRESS".to_string(),
            "0x1234".to_string(),
        );
        let result = Config::from_env_map(env_map);
        match result {
            Err(ConfigError::InvalidValue(k, _)) => assert_eq!(k, "DIVERSIFIER_FACTORY_ADDRESS"),
            _ => panic!("Expected InvalidValue error"),
        }
    }
}
