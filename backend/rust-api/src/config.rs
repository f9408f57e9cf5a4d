use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Mongo,
    Memory,
}

impl StorageBackend {
    fn parse(value: &str) -> Result<Self, config::ConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "mongo" | "mongodb" => Ok(Self::Mongo),
            "memory" | "in-memory" => Ok(Self::Memory),
            other => Err(config::ConfigError::Message(format!(
                "Unknown storage backend '{}', expected 'mongo' or 'memory'",
                other
            ))),
        }
    }
}

/// Rules of the leveled assessment. Every deployment can tune the thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentConfig {
    /// Highest level of the progression; submitting it triggers badge aggregation.
    pub max_level: u32,
    /// Minimum percentage needed to clear a level.
    pub pass_threshold: u32,
    /// Minimum cumulative percentage across all attempts needed for the badge.
    pub badge_threshold: f64,
    pub badge_label: String,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            max_level: 3,
            pass_threshold: 50,
            badge_threshold: 95.0,
            badge_label: "Java Expert".to_string(),
        }
    }
}

impl AssessmentConfig {
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.max_level == 0 {
            return Err(config::ConfigError::Message(
                "assessment.max_level must be at least 1".to_string(),
            ));
        }
        if self.pass_threshold > 100 {
            return Err(config::ConfigError::Message(format!(
                "assessment.pass_threshold must be within 0..=100, got {}",
                self.pass_threshold
            )));
        }
        if !(0.0..=100.0).contains(&self.badge_threshold) {
            return Err(config::ConfigError::Message(format!(
                "assessment.badge_threshold must be within 0..=100, got {}",
                self.badge_threshold
            )));
        }
        if self.badge_label.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "assessment.badge_label must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub mongo_uri: String,
    pub mongo_database: String,
    pub storage: StorageBackend,
    pub bind_addr: String,
    pub question_seed_file: Option<String>,
    pub assessment: AssessmentConfig,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        // Root .env first, local .env as fallback
        let skip_root_env = env::var("SKIP_ROOT_ENV").is_ok();
        if skip_root_env {
            dotenvy::dotenv().ok();
        } else if dotenvy::from_path("../../.env").is_err() {
            dotenvy::dotenv().ok();
        }

        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // config/*.toml + ENV overrides (prefix: APP_)
        let settings = config::Config::builder()
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .build()?;

        let mongo_uri = settings
            .get_string("database.mongo_uri")
            .or_else(|_| env::var("MONGO_URI"))
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        let mongo_database = settings
            .get_string("database.mongo_database")
            .or_else(|_| env::var("MONGO_DATABASE"))
            .unwrap_or_else(|_| "virtuehire".to_string());

        let storage = match settings
            .get_string("storage.backend")
            .or_else(|_| env::var("STORAGE_BACKEND"))
        {
            Ok(value) => StorageBackend::parse(&value)?,
            Err(_) => StorageBackend::Mongo,
        };

        let bind_addr = settings
            .get_string("server.bind_addr")
            .or_else(|_| env::var("BIND_ADDR"))
            .unwrap_or_else(|_| "0.0.0.0:8081".to_string());

        let question_seed_file = settings
            .get_string("seed.questions_file")
            .or_else(|_| env::var("QUESTION_SEED_FILE"))
            .ok()
            .filter(|path| !path.trim().is_empty());

        let defaults = AssessmentConfig::default();
        let assessment = AssessmentConfig {
            max_level: read_u32(&settings, "assessment.max_level", defaults.max_level)?,
            pass_threshold: read_u32(
                &settings,
                "assessment.pass_threshold",
                defaults.pass_threshold,
            )?,
            badge_threshold: settings
                .get_float("assessment.badge_threshold")
                .unwrap_or(defaults.badge_threshold),
            badge_label: settings
                .get_string("assessment.badge_label")
                .unwrap_or(defaults.badge_label),
        };
        assessment.validate()?;

        Ok(Config {
            mongo_uri,
            mongo_database,
            storage,
            bind_addr,
            question_seed_file,
            assessment,
        })
    }

    /// In-memory configuration with default assessment rules.
    pub fn in_memory() -> Self {
        Config {
            mongo_uri: String::new(),
            mongo_database: "virtuehire".to_string(),
            storage: StorageBackend::Memory,
            bind_addr: "127.0.0.1:0".to_string(),
            question_seed_file: None,
            assessment: AssessmentConfig::default(),
        }
    }
}

fn read_u32(settings: &config::Config, key: &str, default: u32) -> Result<u32, config::ConfigError> {
    match settings.get_int(key) {
        Ok(value) => u32::try_from(value).map_err(|_| {
            config::ConfigError::Message(format!("{} must be a non-negative integer", key))
        }),
        Err(config::ConfigError::NotFound(_)) => Ok(default),
        Err(e) => Err(e),
    }
}
