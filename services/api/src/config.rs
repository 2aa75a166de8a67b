//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::Level;

use interview_core::TOTAL_QUESTIONS;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub log_level: Level,
    pub openai_api_key: Option<String>,
    /// Base URL of an OpenAI-compatible endpoint. `None` means api.openai.com.
    pub openai_base_url: Option<String>,
    pub question_model: String,
    pub scoring_model: String,
    pub report_model: String,
    /// Directory under which each session's store lives.
    pub session_store_path: PathBuf,
    pub total_questions: usize,
    pub cors_origin: String,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // --- Server and Database Settings ---
        let bind_address_str = var_or("BIND_ADDRESS", "0.0.0.0:3000");
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url =
            lookup("DATABASE_URL").ok_or_else(|| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- AI Provider Settings ---
        let openai_api_key = lookup("OPENAI_API_KEY");
        let openai_base_url = lookup("OPENAI_BASE_URL").filter(|url| !url.trim().is_empty());
        let question_model = var_or("QUESTION_MODEL", "gpt-4o-mini");
        let scoring_model = var_or("SCORING_MODEL", "gpt-4o-mini");
        let report_model = var_or("REPORT_MODEL", "gpt-4o");

        // --- Session Settings ---
        let session_store_path = PathBuf::from(var_or("SESSION_STORE_PATH", "./sessions"));

        let total_questions = match lookup("TOTAL_QUESTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    ConfigError::InvalidValue(
                        "TOTAL_QUESTIONS".to_string(),
                        format!("'{}' is not a positive number", raw),
                    )
                })?,
            None => TOTAL_QUESTIONS,
        };

        let cors_origin = var_or("CORS_ORIGIN", "http://localhost:3000");

        Ok(Self {
            bind_address,
            database_url,
            log_level,
            openai_api_key,
            openai_base_url,
            question_model,
            scoring_model,
            report_model,
            session_store_path,
            total_questions,
            cors_origin,
        })
    }
}
