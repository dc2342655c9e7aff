//! Process configuration.
//!
//! Every setting can be given as a flag or through the environment. The two
//! secrets (database location and provider key) are mandatory.

use crate::ai::prompts::DEFAULT_MAX_LABELS;
use crate::ai::{
    AdvisorOptions, GeminiSettings, LabelSource, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
    MAX_RETRIES, REQUEST_TIMEOUT_SECS,
};
use crate::routes::DEFAULT_CORS_ORIGINS;
use clap::Parser;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "smart-finance", version, about = "SmartFinance core API and AI advisor")]
pub struct Config {
    /// Database location: `sqlite://<path>`, a file path, or `:memory:`
    #[arg(long, env = "DATABASE_URL", value_parser = parse_database_url)]
    pub database_url: DatabaseLocation,

    /// Gemini API key
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub google_api_key: String,

    /// Address to listen on
    #[arg(long, env = "SMART_FINANCE_BIND", default_value = "127.0.0.1:8000")]
    pub bind: String,

    #[arg(long, env = "SMART_FINANCE_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    #[arg(long, env = "SMART_FINANCE_TEMPERATURE", default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    /// Timeout for a single generation request, in seconds
    #[arg(long, env = "SMART_FINANCE_TIMEOUT_SECS", default_value_t = REQUEST_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Retries for transient provider failures
    #[arg(long, env = "SMART_FINANCE_MAX_RETRIES", default_value_t = MAX_RETRIES)]
    pub max_retries: u32,

    /// Expense labels listed in the prompt before the rest is folded
    #[arg(long, env = "SMART_FINANCE_MAX_LABELS", default_value_t = DEFAULT_MAX_LABELS)]
    pub max_labels: usize,

    /// Grouping key for expenses
    #[arg(long, env = "SMART_FINANCE_LABEL_SOURCE", value_enum, default_value_t = LabelSource::Description)]
    pub label_source: LabelSource,

    /// Browser origins allowed to call the API (comma separated)
    #[arg(
        long,
        env = "SMART_FINANCE_CORS_ORIGINS",
        value_delimiter = ',',
        default_values = DEFAULT_CORS_ORIGINS
    )]
    pub cors_origins: Vec<String>,
}

impl Config {
    pub fn gemini_settings(&self) -> GeminiSettings {
        GeminiSettings {
            model: self.model.clone(),
            temperature: self.temperature,
            timeout: Duration::from_secs(self.timeout_secs),
            max_retries: self.max_retries,
            ..GeminiSettings::new(self.google_api_key.clone())
        }
    }

    pub fn advisor_options(&self) -> AdvisorOptions {
        AdvisorOptions {
            label_source: self.label_source,
            max_labels: self.max_labels,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    Memory,
    File(PathBuf),
}

impl fmt::Display for DatabaseLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, ":memory:"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

pub fn parse_database_url(value: &str) -> Result<DatabaseLocation, String> {
    let value = value.trim();
    let path = value
        .strip_prefix("sqlite://")
        .or_else(|| value.strip_prefix("sqlite:"))
        .unwrap_or(value);

    if path.is_empty() {
        return Err("DATABASE_URL is empty".to_string());
    }
    if value.contains("://") && !value.starts_with("sqlite://") {
        return Err(format!(
            "unsupported database scheme in '{}', expected sqlite://<path>",
            value
        ));
    }

    Ok(match path {
        ":memory:" => DatabaseLocation::Memory,
        _ => DatabaseLocation::File(PathBuf::from(path)),
    })
}
