use std::env;

use tracing_subscriber::EnvFilter;

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

const DATABASE_URL_VAR: &str = "LIFT_LOG_DATABASE_URL";
const USER_VAR: &str = "LIFT_LOG_USER";
const LOG_VAR: &str = "LIFT_LOG_LOG";

const DEFAULT_USER: &str = "local";
const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Invalid log filter in {var}: {message}")]
  InvalidLogFilter { var: &'static str, message: String },

  #[error("Failed to install log subscriber: {0}")]
  Subscriber(String),
}

/// Runtime settings, read from the environment (and `.env` if present)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
  /// SQLite URL; desktop builds fall back to the app data directory
  pub database_url: Option<String>,
  /// Whose progression to load
  pub user_id: String,
  /// tracing EnvFilter directive
  pub log_filter: String,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      database_url: None,
      user_id: DEFAULT_USER.to_string(),
      log_filter: DEFAULT_LOG_FILTER.to_string(),
    }
  }
}

/// Unset and blank are the same thing
fn non_empty_var(name: &str) -> Option<String> {
  env::var(name)
    .ok()
    .map(|v| v.trim().to_string())
    .filter(|v| !v.is_empty())
}

impl AppConfig {
  pub fn from_env() -> Self {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let defaults = Self::default();
    Self {
      database_url: non_empty_var(DATABASE_URL_VAR),
      user_id: non_empty_var(USER_VAR).unwrap_or(defaults.user_id),
      log_filter: non_empty_var(LOG_VAR).unwrap_or(defaults.log_filter),
    }
  }

  pub fn env_filter(&self) -> Result<EnvFilter, ConfigError> {
    EnvFilter::try_new(&self.log_filter).map_err(|e| ConfigError::InvalidLogFilter {
      var: LOG_VAR,
      message: e.to_string(),
    })
  }
}

/// Install the global tracing subscriber
pub fn init_tracing(config: &AppConfig) -> Result<(), ConfigError> {
  tracing_subscriber::fmt()
    .with_env_filter(config.env_filter()?)
    .with_target(false)
    .try_init()
    .map_err(|e| ConfigError::Subscriber(e.to_string()))
}
