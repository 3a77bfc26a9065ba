use crate::Result;
use crate::collect::{CollectOptions, EntityLimits};
use crate::facts::MAX_WINDOW_DAYS;
use crate::governor::RetryPolicy;
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "repopulse.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Base URL of the GitHub API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Days of activity measured when no window is given on the command line
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// Items requested per page (1..=100)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Maximum number of repositories collected at the same time
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Retries after the first attempt for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Time allowed for a single API request
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Delay before the first retry, doubled on each further retry
    #[serde(default = "default_retry_base_delay", with = "humantime_serde")]
    pub retry_base_delay: Duration,

    /// Per entity kind collection limits
    #[serde(default)]
    pub limits: EntityLimits,
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

const fn default_window_days() -> u32 {
    30
}

const fn default_page_size() -> u32 {
    100
}

const fn default_max_concurrency() -> usize {
    4
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

const fn default_retry_base_delay() -> Duration {
    Duration::from_secs(1)
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `repopulse.toml` in `base_dir` is used when it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or holds invalid values
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading repopulse configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(CONFIG_FILE_NAME);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::debug!("No configuration file at '{path}', using defaults");
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading repopulse configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if a value is out of range
    pub fn validate(&self) -> Result<()> {
        if !(1..=MAX_WINDOW_DAYS).contains(&self.window_days) {
            return Err(app_err!("window_days must be between 1 and {MAX_WINDOW_DAYS}, got {}", self.window_days));
        }

        if !(1..=100).contains(&self.page_size) {
            return Err(app_err!("page_size must be between 1 and 100, got {}", self.page_size));
        }

        if self.max_concurrency == 0 {
            return Err(app_err!("max_concurrency must be at least 1"));
        }

        if url::Url::parse(&self.api_url).is_err() {
            return Err(app_err!("api_url '{}' is not a valid URL", self.api_url));
        }

        Ok(())
    }

    #[must_use]
    pub const fn collect_options(&self) -> CollectOptions {
        CollectOptions::new(self.limits, self.page_size)
    }

    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: self.retry_base_delay,
            request_timeout: self.request_timeout,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}
