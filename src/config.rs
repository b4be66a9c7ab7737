use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::page::PageSettings;
use crate::quiz::{DEFAULT_AUTOFILL_TRIGGER, DEFAULT_JUDGE_DELAY, DEFAULT_RATIO};

pub const DEFAULT_ROOT: &str = "src/posts";

const ROOT_KEY: &str = "STUDY_ROOT";
const RATIO_KEY: &str = "STUDY_REVEAL_RATIO";
const DELAY_KEY: &str = "STUDY_JUDGE_DELAY_MS";
const TRIGGER_KEY: &str = "STUDY_AUTOFILL_TRIGGER";
const LOG_JSON_KEY: &str = "STUDY_LOG_JSON";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// directory holding the study documents
    pub root: PathBuf,

    /// initial fraction of inline tokens left visible
    pub reveal_ratio: f64,

    /// quiet period before a typed answer is judged
    pub judge_delay: Duration,

    /// typing this as the last character fills in the answer
    pub autofill_trigger: char,

    pub log_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from(DEFAULT_ROOT),
            reveal_ratio: DEFAULT_RATIO,
            judge_delay: DEFAULT_JUDGE_DELAY,
            autofill_trigger: DEFAULT_AUTOFILL_TRIGGER,
            log_json: false,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(root) = lookup(ROOT_KEY).filter(|v| !v.trim().is_empty()) {
            config.root = PathBuf::from(root);
        }

        if let Some(raw) = lookup(RATIO_KEY) {
            let ratio: f64 = raw.trim().parse().map_err(|_| ConfigError::NotANumber {
                key: RATIO_KEY,
                value: raw.clone(),
            })?;
            if !(0.0..=1.0).contains(&ratio) {
                return Err(ConfigError::OutOfRange {
                    key: RATIO_KEY,
                    value: ratio,
                });
            }
            config.reveal_ratio = ratio;
        }

        if let Some(raw) = lookup(DELAY_KEY) {
            let millis: u64 = raw.trim().parse().map_err(|_| ConfigError::NotANumber {
                key: DELAY_KEY,
                value: raw.clone(),
            })?;
            config.judge_delay = Duration::from_millis(millis);
        }

        if let Some(raw) = lookup(TRIGGER_KEY) {
            let mut chars = raw.chars();
            config.autofill_trigger = match (chars.next(), chars.next()) {
                (Some(c), None) => c,
                _ => {
                    return Err(ConfigError::NotAChar {
                        key: TRIGGER_KEY,
                        value: raw,
                    })
                }
            };
        }

        config.log_json = lookup(LOG_JSON_KEY).is_some_and(|v| v == "1");

        Ok(config)
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(mut self, root: Option<PathBuf>, ratio: Option<f64>) -> Self {
        if let Some(root) = root {
            self.root = root;
        }
        if let Some(ratio) = ratio.filter(|r| !r.is_nan()) {
            self.reveal_ratio = ratio.clamp(0.0, 1.0);
        }
        self
    }

    pub fn page_settings(&self) -> PageSettings {
        PageSettings {
            reveal_ratio: self.reveal_ratio,
            judge_delay: self.judge_delay,
            autofill_trigger: self.autofill_trigger,
        }
    }
}
