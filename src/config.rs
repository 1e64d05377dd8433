//! Layered configuration for hosts embedding the interpreter (and the CLI).
//!
//! Sources, lowest precedence first:
//! - built-in defaults
//! - a TOML file (`aimlite.toml` in the working directory unless a path is given)
//! - environment variables prefixed with `AIMLITE_`
//!
//! Nested keys use a double underscore: `AIMLITE_ENGINE__MAX_REDIRECT_DEPTH=8`
//! sets `engine.max_redirect_depth`, `AIMLITE_BOT__NAME=Ada` sets the `name`
//! bot attribute. Command-line flags are applied on top by the binary.
//!
//! ```toml
//! sources = ["data/demo.aiml"]
//! session = "session.json"
//!
//! [bot]
//! name = "Ada"
//! age = "42"
//!
//! [engine]
//! max_redirect_depth = 32
//! retry_delay_ms = 1000
//! max_retries = 10
//! ```

use crate::{BotProfile, Options, Result, RetryPolicy};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "aimlite.toml";

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct Settings {
    /// Bot attributes read by `<bot name=".."/>`.
    #[serde(default)]
    pub bot: BTreeMap<String, String>,

    /// Rule sources, loaded in this order.
    #[serde(default)]
    pub sources: Vec<PathBuf>,

    #[serde(default)]
    pub engine: EngineConfig,

    /// Session snapshot restored on start and written on exit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default = "default_max_redirect_depth")]
    pub max_redirect_depth: usize,

    /// Upper bound between readiness checks while sources are loading.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed seed for `<random>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_max_redirect_depth() -> usize {
    32
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_max_retries() -> u32 {
    10
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_redirect_depth: default_max_redirect_depth(),
            retry_delay_ms: default_retry_delay_ms(),
            max_retries: default_max_retries(),
            seed: None,
        }
    }
}

impl Settings {
    /// Load settings from defaults, the TOML file and the environment.
    ///
    /// A missing file is not an error; a file that does not parse is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let settings: Settings =
            Self::figment(&path).merge(Env::prefixed("AIMLITE_").split("__")).extract().map_err(Box::new)?;
        Ok(settings)
    }

    /// Defaults plus the TOML file, without the environment layer.
    pub fn figment(path: &Path) -> Figment {
        Figment::new().merge(Serialized::defaults(Settings::default())).merge(Toml::file(path))
    }

    pub fn options(&self) -> Options {
        Options {
            max_redirect_depth: self.engine.max_redirect_depth,
            retry: RetryPolicy {
                delay: Duration::from_millis(self.engine.retry_delay_ms),
                max_retries: self.engine.max_retries,
            },
            seed: self.engine.seed,
        }
    }

    pub fn profile(&self) -> BotProfile {
        BotProfile::new(self.bot.clone())
    }
}
