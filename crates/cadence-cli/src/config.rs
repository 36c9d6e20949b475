use crate::cli::OutputFormat;
use crate::timezone::detect_system_timezone;
use cadence_core::expander::ExpanderConfig;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

pub const CONFIG_FILE: &str = "cadence.toml";

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Timezone used for local times given on the command line (IANA format)
    pub default_timezone: String,
    /// Upper bound on occurrences produced by a single expansion
    pub max_occurrences: u16,
    pub output_format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_timezone: detect_system_timezone(),
            max_occurrences: ExpanderConfig::default().max_occurrences,
            output_format: OutputFormat::default(),
        }
    }
}

impl Config {
    pub fn new() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed("CADENCE_"))
            .extract()
    }

    pub fn expander(&self) -> ExpanderConfig {
        ExpanderConfig {
            max_occurrences: self.max_occurrences,
        }
    }
}
