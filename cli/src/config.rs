use std::{
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{bail, Context, Result};
use clap::ValueEnum;

/// location of the config file, relative to $HOME
const CONFIG_PATH: &str = ".config/geoextent/config.toml";

/// names of the tables and keys in the config file
const OUTPUT_TABLE: &str = "output";
const OUTPUT_FORMAT: &str = "format";
const LOG_TABLE: &str = "log";
const LOG_LEVEL: &str = "level";

const FORMAT_ENV: &str = "GEOEXTENT_FORMAT";
const LOG_LEVEL_ENV: &str = "GEOEXTENT_LOG";

const DEFAULT_LOG_LEVEL: &str = "warn";

/// The format in which the resulting envelope is printed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// A `gml:Envelope` element with ordinates rounded down to two decimals
    #[default]
    Gml,

    /// A comma-separated list of ordinates and the CRS identifier
    Kvp,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gml" => Ok(Self::Gml),
            "kvp" => Ok(Self::Kvp),
            _ => bail!("unknown output format `{s}'. Expected `gml' or `kvp'."),
        }
    }
}

/// The contents of the configuration file. The file is only read when a
/// setting is not given on the command line or in the environment. A
/// missing file is treated like an empty one.
enum FileConfig {
    NotLoaded(Option<PathBuf>),
    Loaded(Option<toml::Value>),
}

impl FileConfig {
    fn new(path: Option<PathBuf>) -> Self {
        Self::NotLoaded(path)
    }

    fn value(&mut self) -> Result<Option<&toml::Value>> {
        if let FileConfig::NotLoaded(path) = self {
            let contents = match path {
                Some(path) if path.exists() => {
                    let file = std::fs::read_to_string(&path).with_context(|| {
                        format!("unable to read configuration file at {:?}", path)
                    })?;
                    let value = toml::from_str(&file)
                        .with_context(|| format!("configuration file {:?} malformed", path))?;
                    Some(value)
                }
                _ => None,
            };
            *self = Self::Loaded(contents);
        }

        match self {
            FileConfig::Loaded(value) => Ok(value.as_ref()),
            FileConfig::NotLoaded(_) => unreachable!("FileConfig should be initialized"),
        }
    }

    /// Returns the string at `[table] key` or `None` if it is not set
    fn get_string(&mut self, table: &str, key: &str) -> Result<Option<String>> {
        let Some(value) = self.value()?.and_then(|v| v.get(table)).and_then(|v| v.get(key)) else {
            return Ok(None);
        };
        let toml::Value::String(s) = value else {
            bail!(
                "`{table}.{key}' should be specified as a string. Received {}: {}",
                value.type_str(),
                value
            )
        };
        Ok(Some(s.clone()))
    }
}

/// Final configuration of the command line tool
#[derive(Debug, PartialEq, Eq)]
pub struct Config {
    pub format: OutputFormat,
    pub log_level: String,
}

impl Config {
    /// Creates the configuration from the command line arguments. Falls back
    /// to environment variables, then to the config file at
    /// $HOME/.config/geoextent/config.toml, then to defaults.
    ///
    /// # Errors
    /// This function errors if the config file cannot be read or if a value
    /// in the environment or the config file is invalid.
    pub fn from_args_with_fallback(
        format: Option<OutputFormat>,
        log_level: Option<String>,
    ) -> Result<Config> {
        let config_path = std::env::var_os("HOME").map(|home| Path::new(&home).join(CONFIG_PATH));
        Self::resolve(
            format,
            log_level,
            |name| std::env::var(name).ok(),
            FileConfig::new(config_path),
        )
    }

    fn resolve<E>(
        format: Option<OutputFormat>,
        log_level: Option<String>,
        env: E,
        mut file: FileConfig,
    ) -> Result<Config>
    where
        E: Fn(&str) -> Option<String>,
    {
        let format = match format {
            Some(format) => format,
            None => match env(FORMAT_ENV) {
                Some(format) => format
                    .parse()
                    .with_context(|| format!("invalid value in ${FORMAT_ENV}"))?,
                None => match file.get_string(OUTPUT_TABLE, OUTPUT_FORMAT)? {
                    Some(format) => format.parse()?,
                    None => OutputFormat::default(),
                },
            },
        };

        let log_level = match log_level {
            Some(log_level) => log_level,
            None => match env(LOG_LEVEL_ENV) {
                Some(log_level) => log_level,
                None => file
                    .get_string(LOG_TABLE, LOG_LEVEL)?
                    .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
            },
        };

        Ok(Config { format, log_level })
    }
}
