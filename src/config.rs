use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use miette::Diagnostic;
use thiserror::Error;

use crate::{aggregate::AggregateOptions, display::DisplayMode};

pub const DEFAULT_DATA_PATH: &str = "temperature_daily.csv";

/// Palette a renderer maps the temperature domain onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorScheme {
    /// Sequential yellow, orange then red.
    #[default]
    YlOrRd,
    Rainbow,
}

impl FromStr for ColorScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yl-or-rd" | "ylorrd" => Ok(Self::YlOrRd),
            "rainbow" => Ok(Self::Rainbow),
            _ => Err(format!(
                "Unknown color scheme {s}. Expecting `yl-or-rd` or `rainbow`"
            )),
        }
    }
}

#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("Invalid value `{value}` for {var}: {reason}")]
    #[diagnostic(code(heatmap::config::invalid_value))]
    InvalidValue {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_path: PathBuf,
    pub cutoff_year: Option<i32>,
    pub include_daily_series: bool,
    pub display_mode: DisplayMode,
    pub color_scheme: ColorScheme,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            cutoff_year: None,
            include_daily_series: false,
            display_mode: DisplayMode::default(),
            color_scheme: ColorScheme::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Builds the configuration from any variable lookup. Unset variables
    /// keep their default, malformed ones are an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Config {
            data_path: lookup("HEATMAP_DATA")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_path),
            cutoff_year: lookup("HEATMAP_CUTOFF_YEAR")
                .map(|value| parse_var("HEATMAP_CUTOFF_YEAR", value))
                .transpose()?,
            include_daily_series: lookup("HEATMAP_DAILY_SERIES")
                .map(|value| parse_bool("HEATMAP_DAILY_SERIES", value))
                .transpose()?
                .unwrap_or(defaults.include_daily_series),
            display_mode: lookup("HEATMAP_DISPLAY")
                .map(|value| parse_var("HEATMAP_DISPLAY", value))
                .transpose()?
                .unwrap_or(defaults.display_mode),
            color_scheme: lookup("HEATMAP_COLOR_SCHEME")
                .map(|value| parse_var("HEATMAP_COLOR_SCHEME", value))
                .transpose()?
                .unwrap_or(defaults.color_scheme),
        })
    }

    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            cutoff_year: self.cutoff_year.unwrap_or(i32::MIN),
            include_daily_series: self.include_daily_series,
        }
    }
}

fn parse_var<T>(var: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    let parsed = value.trim().parse::<T>();
    parsed.map_err(|e| ConfigError::InvalidValue {
        var,
        reason: e.to_string(),
        value,
    })
}

fn parse_bool(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            var,
            value,
            reason: String::from("expecting true or false"),
        }),
    }
}
