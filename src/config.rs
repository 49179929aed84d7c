use serde::{Deserialize, Serialize};
use std::{fs::File, io::BufReader, path::Path};

use crate::{converter::NumberFormat, InputError, InputResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputConfig {
    /// Capacity of the chat bus broadcast channel.
    #[serde(default = "default_bus_capacity")]
    pub bus_capacity: usize,

    /// Install the built-in converters.
    #[serde(default = "default_true")]
    pub register_defaults: bool,

    /// Separators for the generic number converter.
    #[serde(default)]
    pub number_format: NumberFormat,

    #[serde(default)]
    pub missing_converter: MissingConverterPolicy,
}

/// What to do with an expectation whose type has no converter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MissingConverterPolicy {
    /// Fail the `process` call with `InputError::MissingConverter`.
    #[default]
    Fail,
    /// Log a warning and drop the expectation.
    Skip,
}

fn default_bus_capacity() -> usize {
    64
}

fn default_true() -> bool {
    true
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            bus_capacity: default_bus_capacity(),
            register_defaults: default_true(),
            number_format: NumberFormat::default(),
            missing_converter: MissingConverterPolicy::default(),
        }
    }
}

impl InputConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> InputResult<Self> {
        let file = File::open(path)
            .map_err(|e| InputError::config(format!("Failed to open config file: {}", e)))?;
        let reader = BufReader::new(file);
        let config: Self = serde_json::from_reader(reader)
            .map_err(|e| InputError::config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json(s: &str) -> InputResult<Self> {
        let config: Self = serde_json::from_str(s)
            .map_err(|e| InputError::config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the registry cannot work with.
    pub fn validate(&self) -> InputResult<()> {
        if self.bus_capacity == 0 {
            return Err(InputError::config("bus_capacity must be greater than 0"));
        }
        let format = &self.number_format;
        if format.grouping_separator == format.decimal_separator {
            return Err(InputError::config(format!(
                "number_format separators must differ, both are '{}'",
                format.decimal_separator
            )));
        }
        Ok(())
    }
}
