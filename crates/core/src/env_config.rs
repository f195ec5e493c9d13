//! Environment variable lookup with typed, fail-fast parsing.
//!
//! Every accessor reports the offending variable by name so a bad setting is
//! diagnosed before any side effect happens.

use std::fmt::Display;
use std::str::FromStr;

use crate::ConfigError;

/// Variable lookup, usually `std::env::var` but injectable for tests.
pub(crate) struct Env<F> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> Env<F> {
    pub(crate) const fn new(lookup: F) -> Self {
        Self { lookup }
    }

    /// Value of `var`; blank values count as unset.
    pub(crate) fn optional(&self, var: &str) -> Option<String> {
        (self.lookup)(var).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
    }

    pub(crate) fn required(&self, var: &'static str) -> Result<String, ConfigError> {
        self.optional(var).ok_or(ConfigError::Missing(var))
    }

    pub(crate) fn parse_or<T>(&self, var: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.optional(var) {
            None => Ok(default),
            Some(v) => v.parse().map_err(|e: T::Err| ConfigError::InvalidSetting {
                var,
                value: v.clone(),
                reason: e.to_string(),
            }),
        }
    }

    pub(crate) fn flag_or(&self, var: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.optional(var) {
            None => Ok(default),
            Some(v) => match v.to_lowercase().as_str() {
                "1" | "true" | "yes" | "y" | "on" => Ok(true),
                "0" | "false" | "no" | "n" | "off" => Ok(false),
                _ => Err(ConfigError::InvalidSetting {
                    var,
                    value: v,
                    reason: "expected true or false".to_owned(),
                }),
            },
        }
    }
}
