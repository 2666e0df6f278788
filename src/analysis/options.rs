//! Typed access to a component's string options
//!
//! Component constructors read their options through an [`OptionReader`],
//! which remembers which keys were consumed. `finish` then rejects any key
//! the component did not ask for, so a misspelled option fails at analyzer
//! build time instead of being ignored.

use crate::analysis::error::ConfigurationError;
use crate::analysis::spec::ComponentSpec;
use regex::Regex;
use std::collections::BTreeSet;
use std::str::FromStr;

pub struct OptionReader<'a> {
    spec: &'a ComponentSpec,
    used: BTreeSet<String>,
}

impl<'a> OptionReader<'a> {
    pub fn new(spec: &'a ComponentSpec) -> Self {
        OptionReader {
            spec,
            used: BTreeSet::new(),
        }
    }

    pub fn get(&mut self, key: &str) -> Option<&'a str> {
        self.used.insert(key.to_string());
        self.spec.options().get(key).map(String::as_str)
    }

    pub fn require(&mut self, key: &str) -> Result<&'a str, ConfigurationError> {
        self.get(key).ok_or_else(|| ConfigurationError::MissingOption {
            component: self.spec.name().to_string(),
            key: key.to_string(),
        })
    }

    pub fn get_or(&mut self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Parse an option with `FromStr`, falling back to `default` when absent.
    pub fn get_parsed<T>(&mut self, key: &str, default: T) -> Result<T, ConfigurationError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get(key) {
            Some(value) => self.parse(key, value),
            None => Ok(default),
        }
    }

    pub fn require_parsed<T>(&mut self, key: &str) -> Result<T, ConfigurationError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let value = self.require(key)?;
        self.parse(key, value)
    }

    /// `true` / `false`, case-insensitive.
    pub fn get_bool(&mut self, key: &str, default: bool) -> Result<bool, ConfigurationError> {
        match self.get(key) {
            Some(value) if value.eq_ignore_ascii_case("true") => Ok(true),
            Some(value) if value.eq_ignore_ascii_case("false") => Ok(false),
            Some(value) => Err(self.invalid(key, value, "expected true or false")),
            None => Ok(default),
        }
    }

    /// Comma-separated list; entries are trimmed and empty entries dropped.
    pub fn require_list(&mut self, key: &str) -> Result<Vec<String>, ConfigurationError> {
        let value = self.require(key)?;
        let items: Vec<String> = value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect();
        if items.is_empty() {
            return Err(self.invalid(key, value, "expected a comma-separated list"));
        }
        Ok(items)
    }

    pub fn require_regex(&mut self, key: &str) -> Result<Regex, ConfigurationError> {
        let value = self.require(key)?;
        Regex::new(value).map_err(|e| self.invalid(key, value, &e.to_string()))
    }

    /// A positive size, falling back to `default` when absent.
    pub fn get_positive(&mut self, key: &str, default: usize) -> Result<usize, ConfigurationError> {
        let n = self.get_parsed(key, default)?;
        if n == 0 {
            return Err(self.invalid(key, "0", "must be greater than zero"));
        }
        Ok(n)
    }

    pub fn invalid(&self, key: &str, value: &str, reason: &str) -> ConfigurationError {
        ConfigurationError::InvalidOption {
            component: self.spec.name().to_string(),
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Fail if the component carries keys that were never read.
    pub fn finish(self) -> Result<(), ConfigurationError> {
        let unknown: Vec<String> = self
            .spec
            .options()
            .keys()
            .filter(|key| !self.used.contains(*key))
            .cloned()
            .collect();
        if unknown.is_empty() {
            Ok(())
        } else {
            Err(ConfigurationError::UnknownOptions {
                component: self.spec.name().to_string(),
                keys: unknown,
            })
        }
    }

    fn parse<T>(&self, key: &str, value: &str) -> Result<T, ConfigurationError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        value
            .trim()
            .parse()
            .map_err(|e: T::Err| self.invalid(key, value, &e.to_string()))
    }
}
