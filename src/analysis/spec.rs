//! Declarative descriptions of analysis stages
//!
//! A [`ComponentSpec`] names one stage and carries its string options. A
//! [`PipelineSpec`] is the whole chain: ordered char filters, one tokenizer,
//! ordered token filters. Neither validates names or options; that happens
//! when the registry resolves them.
//!
//! Pipeline files are YAML:
//!
//! ```text
//! char_filters:
//!   - name: htmlStrip
//! tokenizer:
//!   name: standard
//!   options:
//!     maxTokenLength: 40
//! token_filters:
//!   - name: lowercase
//!   - name: stop
//!     options: { words: "a,an,the" }
//! ```

use crate::analysis::error::ConfigurationError;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

/// Option map of a component. Keys are unique; order carries no meaning.
pub type ComponentOptions = BTreeMap<String, String>;

/// One named, parameterized stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentSpec {
    name: String,
    #[serde(
        default,
        deserialize_with = "deserialize_options",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    options: ComponentOptions,
}

impl ComponentSpec {
    pub fn new(name: impl Into<String>, options: ComponentOptions) -> Self {
        ComponentSpec {
            name: name.into(),
            options,
        }
    }

    /// A spec without options.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, ComponentOptions::new())
    }

    /// Build a spec from `key=value` strings.
    ///
    /// A string without `=` or a key given twice is a configuration error.
    pub fn from_args<I, S>(name: impl Into<String>, args: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let name = name.into();
        let mut options = ComponentOptions::new();
        for arg in args {
            let (key, value) = Self::parse_option(arg.as_ref())?;
            if options.contains_key(&key) {
                return Err(ConfigurationError::DuplicateOption {
                    component: name,
                    key,
                });
            }
            options.insert(key, value);
        }
        Ok(Self::new(name, options))
    }

    /// Split `key=value` at the first `=`. The value may itself contain `=`.
    pub fn parse_option(arg: &str) -> Result<(String, String), ConfigurationError> {
        match arg.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                Ok((key.trim().to_string(), value.to_string()))
            }
            _ => Err(ConfigurationError::MalformedOption(arg.to_string())),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> &ComponentOptions {
        &self.options
    }
}

impl fmt::Display for ComponentSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.options.is_empty() {
            let pairs: Vec<String> = self
                .options
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            write!(f, "({})", pairs.join(", "))?;
        }
        Ok(())
    }
}

/// The full chain definition.
///
/// The tokenizer is optional in the value itself so that a chain without one
/// is reported by `AnalyzerFactory::new_analyzer` rather than being
/// unrepresentable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineSpec {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    char_filters: Vec<ComponentSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tokenizer: Option<ComponentSpec>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    token_filters: Vec<ComponentSpec>,
}

impl PipelineSpec {
    pub fn new(
        char_filters: Vec<ComponentSpec>,
        tokenizer: Option<ComponentSpec>,
        token_filters: Vec<ComponentSpec>,
    ) -> Self {
        PipelineSpec {
            char_filters,
            tokenizer,
            token_filters,
        }
    }

    pub fn builder() -> PipelineSpecBuilder {
        PipelineSpecBuilder::default()
    }

    pub fn char_filters(&self) -> &[ComponentSpec] {
        &self.char_filters
    }

    pub fn tokenizer(&self) -> Option<&ComponentSpec> {
        self.tokenizer.as_ref()
    }

    pub fn token_filters(&self) -> &[ComponentSpec] {
        &self.token_filters
    }

    /// Parse a YAML pipeline definition.
    pub fn from_yaml_str(source: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(source)
    }

    /// Load a YAML pipeline definition from disk.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let invalid = |message: String| ConfigurationError::InvalidPipelineFile {
            path: path.to_path_buf(),
            message,
        };
        let source = fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        Self::from_yaml_str(&source).map_err(|e| invalid(e.to_string()))
    }
}

impl fmt::Display for PipelineSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stages: Vec<String> = self.char_filters.iter().map(|s| s.to_string()).collect();
        stages.push(match &self.tokenizer {
            Some(tokenizer) => tokenizer.to_string(),
            None => "<no tokenizer>".to_string(),
        });
        stages.extend(self.token_filters.iter().map(|s| s.to_string()));
        write!(f, "{}", stages.join(" | "))
    }
}

/// Collects stages in call order and produces a [`PipelineSpec`].
#[derive(Debug, Default)]
pub struct PipelineSpecBuilder {
    char_filters: Vec<ComponentSpec>,
    tokenizer: Option<ComponentSpec>,
    extra_tokenizer: Option<ComponentSpec>,
    token_filters: Vec<ComponentSpec>,
}

impl PipelineSpecBuilder {
    pub fn char_filter(mut self, spec: ComponentSpec) -> Self {
        self.char_filters.push(spec);
        self
    }

    /// Set the tokenizer. Setting it twice makes `build` fail.
    pub fn tokenizer(mut self, spec: ComponentSpec) -> Self {
        if self.tokenizer.is_none() {
            self.tokenizer = Some(spec);
        } else if self.extra_tokenizer.is_none() {
            self.extra_tokenizer = Some(spec);
        }
        self
    }

    pub fn token_filter(mut self, spec: ComponentSpec) -> Self {
        self.token_filters.push(spec);
        self
    }

    pub fn build(self) -> Result<PipelineSpec, ConfigurationError> {
        if let (Some(first), Some(second)) = (&self.tokenizer, &self.extra_tokenizer) {
            return Err(ConfigurationError::DuplicateTokenizer {
                first: first.name().to_string(),
                second: second.name().to_string(),
            });
        }
        Ok(PipelineSpec::new(
            self.char_filters,
            self.tokenizer,
            self.token_filters,
        ))
    }
}

/// Scalar option values in pipeline files and library manifests.
#[derive(Deserialize)]
#[serde(untagged)]
enum OptionValue {
    Flag(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<OptionValue> for String {
    fn from(value: OptionValue) -> Self {
        match value {
            OptionValue::Flag(b) => b.to_string(),
            OptionValue::Integer(i) => i.to_string(),
            OptionValue::Float(x) => x.to_string(),
            OptionValue::Text(s) => s,
        }
    }
}

/// Accept unquoted numbers and booleans as option values.
pub(crate) fn deserialize_options<'de, D>(deserializer: D) -> Result<ComponentOptions, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, OptionValue>::deserialize(deserializer)?;
    Ok(raw.into_iter().map(|(k, v)| (k, v.into())).collect())
}
