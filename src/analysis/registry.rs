//! Component registry
//!
//! Maps `(role, name)` to something that can turn a [`ComponentSpec`] into a
//! stage factory. Two kinds of entries exist:
//! - native constructors, registered in code (the built-in table)
//! - aliases, registered by component libraries: a new name for another
//!   component of the same role, with preset options
//!
//! Names are matched case-insensitively. Registering a name twice replaces
//! the earlier entry.
//!
//! # Examples
//!
//! ```ignore
//! let mut registry = ComponentRegistry::with_builtins();
//! registry.register_alias(
//!     ComponentRole::TokenFilter,
//!     "short",
//!     ComponentSpec::from_args("length", ["max=3"])?,
//! );
//!
//! let factory = registry.resolve_token_filter(&ComponentSpec::named("short"))?;
//! ```

use crate::analysis::builtin;
use crate::analysis::error::ConfigurationError;
use crate::analysis::factory::{CharFilterFactory, TokenFilterFactory, TokenizerFactory};
use crate::analysis::spec::ComponentSpec;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Which slot of the chain a component fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentRole {
    CharFilter,
    Tokenizer,
    TokenFilter,
}

impl ComponentRole {
    pub const ALL: [ComponentRole; 3] = [
        ComponentRole::CharFilter,
        ComponentRole::Tokenizer,
        ComponentRole::TokenFilter,
    ];

    /// The command-line flag that introduces a stage of this role.
    pub fn flag(&self) -> &'static str {
        match self {
            ComponentRole::CharFilter => "-charfilter",
            ComponentRole::Tokenizer => "-tokenizer",
            ComponentRole::TokenFilter => "-tokenfilter",
        }
    }

    pub fn from_flag(flag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|role| role.flag() == flag)
    }
}

impl fmt::Display for ComponentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ComponentRole::CharFilter => "char filter",
            ComponentRole::Tokenizer => "tokenizer",
            ComponentRole::TokenFilter => "token filter",
        };
        f.write_str(label)
    }
}

/// A resolved factory of any role.
#[derive(Clone)]
pub enum StageFactory {
    CharFilter(Arc<dyn CharFilterFactory>),
    Tokenizer(Arc<dyn TokenizerFactory>),
    TokenFilter(Arc<dyn TokenFilterFactory>),
}

impl StageFactory {
    pub fn role(&self) -> ComponentRole {
        match self {
            StageFactory::CharFilter(_) => ComponentRole::CharFilter,
            StageFactory::Tokenizer(_) => ComponentRole::Tokenizer,
            StageFactory::TokenFilter(_) => ComponentRole::TokenFilter,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            StageFactory::CharFilter(f) => f.name(),
            StageFactory::Tokenizer(f) => f.name(),
            StageFactory::TokenFilter(f) => f.name(),
        }
    }
}

impl fmt::Debug for StageFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.role(), self.name())
    }
}

type Constructor<F> =
    Arc<dyn Fn(&ComponentSpec) -> Result<Arc<F>, ConfigurationError> + Send + Sync>;

enum Entry<F: ?Sized> {
    Native(Constructor<F>),
    Alias(ComponentSpec),
}

impl<F: ?Sized> Clone for Entry<F> {
    fn clone(&self) -> Self {
        match self {
            Entry::Native(ctor) => Entry::Native(Arc::clone(ctor)),
            Entry::Alias(target) => Entry::Alias(target.clone()),
        }
    }
}

/// Entries of one role, keyed by lowercased name.
struct Table<F: ?Sized> {
    role: ComponentRole,
    entries: HashMap<String, Entry<F>>,
}

impl<F: ?Sized> Clone for Table<F> {
    fn clone(&self) -> Self {
        Table {
            role: self.role,
            entries: self.entries.clone(),
        }
    }
}

impl<F: ?Sized> Table<F> {
    fn new(role: ComponentRole) -> Self {
        Table {
            role,
            entries: HashMap::new(),
        }
    }

    fn insert(&mut self, name: &str, entry: Entry<F>) {
        if self.entries.insert(name.to_lowercase(), entry).is_some() {
            warn!(role = %self.role, name, "replacing registered component");
        }
    }

    fn has(&self, name: &str) -> bool {
        self.entries.contains_key(&name.to_lowercase())
    }

    fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.entries.keys().cloned().collect();
        names.sort();
        names
    }

    /// Follow aliases down to a native constructor and run it.
    ///
    /// Each alias hop overlays the caller's options on the alias presets.
    fn resolve(&self, spec: &ComponentSpec) -> Result<Arc<F>, ConfigurationError> {
        let mut current = spec.clone();
        let mut visited = HashSet::new();
        loop {
            let key = current.name().to_lowercase();
            if !visited.insert(key.clone()) {
                return Err(ConfigurationError::AliasCycle {
                    role: self.role,
                    name: spec.name().to_string(),
                });
            }
            match self.entries.get(&key) {
                None => {
                    return Err(ConfigurationError::UnknownComponent {
                        role: self.role,
                        name: current.name().to_string(),
                    })
                }
                Some(Entry::Native(ctor)) => return (**ctor)(&current),
                Some(Entry::Alias(target)) => {
                    let mut options = target.options().clone();
                    options.extend(
                        current
                            .options()
                            .iter()
                            .map(|(k, v)| (k.clone(), v.clone())),
                    );
                    debug!(role = %self.role, alias = current.name(), target = target.name(), "following alias");
                    current = ComponentSpec::new(target.name(), options);
                }
            }
        }
    }
}

/// Registry of every component a chain can name.
#[derive(Clone)]
pub struct ComponentRegistry {
    char_filters: Table<dyn CharFilterFactory>,
    tokenizers: Table<dyn TokenizerFactory>,
    token_filters: Table<dyn TokenFilterFactory>,
}

impl ComponentRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        ComponentRegistry {
            char_filters: Table::new(ComponentRole::CharFilter),
            tokenizers: Table::new(ComponentRole::Tokenizer),
            token_filters: Table::new(ComponentRole::TokenFilter),
        }
    }

    /// A registry holding the built-in components.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtin::register_all(&mut registry);
        registry
    }

    pub fn register_char_filter<C>(&mut self, name: &str, constructor: C)
    where
        C: Fn(&ComponentSpec) -> Result<Arc<dyn CharFilterFactory>, ConfigurationError>
            + Send
            + Sync
            + 'static,
    {
        self.char_filters
            .insert(name, Entry::Native(Arc::new(constructor)));
    }

    pub fn register_tokenizer<C>(&mut self, name: &str, constructor: C)
    where
        C: Fn(&ComponentSpec) -> Result<Arc<dyn TokenizerFactory>, ConfigurationError>
            + Send
            + Sync
            + 'static,
    {
        self.tokenizers
            .insert(name, Entry::Native(Arc::new(constructor)));
    }

    pub fn register_token_filter<C>(&mut self, name: &str, constructor: C)
    where
        C: Fn(&ComponentSpec) -> Result<Arc<dyn TokenFilterFactory>, ConfigurationError>
            + Send
            + Sync
            + 'static,
    {
        self.token_filters
            .insert(name, Entry::Native(Arc::new(constructor)));
    }

    /// Register `name` as another name for `target` within `role`.
    ///
    /// The target is looked up when the alias is resolved, not now, so
    /// aliases may point at components registered later.
    pub fn register_alias(&mut self, role: ComponentRole, name: &str, target: ComponentSpec) {
        match role {
            ComponentRole::CharFilter => self.char_filters.insert(name, Entry::Alias(target)),
            ComponentRole::Tokenizer => self.tokenizers.insert(name, Entry::Alias(target)),
            ComponentRole::TokenFilter => self.token_filters.insert(name, Entry::Alias(target)),
        }
    }

    pub fn has(&self, role: ComponentRole, name: &str) -> bool {
        match role {
            ComponentRole::CharFilter => self.char_filters.has(name),
            ComponentRole::Tokenizer => self.tokenizers.has(name),
            ComponentRole::TokenFilter => self.token_filters.has(name),
        }
    }

    /// Registered names of a role, lowercased and sorted.
    pub fn names(&self, role: ComponentRole) -> Vec<String> {
        match role {
            ComponentRole::CharFilter => self.char_filters.names(),
            ComponentRole::Tokenizer => self.tokenizers.names(),
            ComponentRole::TokenFilter => self.token_filters.names(),
        }
    }

    /// Resolve a spec in any role.
    pub fn resolve(
        &self,
        role: ComponentRole,
        spec: &ComponentSpec,
    ) -> Result<StageFactory, ConfigurationError> {
        let factory = match role {
            ComponentRole::CharFilter => StageFactory::CharFilter(self.resolve_char_filter(spec)?),
            ComponentRole::Tokenizer => StageFactory::Tokenizer(self.resolve_tokenizer(spec)?),
            ComponentRole::TokenFilter => {
                StageFactory::TokenFilter(self.resolve_token_filter(spec)?)
            }
        };
        Ok(factory)
    }

    pub fn resolve_char_filter(
        &self,
        spec: &ComponentSpec,
    ) -> Result<Arc<dyn CharFilterFactory>, ConfigurationError> {
        let factory = self.char_filters.resolve(spec)?;
        debug!(component = %spec, "resolved char filter");
        Ok(factory)
    }

    pub fn resolve_tokenizer(
        &self,
        spec: &ComponentSpec,
    ) -> Result<Arc<dyn TokenizerFactory>, ConfigurationError> {
        let factory = self.tokenizers.resolve(spec)?;
        debug!(component = %spec, "resolved tokenizer");
        Ok(factory)
    }

    pub fn resolve_token_filter(
        &self,
        spec: &ComponentSpec,
    ) -> Result<Arc<dyn TokenFilterFactory>, ConfigurationError> {
        let factory = self.token_filters.resolve(spec)?;
        debug!(component = %spec, "resolved token filter");
        Ok(factory)
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}
