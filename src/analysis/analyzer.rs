//! Chain assembly
//!
//! [`AnalyzerFactory::new_analyzer`] resolves every component of a
//! [`PipelineSpec`] through the registry exactly once. The resulting
//! [`Analyzer`] only holds factories, so running it over a stream never
//! touches the registry again:
//!
//! ```text
//! PipelineSpec --new_analyzer--> Analyzer --token_stream(reader)--> TokenCursor
//!   (names)        (registry)    (factories)     (per stream)        (stages)
//! ```

use crate::analysis::cursor::TokenCursor;
use crate::analysis::error::{ConfigurationError, StreamError};
use crate::analysis::factory::{CharFilterFactory, TokenFilterFactory, TokenizerFactory};
use crate::analysis::registry::ComponentRegistry;
use crate::analysis::spec::PipelineSpec;
use crate::analysis::stream::{BoxCharStream, ReaderCharStream};
use crate::analysis::token::TokenRecord;
use std::fmt;
use std::io::{BufReader, Cursor, Read};
use std::sync::Arc;
use tracing::debug;

/// Turns pipeline specs into analyzers.
#[derive(Clone)]
pub struct AnalyzerFactory {
    registry: Arc<ComponentRegistry>,
}

impl AnalyzerFactory {
    pub fn new(registry: ComponentRegistry) -> Self {
        AnalyzerFactory {
            registry: Arc::new(registry),
        }
    }

    pub fn with_builtins() -> Self {
        Self::new(ComponentRegistry::with_builtins())
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Resolve `spec` into an analyzer.
    ///
    /// Fails without building anything if the pipeline has no tokenizer or any
    /// component fails to resolve.
    pub fn new_analyzer(&self, spec: &PipelineSpec) -> Result<Analyzer, ConfigurationError> {
        let tokenizer_spec = spec
            .tokenizer()
            .ok_or(ConfigurationError::MissingTokenizer)?;

        let char_filters = spec
            .char_filters()
            .iter()
            .map(|c| self.registry.resolve_char_filter(c))
            .collect::<Result<Vec<_>, _>>()?;
        let tokenizer = self.registry.resolve_tokenizer(tokenizer_spec)?;
        let token_filters = spec
            .token_filters()
            .iter()
            .map(|c| self.registry.resolve_token_filter(c))
            .collect::<Result<Vec<_>, _>>()?;

        let analyzer = Analyzer {
            stages: Arc::new(Stages {
                char_filters,
                tokenizer,
                token_filters,
            }),
        };
        debug!(chain = ?analyzer, "built analyzer");
        Ok(analyzer)
    }
}

impl Default for AnalyzerFactory {
    fn default() -> Self {
        Self::with_builtins()
    }
}

struct Stages {
    char_filters: Vec<Arc<dyn CharFilterFactory>>,
    tokenizer: Arc<dyn TokenizerFactory>,
    token_filters: Vec<Arc<dyn TokenFilterFactory>>,
}

/// A resolved chain, reusable for any number of independent streams.
///
/// Cloning is cheap and clones share the resolved factories.
#[derive(Clone)]
pub struct Analyzer {
    stages: Arc<Stages>,
}

impl Analyzer {
    /// Start a lazy token sequence over `reader`.
    pub fn token_stream<R>(&self, reader: R) -> TokenCursor
    where
        R: Read + Send + 'static,
    {
        self.token_stream_from(Box::new(ReaderCharStream::new(BufReader::new(reader))))
    }

    /// Start a lazy token sequence over an existing char stream.
    pub fn token_stream_from(&self, input: BoxCharStream) -> TokenCursor {
        let chars = self
            .stages
            .char_filters
            .iter()
            .fold(input, |stream, filter| filter.create(stream));
        let tokens = self.stages.tokenizer.create(chars);
        let tokens = self
            .stages
            .token_filters
            .iter()
            .fold(tokens, |stream, filter| filter.create(stream));
        debug!(chain = ?self, "created stage chain");
        TokenCursor::new(tokens)
    }

    /// Run the chain over an in-memory string.
    pub fn analyze(&self, text: &str) -> Result<Vec<TokenRecord>, StreamError> {
        self.token_stream(Cursor::new(text.as_bytes().to_vec()))
            .collect()
    }

    /// Stage names, outermost input first.
    pub fn stage_names(&self) -> Vec<&str> {
        let stages = &self.stages;
        stages
            .char_filters
            .iter()
            .map(|f| f.name())
            .chain(std::iter::once(stages.tokenizer.name()))
            .chain(stages.token_filters.iter().map(|f| f.name()))
            .collect()
    }
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Analyzer[{}]", self.stage_names().join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::spec::ComponentSpec;

    fn factory() -> AnalyzerFactory {
        AnalyzerFactory::with_builtins()
    }

    #[test]
    fn test_missing_tokenizer() {
        let spec = PipelineSpec::builder()
            .token_filter(ComponentSpec::named("uppercase"))
            .build()
            .unwrap();
        assert!(matches!(
            factory().new_analyzer(&spec),
            Err(ConfigurationError::MissingTokenizer)
        ));
    }

    #[test]
    fn test_unknown_filter_aborts() {
        let spec = PipelineSpec::builder()
            .tokenizer(ComponentSpec::named("whitespace"))
            .token_filter(ComponentSpec::named("shout"))
            .build()
            .unwrap();
        let err = factory().new_analyzer(&spec).unwrap_err();
        assert_eq!(err.to_string(), "unknown token filter 'shout'");
    }

    #[test]
    fn test_stage_names_in_order() {
        let spec = PipelineSpec::builder()
            .char_filter(ComponentSpec::named("htmlstrip"))
            .tokenizer(ComponentSpec::named("Standard"))
            .token_filter(ComponentSpec::named("lowercase"))
            .token_filter(ComponentSpec::from_args("truncate", ["prefixLength=3"]).unwrap())
            .build()
            .unwrap();
        let analyzer = factory().new_analyzer(&spec).unwrap();
        assert_eq!(
            analyzer.stage_names(),
            vec!["htmlStrip", "standard", "lowercase", "truncate"]
        );
        assert_eq!(
            format!("{:?}", analyzer),
            "Analyzer[htmlStrip | standard | lowercase | truncate]"
        );
    }

    #[test]
    fn test_analyze() {
        let spec = PipelineSpec::builder()
            .tokenizer(ComponentSpec::named("whitespace"))
            .token_filter(ComponentSpec::named("uppercase"))
            .build()
            .unwrap();
        let analyzer = factory().new_analyzer(&spec).unwrap();
        assert_eq!(
            analyzer.analyze("Hello World").unwrap(),
            vec![
                TokenRecord::new("HELLO", "word"),
                TokenRecord::new("WORLD", "word"),
            ]
        );
    }

    #[test]
    fn test_analyzer_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Analyzer>();
        assert_send_sync::<AnalyzerFactory>();
    }
}
