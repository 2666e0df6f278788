//! # textchain
//!
//! Builds a text analysis chain (char filters, one tokenizer, token filters)
//! from named, string-parameterized components and runs it lazily over an
//! input stream, producing `(text, category)` token records.
//!
//! ## Overview
//!
//! - [`ComponentSpec`] / [`PipelineSpec`]: declarative description of the chain
//! - [`ComponentRegistry`]: resolves component names to stage factories
//! - [`AnalyzerFactory`]: resolves a spec once into a reusable [`Analyzer`]
//! - [`TokenCursor`]: pull-based token sequence for one input stream
//!
//! ## Example
//!
//! ```ignore
//! use textchain::{AnalyzerFactory, ComponentSpec, PipelineSpec};
//!
//! let spec = PipelineSpec::builder()
//!     .tokenizer(ComponentSpec::named("whitespace"))
//!     .token_filter(ComponentSpec::named("uppercase"))
//!     .build()?;
//!
//! let analyzer = AnalyzerFactory::with_builtins().new_analyzer(&spec)?;
//! for record in analyzer.analyze("Hello World")? {
//!     println!("{record}");
//! }
//! ```

pub mod analysis;

pub use analysis::analyzer::{Analyzer, AnalyzerFactory};
pub use analysis::cursor::TokenCursor;
pub use analysis::error::{
    AnalysisError, ConfigurationError, ResolutionError, Result, StreamError,
};
pub use analysis::registry::{ComponentRegistry, ComponentRole, StageFactory};
pub use analysis::spec::{ComponentOptions, ComponentSpec, PipelineSpec, PipelineSpecBuilder};
pub use analysis::token::{Token, TokenRecord};
