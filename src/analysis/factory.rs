//! Stage factories
//!
//! A factory is the resolved, option-checked form of a [`ComponentSpec`].
//! Resolving is the expensive step and happens once per analyzer; creating a
//! stage from a factory only wraps the cursor beneath it and happens once per
//! input stream.
//!
//! [`ComponentSpec`]: crate::analysis::spec::ComponentSpec

use crate::analysis::stream::{BoxCharStream, BoxTokenStream};

/// Builds char filters: char stream in, char stream out.
pub trait CharFilterFactory: Send + Sync {
    fn name(&self) -> &str;
    fn create(&self, input: BoxCharStream) -> BoxCharStream;
}

/// Builds the tokenizer: char stream in, token stream out.
pub trait TokenizerFactory: Send + Sync {
    fn name(&self) -> &str;
    fn create(&self, input: BoxCharStream) -> BoxTokenStream;
}

/// Builds token filters: token stream in, token stream out.
pub trait TokenFilterFactory: Send + Sync {
    fn name(&self) -> &str;
    fn create(&self, input: BoxTokenStream) -> BoxTokenStream;
}
