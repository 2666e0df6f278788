//! Built-in components
//!
//! The compiled-in table every registry starts from (via
//! [`ComponentRegistry::with_builtins`]):
//!
//! - char filters: `mapping`, `patternReplace`, `htmlStrip`
//! - tokenizers: `whitespace`, `standard`, `keyword`, `pattern`
//! - token filters: `lowercase`, `uppercase`, `trim`, `length`, `stop`,
//!   `truncate`, `type`, `limitTokenCount`, `patternReplace`
//!
//! Each constructor reads its options through an
//! [`OptionReader`](crate::analysis::options::OptionReader), so unknown keys
//! and bad values are reported when the analyzer is built.

pub mod char_filters;
pub mod token_filters;
pub mod tokenizers;

use crate::analysis::registry::ComponentRegistry;

pub fn register_all(registry: &mut ComponentRegistry) {
    char_filters::register(registry);
    tokenizers::register(registry);
    token_filters::register(registry);
}

/// Char offset of `byte` within `text`, continuing from a known position.
///
/// `from_byte` / `from_char` must describe the same earlier position.
pub(crate) fn char_offset(text: &str, from_byte: usize, from_char: usize, byte: usize) -> usize {
    from_char + text[from_byte..byte].chars().count()
}
