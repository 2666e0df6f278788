//! Built-in token filters
//!
//! Most filters are one of two shapes: rewrite every token ([`MapFactory`])
//! or drop some tokens ([`RetainFactory`]). `limitTokenCount` is the odd one
//! out since it stops pulling from the stage beneath.

use crate::analysis::error::{ConfigurationError, StreamError};
use crate::analysis::factory::TokenFilterFactory;
use crate::analysis::options::OptionReader;
use crate::analysis::registry::ComponentRegistry;
use crate::analysis::spec::ComponentSpec;
use crate::analysis::stream::{BoxTokenStream, TokenStream};
use crate::analysis::token::Token;
use std::collections::HashSet;
use std::sync::Arc;

pub fn register(registry: &mut ComponentRegistry) {
    registry.register_token_filter("lowercase", lowercase);
    registry.register_token_filter("uppercase", uppercase);
    registry.register_token_filter("trim", trim);
    registry.register_token_filter("length", length);
    registry.register_token_filter("stop", stop);
    registry.register_token_filter("truncate", truncate);
    registry.register_token_filter("type", type_filter);
    registry.register_token_filter("limitTokenCount", limit_token_count);
    registry.register_token_filter("patternReplace", pattern_replace);
}

type Built = Result<Arc<dyn TokenFilterFactory>, ConfigurationError>;
type TokenMap = Arc<dyn Fn(Token) -> Token + Send + Sync>;
type TokenPredicate = Arc<dyn Fn(&Token) -> bool + Send + Sync>;

/// A filter that rewrites each token.
pub struct MapFactory {
    name: &'static str,
    map: TokenMap,
}

impl MapFactory {
    pub fn new<F>(name: &'static str, map: F) -> Self
    where
        F: Fn(Token) -> Token + Send + Sync + 'static,
    {
        MapFactory {
            name,
            map: Arc::new(map),
        }
    }
}

impl TokenFilterFactory for MapFactory {
    fn name(&self) -> &str {
        self.name
    }

    fn create(&self, input: BoxTokenStream) -> BoxTokenStream {
        Box::new(MapTokens {
            input,
            map: Arc::clone(&self.map),
        })
    }
}

struct MapTokens {
    input: BoxTokenStream,
    map: TokenMap,
}

impl TokenStream for MapTokens {
    fn advance(&mut self) -> Result<Option<Token>, StreamError> {
        Ok(self.input.advance()?.map(|token| (self.map)(token)))
    }
}

/// A filter that keeps tokens matching a predicate.
pub struct RetainFactory {
    name: &'static str,
    keep: TokenPredicate,
}

impl RetainFactory {
    pub fn new<F>(name: &'static str, keep: F) -> Self
    where
        F: Fn(&Token) -> bool + Send + Sync + 'static,
    {
        RetainFactory {
            name,
            keep: Arc::new(keep),
        }
    }
}

impl TokenFilterFactory for RetainFactory {
    fn name(&self) -> &str {
        self.name
    }

    fn create(&self, input: BoxTokenStream) -> BoxTokenStream {
        Box::new(RetainTokens {
            input,
            keep: Arc::clone(&self.keep),
        })
    }
}

struct RetainTokens {
    input: BoxTokenStream,
    keep: TokenPredicate,
}

impl TokenStream for RetainTokens {
    fn advance(&mut self) -> Result<Option<Token>, StreamError> {
        while let Some(token) = self.input.advance()? {
            if (self.keep)(&token) {
                return Ok(Some(token));
            }
        }
        Ok(None)
    }
}

fn lowercase(spec: &ComponentSpec) -> Built {
    OptionReader::new(spec).finish()?;
    Ok(Arc::new(MapFactory::new("lowercase", |token: Token| {
        let text = token.text.to_lowercase();
        token.with_text(text)
    })))
}

fn uppercase(spec: &ComponentSpec) -> Built {
    OptionReader::new(spec).finish()?;
    Ok(Arc::new(MapFactory::new("uppercase", |token: Token| {
        let text = token.text.to_uppercase();
        token.with_text(text)
    })))
}

fn trim(spec: &ComponentSpec) -> Built {
    OptionReader::new(spec).finish()?;
    Ok(Arc::new(MapFactory::new("trim", |token: Token| {
        let text = token.text.trim().to_string();
        token.with_text(text)
    })))
}

fn length(spec: &ComponentSpec) -> Built {
    let mut options = OptionReader::new(spec);
    let min: usize = options.get_parsed("min", 0)?;
    let max: usize = options.get_parsed("max", usize::MAX)?;
    if min > max {
        return Err(options.invalid("min", &min.to_string(), "greater than max"));
    }
    options.finish()?;
    Ok(Arc::new(RetainFactory::new("length", move |token: &Token| {
        (min..=max).contains(&token.text.chars().count())
    })))
}

fn stop(spec: &ComponentSpec) -> Built {
    let mut options = OptionReader::new(spec);
    let words = options.require_list("words")?;
    let ignore_case = options.get_bool("ignoreCase", false)?;
    options.finish()?;

    let words: HashSet<String> = if ignore_case {
        words.iter().map(|w| w.to_lowercase()).collect()
    } else {
        words.into_iter().collect()
    };
    Ok(Arc::new(RetainFactory::new("stop", move |token: &Token| {
        if ignore_case {
            !words.contains(&token.text.to_lowercase())
        } else {
            !words.contains(&token.text)
        }
    })))
}

fn truncate(spec: &ComponentSpec) -> Built {
    let mut options = OptionReader::new(spec);
    let prefix = options.get_positive("prefixLength", 5)?;
    options.finish()?;
    Ok(Arc::new(MapFactory::new("truncate", move |token: Token| {
        match token.text.char_indices().nth(prefix) {
            Some((cut, _)) => {
                let text = token.text[..cut].to_string();
                token.with_text(text)
            }
            None => token,
        }
    })))
}

fn type_filter(spec: &ComponentSpec) -> Built {
    let mut options = OptionReader::new(spec);
    let types: HashSet<String> = options.require_list("types")?.into_iter().collect();
    let whitelist = options.get_bool("useWhitelist", false)?;
    options.finish()?;
    Ok(Arc::new(RetainFactory::new("type", move |token: &Token| {
        types.contains(&token.category) == whitelist
    })))
}

pub struct LimitTokenCountFactory {
    max: usize,
}

fn limit_token_count(spec: &ComponentSpec) -> Built {
    let mut options = OptionReader::new(spec);
    let max = options.require_parsed("maxTokenCount")?;
    options.finish()?;
    Ok(Arc::new(LimitTokenCountFactory { max }))
}

impl TokenFilterFactory for LimitTokenCountFactory {
    fn name(&self) -> &str {
        "limitTokenCount"
    }

    fn create(&self, input: BoxTokenStream) -> BoxTokenStream {
        Box::new(LimitTokens {
            input,
            remaining: self.max,
        })
    }
}

struct LimitTokens {
    input: BoxTokenStream,
    remaining: usize,
}

impl TokenStream for LimitTokens {
    fn advance(&mut self) -> Result<Option<Token>, StreamError> {
        if self.remaining == 0 {
            return Ok(None);
        }
        let token = self.input.advance()?;
        if token.is_some() {
            self.remaining -= 1;
        }
        Ok(token)
    }
}

fn pattern_replace(spec: &ComponentSpec) -> Built {
    let mut options = OptionReader::new(spec);
    let regex = options.require_regex("pattern")?;
    let replacement = options.get_or("replacement", "").to_string();
    let all = options.get_bool("all", true)?;
    options.finish()?;
    Ok(Arc::new(MapFactory::new("patternReplace", move |token: Token| {
        let text = if all {
            regex.replace_all(&token.text, replacement.as_str())
        } else {
            regex.replace(&token.text, replacement.as_str())
        }
        .into_owned();
        token.with_text(text)
    })))
}
