//! Built-in tokenizers
//!
//! Token offsets are char offsets into the stream the tokenizer reads, i.e.
//! after char filtering.

use crate::analysis::builtin::char_offset;
use crate::analysis::error::{ConfigurationError, StreamError};
use crate::analysis::factory::TokenizerFactory;
use crate::analysis::options::OptionReader;
use crate::analysis::registry::ComponentRegistry;
use crate::analysis::spec::ComponentSpec;
use crate::analysis::stream::{read_line, BoxCharStream, BoxTokenStream, TokenStream};
use crate::analysis::token::{category, Token};
use logos::Logos;
use regex::Regex;
use std::collections::VecDeque;
use std::sync::Arc;

pub const DEFAULT_MAX_TOKEN_LENGTH: usize = 255;

pub fn register(registry: &mut ComponentRegistry) {
    registry.register_tokenizer("whitespace", whitespace);
    registry.register_tokenizer("standard", standard);
    registry.register_tokenizer("keyword", keyword);
    registry.register_tokenizer("pattern", pattern);
}

type Built = Result<Arc<dyn TokenizerFactory>, ConfigurationError>;

/// Queue `text` as tokens of at most `max_len` chars each.
fn push_chunked(
    out: &mut VecDeque<Token>,
    text: &str,
    category: &str,
    start: usize,
    max_len: usize,
) {
    let chars: Vec<char> = text.chars().collect();
    for (i, chunk) in chars.chunks(max_len).enumerate() {
        let from = start + i * max_len;
        out.push_back(Token::new(
            chunk.iter().collect::<String>(),
            category,
            from,
            from + chunk.len(),
        ));
    }
}

// ---------------------------------------------------------------------------
// whitespace
// ---------------------------------------------------------------------------

pub struct WhitespaceFactory {
    max_len: usize,
}

fn whitespace(spec: &ComponentSpec) -> Built {
    let mut options = OptionReader::new(spec);
    let max_len = options.get_positive("maxTokenLength", DEFAULT_MAX_TOKEN_LENGTH)?;
    options.finish()?;
    Ok(Arc::new(WhitespaceFactory { max_len }))
}

impl TokenizerFactory for WhitespaceFactory {
    fn name(&self) -> &str {
        "whitespace"
    }

    fn create(&self, input: BoxCharStream) -> BoxTokenStream {
        Box::new(WhitespaceTokenizer {
            input,
            max_len: self.max_len,
            position: 0,
        })
    }
}

struct WhitespaceTokenizer {
    input: BoxCharStream,
    max_len: usize,
    /// Chars consumed so far
    position: usize,
}

impl TokenStream for WhitespaceTokenizer {
    fn advance(&mut self) -> Result<Option<Token>, StreamError> {
        let mut text = String::new();
        let mut start = self.position;
        let mut len = 0;
        while let Some(c) = self.input.next_char()? {
            self.position += 1;
            if c.is_whitespace() {
                if len > 0 {
                    break;
                }
                start = self.position;
                continue;
            }
            text.push(c);
            len += 1;
            if len == self.max_len {
                break;
            }
        }
        if len == 0 {
            return Ok(None);
        }
        Ok(Some(Token::new(text, category::WORD, start, start + len)))
    }
}

// ---------------------------------------------------------------------------
// standard
// ---------------------------------------------------------------------------

/// Word-level lexemes. Punctuation is recognized only to be dropped.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"\s+")]
enum Lexeme {
    #[regex(r"[0-9]+([.,][0-9]+)*", priority = 3)]
    Number,

    /// Letters and digits, joined by single inner apostrophes (`don't`)
    #[regex(r"[^\s!-/:-@\[-`{-~]+('[^\s!-/:-@\[-`{-~]+)*", priority = 2)]
    Word,

    #[regex(r"[!-/:-@\[-`{-~]")]
    Punct,
}

pub struct StandardFactory {
    max_len: usize,
}

fn standard(spec: &ComponentSpec) -> Built {
    let mut options = OptionReader::new(spec);
    let max_len = options.get_positive("maxTokenLength", DEFAULT_MAX_TOKEN_LENGTH)?;
    options.finish()?;
    Ok(Arc::new(StandardFactory { max_len }))
}

impl TokenizerFactory for StandardFactory {
    fn name(&self) -> &str {
        "standard"
    }

    fn create(&self, input: BoxCharStream) -> BoxTokenStream {
        Box::new(StandardTokenizer {
            input,
            max_len: self.max_len,
            line: String::new(),
            line_start: 0,
            pending: VecDeque::new(),
        })
    }
}

/// Lexes one line at a time.
struct StandardTokenizer {
    input: BoxCharStream,
    max_len: usize,
    line: String,
    /// Char offset of the current line
    line_start: usize,
    pending: VecDeque<Token>,
}

impl TokenStream for StandardTokenizer {
    fn advance(&mut self) -> Result<Option<Token>, StreamError> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Ok(Some(token));
            }
            self.line_start += self.line.chars().count();
            self.line.clear();
            if !read_line(self.input.as_mut(), &mut self.line)? {
                return Ok(None);
            }

            let mut lexer = Lexeme::lexer(&self.line);
            let (mut byte, mut chars) = (0, self.line_start);
            while let Some(result) = lexer.next() {
                let Ok(lexeme) = result else {
                    continue;
                };
                let span = lexer.span();
                let start = char_offset(&self.line, byte, chars, span.start);
                (byte, chars) = (span.start, start);

                let text = lexer.slice();
                let category = match lexeme {
                    Lexeme::Number => category::NUMBER,
                    Lexeme::Word if text.chars().any(|c| c.is_ascii_digit()) => category::ALPHANUM,
                    Lexeme::Word => category::WORD,
                    Lexeme::Punct => continue,
                };
                push_chunked(&mut self.pending, text, category, start, self.max_len);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// keyword
// ---------------------------------------------------------------------------

pub struct KeywordFactory;

fn keyword(spec: &ComponentSpec) -> Built {
    OptionReader::new(spec).finish()?;
    Ok(Arc::new(KeywordFactory))
}

impl TokenizerFactory for KeywordFactory {
    fn name(&self) -> &str {
        "keyword"
    }

    fn create(&self, input: BoxCharStream) -> BoxTokenStream {
        Box::new(KeywordTokenizer { input, done: false })
    }
}

/// The whole input as one token.
struct KeywordTokenizer {
    input: BoxCharStream,
    done: bool,
}

impl TokenStream for KeywordTokenizer {
    fn advance(&mut self) -> Result<Option<Token>, StreamError> {
        if self.done {
            return Ok(None);
        }
        self.done = true;
        let mut text = String::new();
        while let Some(c) = self.input.next_char()? {
            text.push(c);
        }
        if text.is_empty() {
            return Ok(None);
        }
        let len = text.chars().count();
        Ok(Some(Token::new(text, category::WORD, 0, len)))
    }
}

// ---------------------------------------------------------------------------
// pattern
// ---------------------------------------------------------------------------

struct PatternRule {
    regex: Regex,
    /// `None` splits on matches; `Some(n)` emits capture group `n`
    group: Option<usize>,
}

pub struct PatternFactory {
    rule: Arc<PatternRule>,
}

fn pattern(spec: &ComponentSpec) -> Built {
    let mut options = OptionReader::new(spec);
    let regex = options.require_regex("pattern")?;
    let raw_group: i64 = options.get_parsed("group", -1)?;
    let group = match raw_group {
        -1 => None,
        n if n >= 0 && (n as usize) < regex.captures_len() => Some(n as usize),
        n => {
            return Err(options.invalid(
                "group",
                &n.to_string(),
                &format!("pattern has {} group(s)", regex.captures_len() - 1),
            ))
        }
    };
    options.finish()?;
    Ok(Arc::new(PatternFactory {
        rule: Arc::new(PatternRule { regex, group }),
    }))
}

impl TokenizerFactory for PatternFactory {
    fn name(&self) -> &str {
        "pattern"
    }

    fn create(&self, input: BoxCharStream) -> BoxTokenStream {
        Box::new(PatternTokenizer {
            input,
            rule: Arc::clone(&self.rule),
            line: String::new(),
            line_start: 0,
            pending: VecDeque::new(),
        })
    }
}

/// Matches within one line at a time; the line break itself is a boundary.
struct PatternTokenizer {
    input: BoxCharStream,
    rule: Arc<PatternRule>,
    line: String,
    line_start: usize,
    pending: VecDeque<Token>,
}

impl PatternTokenizer {
    fn tokenize_line(&mut self) {
        let content = self.line.trim_end_matches(['\n', '\r']);
        let mut spans = Vec::new();
        match self.rule.group {
            None => {
                let mut last = 0;
                for m in self.rule.regex.find_iter(content) {
                    spans.push((last, m.start()));
                    last = m.end();
                }
                spans.push((last, content.len()));
            }
            Some(group) => {
                for caps in self.rule.regex.captures_iter(content) {
                    if let Some(m) = caps.get(group) {
                        spans.push((m.start(), m.end()));
                    }
                }
            }
        }

        let (mut byte, mut chars) = (0, self.line_start);
        for (from, to) in spans {
            if from >= to || from < byte {
                continue;
            }
            let start = char_offset(content, byte, chars, from);
            let end = char_offset(content, from, start, to);
            (byte, chars) = (from, start);
            self.pending
                .push_back(Token::new(&content[from..to], category::WORD, start, end));
        }
    }
}

impl TokenStream for PatternTokenizer {
    fn advance(&mut self) -> Result<Option<Token>, StreamError> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Ok(Some(token));
            }
            self.line_start += self.line.chars().count();
            self.line.clear();
            if !read_line(self.input.as_mut(), &mut self.line)? {
                return Ok(None);
            }
            self.tokenize_line();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::builtin::testing::{chars, drain_tokens, texts};
    use rstest::rstest;

    fn spec(name: &str, args: &[&str]) -> ComponentSpec {
        ComponentSpec::from_args(name, args.iter().copied()).unwrap()
    }

    fn run(factory: &dyn TokenizerFactory, text: &str) -> Vec<Token> {
        drain_tokens(factory.create(chars(text))).unwrap()
    }

    #[test]
    fn test_whitespace_offsets() {
        let factory = whitespace(&spec("whitespace", &[])).unwrap();
        assert_eq!(
            run(factory.as_ref(), "Hello World"),
            vec![
                Token::new("Hello", "word", 0, 5),
                Token::new("World", "word", 6, 11),
            ]
        );
        assert_eq!(
            run(factory.as_ref(), "  a\tb\n"),
            vec![Token::new("a", "word", 2, 3), Token::new("b", "word", 4, 5)]
        );
    }

    #[test]
    fn test_whitespace_max_length() {
        let factory = whitespace(&spec("whitespace", &["maxTokenLength=3"])).unwrap();
        let tokens = run(factory.as_ref(), "abcdefg hi");
        assert_eq!(texts(&tokens), vec!["abc", "def", "g", "hi"]);
        assert_eq!(tokens[2], Token::new("g", "word", 6, 7));
    }

    #[test]
    fn test_whitespace_rejects_zero_length() {
        assert!(matches!(
            whitespace(&spec("whitespace", &["maxTokenLength=0"])).err().unwrap(),
            ConfigurationError::InvalidOption { .. }
        ));
    }

    #[test]
    fn test_standard_categories() {
        let factory = standard(&spec("standard", &[])).unwrap();
        let tokens = run(factory.as_ref(), "Hello, World! 42 abc123 3.14 café");
        let pairs: Vec<(&str, &str)> = tokens
            .iter()
            .map(|t| (t.text.as_str(), t.category.as_str()))
            .collect();
        insta::assert_debug_snapshot!(pairs, @r#"
        [
            (
                "Hello",
                "word",
            ),
            (
                "World",
                "word",
            ),
            (
                "42",
                "number",
            ),
            (
                "abc123",
                "alphanum",
            ),
            (
                "3.14",
                "number",
            ),
            (
                "café",
                "word",
            ),
        ]
        "#);
    }

    #[rstest]
    #[case("don't stop", &["don't", "stop"])]
    #[case("O'Neil's rock'n'roll", &["O'Neil's", "rock'n'roll"])]
    #[case("'quoted' dogs'", &["quoted", "dogs"])]
    #[case("it''s", &["it", "s"])]
    fn test_standard_inner_apostrophes(#[case] input: &str, #[case] expected: &[&str]) {
        let factory = standard(&spec("standard", &[])).unwrap();
        assert_eq!(texts(&run(factory.as_ref(), input)), expected);
    }

    #[test]
    fn test_standard_offsets_across_lines() {
        let factory = standard(&spec("standard", &[])).unwrap();
        assert_eq!(
            run(factory.as_ref(), "é a\nb"),
            vec![
                Token::new("é", "word", 0, 1),
                Token::new("a", "word", 2, 3),
                Token::new("b", "word", 4, 5),
            ]
        );
    }

    #[test]
    fn test_standard_only_punctuation() {
        let factory = standard(&spec("standard", &[])).unwrap();
        assert!(run(factory.as_ref(), "... !? --").is_empty());
    }

    #[rstest]
    #[case("Hello World", vec!["Hello World"])]
    #[case("", vec![])]
    #[case(" padded ", vec![" padded "])]
    fn test_keyword(#[case] input: &str, #[case] expected: Vec<&str>) {
        let factory = keyword(&spec("keyword", &[])).unwrap();
        assert_eq!(texts(&run(factory.as_ref(), input)), expected);
    }

    #[test]
    fn test_pattern_split() {
        let factory = pattern(&spec("pattern", &["pattern=,"])).unwrap();
        let tokens = run(factory.as_ref(), "a,b,,c\nd");
        assert_eq!(texts(&tokens), vec!["a", "b", "c", "d"]);
        assert_eq!(tokens[2], Token::new("c", "word", 5, 6));
        assert_eq!(tokens[3], Token::new("d", "word", 7, 8));
    }

    #[test]
    fn test_pattern_group() {
        let factory = pattern(&spec("pattern", &["pattern='([^']*)'", "group=1"])).unwrap();
        let tokens = run(factory.as_ref(), "'aaa', 'bbb'");
        assert_eq!(
            tokens,
            vec![Token::new("aaa", "word", 1, 4), Token::new("bbb", "word", 8, 11)]
        );
    }

    #[rstest]
    #[case("group=2")]
    #[case("group=-2")]
    #[case("group=x")]
    fn test_pattern_bad_group(#[case] group: &str) {
        let err = pattern(&spec("pattern", &["pattern=(a)", group])).err().unwrap();
        assert!(matches!(err, ConfigurationError::InvalidOption { .. }));
    }
}
