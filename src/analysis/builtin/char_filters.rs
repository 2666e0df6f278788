//! Built-in char filters

use crate::analysis::error::{ConfigurationError, StreamError};
use crate::analysis::factory::CharFilterFactory;
use crate::analysis::options::OptionReader;
use crate::analysis::registry::ComponentRegistry;
use crate::analysis::spec::ComponentSpec;
use crate::analysis::stream::{read_line, BoxCharStream, CharStream};
use regex::Regex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

pub fn register(registry: &mut ComponentRegistry) {
    registry.register_char_filter("mapping", mapping);
    registry.register_char_filter("patternReplace", pattern_replace);
    registry.register_char_filter("htmlStrip", html_strip);
}

type Built = Result<Arc<dyn CharFilterFactory>, ConfigurationError>;

// ---------------------------------------------------------------------------
// mapping
// ---------------------------------------------------------------------------

struct MappingTable {
    map: HashMap<String, String>,
    /// Longest key, in chars; bounds the lookahead
    max_len: usize,
}

pub struct MappingFactory {
    table: Arc<MappingTable>,
}

fn mapping(spec: &ComponentSpec) -> Built {
    let mut options = OptionReader::new(spec);
    let pairs = options.require_list("mappings")?;
    let mut map = HashMap::new();
    for pair in &pairs {
        let (from, to) = pair
            .split_once("=>")
            .filter(|(from, _)| !from.is_empty())
            .ok_or_else(|| options.invalid("mappings", pair, "expected from=>to"))?;
        map.insert(from.to_string(), to.to_string());
    }
    options.finish()?;

    let max_len = map.keys().map(|k| k.chars().count()).max().unwrap_or(1);
    Ok(Arc::new(MappingFactory {
        table: Arc::new(MappingTable { map, max_len }),
    }))
}

impl CharFilterFactory for MappingFactory {
    fn name(&self) -> &str {
        "mapping"
    }

    fn create(&self, input: BoxCharStream) -> BoxCharStream {
        Box::new(MappingCharFilter {
            input,
            table: Arc::clone(&self.table),
            lookahead: VecDeque::new(),
            output: VecDeque::new(),
            exhausted: false,
        })
    }
}

struct MappingCharFilter {
    input: BoxCharStream,
    table: Arc<MappingTable>,
    lookahead: VecDeque<char>,
    output: VecDeque<char>,
    exhausted: bool,
}

impl CharStream for MappingCharFilter {
    fn next_char(&mut self) -> Result<Option<char>, StreamError> {
        loop {
            if let Some(c) = self.output.pop_front() {
                return Ok(Some(c));
            }
            while !self.exhausted && self.lookahead.len() < self.table.max_len {
                match self.input.next_char()? {
                    Some(c) => self.lookahead.push_back(c),
                    None => self.exhausted = true,
                }
            }
            if self.lookahead.is_empty() {
                return Ok(None);
            }

            // Longest key wins
            let mut matched = None;
            for len in (1..=self.lookahead.len()).rev() {
                let key: String = self.lookahead.iter().take(len).collect();
                if let Some(replacement) = self.table.map.get(&key) {
                    matched = Some((len, replacement));
                    break;
                }
            }
            match matched {
                Some((len, replacement)) => {
                    self.lookahead.drain(..len);
                    self.output.extend(replacement.chars());
                }
                None => return Ok(self.lookahead.pop_front()),
            }
        }
    }
}

// ---------------------------------------------------------------------------
// patternReplace
// ---------------------------------------------------------------------------

struct Replacement {
    regex: Regex,
    replacement: String,
}

pub struct PatternReplaceFactory {
    rule: Arc<Replacement>,
}

fn pattern_replace(spec: &ComponentSpec) -> Built {
    let mut options = OptionReader::new(spec);
    let regex = options.require_regex("pattern")?;
    let replacement = options.get_or("replacement", "").to_string();
    options.finish()?;
    Ok(Arc::new(PatternReplaceFactory {
        rule: Arc::new(Replacement { regex, replacement }),
    }))
}

impl CharFilterFactory for PatternReplaceFactory {
    fn name(&self) -> &str {
        "patternReplace"
    }

    fn create(&self, input: BoxCharStream) -> BoxCharStream {
        Box::new(PatternReplaceCharFilter {
            input,
            rule: Arc::clone(&self.rule),
            line: String::new(),
            pending: VecDeque::new(),
        })
    }
}

/// Applies the pattern one line at a time; matches never span a newline.
struct PatternReplaceCharFilter {
    input: BoxCharStream,
    rule: Arc<Replacement>,
    line: String,
    pending: VecDeque<char>,
}

impl CharStream for PatternReplaceCharFilter {
    fn next_char(&mut self) -> Result<Option<char>, StreamError> {
        loop {
            if let Some(c) = self.pending.pop_front() {
                return Ok(Some(c));
            }
            self.line.clear();
            if !read_line(self.input.as_mut(), &mut self.line)? {
                return Ok(None);
            }
            // Anchors see the line without its terminator
            let content_len = self.line.trim_end_matches(['\n', '\r']).len();
            let (content, terminator) = self.line.split_at(content_len);
            let replaced = self
                .rule
                .regex
                .replace_all(content, self.rule.replacement.as_str());
            self.pending.extend(replaced.chars());
            self.pending.extend(terminator.chars());
        }
    }
}

// ---------------------------------------------------------------------------
// htmlStrip
// ---------------------------------------------------------------------------

/// Tags longer than this are passed through as text.
const MAX_TAG_LEN: usize = 1024;
const MAX_ENTITY_LEN: usize = 10;

/// Elements that separate text; stripping them leaves a line break.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "blockquote", "br", "dd", "div", "dl", "dt", "footer", "h1", "h2", "h3",
    "h4", "h5", "h6", "header", "hr", "li", "ol", "p", "pre", "section", "table", "td", "th", "tr",
    "ul",
];

pub struct HtmlStripFactory;

fn html_strip(spec: &ComponentSpec) -> Built {
    OptionReader::new(spec).finish()?;
    Ok(Arc::new(HtmlStripFactory))
}

impl CharFilterFactory for HtmlStripFactory {
    fn name(&self) -> &str {
        "htmlStrip"
    }

    fn create(&self, input: BoxCharStream) -> BoxCharStream {
        Box::new(HtmlStripCharFilter {
            input,
            rescan: VecDeque::new(),
            pending: VecDeque::new(),
        })
    }
}

struct HtmlStripCharFilter {
    input: BoxCharStream,
    /// Chars read ahead that turned out not to belong to a tag or entity.
    /// They are interpreted again before any new input is read.
    rescan: VecDeque<char>,
    pending: VecDeque<char>,
}

impl HtmlStripCharFilter {
    fn next_raw(&mut self) -> Result<Option<char>, StreamError> {
        match self.rescan.pop_front() {
            Some(c) => Ok(Some(c)),
            None => self.input.next_char(),
        }
    }

    /// Put `chars` back in front of whatever is still queued for rescanning.
    fn unread(&mut self, chars: impl DoubleEndedIterator<Item = char>) {
        for c in chars.rev() {
            self.rescan.push_front(c);
        }
    }

    /// Called after a `<`. Markup is dropped; anything else keeps the `<`
    /// and is scanned again from the following char.
    fn strip_tag(&mut self) -> Result<(), StreamError> {
        let mut tag = String::new();
        loop {
            match self.next_raw()? {
                Some('>') => break,
                Some(c) if tag.len() < MAX_TAG_LEN => tag.push(c),
                other => {
                    // Unterminated or oversized
                    self.pending.push_back('<');
                    self.unread(tag.chars().chain(other));
                    return Ok(());
                }
            }
        }

        let starts_tag = tag
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || matches!(c, '/' | '!' | '?'));
        if !starts_tag {
            self.pending.push_back('<');
            self.unread(tag.chars().chain(Some('>')));
            return Ok(());
        }

        let element: String = tag
            .trim_start_matches('/')
            .chars()
            .take_while(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_lowercase();
        if BLOCK_ELEMENTS.contains(&element.as_str()) {
            self.pending.push_back('\n');
        }
        Ok(())
    }

    fn decode_entity(&mut self) -> Result<(), StreamError> {
        let mut name = String::new();
        loop {
            match self.next_raw()? {
                Some(';') => {
                    match decode_entity(&name) {
                        Some(c) => self.pending.push_back(c),
                        None => {
                            self.pending.push_back('&');
                            self.pending.extend(name.chars());
                            self.pending.push_back(';');
                        }
                    }
                    return Ok(());
                }
                Some(c) if (c.is_ascii_alphanumeric() || c == '#') && name.len() < MAX_ENTITY_LEN => {
                    name.push(c)
                }
                other => {
                    self.pending.push_back('&');
                    self.pending.extend(name.chars());
                    self.unread(other.into_iter());
                    return Ok(());
                }
            }
        }
    }
}

impl CharStream for HtmlStripCharFilter {
    fn next_char(&mut self) -> Result<Option<char>, StreamError> {
        loop {
            if let Some(c) = self.pending.pop_front() {
                return Ok(Some(c));
            }
            match self.next_raw()? {
                None => return Ok(None),
                Some('<') => self.strip_tag()?,
                Some('&') => self.decode_entity()?,
                Some(c) => return Ok(Some(c)),
            }
        }
    }
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}
