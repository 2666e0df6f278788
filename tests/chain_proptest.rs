//! Property-based tests for tokenizers and filters
//!
//! Inputs are arbitrary Unicode strings, so these also exercise incremental
//! UTF-8 decoding of the input reader.

use proptest::prelude::*;
use std::io::Cursor;
use textchain::analysis::args::parse_stage_args;
use textchain::{Analyzer, AnalyzerFactory, Token};

fn analyzer(args: &[&str]) -> Analyzer {
    let spec = parse_stage_args(args).expect("stage args to parse");
    AnalyzerFactory::with_builtins()
        .new_analyzer(&spec)
        .expect("analyzer to build")
}

fn tokens(analyzer: &Analyzer, text: &str) -> Vec<Token> {
    let mut cursor = analyzer.token_stream(Cursor::new(text.as_bytes().to_vec()));
    let mut out = Vec::new();
    while let Some(token) = cursor.advance_token().expect("valid UTF-8 to analyze") {
        out.push(token);
    }
    out
}

fn texts(tokens: &[Token]) -> Vec<String> {
    tokens.iter().map(|t| t.text.clone()).collect()
}

proptest! {
    #[test]
    fn whitespace_matches_split_whitespace(text in "\\PC*") {
        let tokens = tokens(&analyzer(&["-tokenizer", "whitespace"]), &text);
        let expected: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        prop_assert_eq!(texts(&tokens), expected);
    }

    #[test]
    fn offsets_point_back_into_the_input(text in "[a-zé ,.0-9\n]{0,60}") {
        let chars: Vec<char> = text.chars().collect();
        for args in [&["-tokenizer", "whitespace"][..], &["-tokenizer", "standard"][..]] {
            for token in tokens(&analyzer(args), &text) {
                let slice: String = chars[token.start..token.end].iter().collect();
                prop_assert_eq!(slice, token.text);
            }
        }
    }

    #[test]
    fn max_token_length_bounds_every_token(text in "\\PC*", max in 1usize..8) {
        let max_arg = format!("maxTokenLength={}", max);
        let tokens = tokens(&analyzer(&["-tokenizer", "whitespace", max_arg.as_str()]), &text);
        prop_assert!(tokens.iter().all(|t| (1..=max).contains(&t.text.chars().count())));
        let rejoined: String = tokens.iter().map(|t| t.text.as_str()).collect();
        let expected: String = text.split_whitespace().collect();
        prop_assert_eq!(rejoined, expected);
    }

    #[test]
    fn keyword_reproduces_the_input(text in "\\PC+") {
        let tokens = tokens(&analyzer(&["-tokenizer", "keyword"]), &text);
        prop_assert_eq!(texts(&tokens), vec![text]);
    }

    #[test]
    fn lowercase_is_per_token(text in "[A-Za-zÀ-ÖØ-Þ ]{0,40}") {
        let plain = tokens(&analyzer(&["-tokenizer", "whitespace"]), &text);
        let lowered = tokens(&analyzer(&["-tokenizer", "whitespace", "-tokenfilter", "lowercase"]), &text);
        let expected: Vec<String> = plain.iter().map(|t| t.text.to_lowercase()).collect();
        prop_assert_eq!(texts(&lowered), expected);
    }

    #[test]
    fn length_filter_keeps_exactly_the_tokens_in_range(
        text in "[a-z ]{0,60}",
        min in 0usize..4,
        extra in 0usize..4,
    ) {
        let max = min + extra;
        let (min_arg, max_arg) = (format!("min={}", min), format!("max={}", max));
        let plain = tokens(&analyzer(&["-tokenizer", "whitespace"]), &text);
        let kept = tokens(
            &analyzer(&["-tokenizer", "whitespace", "-tokenfilter", "length", min_arg.as_str(), max_arg.as_str()]),
            &text,
        );
        let expected: Vec<String> = plain
            .iter()
            .filter(|t| (min..=max).contains(&t.text.len()))
            .map(|t| t.text.clone())
            .collect();
        prop_assert_eq!(texts(&kept), expected);
    }

    #[test]
    fn limit_token_count_caps_the_sequence(text in "[a-z ]{0,60}", limit in 0usize..6) {
        let limit_arg = format!("maxTokenCount={}", limit);
        let total = tokens(&analyzer(&["-tokenizer", "whitespace"]), &text).len();
        let limited = tokens(
            &analyzer(&["-tokenizer", "whitespace", "-tokenfilter", "limitTokenCount", limit_arg.as_str()]),
            &text,
        );
        prop_assert_eq!(limited.len(), total.min(limit));
    }

    #[test]
    fn mapping_without_matches_is_identity(text in "[a-z \n]{0,60}") {
        let mapped = tokens(
            &analyzer(&["-charfilter", "mapping", "mappings=X=>y,YZ=>q", "-tokenizer", "keyword"]),
            &text,
        );
        let plain = tokens(&analyzer(&["-tokenizer", "keyword"]), &text);
        prop_assert_eq!(mapped, plain);
    }
}
