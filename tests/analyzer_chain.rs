//! End-to-end behavior of analyzers built from pipeline specs

use rstest::rstest;
use std::io::Cursor;
use std::thread;
use textchain::analysis::args::parse_stage_args;
use textchain::analysis::output::{OutputFormat, TokenWriter};
use textchain::{
    AnalyzerFactory, ComponentRegistry, ComponentRole, ComponentSpec, ConfigurationError,
    PipelineSpec, StreamError, TokenRecord,
};

fn chain(args: &[&str]) -> PipelineSpec {
    parse_stage_args(args).expect("stage args to parse")
}

fn render(spec: &PipelineSpec, text: &str) -> String {
    let analyzer = AnalyzerFactory::with_builtins()
        .new_analyzer(spec)
        .expect("analyzer to build");
    let mut writer = TokenWriter::new(Vec::new(), OutputFormat::Tsv);
    writer
        .write_all(analyzer.token_stream(Cursor::new(text.as_bytes().to_vec())))
        .expect("analysis to succeed");
    String::from_utf8(writer.finish().unwrap()).unwrap()
}

#[test]
fn hello_world_whitespace() {
    let spec = chain(&["-tokenizer", "whitespace"]);
    assert_eq!(render(&spec, "Hello World"), "Hello\tword\nWorld\tword\n");
}

#[test]
fn hello_world_uppercase() {
    let spec = chain(&["-tokenizer", "whitespace", "-tokenfilter", "uppercase"]);
    assert_eq!(render(&spec, "Hello World"), "HELLO\tword\nWORLD\tword\n");
}

#[rstest]
#[case::whitespace(&["-tokenizer", "whitespace"])]
#[case::standard(&["-tokenizer", "standard", "-tokenfilter", "lowercase"])]
#[case::keyword(&["-charfilter", "htmlStrip", "-tokenizer", "keyword"])]
#[case::pattern(&["-tokenizer", "pattern", "pattern=,"])]
fn empty_input_gives_no_tokens(#[case] args: &[&str]) {
    assert_eq!(render(&chain(args), ""), "");
}

#[test]
fn missing_tokenizer_is_rejected() {
    let spec = chain(&["-tokenfilter", "uppercase"]);
    let err = AnalyzerFactory::with_builtins()
        .new_analyzer(&spec)
        .unwrap_err();
    assert!(matches!(err, ConfigurationError::MissingTokenizer));
}

#[rstest]
#[case(&["-tokenizer", "nope"], "unknown tokenizer 'nope'")]
#[case(&["-tokenizer", "whitespace", "size=3"], "whitespace: unknown option(s) size")]
#[case(&["-tokenizer", "pattern"], "pattern: missing required option 'pattern'")]
#[case(&["-tokenizer", "whitespace", "-tokenfilter", "truncate", "prefixLength=0"], "truncate: invalid value '0' for option 'prefixLength': must be greater than zero")]
fn unresolvable_chains_are_rejected(#[case] args: &[&str], #[case] message: &str) {
    let err = AnalyzerFactory::with_builtins()
        .new_analyzer(&chain(args))
        .unwrap_err();
    assert_eq!(err.to_string(), message);
}

#[test]
fn filters_apply_in_order() {
    // truncate then uppercase vs. a stop filter that only matches lowercase
    let stop_then_upper = chain(&[
        "-tokenizer", "whitespace",
        "-tokenfilter", "stop", "words=the",
        "-tokenfilter", "uppercase",
    ]);
    let upper_then_stop = chain(&[
        "-tokenizer", "whitespace",
        "-tokenfilter", "uppercase",
        "-tokenfilter", "stop", "words=the",
    ]);
    assert_eq!(render(&stop_then_upper, "the cat"), "CAT\tword\n");
    assert_eq!(render(&upper_then_stop, "the cat"), "THE\tword\nCAT\tword\n");
}

#[test]
fn char_filters_apply_in_order() {
    let map_then_strip = chain(&[
        "-charfilter", "mapping", "mappings=[=><,]=>>",
        "-charfilter", "htmlStrip",
        "-tokenizer", "whitespace",
    ]);
    assert_eq!(render(&map_then_strip, "[b]bold[/b] text"), "bold\tword\ntext\tword\n");
}

#[rstest]
#[case::stray_angle_before_tag(&["-charfilter", "htmlStrip"], "x < y <b>z</b>", "x < y z")]
#[case::stray_angle_before_entity(&["-charfilter", "htmlStrip"], "a < b &amp; c", "a < b & c")]
#[case::end_anchor_on_every_line(
    &["-charfilter", "patternReplace", "pattern=x$", "replacement=Y"],
    "ax\nbx\ncx",
    "aY\nbY\ncY"
)]
fn char_filters_keep_their_contract_on_plain_text(
    #[case] filter: &[&str],
    #[case] text: &str,
    #[case] expected: &str,
) {
    let mut args = filter.to_vec();
    args.extend(["-tokenizer", "keyword"]);
    let records = AnalyzerFactory::with_builtins()
        .new_analyzer(&chain(&args))
        .unwrap()
        .analyze(text)
        .unwrap();
    assert_eq!(records, vec![TokenRecord::new(expected, "word")]);
}

#[test]
fn analyzers_from_the_same_spec_agree() {
    let spec = chain(&[
        "-charfilter", "htmlStrip",
        "-tokenizer", "standard",
        "-tokenfilter", "lowercase",
        "-tokenfilter", "length", "min=2",
    ]);
    let text = "<p>The 2 quick foxes, 3.5 times</p>";
    let factory = AnalyzerFactory::with_builtins();
    let first = factory.new_analyzer(&spec).unwrap().analyze(text).unwrap();
    let second = factory.new_analyzer(&spec).unwrap().analyze(text).unwrap();
    assert_eq!(first, second);
    insta::assert_snapshot!(render(&spec, text), @r"
    the	word
    quick	word
    foxes	word
    3.5	number
    times	word
    ");
}

#[test]
fn one_analyzer_serves_many_threads() {
    let spec = chain(&["-tokenizer", "whitespace", "-tokenfilter", "uppercase"]);
    let analyzer = AnalyzerFactory::with_builtins().new_analyzer(&spec).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let analyzer = analyzer.clone();
            thread::spawn(move || analyzer.analyze(&format!("thread {}", i)).unwrap())
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(
            handle.join().unwrap(),
            vec![
                TokenRecord::new("THREAD", "word"),
                TokenRecord::new(i.to_string(), "word"),
            ]
        );
    }
}

#[test]
fn malformed_input_terminates_the_sequence() {
    let spec = chain(&["-tokenizer", "whitespace"]);
    let analyzer = AnalyzerFactory::with_builtins().new_analyzer(&spec).unwrap();
    let mut cursor = analyzer.token_stream(Cursor::new(b"ok \xFF bad".to_vec()));

    assert_eq!(
        cursor.next().unwrap().unwrap(),
        TokenRecord::new("ok", "word")
    );
    assert!(matches!(
        cursor.next(),
        Some(Err(StreamError::MalformedInput { offset: 3, .. }))
    ));
    assert!(cursor.next().is_none());
}

#[test]
fn aliases_resolve_with_preset_and_caller_options() {
    let mut registry = ComponentRegistry::with_builtins();
    registry.register_alias(
        ComponentRole::TokenFilter,
        "short",
        ComponentSpec::from_args("length", ["max=3"]).unwrap(),
    );
    let factory = AnalyzerFactory::new(registry);

    let preset = chain(&["-tokenizer", "whitespace", "-tokenfilter", "short"]);
    let tokens = factory.new_analyzer(&preset).unwrap().analyze("a bb cccc").unwrap();
    assert_eq!(tokens.len(), 2);

    let widened = chain(&["-tokenizer", "whitespace", "-tokenfilter", "short", "max=4"]);
    let tokens = factory.new_analyzer(&widened).unwrap().analyze("a bb cccc").unwrap();
    assert_eq!(tokens.len(), 3);
}

#[test]
fn pipeline_yaml_matches_stage_args() {
    let from_yaml = PipelineSpec::from_yaml_str(
        r#"
tokenizer:
  name: whitespace
  options: { maxTokenLength: 10 }
token_filters:
  - name: stop
    options: { words: "a,the", ignoreCase: true }
"#,
    )
    .unwrap();
    let from_args = chain(&[
        "-tokenizer", "whitespace", "maxTokenLength=10",
        "-tokenfilter", "stop", "words=a,the", "ignoreCase=true",
    ]);
    assert_eq!(from_yaml, from_args);
    assert_eq!(render(&from_yaml, "The end"), "end\tword\n");
}
