//! Stage arguments on the command line
//!
//! The chain is given as a flat argument tail:
//!
//! ```text
//! -charfilter mapping mappings=ph=>f -tokenizer whitespace -tokenfilter uppercase
//! ```
//!
//! Each stage flag is followed by the component name and any number of
//! `key=value` options, up to the next stage flag. This grammar does not fit
//! a derive-style parser, so the driver splits it off first with
//! [`split_stage_args`] and parses the rest normally.

use crate::analysis::error::ConfigurationError;
use crate::analysis::registry::ComponentRole;
use crate::analysis::spec::{ComponentSpec, PipelineSpec};

fn is_stage_flag(arg: &str) -> bool {
    ComponentRole::from_flag(arg).is_some()
}

/// Split `args` before the first stage flag.
pub fn split_stage_args(mut args: Vec<String>) -> (Vec<String>, Vec<String>) {
    let at = args
        .iter()
        .position(|arg| is_stage_flag(arg))
        .unwrap_or(args.len());
    let stages = args.split_off(at);
    (args, stages)
}

/// Parse a stage argument tail into a pipeline spec.
///
/// A missing tokenizer is not an error here; the analyzer factory reports
/// it. A second tokenizer is.
pub fn parse_stage_args<S: AsRef<str>>(args: &[S]) -> Result<PipelineSpec, ConfigurationError> {
    let mut builder = PipelineSpec::builder();
    let args: Vec<&str> = args.iter().map(|arg| arg.as_ref()).collect();
    let mut args = args.into_iter().peekable();

    while let Some(flag) = args.next() {
        let role = ComponentRole::from_flag(flag)
            .ok_or_else(|| ConfigurationError::UnexpectedArgument(flag.to_string()))?;
        let name = args
            .next_if(|arg| !is_stage_flag(arg))
            .ok_or_else(|| ConfigurationError::MissingStageName {
                flag: flag.to_string(),
            })?;

        let mut options = Vec::new();
        while let Some(option) = args.next_if(|arg| !is_stage_flag(arg)) {
            options.push(option);
        }
        let spec = ComponentSpec::from_args(name, options)?;

        builder = match role {
            ComponentRole::CharFilter => builder.char_filter(spec),
            ComponentRole::Tokenizer => builder.tokenizer(spec),
            ComponentRole::TokenFilter => builder.token_filter(spec),
        };
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_split() {
        let (head, tail) = split_stage_args(strings(&[
            "textchain", "-v", "in.txt", "-tokenizer", "whitespace",
        ]));
        assert_eq!(head, vec!["textchain", "-v", "in.txt"]);
        assert_eq!(tail, vec!["-tokenizer", "whitespace"]);

        let (head, tail) = split_stage_args(strings(&["textchain", "--list-components"]));
        assert_eq!(head.len(), 2);
        assert!(tail.is_empty());
    }

    #[test]
    fn test_parse_full_chain() {
        let spec = parse_stage_args(&[
            "-charfilter",
            "mapping",
            "mappings=ph=>f",
            "-tokenizer",
            "whitespace",
            "maxTokenLength=10",
            "-tokenfilter",
            "length",
            "min=2",
            "max=5",
            "-tokenfilter",
            "uppercase",
        ])
        .unwrap();
        assert_eq!(
            spec.to_string(),
            "mapping(mappings=ph=>f) | whitespace(maxTokenLength=10) | length(max=5, min=2) | uppercase"
        );
    }

    #[test]
    fn test_parse_without_tokenizer() {
        let spec = parse_stage_args(&["-tokenfilter", "uppercase"]).unwrap();
        assert!(spec.tokenizer().is_none());
    }

    #[rstest]
    #[case(&["whitespace"], "UnexpectedArgument")]
    #[case(&["-tokenizer"], "MissingStageName")]
    #[case(&["-tokenizer", "-tokenfilter", "uppercase"], "MissingStageName")]
    #[case(&["-tokenizer", "whitespace", "oops"], "MalformedOption")]
    #[case(&["-tokenfilter", "length", "min=1", "min=2"], "DuplicateOption")]
    #[case(&["-tokenizer", "whitespace", "-tokenizer", "keyword"], "DuplicateTokenizer")]
    fn test_parse_errors(#[case] args: &[&str], #[case] expected: &str) {
        let err = parse_stage_args(args).unwrap_err();
        assert!(
            format!("{:?}", err).starts_with(expected),
            "expected {}, got {:?}",
            expected,
            err
        );
    }
}
