use bytes::Bytes;

use crate::commands::{Builtin, BuiltinContext};
use crate::result::CommandResult;

/// Flags recognized by `echo`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoOptions {
    /// Append `\n` after the words (`-n` clears it).
    pub newline: bool,
    /// Escape interpretation requested (`-e` sets, `-E` clears). Carried
    /// through; the words are emitted verbatim either way.
    pub escapes: bool,
}

impl Default for EchoOptions {
    fn default() -> Self {
        Self {
            newline: true,
            escapes: false,
        }
    }
}

/// Pull `-n`, `-e` and `-E` out of `args`, wherever they appear.
pub fn parse_flags(args: Vec<String>) -> (EchoOptions, Vec<String>) {
    let mut opts = EchoOptions::default();
    let words = args
        .into_iter()
        .filter(|arg| match arg.as_str() {
            "-n" => {
                opts.newline = false;
                false
            }
            "-e" => {
                opts.escapes = true;
                false
            }
            "-E" => {
                opts.escapes = false;
                false
            }
            _ => true,
        })
        .collect();
    (opts, words)
}

/// The `echo` builtin: the words joined by single spaces, then a newline
/// unless `-n` was given, then the end of the stream.
pub fn echo(args: Vec<String>) -> CommandResult {
    let (opts, words) = parse_flags(args);
    let mut chunks = Vec::with_capacity(2);
    if !words.is_empty() {
        chunks.push(Bytes::from(words.join(" ")));
    }
    if opts.newline {
        chunks.push(Bytes::from_static(b"\n"));
    }
    CommandResult::from_chunks(chunks)
}

/// `echo -n`: no output, used for blank lines.
pub fn silent() -> CommandResult {
    echo(vec!["-n".into()])
}

/// Fallback for a name no builtin or resolver handled.
pub fn not_found(name: &str) -> CommandResult {
    echo(vec![format!("No command \"{name}\" found")])
}

pub struct Echo;

impl Builtin for Echo {
    fn invoke(&self, args: Vec<String>, _ctx: &BuiltinContext<'_>) -> CommandResult {
        echo(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[tokio::test]
    async fn echo_appends_newline() {
        assert_eq!(echo(args(&["a", "b"])).collect_string().await, "a b\n");
    }

    #[tokio::test]
    async fn echo_n_suppresses_newline() {
        assert_eq!(echo(args(&["-n", "a", "b"])).collect_string().await, "a b");
    }

    #[tokio::test]
    async fn echo_flag_anywhere() {
        assert_eq!(echo(args(&["a", "-n", "b"])).collect_string().await, "a b");
    }

    #[tokio::test]
    async fn echo_bare_n_is_empty() {
        assert_eq!(silent().collect_string().await, "");
    }

    #[tokio::test]
    async fn echo_no_args_is_newline() {
        assert_eq!(echo(Vec::new()).collect_string().await, "\n");
    }

    #[tokio::test]
    async fn echo_escapes_pass_through() {
        assert_eq!(
            echo(args(&["-e", "a\\tb"])).collect_string().await,
            "a\\tb\n"
        );
    }

    #[tokio::test]
    async fn not_found_message() {
        assert_eq!(
            not_found("foo").collect_string().await,
            "No command \"foo\" found\n"
        );
    }

    #[test]
    fn flags_last_wins() {
        let (opts, words) = parse_flags(args(&["-e", "x", "-E"]));
        assert!(!opts.escapes);
        assert!(opts.newline);
        assert_eq!(words, vec!["x"]);
    }

    #[test]
    fn flags_escape_retained() {
        let (opts, _) = parse_flags(args(&["-e"]));
        assert!(opts.escapes);
    }
}
