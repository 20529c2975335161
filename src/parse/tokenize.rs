use crate::error::ShellError;

/// Split an expanded line into words using shlex (POSIX word splitting).
///
/// Malformed quoting is returned as an error rather than guessed around.
pub fn tokenize(text: &str) -> Result<Vec<String>, ShellError> {
    shlex::split(text).ok_or_else(|| ShellError::UnbalancedQuotes(text.to_string()))
}
