use thiserror::Error;

/// Errors surfaced by the session engine and the dispatcher.
///
/// An unknown command is not an error: it renders as an ordinary
/// `No command "<name>" found` line.
#[derive(Debug, Error)]
pub enum ShellError {
    /// The expanded line has an unterminated quote or a dangling escape.
    #[error("unbalanced quoting in: {0}")]
    UnbalancedQuotes(String),
    /// Reading the session input failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The host dropped the readable side of the session stream.
    #[error("session output closed")]
    OutputClosed,
    /// A user configuration file could not be parsed.
    #[error("config error: {0}")]
    Config(String),
}

impl From<toml::de::Error> for ShellError {
    fn from(err: toml::de::Error) -> Self {
        ShellError::Config(err.to_string())
    }
}
