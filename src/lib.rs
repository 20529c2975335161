//! shellpipe: an in-process interactive shell session over one duplex stream.
//!
//! Text written to a [`ShellStream`] is split into lines; each line is
//! expanded against the session environment, tokenized, and run as a
//! builtin or through host-registered resolver hooks. Reading the stream
//! yields prompts and command output strictly in order: the next line is not
//! read until the previous command's output has fully drained.
//!
//! # Architecture
//!
//! - **[`parse`]** — `$VAR` expansion (shellexpand), word splitting (shlex), invocation type.
//! - **[`dispatch`]** — Resolution precedence: builtins, resolver hooks, not-found fallback.
//! - **[`commands`]** — Builtins (`echo`, `exec`) and the optional process resolver.
//! - **[`result`]** — Command results: stream or duplex.
//! - **[`stream`]** — Cold streams that resume on the next poll turn unless held.
//! - **[`session`]** — The shell, its engine loop, and the host-facing stream.
//! - **[`config`]** — Configuration loading: embedded defaults + user overlay merge.
//! - **[`logging`]** — File logging to `~/.local/share/shellpipe/session.log`.

/// Builtin commands and the process resolver.
pub mod commands;
/// Configuration types, loading, and overlay merge logic.
pub mod config;
/// Line dispatch and the resolver hook trait.
pub mod dispatch;
/// The session environment.
pub mod env;
/// Crate error type.
pub mod error;
/// File-based logging setup.
pub mod logging;
/// Expansion and tokenization.
pub mod parse;
/// Stream and duplex command results.
pub mod result;
/// The shell, engine loop and session stream.
pub mod session;
/// Cold stream flow control.
pub mod stream;

pub use dispatch::{CommandContext, CommandResolver};
pub use env::Environment;
pub use error::ShellError;
pub use result::{CommandResult, DuplexResult, OutputStream};
pub use session::{Shell, ShellStream};

/// Dispatch a single line on a fresh default shell and collect its output.
///
/// This is the main entry point for tests and simple usage.
pub async fn run_line(line: &str) -> Result<String, ShellError> {
    let shell = Shell::new();
    Ok(shell.dispatch(line)?.collect_string().await)
}
