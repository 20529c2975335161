//! The per-session loop: read a line, dispatch it, drain its result, prompt.
//!
//! ```text
//!   (start) ─prompt─▶ AwaitingLine ─line─▶ Dispatching ─result─▶ DrainingResult
//!                          ▲                                          │
//!                          └────────────prompt, resume input──────────┘
//!   AwaitingLine ─end of input─▶ Closed
//! ```
//!
//! Input is only polled in `AwaitingLine`. While a result drains, unread input
//! stays in the writable side's buffer and the host's writes wait once it is
//! full, so at most one command is in flight and output is totally ordered.

use std::time::Duration;

use futures::StreamExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use crate::error::ShellError;
use crate::result::{Chunk, CommandResult};
use crate::session::Shell;

/// Engine state, logged on every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Starting,
    AwaitingLine,
    Dispatching,
    DrainingResult,
    Closed,
}

/// Writing end of the session's output channel.
#[derive(Debug, Clone)]
pub struct OutputSink {
    tx: mpsc::Sender<Chunk>,
}

impl OutputSink {
    pub fn new(tx: mpsc::Sender<Chunk>) -> Self {
        Self { tx }
    }

    /// Queue a chunk, waiting while the channel is full.
    pub async fn queue(&self, chunk: Chunk) -> Result<(), ShellError> {
        if chunk.is_empty() {
            return Ok(());
        }
        self.tx.send(chunk).await.map_err(|_| ShellError::OutputClosed)
    }
}

struct Engine<'a> {
    shell: &'a Shell,
    output: OutputSink,
    state: SessionState,
}

impl Engine<'_> {
    fn transition(&mut self, next: SessionState) {
        log::trace!("session: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    async fn queue_prompt(&self) -> Result<(), ShellError> {
        let prompt = self.shell.env().prompt();
        self.output.queue(Chunk::from(prompt)).await
    }

    async fn drain(&self, result: CommandResult) -> Result<(), ShellError> {
        let draining = forward(result, &self.output);
        let Some(limit) = self.shell.settings().drain_timeout else {
            return draining.await;
        };
        match tokio::time::timeout(limit, draining).await {
            Ok(done) => done,
            Err(_) => {
                log::warn!("command still running after {limit:?}; abandoning its output");
                Ok(())
            }
        }
    }
}

/// Forward a result into the output channel without ending the channel,
/// returning once the result's own completion signal has fired.
async fn forward(result: CommandResult, output: &OutputSink) -> Result<(), ShellError> {
    match result {
        CommandResult::Stream(mut stream) => {
            while let Some(chunk) = stream.next().await {
                output.queue(chunk).await?;
            }
        }
        CommandResult::Duplex(duplex) => {
            // Only the output side is wired to the session.
            let (mut stdout, closed) = duplex.into_output();
            while let Some(chunk) = stdout.next().await {
                output.queue(chunk).await?;
            }
            closed.await;
        }
    }
    Ok(())
}

/// Decode one raw input line: a trailing `\r` is dropped and invalid UTF-8
/// is replaced rather than ending the session.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Run a session over `input` until it ends, writing into `output`.
///
/// Dropping `output` on return is the channel's end signal. No prompt is
/// queued after end of input; the last drained result is always followed by
/// its prompt because input is not read until that prompt is queued.
pub async fn run<R>(shell: &Shell, input: R, output: OutputSink) -> Result<(), ShellError>
where
    R: AsyncBufRead + Unpin,
{
    let mut engine = Engine {
        shell,
        output,
        state: SessionState::Starting,
    };
    let mut lines = input.split(b'\n');

    engine.queue_prompt().await?;
    engine.transition(SessionState::AwaitingLine);

    while let Some(raw) = lines.next_segment().await? {
        engine.transition(SessionState::Dispatching);
        let result = shell.dispatch(&decode_line(&raw))?;

        engine.transition(SessionState::DrainingResult);
        engine.drain(result).await?;

        engine.queue_prompt().await?;
        engine.transition(SessionState::AwaitingLine);
    }

    engine.transition(SessionState::Closed);
    Ok(())
}

/// Settings the engine reads from its [`Shell`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Capacity, in bytes, of the writable side's buffer.
    pub input_buffer: usize,
    /// Chunks queued on the output channel before the engine waits.
    pub output_buffer: usize,
    /// Abandon a result that has not completed within this time.
    pub drain_timeout: Option<Duration>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            input_buffer: 8192,
            output_buffer: 64,
            drain_timeout: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::OutputStream;

    async fn run_lines(shell: &Shell, input: &str) -> String {
        run_bytes(shell, input.as_bytes()).await
    }

    async fn run_bytes(shell: &Shell, input: &[u8]) -> String {
        let (tx, mut rx) = mpsc::channel::<Chunk>(16);
        let collect = async move {
            let mut out = Vec::new();
            while let Some(chunk) = rx.recv().await {
                out.extend_from_slice(&chunk);
            }
            String::from_utf8(out).unwrap()
        };
        let (done, out) = tokio::join!(run(shell, input, OutputSink::new(tx)), collect);
        done.unwrap();
        out
    }

    #[tokio::test]
    async fn prompt_only_for_empty_input() {
        assert_eq!(run_lines(&Shell::new(), "").await, "$ ");
    }

    #[tokio::test]
    async fn prompt_after_each_line() {
        let out = run_lines(&Shell::new(), "echo a\necho b\n").await;
        assert_eq!(out, "$ a\n$ b\n$ ");
    }

    #[tokio::test]
    async fn crlf_and_unterminated_last_line() {
        let out = run_lines(&Shell::new(), "echo a\r\necho b").await;
        assert_eq!(out, "$ a\n$ b\n$ ");
    }

    #[tokio::test]
    async fn invalid_utf8_line_does_not_end_session() {
        let out = run_bytes(&Shell::new(), b"echo \xff\necho after\n").await;
        assert_eq!(out, "$ \u{FFFD}\n$ after\n$ ");
    }

    #[test]
    fn decode_strips_carriage_return() {
        assert_eq!(decode_line(b"echo a\r"), "echo a");
        assert_eq!(decode_line(b"a\rb"), "a\rb");
    }

    #[tokio::test]
    async fn blank_lines_advance_prompt() {
        let out = run_lines(&Shell::new(), "\n  \necho x\n").await;
        assert_eq!(out, "$ $ $ x\n$ ");
    }

    #[tokio::test]
    async fn prompt_read_each_time() {
        let mut shell = Shell::new();
        shell.on_command(|name: &str, args: &[String], ctx: &crate::dispatch::CommandContext| {
            (name == "ps1").then(|| {
                ctx.env.set("PS1", args.join(" "));
                CommandResult::from_chunks(Vec::<String>::new())
            })
        });
        let out = run_lines(&shell, "ps1 >>\necho hi\n").await;
        assert_eq!(out, "$ >>hi\n>>");
    }

    #[tokio::test]
    async fn quoting_error_ends_session() {
        let (tx, mut rx) = mpsc::channel(16);
        let shell = Shell::new();
        let err = run(&shell, &b"echo 'x\necho y\n"[..], OutputSink::new(tx))
            .await
            .unwrap_err();
        assert!(matches!(err, ShellError::UnbalancedQuotes(_)));
        assert_eq!(rx.recv().await.as_deref(), Some(&b"$ "[..]));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn drain_timeout_abandons_result() {
        let mut shell = Shell::new();
        shell.settings_mut().drain_timeout = Some(Duration::from_secs(5));
        shell.on_command(|name: &str, _: &[String], _: &crate::dispatch::CommandContext| {
            (name == "hang").then(|| {
                CommandResult::Stream(OutputStream::new(futures::stream::pending()))
            })
        });
        let out = run_lines(&shell, "hang\necho after\n").await;
        assert_eq!(out, "$ $ after\n$ ");
    }

    #[tokio::test]
    async fn closed_output_stops_engine() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let shell = Shell::new();
        let err = run(&shell, &b"echo a\n"[..], OutputSink::new(tx)).await.unwrap_err();
        assert!(matches!(err, ShellError::OutputClosed));
    }
}
