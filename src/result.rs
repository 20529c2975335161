//! Command results: the two shapes a command's output can take.

use std::future::Future;
use std::pin::Pin;

use bytes::Bytes;
use futures::future::BoxFuture;
use futures::{FutureExt, Stream, StreamExt};
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;

use crate::stream::{ColdStream, FlowControl};

/// One unit of command output.
pub type Chunk = Bytes;

/// A boxed, sendable stream of output chunks.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Chunk> + Send>>;

/// Input side of a [`DuplexResult`].
pub type ResultStdin = Box<dyn AsyncWrite + Send + Unpin>;

/// Output of one command invocation.
///
/// A stream result completes when its stream ends; a duplex result completes
/// when its close signal fires.
pub enum CommandResult {
    Stream(OutputStream),
    Duplex(DuplexResult),
}

impl CommandResult {
    /// A stream result yielding `chunks` in order, then ending.
    pub fn from_chunks<I, C>(chunks: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Chunk>,
    {
        let chunks: Vec<Chunk> = chunks.into_iter().map(Into::into).collect();
        Self::Stream(OutputStream::new(futures::stream::iter(chunks)))
    }

    /// A stream result with a single chunk of text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self::from_chunks([text.into()])
    }

    /// Drain the result: the stream to its end, or the duplex output to its
    /// end followed by its close signal.
    pub async fn collect_bytes(self) -> Vec<u8> {
        let mut out = Vec::new();
        match self {
            CommandResult::Stream(mut stream) => {
                while let Some(chunk) = stream.next().await {
                    out.extend_from_slice(&chunk);
                }
            }
            CommandResult::Duplex(duplex) => {
                let (mut stdout, closed) = duplex.into_output();
                while let Some(chunk) = stdout.next().await {
                    out.extend_from_slice(&chunk);
                }
                closed.await;
            }
        }
        out
    }

    pub async fn collect_string(self) -> String {
        String::from_utf8_lossy(&self.collect_bytes().await).into_owned()
    }
}

impl From<OutputStream> for CommandResult {
    fn from(stream: OutputStream) -> Self {
        CommandResult::Stream(stream)
    }
}

impl From<DuplexResult> for CommandResult {
    fn from(duplex: DuplexResult) -> Self {
        CommandResult::Duplex(duplex)
    }
}

/// A finite, non-restartable stream of output chunks that starts cold and
/// resumes on the next turn.
pub struct OutputStream {
    inner: ColdStream<ChunkStream>,
}

impl OutputStream {
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Chunk> + Send + 'static,
    {
        Self {
            inner: ColdStream::resume_next(Box::pin(stream)),
        }
    }

    /// An output stream fed by the returned sender; it ends once every
    /// sender is dropped.
    pub fn channel() -> (mpsc::UnboundedSender<Chunk>, Self) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let stream = futures::stream::poll_fn(move |cx| rx.poll_recv(cx));
        (tx, Self::new(stream))
    }

    pub fn control(&self) -> FlowControl {
        self.inner.control()
    }
}

impl Stream for OutputStream {
    type Item = Chunk;

    fn poll_next(
        self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Option<Chunk>> {
        Pin::new(&mut self.get_mut().inner).poll_next(cx)
    }
}

/// A result that behaves like an interactive process: an input side, an
/// output side, and a close signal distinct from the output's end.
pub struct DuplexResult {
    stdin: Option<ResultStdin>,
    stdout: ChunkStream,
    closed: BoxFuture<'static, ()>,
}

impl DuplexResult {
    pub fn new<S, F>(stdin: Option<ResultStdin>, stdout: S, closed: F) -> Self
    where
        S: Stream<Item = Chunk> + Send + 'static,
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            stdin,
            stdout: Box::pin(stdout),
            closed: closed.boxed(),
        }
    }

    /// Take the input side, leaving `None` behind.
    pub fn take_stdin(&mut self) -> Option<ResultStdin> {
        self.stdin.take()
    }

    /// Split into the output side and the close signal. An input side that
    /// was not taken with [`DuplexResult::take_stdin`] is dropped.
    pub fn into_output(self) -> (ChunkStream, BoxFuture<'static, ()>) {
        (self.stdout, self.closed)
    }
}
