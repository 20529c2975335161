//! The host-facing duplex: raw text in, serialized session output out.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::StreamExt;
use futures::stream::BoxStream;
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::io::StreamReader;

use crate::error::ShellError;
use crate::result::Chunk;
use crate::stream::{ColdStream, FlowControl};

type OutputReader = StreamReader<BoxStream<'static, io::Result<Chunk>>, Chunk>;

/// One interactive session as a single stream.
///
/// Writes are split into lines and run as commands; reads yield the
/// prompts and command output in order. Shutting down the writable side
/// ends the session once the in-flight command (if any) has drained, after
/// which reads return EOF.
pub struct ShellStream {
    input: DuplexStream,
    output: OutputReader,
    output_flow: FlowControl,
    task: Option<SessionHandle>,
}

/// The session task, detached from its stream.
///
/// Lets a host that splits the stream into halves still learn how the
/// session ended.
#[derive(Debug)]
pub struct SessionHandle {
    task: JoinHandle<Result<(), ShellError>>,
}

impl SessionHandle {
    /// Wait for the session task to stop and return the engine's result.
    ///
    /// A panic raised by a resolver hook is resumed here.
    pub async fn join(self) -> Result<(), ShellError> {
        match self.task.await {
            Ok(result) => result,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => Err(ShellError::Io(io::Error::other(err))),
        }
    }
}

impl ShellStream {
    pub(crate) fn new(
        input: DuplexStream,
        mut rx: mpsc::Receiver<Chunk>,
        task: JoinHandle<Result<(), ShellError>>,
    ) -> Self {
        let chunks = ColdStream::resume_next(futures::stream::poll_fn(move |cx| rx.poll_recv(cx)));
        let output_flow = chunks.control();
        let output = StreamReader::new(chunks.map(Ok::<Chunk, io::Error>).boxed());
        Self {
            input,
            output,
            output_flow,
            task: Some(SessionHandle { task }),
        }
    }

    /// Pause/resume handle for the readable side.
    pub fn output_control(&self) -> FlowControl {
        self.output_flow.clone()
    }

    /// Detach the session task, e.g. before `tokio::io::split`.
    ///
    /// Returns `None` once taken; [`ShellStream::finish`] then reports `Ok`.
    pub fn take_handle(&mut self) -> Option<SessionHandle> {
        self.task.take()
    }

    /// Drop both sides and wait for the session task to stop.
    ///
    /// Returns the engine's error, if it ended on one.
    pub async fn finish(self) -> Result<(), ShellError> {
        let ShellStream { task, .. } = self;
        match task {
            Some(handle) => handle.join().await,
            None => Ok(()),
        }
    }
}

impl AsyncRead for ShellStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().output).poll_read(cx, buf)
    }
}

impl AsyncWrite for ShellStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().input).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().input).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().input).poll_shutdown(cx)
    }
}
