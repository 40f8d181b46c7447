use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::RunnerError;
use crate::util::RingBytes;

#[derive(Debug)]
pub struct LineTap {
    pub line: String,
    pub stream: LineStream,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStream {
    Stdout,
    Stderr,
}

impl LineStream {
    pub fn label(&self) -> &'static str {
        match self {
            LineStream::Stdout => "stdout",
            LineStream::Stderr => "stderr",
        }
    }
}

/// Read `rd` to EOF line by line. Every byte lands in `ring`; each line,
/// without its terminator, is forwarded on `line_tx`. A final line with no
/// newline is still forwarded.
///
/// A closed receiver does not stop the pump, so the ring keeps filling.
pub fn pump_lines<R>(
    rd: R,
    ring: Arc<RingBytes>,
    line_tx: mpsc::Sender<LineTap>,
    stream: LineStream,
) -> JoinHandle<Result<u64, RunnerError>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::with_capacity(16 * 1024, rd);
        let mut raw: Vec<u8> = Vec::with_capacity(1024);
        let mut total = 0u64;

        loop {
            raw.clear();
            let n = reader
                .read_until(b'\n', &mut raw)
                .await
                .map_err(|source| RunnerError::StreamIo {
                    stream: stream.label(),
                    source,
                })?;
            if n == 0 {
                return Ok(total);
            }
            total += n as u64;
            ring.push(&raw);

            let body = strip_terminator(&raw);
            if body.is_empty() && raw.last() != Some(&b'\n') {
                continue;
            }
            let line = String::from_utf8_lossy(body).into_owned();
            let _ = line_tx.send(LineTap { line, stream }).await;
        }
    })
}

fn strip_terminator(raw: &[u8]) -> &[u8] {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    raw.strip_suffix(b"\r").unwrap_or(raw)
}

#[cfg(test)]
mod tests {
    use tokio::io::AsyncWriteExt;

    use super::*;

    #[tokio::test]
    async fn flushes_last_line_without_newline_on_eof() {
        let (mut wr, rd) = tokio::io::duplex(1024);
        let ring = RingBytes::new(1024);
        let (tx, mut rx) = mpsc::channel::<LineTap>(8);

        let task = pump_lines(rd, ring, tx, LineStream::Stdout);

        wr.write_all(b"hello").await.unwrap();
        drop(wr);

        let tap = rx.recv().await.expect("expected one line");
        assert_eq!(tap.line, "hello");
        assert_eq!(tap.stream, LineStream::Stdout);

        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn splits_crlf_lines_and_keeps_ring_tail() {
        let (mut wr, rd) = tokio::io::duplex(1024);
        let ring = RingBytes::new(4);
        let (tx, mut rx) = mpsc::channel::<LineTap>(8);

        let task = pump_lines(rd, ring.clone(), tx, LineStream::Stderr);

        wr.write_all(b"one\r\ntwo\n").await.unwrap();
        drop(wr);

        assert_eq!(rx.recv().await.unwrap().line, "one");
        assert_eq!(rx.recv().await.unwrap().line, "two");
        assert!(rx.recv().await.is_none());

        assert_eq!(task.await.unwrap().unwrap(), 9);
        assert_eq!(ring.to_bytes(), b"two\n");
    }
}
