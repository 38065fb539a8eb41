//! Chunked byte streams produced by blocking packaging workers.

use std::io::{self, Read, Write};
use std::path::PathBuf;

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::warn;

use crate::plan::ArchiveEntry;

/// Chunks produced by a packaging worker, consumed as an HTTP body.
pub type ByteStream = ReceiverStream<io::Result<Vec<u8>>>;

/// Read chunk size for single-file streaming.
const CHUNK_SIZE: usize = 64 * 1024;

/// Channel depth; bounds how far packaging runs ahead of the client.
const CHANNEL_DEPTH: usize = 8;

/// `Write` adapter feeding a bounded channel. Blocking sends propagate the
/// consumer's backpressure into the packaging worker; a dropped receiver
/// turns into a broken pipe, which stops the worker.
struct ChannelWriter {
    sender: mpsc::Sender<io::Result<Vec<u8>>>,
}

impl Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.sender
            .blocking_send(Ok(buf.to_vec()))
            .map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl ChannelWriter {
    fn fail(&self, error: io::Error) {
        let _ = self.sender.blocking_send(Err(error));
    }
}

/// Stream one file from disk in fixed-size chunks.
#[must_use]
pub fn stream_file(path: PathBuf) -> ByteStream {
    let (sender, receiver) = mpsc::channel(CHANNEL_DEPTH);
    tokio::task::spawn_blocking(move || {
        let mut writer = ChannelWriter { sender };
        let mut file = match std::fs::File::open(&path) {
            Ok(file) => file,
            Err(error) => {
                writer.fail(error);
                return;
            }
        };
        let mut buffer = vec![0_u8; CHUNK_SIZE];
        loop {
            match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(read) => {
                    if writer.write_all(&buffer[..read]).is_err() {
                        break;
                    }
                }
                Err(error) => {
                    writer.fail(error);
                    break;
                }
            }
        }
    });
    ReceiverStream::new(receiver)
}

/// Stream a tar archive containing `entries`, appended sequentially in plan
/// order. Each entry finishes before the next starts, so the archive is
/// valid even if the client disconnects mid-stream.
#[must_use]
pub fn stream_archive(entries: Vec<ArchiveEntry>) -> ByteStream {
    let (sender, receiver) = mpsc::channel(CHANNEL_DEPTH);
    tokio::task::spawn_blocking(move || {
        let mut builder = tar::Builder::new(ChannelWriter { sender });
        for entry in entries {
            if let Err(error) = append_entry(&mut builder, &entry) {
                warn!(source = %entry.source.display(), %error, "archive entry failed");
                if let Ok(writer) = builder.into_inner() {
                    writer.fail(error);
                }
                return;
            }
        }
        if let Err(error) = builder.finish() {
            warn!(%error, "archive finish failed");
        }
    });
    ReceiverStream::new(receiver)
}

fn append_entry(builder: &mut tar::Builder<ChannelWriter>, entry: &ArchiveEntry) -> io::Result<()> {
    let mut file = std::fs::File::open(&entry.source)?;
    builder.append_file(&entry.entry_name, &mut file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_stream::StreamExt;

    async fn collect(mut stream: ByteStream) -> io::Result<Vec<u8>> {
        let mut bytes = Vec::new();
        while let Some(chunk) = stream.next().await {
            bytes.extend(chunk?);
        }
        Ok(bytes)
    }

    #[tokio::test]
    async fn single_file_streams_verbatim() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("intro.mkv");
        std::fs::write(&path, b"payload bytes")?;

        let bytes = collect(stream_file(path)).await?;
        assert_eq!(bytes, b"payload bytes");
        Ok(())
    }

    #[tokio::test]
    async fn missing_file_surfaces_an_in_stream_error() {
        let stream = stream_file(PathBuf::from("/nonexistent/intro.mkv"));
        let result = collect(stream).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn archive_contains_entries_in_plan_order() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("intro.mkv"), b"first")?;
        std::fs::create_dir(dir.path().join("extras"))?;
        std::fs::write(dir.path().join("extras/bonus.mkv"), b"second")?;

        let entries = vec![
            ArchiveEntry {
                source: dir.path().join("intro.mkv"),
                entry_name: "intro.mkv".into(),
            },
            ArchiveEntry {
                source: dir.path().join("extras/bonus.mkv"),
                entry_name: "extras/bonus.mkv".into(),
            },
        ];
        let bytes = collect(stream_archive(entries)).await?;

        let mut archive = tar::Archive::new(bytes.as_slice());
        let mut seen = Vec::new();
        for entry in archive.entries()? {
            let mut entry = entry?;
            let name = entry.path()?.to_string_lossy().into_owned();
            let mut content = Vec::new();
            entry.read_to_end(&mut content)?;
            seen.push((name, content));
        }
        assert_eq!(
            seen,
            vec![
                ("intro.mkv".to_string(), b"first".to_vec()),
                ("extras/bonus.mkv".to_string(), b"second".to_vec()),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn archive_with_a_missing_entry_fails_in_stream() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("intro.mkv"), b"first")?;

        let entries = vec![
            ArchiveEntry {
                source: dir.path().join("intro.mkv"),
                entry_name: "intro.mkv".into(),
            },
            ArchiveEntry {
                source: dir.path().join("ghost.mkv"),
                entry_name: "ghost.mkv".into(),
            },
        ];
        let result = collect(stream_archive(entries)).await;
        assert!(result.is_err());
        Ok(())
    }
}
