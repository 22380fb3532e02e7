use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, trace};

use crate::TransferError;
use crate::encoding::Transcoder;

/// Ordered writer for the local destination file.
///
/// Accepts chunks strictly in offset order. Dropping the sink without
/// calling [`close`](Self::close) still releases the OS handle, but
/// buffered bytes may be lost.
#[derive(Debug)]
pub struct LocalWriteSink {
    path: PathBuf,
    file: BufWriter<File>,
    transcoder: Option<Transcoder>,
    received: u64,
    written: u64,
}

impl LocalWriteSink {
    /// Creates or truncates `path`.
    ///
    /// `mode` only takes effect when the file is created.
    pub async fn open(
        path: &Path,
        mode: Option<u32>,
        transcoder: Option<Transcoder>,
    ) -> Result<Self, TransferError> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        if let Some(mode) = mode {
            options.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;

        let file = options
            .open(path)
            .await
            .map_err(|source| TransferError::LocalOpen {
                path: path.to_path_buf(),
                source,
            })?;
        debug!(
            path = %path.display(),
            encoding = transcoder.as_ref().map_or("verbatim", Transcoder::name),
            "local file opened"
        );

        Ok(Self {
            path: path.to_path_buf(),
            file: BufWriter::new(file),
            transcoder,
            received: 0,
            written: 0,
        })
    }

    /// Appends the chunk that starts at `offset`.
    ///
    /// `offset` must equal the number of bytes received so far; any other
    /// offset is a [`TransferError::LocalWrite`] and nothing is written.
    pub async fn write(&mut self, offset: u64, bytes: &[u8]) -> Result<(), TransferError> {
        if offset != self.received {
            return Err(TransferError::LocalWrite {
                path: self.path.clone(),
                source: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!(
                        "out of order write at offset {offset}, expected {}",
                        self.received
                    ),
                ),
            });
        }

        match self.transcoder.as_mut() {
            Some(transcoder) => {
                let out = transcoder.transcode(bytes, false);
                self.write_all(&out).await?;
            }
            None => self.write_all(bytes).await?,
        }
        self.received += bytes.len() as u64;
        trace!(offset, len = bytes.len(), "chunk written");
        Ok(())
    }

    async fn write_all(&mut self, bytes: &[u8]) -> Result<(), TransferError> {
        self.file
            .write_all(bytes)
            .await
            .map_err(|source| TransferError::LocalWrite {
                path: self.path.clone(),
                source,
            })?;
        self.written += bytes.len() as u64;
        Ok(())
    }

    /// Flushes the encoder tail and all buffered bytes to disk.
    ///
    /// Returns the number of bytes written to the local file.
    pub async fn close(mut self) -> Result<u64, TransferError> {
        if let Some(mut transcoder) = self.transcoder.take() {
            let tail = transcoder.finish();
            self.write_all(&tail).await?;
        }

        let path = self.path.clone();
        let local_write = |source| TransferError::LocalWrite {
            path: path.clone(),
            source,
        };
        self.file.flush().await.map_err(local_write)?;
        self.file.get_ref().sync_all().await.map_err(local_write)?;
        Ok(self.written)
    }

    /// Bytes accepted from the remote so far.
    pub fn received(&self) -> u64 {
        self.received
    }
}
