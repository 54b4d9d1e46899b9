use std::io::{self, SeekFrom};

use bytes::{Bytes, BytesMut};
use mime_guess::mime::Mime;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use common::prelude::UploadBody;

use super::sniff::{sniff, SNIFF_LEN};
use crate::config::UploadLimits;

#[derive(Debug, thiserror::Error)]
pub enum SpoolError {
    #[error("file exceeds {0} bytes")]
    TooLarge(u64),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Collects one multipart file in memory, moving it to an
///  anonymous temp file once it outgrows the memory buffer.
pub struct Spooler {
    max_bytes: u64,
    memory_limit: usize,
    len: u64,
    buffer: BytesMut,
    disk: Option<File>,
}

impl Spooler {
    pub fn new(limits: &UploadLimits) -> Self {
        Self {
            max_bytes: limits.max_file_bytes,
            memory_limit: limits.memory_buffer_bytes,
            len: 0,
            buffer: BytesMut::new(),
            disk: None,
        }
    }

    /// Append a chunk. Fails as soon as the file crosses the size ceiling.
    pub async fn push(&mut self, chunk: &[u8]) -> Result<(), SpoolError> {
        self.len += chunk.len() as u64;
        if self.len > self.max_bytes {
            return Err(SpoolError::TooLarge(self.max_bytes));
        }

        if let Some(file) = self.disk.as_mut() {
            file.write_all(chunk).await?;
            return Ok(());
        }

        if self.buffer.len() + chunk.len() > self.memory_limit {
            tracing::debug!(bytes = self.len, "spilling upload to temporary file");
            let mut file = temp_file().await?;
            file.write_all(&self.buffer).await?;
            file.write_all(chunk).await?;
            self.buffer = BytesMut::new();
            self.disk = Some(file);
        } else {
            self.buffer.extend_from_slice(chunk);
        }
        Ok(())
    }

    pub async fn finish(self) -> io::Result<SpooledFile> {
        match self.disk {
            Some(mut file) => {
                file.flush().await?;
                file.seek(SeekFrom::Start(0)).await?;
                Ok(SpooledFile::Disk {
                    file,
                    len: self.len,
                })
            }
            None => Ok(SpooledFile::Memory(self.buffer.freeze())),
        }
    }
}

async fn temp_file() -> io::Result<File> {
    let std_file = tokio::task::spawn_blocking(tempfile::tempfile)
        .await
        .map_err(io::Error::other)??;
    Ok(File::from_std(std_file))
}

/// A fully received file, positioned at its first byte
#[derive(Debug)]
pub enum SpooledFile {
    Memory(Bytes),
    Disk { file: File, len: u64 },
}

impl SpooledFile {
    pub fn len(&self) -> u64 {
        match self {
            SpooledFile::Memory(bytes) => bytes.len() as u64,
            SpooledFile::Disk { len, .. } => *len,
        }
    }

    pub fn is_on_disk(&self) -> bool {
        matches!(self, SpooledFile::Disk { .. })
    }

    /// Sniff the content type from the file's prefix.
    ///  Leaves the file rewound to its first byte.
    pub async fn sniff(&mut self) -> io::Result<Option<Mime>> {
        match self {
            SpooledFile::Memory(bytes) => Ok(sniff(bytes)),
            SpooledFile::Disk { file, .. } => {
                let mut prefix = Vec::with_capacity(SNIFF_LEN);
                file.seek(SeekFrom::Start(0)).await?;
                (&mut *file)
                    .take(SNIFF_LEN as u64)
                    .read_to_end(&mut prefix)
                    .await?;
                file.seek(SeekFrom::Start(0)).await?;
                Ok(sniff(&prefix))
            }
        }
    }

    pub fn into_upload_body(self) -> UploadBody {
        match self {
            SpooledFile::Memory(bytes) => UploadBody::from_bytes(bytes),
            SpooledFile::Disk { file, len } => UploadBody::from_reader(file, len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_file_bytes: u64, memory_buffer_bytes: usize) -> UploadLimits {
        UploadLimits {
            max_file_bytes,
            memory_buffer_bytes,
            ..UploadLimits::default()
        }
    }

    fn png_bytes(len: usize) -> Vec<u8> {
        let mut data = b"\x89PNG\r\n\x1a\n".to_vec();
        data.extend((0..len - data.len()).map(|i| (i % 253) as u8));
        data
    }

    async fn read_back(file: SpooledFile) -> Vec<u8> {
        match file {
            SpooledFile::Memory(bytes) => bytes.to_vec(),
            SpooledFile::Disk { mut file, .. } => {
                let mut out = Vec::new();
                file.read_to_end(&mut out).await.unwrap();
                out
            }
        }
    }

    #[tokio::test]
    async fn test_small_file_stays_in_memory() {
        let data = png_bytes(1024);
        let mut spooler = Spooler::new(&limits(10_000, 4096));
        spooler.push(&data[..500]).await.unwrap();
        spooler.push(&data[500..]).await.unwrap();

        let mut file = spooler.finish().await.unwrap();
        assert!(!file.is_on_disk());
        assert_eq!(file.len(), 1024);
        assert_eq!(file.sniff().await.unwrap(), Some(mime_guess::mime::IMAGE_PNG));
        assert_eq!(read_back(file).await, data);
    }

    #[tokio::test]
    async fn test_large_file_spills_to_disk_and_rewinds() {
        let data = png_bytes(20_000);
        let mut spooler = Spooler::new(&limits(100_000, 4096));
        for chunk in data.chunks(3000) {
            spooler.push(chunk).await.unwrap();
        }

        let mut file = spooler.finish().await.unwrap();
        assert!(file.is_on_disk());
        assert_eq!(file.len(), 20_000);
        assert_eq!(file.sniff().await.unwrap(), Some(mime_guess::mime::IMAGE_PNG));
        // sniffing must not consume any of the upload
        assert_eq!(read_back(file).await, data);
    }

    #[tokio::test]
    async fn test_rejects_file_over_ceiling() {
        let mut spooler = Spooler::new(&limits(1000, 4096));
        spooler.push(&[0u8; 600]).await.unwrap();
        let err = spooler.push(&[0u8; 600]).await.unwrap_err();
        assert!(matches!(err, SpoolError::TooLarge(1000)));
    }

    #[tokio::test]
    async fn test_file_at_ceiling_is_accepted() {
        let mut spooler = Spooler::new(&limits(1000, 4096));
        spooler.push(&[0u8; 1000]).await.unwrap();
        assert_eq!(spooler.finish().await.unwrap().len(), 1000);
    }

    #[tokio::test]
    async fn test_empty_file_sniffs_nothing() {
        let spooler = Spooler::new(&limits(1000, 4096));
        let mut file = spooler.finish().await.unwrap();
        assert_eq!(file.len(), 0);
        assert_eq!(file.sniff().await.unwrap(), None);
    }
}
