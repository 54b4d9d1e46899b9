use std::io;

use bytes::Bytes;
use futures::stream::{self, BoxStream};
use futures::{StreamExt, TryStreamExt};
use tokio::io::AsyncRead;
use tokio_util::io::ReaderStream;

use super::progress::Progress;

/// A file body of known length, ready to stream to the storage provider
pub struct UploadBody {
    len: u64,
    stream: BoxStream<'static, io::Result<Bytes>>,
}

impl UploadBody {
    pub fn from_bytes(bytes: Bytes) -> Self {
        let len = bytes.len() as u64;
        Self {
            len,
            stream: stream::once(async move { Ok(bytes) }).boxed(),
        }
    }

    /// Stream `len` bytes out of `reader`, starting at its current position
    pub fn from_reader<R>(reader: R, len: u64) -> Self
    where
        R: AsyncRead + Send + 'static,
    {
        Self {
            len,
            stream: ReaderStream::new(reader).boxed(),
        }
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub(crate) fn into_reqwest(self, filename: &str) -> reqwest::Body {
        let mut progress = Progress::new(filename, self.len);
        let stream = self
            .stream
            .inspect_ok(move |chunk| progress.record(chunk.len()));
        reqwest::Body::wrap_stream(stream)
    }
}

impl std::fmt::Debug for UploadBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadBody").field("len", &self.len).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(body: UploadBody) -> Vec<u8> {
        body.stream
            .try_fold(Vec::new(), |mut acc, chunk| async move {
                acc.extend_from_slice(&chunk);
                Ok(acc)
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_from_bytes() {
        let body = UploadBody::from_bytes(Bytes::from_static(b"hello"));
        assert_eq!(body.len(), 5);
        assert_eq!(collect(body).await, b"hello");
    }

    #[tokio::test]
    async fn test_from_reader() {
        let data = vec![7u8; 100_000];
        let body = UploadBody::from_reader(std::io::Cursor::new(data.clone()), 100_000);
        assert_eq!(body.len(), 100_000);
        assert_eq!(collect(body).await, data);
    }
}
