/// Tracks how much of an upload body has been handed to the transport
#[derive(Debug, Clone)]
pub struct Progress {
    filename: String,
    total: u64,
    sent: u64,
}

impl Progress {
    pub fn new(filename: impl Into<String>, total: u64) -> Self {
        Self {
            filename: filename.into(),
            total,
            sent: 0,
        }
    }

    /// Add `n` bytes and report the new position
    pub fn record(&mut self, n: usize) {
        self.sent += n as u64;
        if self.is_done() {
            tracing::debug!(filename = %self.filename, bytes = self.sent, "upload stream done");
        } else {
            tracing::debug!(
                filename = %self.filename,
                bytes = self.sent,
                total = self.total,
                "upload in progress"
            );
        }
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn is_done(&self) -> bool {
        self.sent >= self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_counts_bytes() {
        let mut progress = Progress::new("photo.png", 10);
        progress.record(4);
        assert_eq!(progress.sent(), 4);
        assert!(!progress.is_done());
        progress.record(6);
        assert_eq!(progress.sent(), 10);
        assert!(progress.is_done());
    }
}
