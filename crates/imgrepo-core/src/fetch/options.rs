use std::time::Duration;

/// Timeouts and chunking applied to every curl handle the crate opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOptions {
    pub connect_timeout: Duration,
    /// Hard cap on one artifact transfer, so a stuck stream eventually fails.
    pub transfer_timeout: Duration,
    pub manifest_timeout: Duration,
    /// Abort if throughput stays below `low_speed_limit` bytes/sec for `low_speed_time`.
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
    /// Receive buffer size; upper bound on each chunk written and hashed.
    pub chunk_size: usize,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            transfer_timeout: Duration::from_secs(3600),
            manifest_timeout: Duration::from_secs(60),
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(60),
            chunk_size: 32 * 1024,
        }
    }
}
