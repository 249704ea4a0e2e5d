pub mod buffer_pool;
pub mod platform_specific;

// Re-exports
pub use buffer_pool::{AlignedBuffer, BufferPool};

/// Result type for I/O operations
pub type IOResult<T> = Result<T, IOError>;

/// I/O specific errors
#[derive(Debug, thiserror::Error)]
pub enum IOError {
    #[error("I/O operation failed: {0}")]
    OperationFailed(String),

    #[error("Alignment error: {0}")]
    AlignmentError(String),

    #[error("Buffer allocation failed: {0}")]
    AllocationFailed(String),

    #[error("Platform not supported: {0}")]
    PlatformNotSupported(String),

    #[error("Operation interrupted by user")]
    Interrupted,

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Anyhow error: {0}")]
    AnyhowError(#[from] anyhow::Error),
}

/// Data-sync policy applied between block writes during a wipe pass (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SyncPolicy {
    /// No explicit syncs; rely on the device being closed/dropped at the end of the run.
    Never,
    /// Force a data sync after every block write (`O_SYNC`-equivalent semantics).
    EveryBlock,
    /// Issue a data sync every `N` block writes.
    EveryNWrites(u32),
    /// Issue exactly one data sync when the pass completes.
    AtEnd,
}

impl SyncPolicy {
    /// Parses the `sync: N` configuration knob: `0` means `AtEnd`, `>=1` means every N writes.
    pub fn from_n(n: u32) -> Self {
        if n == 0 {
            SyncPolicy::AtEnd
        } else {
            SyncPolicy::EveryNWrites(n)
        }
    }

    /// Whether a sync should be issued after `writes_so_far` writes in the current pass.
    /// `pass_complete` is true on the call following the pass's final write.
    pub fn should_sync(&self, writes_so_far: u64, pass_complete: bool) -> bool {
        match self {
            SyncPolicy::Never => false,
            SyncPolicy::EveryBlock => true,
            SyncPolicy::EveryNWrites(n) => *n > 0 && writes_so_far.is_multiple_of(*n as u64),
            SyncPolicy::AtEnd => pass_complete,
        }
    }
}

/// I/O mode selected by configuration; `Auto` lets the worker fall back to `Cached`
/// when `Direct` is refused by the underlying filesystem (e.g. a loopback image).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum IOMode {
    Auto,
    Direct,
    Cached,
}

#[cfg(test)]
mod sync_policy_tests {
    use super::*;

    #[test]
    fn at_end_only_syncs_on_pass_complete() {
        let p = SyncPolicy::AtEnd;
        assert!(!p.should_sync(5, false));
        assert!(p.should_sync(5, true));
    }

    #[test]
    fn every_n_writes_syncs_on_multiples() {
        let p = SyncPolicy::EveryNWrites(4);
        assert!(!p.should_sync(3, false));
        assert!(p.should_sync(4, false));
        assert!(p.should_sync(8, false));
    }

    #[test]
    fn from_n_zero_is_at_end() {
        assert_eq!(SyncPolicy::from_n(0), SyncPolicy::AtEnd);
        assert_eq!(SyncPolicy::from_n(7), SyncPolicy::EveryNWrites(7));
    }
}
