//! Descriptor and recording store module
//!
//! The handler only sees two capabilities: reading a descriptor by key and
//! writing a request recording next to it. The file-system backend lives in
//! [`fs`]; another backend only has to implement these traits.

mod fs;

pub use fs::FsStore;

use std::future::Future;
use std::path::{Path, PathBuf};

/// Store access failure
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{} does not exist", .location.display())]
    NotFound { location: PathBuf },

    #[error("{}: {source}", .location.display())]
    Io {
        location: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StoreError {
    /// Classify an I/O error for `location`
    pub fn from_io(location: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound { location }
        } else {
            Self::Io { location, source }
        }
    }
}

/// Read-only keyed access to response descriptors
pub trait DescriptorStore: Send + Sync {
    /// Location a key resolves to. Recordings are named after it.
    fn resolve(&self, key: &str) -> PathBuf;

    /// Read the full descriptor stored at `location`
    fn load(&self, location: &Path) -> impl Future<Output = Result<Vec<u8>, StoreError>> + Send;
}

/// Write-once sink for request recordings
pub trait RequestRecorder: Send + Sync {
    /// Persist `dump` under `<location>.<stamp>`
    fn record(
        &self,
        location: &Path,
        stamp: &str,
        dump: &[u8],
    ) -> impl Future<Output = Result<PathBuf, StoreError>> + Send;
}
