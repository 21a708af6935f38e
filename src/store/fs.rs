//! File-system backed store
//!
//! Descriptors are plain files directly under the root directory; recordings
//! are written beside them with a timestamp suffix.

use super::{DescriptorStore, RequestRecorder, StoreError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Store rooted at a single directory
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// `<location>.<stamp>` without going through UTF-8
fn recording_path(location: &Path, stamp: &str) -> PathBuf {
    let mut name = OsString::from(location.as_os_str());
    name.push(".");
    name.push(stamp);
    PathBuf::from(name)
}

impl DescriptorStore for FsStore {
    // Keys are validated to a single normal component before they get here,
    // so the join stays inside root.
    fn resolve(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    async fn load(&self, location: &Path) -> Result<Vec<u8>, StoreError> {
        fs::read(location)
            .await
            .map_err(|e| StoreError::from_io(location.to_path_buf(), e))
    }
}

impl RequestRecorder for FsStore {
    async fn record(
        &self,
        location: &Path,
        stamp: &str,
        dump: &[u8],
    ) -> Result<PathBuf, StoreError> {
        let path = recording_path(location, stamp);
        match fs::write(&path, dump).await {
            Ok(()) => Ok(path),
            Err(e) => Err(StoreError::from_io(path, e)),
        }
    }
}
