//! Relative local destinations.
//!
//! Lives in its own test binary: it changes the process working
//! directory, which would leak into any test running alongside it.

use std::path::{Path, PathBuf};

use fastget_session::LocalSession;
use fastget_transfer::{TransferOptions, fast_get};
use tempfile::TempDir;

/// Restores the previous working directory on drop.
struct CwdGuard(PathBuf);

impl CwdGuard {
    fn enter(dir: &Path) -> Self {
        let previous = std::env::current_dir().unwrap();
        std::env::set_current_dir(dir).unwrap();
        Self(previous)
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        let _ = std::env::set_current_dir(&self.0);
    }
}

#[tokio::test]
async fn relative_local_paths_resolve_against_cwd() {
    let dir = TempDir::new().unwrap();
    let server = dir.path().join("server/home/alice/testServer");
    let data = dir.path().join("client/test/testData");
    std::fs::create_dir_all(&server).unwrap();
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(server.join("fastget-gzip.txt.gz"), vec![0x1f; 300_001]).unwrap();
    let session = LocalSession::new(dir.path().join("server"), "/home/alice");

    let before = std::env::current_dir().unwrap();
    {
        let _cwd = CwdGuard::enter(&dir.path().join("client"));

        fast_get(&session, "testServer/fastget-gzip.txt.gz", "./test/testData/rel-1.gz", TransferOptions::default())
            .await
            .unwrap();
        fast_get(&session, "testServer/fastget-gzip.txt.gz", "../client/test/testData/rel-2.gz", TransferOptions::default())
            .await
            .unwrap();
    }
    assert_eq!(std::env::current_dir().unwrap(), before);

    assert_eq!(std::fs::metadata(data.join("rel-1.gz")).unwrap().len(), 300_001);
    assert_eq!(std::fs::metadata(data.join("rel-2.gz")).unwrap().len(), 300_001);
}
