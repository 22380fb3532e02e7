use serde::{Deserialize, Serialize};

use crate::constants::{S_IFDIR, S_IFMT, S_IFREG};

/// File attributes returned by `stat`.
///
/// Every field is optional on the wire; servers only fill what they
/// know about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub atime: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtime: Option<u32>,
}

impl FileAttributes {
    /// File type bits, if permissions are known.
    fn file_type(&self) -> Option<u32> {
        self.permissions.map(|p| p & S_IFMT)
    }

    pub fn is_dir(&self) -> bool {
        self.file_type() == Some(S_IFDIR)
    }

    pub fn is_regular(&self) -> bool {
        self.file_type() == Some(S_IFREG)
    }

    /// Size in bytes, treating an unreported size as empty.
    pub fn len(&self) -> u64 {
        self.size.unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Permission bits without the file type.
    pub fn mode(&self) -> Option<u32> {
        self.permissions.map(|p| p & 0o7777)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_type_from_permissions() {
        let file = FileAttributes {
            permissions: Some(S_IFREG | 0o644),
            ..Default::default()
        };
        assert!(file.is_regular());
        assert!(!file.is_dir());
        assert_eq!(file.mode(), Some(0o644));

        let dir = FileAttributes {
            permissions: Some(S_IFDIR | 0o755),
            ..Default::default()
        };
        assert!(dir.is_dir());
        assert!(!dir.is_regular());
    }

    #[test]
    fn unknown_type_is_neither() {
        let attrs = FileAttributes {
            size: Some(10),
            ..Default::default()
        };
        assert!(!attrs.is_dir());
        assert!(!attrs.is_regular());
        assert_eq!(attrs.len(), 10);
    }

    #[test]
    fn missing_size_reads_as_empty() {
        let attrs = FileAttributes::default();
        assert_eq!(attrs.len(), 0);
        assert!(attrs.is_empty());
    }

    #[test]
    fn omits_unset_fields() {
        let attrs = FileAttributes {
            size: Some(5),
            mtime: Some(1_700_000_000),
            ..Default::default()
        };
        let json = serde_json::to_value(&attrs).unwrap();
        assert_eq!(json, serde_json::json!({"size": 5, "mtime": 1_700_000_000}));
    }
}
