use std::path::{Component, Path, PathBuf};

use fastget_protocol::join_remote;

use crate::TransferError;

/// Resolves a local destination against `base` (normally the process cwd).
///
/// Rejects:
/// - Empty paths
/// - `..` components that would climb above the filesystem root
///
/// Absolute paths ignore `base`. The result is lexically normalized; no
/// filesystem access happens here.
pub fn resolve_local(path: &Path, base: &Path) -> Result<PathBuf, TransferError> {
    if path.as_os_str().is_empty() {
        return Err(TransferError::InvalidPath("empty local path".into()));
    }

    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    };

    let mut resolved = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component),
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return Err(TransferError::InvalidPath(format!(
                        "{} escapes above filesystem root",
                        path.display()
                    )));
                }
            }
            Component::Normal(name) => resolved.push(name),
        }
    }

    Ok(resolved)
}

/// Resolves a remote source against the session's home directory.
///
/// Bounds checking above `/` is left to the server, so `..` at the root
/// simply stays at the root.
pub fn resolve_remote(path: &str, home: &str) -> Result<String, TransferError> {
    if path.is_empty() {
        return Err(TransferError::InvalidPath("empty remote path".into()));
    }
    if path.contains('\0') {
        return Err(TransferError::InvalidPath(format!(
            "remote path contains NUL: {path:?}"
        )));
    }
    Ok(join_remote(home, path))
}

/// Returns `true` when `path` needs the home directory to resolve.
pub fn is_remote_relative(path: &str) -> bool {
    !path.starts_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_paths() {
        assert!(resolve_local(Path::new(""), Path::new("/tmp")).is_err());
        assert!(resolve_remote("", "/home/alice").is_err());
    }

    #[test]
    fn rejects_nul_in_remote_path() {
        assert!(resolve_remote("bad\0name", "/home/alice").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn absolute_local_ignores_base() {
        let p = resolve_local(Path::new("/var/tmp/out.bin"), Path::new("/home/alice")).unwrap();
        assert_eq!(p, PathBuf::from("/var/tmp/out.bin"));
    }

    #[cfg(unix)]
    #[test]
    fn current_dir_prefix_joins_base() {
        let p = resolve_local(Path::new("./test/testData/out.txt"), Path::new("/work/client"))
            .unwrap();
        assert_eq!(p, PathBuf::from("/work/client/test/testData/out.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn parent_dir_walks_up_from_base() {
        let p = resolve_local(
            Path::new("../ssh2-sftp-client/test/testData/out.txt"),
            Path::new("/work/ssh2-sftp-client"),
        )
        .unwrap();
        assert_eq!(p, PathBuf::from("/work/ssh2-sftp-client/test/testData/out.txt"));
    }

    #[cfg(unix)]
    #[test]
    fn parent_dir_to_root_is_allowed() {
        let p = resolve_local(Path::new("../../x"), Path::new("/a/b")).unwrap();
        assert_eq!(p, PathBuf::from("/x"));
    }

    #[cfg(unix)]
    #[test]
    fn rejects_escape_above_root() {
        let err = resolve_local(Path::new("../../../x"), Path::new("/a/b")).unwrap_err();
        assert!(err.to_string().contains("escapes above filesystem root"));
    }

    #[cfg(unix)]
    #[test]
    fn rejects_nested_escape_above_root() {
        assert!(resolve_local(Path::new("/sub/../../escape"), Path::new("/")).is_err());
    }

    #[test]
    fn remote_relative_forms_match_absolute() {
        let home = "/home/alice";
        let abs = resolve_remote("/home/alice/testServer/f.txt", home).unwrap();
        assert_eq!(resolve_remote("./testServer/f.txt", home).unwrap(), abs);
        assert_eq!(resolve_remote("testServer/f.txt", home).unwrap(), abs);
        assert_eq!(resolve_remote("../alice/testServer/f.txt", home).unwrap(), abs);
    }

    #[test]
    fn remote_parent_at_root_stays_at_root() {
        assert_eq!(resolve_remote("../../../etc/motd", "/home").unwrap(), "/etc/motd");
    }

    #[test]
    fn detects_relative_remote_paths() {
        assert!(is_remote_relative("./x"));
        assert!(is_remote_relative("x"));
        assert!(!is_remote_relative("/x"));
    }
}
