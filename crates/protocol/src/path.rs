//! Remote path arithmetic.
//!
//! SFTP paths always use `/` regardless of either host's platform.

/// Joins `path` onto `base` the way an SFTP server resolves it.
///
/// Absolute paths restart at `/`; `.` and empty components are dropped;
/// `..` pops one component and never climbs above `/`.
pub fn join_remote(base: &str, path: &str) -> String {
    let start = if path.starts_with('/') { "" } else { base };
    let mut parts: Vec<&str> = Vec::new();
    for part in start.split('/').chain(path.split('/')) {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            name => parts.push(name),
        }
    }
    format!("/{}", parts.join("/"))
}
