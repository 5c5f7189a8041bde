//! Resolving command names to executable paths.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Return whether `path` names a regular file that someone may execute.
fn is_executable_file(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|md| md.is_file() && md.permissions().mode() & 0o111 != 0)
}

/// Find `cmd` in the colon-separated directory list `path_var`.
/// Names containing a slash are not searched and are returned unchanged. An empty entry in the
/// list means the current directory.
pub fn path_get_path(cmd: &str, path_var: Option<&str>) -> Option<PathBuf> {
    if cmd.is_empty() {
        return None;
    }
    if cmd.contains('/') {
        return Some(PathBuf::from(cmd));
    }
    path_var?
        .split(':')
        .map(|dir| if dir.is_empty() { Path::new(".") } else { Path::new(dir) })
        .map(|dir| dir.join(cmd))
        .find(|candidate| is_executable_file(candidate))
}

/// Resolve `cmd` against the process's $PATH. Commands that cannot be resolved are returned as
/// given, so that exec() fails and the child reports them.
pub fn resolve_command(cmd: &str) -> PathBuf {
    let path_var = std::env::var("PATH").ok();
    path_get_path(cmd, path_var.as_deref()).unwrap_or_else(|| PathBuf::from(cmd))
}
