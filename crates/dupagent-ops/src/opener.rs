//! Opening files and folders with the system default application.

use std::path::Path;

use tracing::warn;

/// Open `path` with the host's default handler.
///
/// Returns `false` and logs the reason when the path is missing or the
/// handler cannot be launched.
pub fn open_path(path: &Path) -> bool {
    if !path.exists() {
        warn!(path = %path.display(), "cannot open missing path");
        return false;
    }
    match open::that(path) {
        Ok(()) => true,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to open with system handler");
            false
        }
    }
}

/// Open the directory containing `path`.
pub fn open_parent(path: &Path) -> bool {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => open_path(parent),
        _ => open_path(Path::new(".")),
    }
}
