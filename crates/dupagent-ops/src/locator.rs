//! Choosing the trash root for a file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use dupagent_core::TrashError;

/// Numeric user id used when the platform has none.
pub const FALLBACK_UID: u32 = 1000;

/// Which kind of trash root a target is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrashKind {
    /// `~/.local/share/Trash` for files under the home directory.
    Home,
    /// `<mount-root>/.Trash-<uid>` for files on other volumes.
    Volume,
}

/// A trash root and its two subdirectories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrashTarget {
    pub root: PathBuf,
    pub files_dir: PathBuf,
    pub info_dir: PathBuf,
    pub kind: TrashKind,
}

impl TrashTarget {
    /// Layout rooted at `root`, with `files/` and `info/` below it.
    pub fn new(root: impl Into<PathBuf>, kind: TrashKind) -> Self {
        let root = root.into();
        Self {
            files_dir: root.join("files"),
            info_dir: root.join("info"),
            root,
            kind,
        }
    }

    /// Sidecar path for a name inside `files/`.
    pub fn info_path_for(&self, name: &std::ffi::OsStr) -> PathBuf {
        let mut info_name = name.to_os_string();
        info_name.push(".trashinfo");
        self.info_dir.join(info_name)
    }
}

/// Decides whether a directory is the top of its volume.
pub trait MountProbe: Send + Sync {
    fn is_mount_point(&self, dir: &Path) -> bool;
}

/// Mount detection by comparing device ids with the parent directory.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeviceProbe;

impl MountProbe for DeviceProbe {
    #[cfg(unix)]
    fn is_mount_point(&self, dir: &Path) -> bool {
        use std::os::unix::fs::MetadataExt;

        let Ok(meta) = fs::symlink_metadata(dir) else {
            return false;
        };
        if meta.file_type().is_symlink() {
            return false;
        }
        let Ok(parent) = fs::symlink_metadata(dir.join("..")) else {
            return false;
        };
        meta.dev() != parent.dev() || meta.ino() == parent.ino()
    }

    #[cfg(not(unix))]
    fn is_mount_point(&self, dir: &Path) -> bool {
        fs::metadata(dir).is_ok() && dir.parent().is_none()
    }
}

/// Resolves the trash root for a file.
///
/// Files under the home directory go to the home trash. Anything else goes to
/// `.Trash-<uid>` at the top of the volume that holds it, found by walking up
/// from the containing directory until a mount point or the filesystem root.
pub struct TrashLocator {
    home: Option<PathBuf>,
    uid: u32,
    probe: Box<dyn MountProbe>,
}

impl TrashLocator {
    /// Locator for the given home directory and user id, probing mounts by device.
    pub fn new(home: Option<PathBuf>, uid: u32) -> Self {
        Self {
            home,
            uid,
            probe: Box::new(DeviceProbe),
        }
    }

    /// Locator for the current user.
    pub fn from_env() -> Self {
        Self::new(dirs::home_dir(), current_uid())
    }

    /// Replace the mount detection.
    pub fn with_probe(mut self, probe: impl MountProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    /// The home directory, if one is known.
    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    /// User id used in `.Trash-<uid>` names.
    pub fn uid(&self) -> u32 {
        self.uid
    }

    /// Whether `path` lies inside the home directory (component-wise).
    pub fn is_under_home(&self, path: &Path) -> bool {
        self.home.as_deref().is_some_and(|home| path.starts_with(home))
    }

    /// Trash root for an absolute path.
    pub fn locate(&self, path: &Path) -> Result<TrashTarget, TrashError> {
        if !path.is_absolute() {
            return Err(TrashError::InvalidPath {
                path: path.to_path_buf(),
            });
        }

        if let Some(home) = self.home.as_deref().filter(|home| path.starts_with(home)) {
            return Ok(TrashTarget::new(
                home.join(".local").join("share").join("Trash"),
                TrashKind::Home,
            ));
        }

        let mut dir = path.parent().ok_or_else(|| TrashError::InvalidPath {
            path: path.to_path_buf(),
        })?;
        while !self.probe.is_mount_point(dir) {
            match dir.parent() {
                Some(parent) => dir = parent,
                None => break,
            }
        }

        Ok(TrashTarget::new(
            dir.join(format!(".Trash-{}", self.uid)),
            TrashKind::Volume,
        ))
    }
}

impl fmt::Debug for TrashLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrashLocator")
            .field("home", &self.home)
            .field("uid", &self.uid)
            .finish_non_exhaustive()
    }
}

/// Numeric id of the current user.
#[cfg(unix)]
pub fn current_uid() -> u32 {
    // SAFETY: getuid has no preconditions and cannot fail.
    unsafe { libc::getuid() }
}

/// Numeric id of the current user.
#[cfg(not(unix))]
pub fn current_uid() -> u32 {
    FALLBACK_UID
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Treats a fixed set of directories as mount points.
    struct FixedMounts(Vec<PathBuf>);

    impl MountProbe for FixedMounts {
        fn is_mount_point(&self, dir: &Path) -> bool {
            self.0.iter().any(|m| m == dir)
        }
    }

    fn locator() -> TrashLocator {
        TrashLocator::new(Some(PathBuf::from("/home/user")), 1000)
            .with_probe(FixedMounts(vec![PathBuf::from("/media/usb")]))
    }

    #[test]
    fn test_home_path() {
        let target = locator().locate(Path::new("/home/user/docs/a.txt")).unwrap();
        assert_eq!(target.root, PathBuf::from("/home/user/.local/share/Trash"));
        assert_eq!(target.files_dir, PathBuf::from("/home/user/.local/share/Trash/files"));
        assert_eq!(target.info_dir, PathBuf::from("/home/user/.local/share/Trash/info"));
        assert_eq!(target.kind, TrashKind::Home);
    }

    #[test]
    fn test_home_prefix_is_component_wise() {
        let locator = locator();
        assert!(!locator.is_under_home(Path::new("/home/user2/a.txt")));
        let target = locator.locate(Path::new("/home/user2/a.txt")).unwrap();
        assert_eq!(target.kind, TrashKind::Volume);
    }

    #[test]
    fn test_external_volume() {
        let target = locator().locate(Path::new("/media/usb/photos/x.jpg")).unwrap();
        assert_eq!(target.root, PathBuf::from("/media/usb/.Trash-1000"));
        assert_eq!(target.kind, TrashKind::Volume);
    }

    #[test]
    fn test_walks_up_to_filesystem_root() {
        let locator = TrashLocator::new(None, 42).with_probe(FixedMounts(Vec::new()));
        let target = locator.locate(Path::new("/srv/data/file")).unwrap();
        assert_eq!(target.root, PathBuf::from("/.Trash-42"));
    }

    #[test]
    fn test_relative_path_is_rejected() {
        assert!(matches!(
            locator().locate(Path::new("relative/file")),
            Err(TrashError::InvalidPath { .. })
        ));
    }

    #[test]
    fn test_info_path() {
        let target = TrashTarget::new("/t", TrashKind::Home);
        assert_eq!(
            target.info_path_for(std::ffi::OsStr::new("a.1.txt")),
            PathBuf::from("/t/info/a.1.txt.trashinfo")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_device_probe_filesystem_root() {
        assert!(DeviceProbe.is_mount_point(Path::new("/")));
    }
}
