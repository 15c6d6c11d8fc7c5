//! Moving files into the freedesktop trash.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use dupagent_core::TrashError;

use crate::info::TrashInfo;
use crate::locator::{TrashKind, TrashLocator, TrashTarget};
use crate::progress::{TrashEvent, TrashFailure, TrashProgress, TrashSummary, TrashedFile};
use crate::TRASH_CHANNEL_SIZE;

/// Moves files into the trash root of their volume.
#[derive(Debug)]
pub struct TrashMover {
    locator: TrashLocator,
}

impl TrashMover {
    /// Mover that resolves trash roots with `locator`.
    pub fn new(locator: TrashLocator) -> Self {
        Self { locator }
    }

    /// Mover for the current user.
    pub fn from_env() -> Self {
        Self::new(TrashLocator::from_env())
    }

    /// The locator used to pick trash roots.
    pub fn locator(&self) -> &TrashLocator {
        &self.locator
    }

    /// Trash a single file.
    ///
    /// If the move succeeds but the sidecar cannot be written, the file stays
    /// in `files/` and [`TrashError::WriteInfo`] is returned.
    pub fn trash(&self, path: &Path) -> Result<TrashedFile, TrashError> {
        let original = std::path::absolute(path).map_err(|_| TrashError::InvalidPath {
            path: path.to_path_buf(),
        })?;
        let name = original
            .file_name()
            .ok_or_else(|| TrashError::InvalidPath {
                path: original.clone(),
            })?
            .to_os_string();

        let metadata = fs::symlink_metadata(&original).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => TrashError::NotFound {
                path: original.clone(),
            },
            _ => TrashError::Move {
                path: original.clone(),
                source,
            },
        })?;

        let target = self.locator.locate(&original)?;
        prepare(&target)?;

        let move_error = |source: io::Error| TrashError::Move {
            path: original.clone(),
            source,
        };
        let trashed_name = reserve_name(&target, &name, metadata.is_dir()).map_err(move_error)?;
        let trashed = target.files_dir.join(&trashed_name);
        if let Err(source) = move_item(&original, &trashed) {
            release_name(&trashed, metadata.is_dir());
            return Err(move_error(source));
        }

        let info_path = target.info_path_for(&trashed_name);
        TrashInfo::now(&original, target.kind)
            .write_new(&info_path)
            .map_err(|source| TrashError::WriteInfo {
                path: info_path.clone(),
                trashed: trashed.clone(),
                source,
            })?;

        debug!(
            original = %original.display(),
            trashed = %trashed.display(),
            "moved to trash"
        );
        Ok(TrashedFile {
            original,
            trashed,
            info: info_path,
            size: metadata.len(),
        })
    }

    /// Trash files one after another. A failure only affects its own file.
    pub fn trash_all<I, P>(&self, paths: I) -> TrashSummary
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut summary = TrashSummary::default();
        for path in paths {
            self.trash_one(path.as_ref(), &mut summary);
        }
        info!(moved = summary.moved_count(), failed = summary.failed_count(), "trash finished");
        summary
    }

    fn trash_one(&self, path: &Path, summary: &mut TrashSummary) {
        match self.trash(path) {
            Ok(file) => summary.moved.push(file),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "cannot move to trash");
                summary.failed.push(TrashFailure {
                    path: path.to_path_buf(),
                    message: err.to_string(),
                    moved: err.file_was_moved(),
                });
            }
        }
    }
}

/// Trash files on the blocking pool, reporting progress.
///
/// Returns a receiver that gets a [`TrashEvent::Progress`] before and after
/// each file, then a single [`TrashEvent::Complete`].
pub fn start_trash(mover: TrashMover, paths: Vec<PathBuf>) -> mpsc::Receiver<TrashEvent> {
    let (tx, rx) = mpsc::channel(TRASH_CHANNEL_SIZE);

    tokio::task::spawn_blocking(move || {
        let mut progress = TrashProgress::new(paths.len());
        let mut summary = TrashSummary::default();

        for path in paths {
            progress.current_file = Some(path.clone());
            let _ = tx.blocking_send(TrashEvent::Progress(progress.clone()));

            let failures_before = summary.failed_count();
            mover.trash_one(&path, &mut summary);
            if summary.failed_count() > failures_before {
                progress.failures += 1;
            } else if let Some(file) = summary.moved.last() {
                progress.bytes_moved += file.size;
            }
            progress.files_completed += 1;
            let _ = tx.blocking_send(TrashEvent::Progress(progress.clone()));
        }

        info!(moved = summary.moved_count(), failed = summary.failed_count(), "trash finished");
        let _ = tx.blocking_send(TrashEvent::Complete(summary));
    });

    rx
}

/// Create `files/` and `info/`, restricting volume roots to the owner.
fn prepare(target: &TrashTarget) -> Result<(), TrashError> {
    for dir in [&target.files_dir, &target.info_dir] {
        fs::create_dir_all(dir).map_err(|source| TrashError::CreateDir {
            path: dir.clone(),
            source,
        })?;
    }

    if target.kind == TrashKind::Volume {
        restrict_to_owner(&target.root)?;
    }
    Ok(())
}

#[cfg(unix)]
fn restrict_to_owner(root: &Path) -> Result<(), TrashError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(root, fs::Permissions::from_mode(0o700)).map_err(|source| {
        TrashError::Permissions {
            path: root.to_path_buf(),
            source,
        }
    })
}

#[cfg(not(unix))]
fn restrict_to_owner(_root: &Path) -> Result<(), TrashError> {
    Ok(())
}

/// First name not used by `files/` or `info/` in the target.
pub fn free_name(target: &TrashTarget, name: &OsStr) -> OsString {
    let taken = |candidate: &OsStr| {
        fs::symlink_metadata(target.files_dir.join(candidate)).is_ok()
            || fs::symlink_metadata(target.info_path_for(candidate)).is_ok()
    };

    if !taken(name) {
        return name.to_os_string();
    }
    let mut counter = 1u32;
    loop {
        let candidate = collision_name(name, counter);
        if !taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Claim a free name by creating a placeholder in `files/`.
///
/// The placeholder is an empty file, or an empty directory when trashing a
/// directory, so the later move replaces it instead of anything another
/// process put there in the meantime.
fn reserve_name(target: &TrashTarget, name: &OsStr, is_dir: bool) -> io::Result<OsString> {
    loop {
        let candidate = free_name(target, name);
        let placeholder = target.files_dir.join(&candidate);
        let created = if is_dir {
            fs::create_dir(&placeholder)
        } else {
            fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&placeholder)
                .map(drop)
        };
        match created {
            Ok(()) => return Ok(candidate),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
                debug!(name = ?candidate, "trash name taken concurrently, retrying");
            }
            Err(err) => return Err(err),
        }
    }
}

fn release_name(placeholder: &Path, is_dir: bool) {
    let _ = if is_dir {
        fs::remove_dir_all(placeholder)
    } else {
        fs::remove_file(placeholder)
    };
}

/// `name` with `.counter` inserted after the stem.
///
/// The stem ends at the first dot that is not the leading dot of a hidden
/// name: `archive.tar.gz` becomes `archive.1.tar.gz` and `.bashrc` becomes
/// `.bashrc.1`.
pub fn collision_name(name: &OsStr, counter: u32) -> OsString {
    let Some(name) = name.to_str() else {
        let mut fallback = name.to_os_string();
        fallback.push(format!(".{counter}"));
        return fallback;
    };

    let skip = usize::from(name.starts_with('.'));
    let (stem, rest) = match name[skip..].find('.') {
        Some(index) => name.split_at(skip + index),
        None => (name, ""),
    };
    OsString::from(format!("{stem}.{counter}{rest}"))
}

/// Move a file or directory, falling back to copy and delete across volumes.
///
/// `dest` may already exist as the placeholder left by [`reserve_name`].
fn move_item(source: &Path, dest: &Path) -> io::Result<()> {
    match fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(err) => {
            debug!(error = %err, "rename failed, copying instead");
            copy_then_remove(source, dest)
        }
    }
}

/// Copy `source` to `dest`, then delete `source`. The copy is removed if
/// the source cannot be deleted.
fn copy_then_remove(source: &Path, dest: &Path) -> io::Result<()> {
    let is_dir = fs::symlink_metadata(source)?.is_dir();
    if is_dir {
        copy_dir_recursive(source, dest)?;
        if let Err(err) = fs::remove_dir_all(source) {
            let _ = fs::remove_dir_all(dest);
            return Err(err);
        }
    } else {
        fs::copy(source, dest)?;
        if let Err(err) = fs::remove_file(source) {
            let _ = fs::remove_file(dest);
            return Err(err);
        }
    }
    Ok(())
}

fn copy_dir_recursive(source: &Path, dest: &Path) -> io::Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let path = entry.path();
        let dest_path = dest.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&path, &dest_path)?;
        } else {
            fs::copy(&path, &dest_path)?;
        }
    }
    Ok(())
}
