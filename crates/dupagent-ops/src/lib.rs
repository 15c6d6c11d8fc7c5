//! Trash relocation for dupagent.
//!
//! Files are never deleted. [`TrashMover`] moves each one into the
//! freedesktop.org trash of the volume that holds it and writes a
//! `.trashinfo` sidecar so that desktop file managers can restore it:
//!
//! - files under the home directory go to `~/.local/share/Trash`
//! - anything else goes to `<mount-root>/.Trash-<uid>`
//!
//! Inside a trash root the file lands in `files/<name>` and its metadata in
//! `info/<name>.trashinfo`. Name clashes are resolved by inserting a counter
//! after the stem (`photo.jpg`, `photo.1.jpg`, `photo.2.jpg`, ...).

mod info;
mod locator;
mod mover;
mod opener;
mod progress;

pub use info::{DATE_FORMAT, InfoParseError, TrashInfo, encode_path};
pub use locator::{
    DeviceProbe, FALLBACK_UID, MountProbe, TrashKind, TrashLocator, TrashTarget, current_uid,
};
pub use mover::{TrashMover, collision_name, free_name, start_trash};
pub use opener::{open_parent, open_path};
pub use progress::{TrashEvent, TrashFailure, TrashProgress, TrashSummary, TrashedFile};

pub use dupagent_core::TrashError;

/// Default channel buffer size for trash progress updates.
pub const TRASH_CHANNEL_SIZE: usize = 100;
