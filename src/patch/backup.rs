//! One-time backup of the pristine destination font

use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupStatus {
    /// The backup was written by this call
    Created,
    /// A backup was already there and was left alone
    Existing,
}

/// Copy `source` to `backup` unless `backup` already exists.
///
/// The copy keeps the source's permissions and modification time. It is
/// staged in a temporary file and moved into place without clobbering, so a
/// backup is never overwritten and never left half written.
pub fn ensure_backup(source: &Path, backup: &Path) -> io::Result<BackupStatus> {
    if backup.exists() {
        debug!("Keeping existing backup {}", backup.display());
        return Ok(BackupStatus::Existing);
    }

    let directory = backup.parent().unwrap_or_else(|| Path::new("."));
    let mut staged = tempfile::NamedTempFile::new_in(directory)?;
    let mut original = fs::File::open(source)?;
    let copied = io::copy(&mut original, staged.as_file_mut())?;

    let metadata = original.metadata()?;
    staged.as_file().set_permissions(metadata.permissions())?;
    staged.as_file().set_modified(metadata.modified()?)?;
    staged.as_file().sync_all()?;

    match staged.persist_noclobber(backup) {
        Ok(_) => {
            debug!("Copied {copied} bytes to {}", backup.display());
            Ok(BackupStatus::Created)
        }
        Err(error) if error.error.kind() == io::ErrorKind::AlreadyExists => {
            Ok(BackupStatus::Existing)
        }
        Err(error) => Err(error.error),
    }
}
