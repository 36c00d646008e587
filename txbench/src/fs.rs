//! Directory and file creation with explicit permission modes.
//!
//! `DirBuilder::mode` and `OpenOptions::mode` are filtered through the
//! process umask, which typically strips group-write and always strips the
//! setgid bit. Every helper here re-applies the requested mode with
//! `set_permissions` after creation so the on-disk mode is exactly the one
//! asked for.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use tempfile::TempDir;

/// Mode for benchmark working directories: `rwxrwx---` plus setgid.
pub const DEFAULT_PATH_PERM: u32 = 0o2770;

/// Mode for database files: `rw-rw----`.
pub const DEFAULT_FILE_PERM: u32 = 0o660;

/// Creates `path` (and missing parents) and sets its mode to `mode`.
pub fn create_dir_with_mode(path: &Path, mode: u32) -> io::Result<()> {
    std::fs::create_dir_all(path)?;
    set_mode(path, mode)
}

/// Opens `path` read-write, creating it when absent, and sets its mode.
///
/// Existing content is never truncated.
pub fn create_file_with_mode(path: &Path, mode: u32) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true).truncate(false);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    let file = options.open(path)?;
    set_mode(path, mode)?;
    Ok(file)
}

/// Creates a uniquely named directory below `base` with the given mode.
///
/// `base` is created first if it is missing. The returned `TempDir` removes
/// the directory when dropped unless the caller keeps it.
pub fn create_temp_dir(base: &Path, prefix: &str, mode: u32) -> io::Result<TempDir> {
    std::fs::create_dir_all(base)?;
    let dir = tempfile::Builder::new().prefix(prefix).tempdir_in(base)?;
    set_mode(dir.path(), mode)?;
    log::debug!("Created benchmark directory {}", dir.path().display());
    Ok(dir)
}

/// Returns the permission bits of `path` (including setuid/setgid/sticky).
#[cfg(unix)]
pub fn mode_of(path: &Path) -> io::Result<u32> {
    use std::os::unix::fs::PermissionsExt;
    Ok(std::fs::metadata(path)?.permissions().mode() & 0o7777)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
