use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ViirsError;

/// Regular files directly inside `dir` whose extension matches `ext`
/// (case-insensitive), sorted by path. A missing directory yields nothing.
pub fn find_files_with_ext(dir: &Path, ext: &str) -> Result<Vec<PathBuf>, ViirsError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(ViirsError::Filesystem(format!(
                "read dir {}: {err}",
                dir.display()
            )));
        }
    };

    let mut out = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| ViirsError::Filesystem(err.to_string()))?;
        let path = entry.path();
        if path.is_file()
            && path
                .extension()
                .and_then(|value| value.to_str())
                .map(|value| value.eq_ignore_ascii_case(ext))
                .unwrap_or(false)
        {
            out.push(path);
        }
    }
    out.sort();
    Ok(out)
}

/// Runs `write` against a temporary path next to `dest` and renames the
/// result into place. On failure the temporary file is removed and `dest`
/// is left untouched.
pub fn write_atomic<F>(dest: &Path, write: F) -> Result<(), ViirsError>
where
    F: FnOnce(&Path) -> Result<(), ViirsError>,
{
    let parent = dest
        .parent()
        .ok_or_else(|| ViirsError::Filesystem("invalid destination path".to_string()))?;
    fs::create_dir_all(parent).map_err(|err| ViirsError::Filesystem(err.to_string()))?;
    let mut builder = tempfile::Builder::new();
    builder.prefix(".viirs-fetch").suffix(".tmp");
    // Same mode as a freshly created file; the umask still applies.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o644));
    }
    let temp = builder
        .tempfile_in(parent)
        .map_err(|err| ViirsError::Filesystem(err.to_string()))?
        .into_temp_path();
    write(&temp)?;
    temp.persist(dest)
        .map_err(|err| ViirsError::Filesystem(format!("persist {}: {err}", dest.display())))?;
    Ok(())
}
