use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::Path;

use tracing::debug;

use crate::error::AppError;

/// Write `data` to `path` via a temporary sibling and a rename, so a failed
/// run never leaves a half-written output. Existing files are replaced.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<(), AppError> {
    let file_name = path.file_name().ok_or_else(|| {
        AppError::validation(format!("Output path {} is not a file", path.display()))
    })?;

    // foo.json → .foo.json.tmp
    let mut tmp_name = OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(&tmp_name);

    let result = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(data)?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp_path, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(AppError::Io {
            message: format!("{}: {e}", path.display()),
        });
    }

    debug!(path = %path.display(), bytes = data.len(), "wrote output");
    Ok(())
}
