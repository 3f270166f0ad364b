use std::fs;
use std::io;
use std::path::Path;

use tracing::warn;
use zip::ZipArchive;

use crate::error::HarvestError;

/// Expands `zip_path` into `target_dir`, one entry at a time.
///
/// A bad entry (unreadable data, name escaping the destination) is skipped
/// with a warning and the remaining entries still extract; only a failure to
/// open the archive itself is an error.
pub fn extract_zip(zip_path: &Path, target_dir: &Path) -> Result<(), HarvestError> {
    let file = fs::File::open(zip_path)
        .map_err(|err| HarvestError::Archive(format!("open zip {}: {err}", zip_path.display())))?;
    let mut archive =
        ZipArchive::new(file).map_err(|err| HarvestError::Archive(err.to_string()))?;

    for index in 0..archive.len() {
        let mut entry = match archive.by_index(index) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(index, error = %err, "skipping unreadable archive entry");
                continue;
            }
        };
        let entry_path = match entry.enclosed_name() {
            Some(path) => target_dir.join(path),
            None => {
                warn!(
                    name = entry.name(),
                    "skipping entry that escapes the destination"
                );
                continue;
            }
        };

        if entry.is_dir() {
            if let Err(err) = fs::create_dir_all(&entry_path) {
                warn!(path = %entry_path.display(), error = %err, "skipping directory entry");
            }
            continue;
        }

        if let Err(err) = write_entry(&mut entry, &entry_path) {
            warn!(path = %entry_path.display(), error = %err, "skipping archive entry");
        }
    }
    Ok(())
}

fn write_entry<R: io::Read>(entry: &mut R, entry_path: &Path) -> io::Result<()> {
    if let Some(parent) = entry_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut outfile = fs::File::create(entry_path)?;
    io::copy(entry, &mut outfile)?;
    Ok(())
}
