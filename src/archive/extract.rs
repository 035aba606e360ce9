//! Archive unpacking and tree listing
//!
//! These run on blocking threads: `zip` and `std::fs` are synchronous.

use crate::archive::ArchiveError;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Unpacks a zip archive into `dest`
///
/// Entries whose names would escape `dest` are rejected by `zip` itself.
pub fn extract_zip(archive: &Path, dest: &Path) -> Result<(), ArchiveError> {
    let file = File::open(archive).map_err(|e| {
        ArchiveError::Extraction(format!("cannot open {}: {}", archive.display(), e))
    })?;

    let mut zip = zip::ZipArchive::new(file)
        .map_err(|e| ArchiveError::Extraction(format!("{}: {}", archive.display(), e)))?;

    tracing::debug!(
        "Extracting {} entries from {} into {}",
        zip.len(),
        archive.display(),
        dest.display()
    );

    zip.extract(dest)
        .map_err(|e| ArchiveError::Extraction(format!("{}: {}", archive.display(), e)))
}

/// Lists regular files under `root`, relative to it, in sorted order
///
/// Symlinks are not followed and not listed.
pub fn list_files(root: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk(root, Path::new(""), &mut files)?;
    files.sort();
    Ok(files)
}

fn walk(dir: &Path, relative: &Path, files: &mut Vec<PathBuf>) -> io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let relative = relative.join(entry.file_name());

        if file_type.is_dir() {
            walk(&entry.path(), &relative, files)?;
        } else if file_type.is_file() {
            files.push(relative);
        }
    }
    Ok(())
}
