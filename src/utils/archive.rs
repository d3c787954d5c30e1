//! Zip packing and unpacking for dependency bundles and release packages.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{Error, Result};

/// Zip a directory's contents, with entry paths relative to the directory
/// itself (the archive root holds the directory's children, not the
/// directory).
pub fn zip_dir(src_dir: &Path, dest_zip: &Path) -> Result<()> {
    let file = File::create(dest_zip)?;
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    add_entries(&mut writer, src_dir, src_dir, options)?;

    writer.finish()?;
    Ok(())
}

fn add_entries(
    writer: &mut ZipWriter<File>,
    root: &Path,
    dir: &Path,
    options: FileOptions,
) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let name = path
            .strip_prefix(root)
            .map_err(|_| Error::Other(format!("path escapes archive root: {}", path.display())))?
            .to_string_lossy()
            .replace('\\', "/");

        if path.is_dir() {
            writer.add_directory(format!("{}/", name), options)?;
            add_entries(writer, root, &path, options)?;
        } else {
            writer.start_file(name, options)?;
            let mut source = File::open(&path)?;
            io::copy(&mut source, writer)?;
        }
    }
    Ok(())
}

/// Extract a zip archive fully into a destination directory.
pub fn unzip_to(zip_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = File::open(zip_path)?;
    let mut archive = ZipArchive::new(file)?;
    archive.extract(dest_dir)?;
    Ok(())
}
