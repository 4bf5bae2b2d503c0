//! Content source abstraction for reading exported block files from a
//! directory tree or a ZIP archive.

use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::io::{Read, Seek};
use walkdir::WalkDir;

/// Trait for abstracting file I/O (filesystem vs. ZIP source).
pub trait ContentSource {
    /// Read a file at the given logical path and return its content as a string.
    fn read_to_string(&mut self, path: &Utf8Path) -> Result<String>;
    /// List all files below a directory (recursively), returning full logical paths.
    fn list_files(&mut self, root: &Utf8Path) -> Result<Vec<Utf8PathBuf>>;
    /// Filesystem location of a logical path, for sources backed by local files.
    fn local_path(&self, _path: &Utf8Path) -> Option<Utf8PathBuf> {
        None
    }
}

impl<S: ContentSource + ?Sized> ContentSource for Box<S> {
    fn read_to_string(&mut self, path: &Utf8Path) -> Result<String> {
        (**self).read_to_string(path)
    }
    fn list_files(&mut self, root: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
        (**self).list_files(root)
    }
    fn local_path(&self, path: &Utf8Path) -> Option<Utf8PathBuf> {
        (**self).local_path(path)
    }
}

/// Reads files directly from the local filesystem.
pub struct FsSource;

impl ContentSource for FsSource {
    fn read_to_string(&mut self, path: &Utf8Path) -> Result<String> {
        std::fs::read_to_string(path.as_std_path()).with_context(|| format!("Failed to read {}", path))
    }

    fn list_files(&mut self, root: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
        let mut files = Vec::new();
        for entry in WalkDir::new(root.as_std_path()).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Walk dir {}", root))?;
            if entry.file_type().is_file() {
                let p = Utf8PathBuf::from_path_buf(entry.into_path())
                    .map_err(|p| anyhow::anyhow!("Non-UTF8 path {}", p.display()))?;
                files.push(p);
            }
        }
        Ok(files)
    }

    fn local_path(&self, path: &Utf8Path) -> Option<Utf8PathBuf> {
        Some(path.to_path_buf())
    }
}

/// Reads files from a ZIP archive of exported blocks.
pub struct ZipSource<R: Read + Seek> {
    zip: zip::ZipArchive<R>,
}

impl<R: Read + Seek> ZipSource<R> {
    pub fn new(reader: R) -> Result<Self> {
        let zip = zip::ZipArchive::new(reader).context("Failed to open zip archive")?;
        Ok(Self { zip })
    }
}

fn archive_name(path: &Utf8Path) -> &str {
    path.as_str().trim_start_matches("./").trim_start_matches('/')
}

impl<R: Read + Seek> ContentSource for ZipSource<R> {
    fn read_to_string(&mut self, path: &Utf8Path) -> Result<String> {
        let name = archive_name(path);
        let mut f = self
            .zip
            .by_name(name)
            .with_context(|| format!("File {} not found in zip", name))?;
        let mut s = String::new();
        f.read_to_string(&mut s)
            .with_context(|| format!("Failed to read {} from zip", name))?;
        Ok(s)
    }

    fn list_files(&mut self, root: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
        let mut prefix = archive_name(root).to_string();
        if !prefix.is_empty() && !prefix.ends_with('/') {
            prefix.push('/');
        }
        let mut files = Vec::new();
        for i in 0..self.zip.len() {
            let name = self.zip.by_index(i)?.name().to_string();
            if name.starts_with(&prefix) && !name.ends_with('/') {
                files.push(Utf8PathBuf::from(name));
            }
        }
        files.sort();
        Ok(files)
    }
}
