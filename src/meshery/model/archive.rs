use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;
use tracing::{debug, info, instrument, warn};
use walkdir::WalkDir;

use crate::meshery::model::error::{ImportError, Result};

/// File name suffix used for archived directories.
pub const ARCHIVE_SUFFIX: &str = ".tar.gz";

/// Permission bits written for every archived file.
const ENTRY_MODE: u32 = 0o644;

/// A single file inside the archive, keyed by its POSIX-style path relative to
/// the parent of the archived directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub path: String,
    pub contents: Vec<u8>,
}

/// How the payload bytes were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// Raw bytes of a single file, sent as-is.
    File,
    /// Gzip-compressed tar stream of a directory tree.
    Archive,
}

/// Bytes and file name submitted to the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPayload {
    pub file_name: String,
    pub data: Vec<u8>,
    pub kind: PayloadKind,
}

impl ModelPayload {
    /// Prepares the payload for `path`.
    ///
    /// Directories are archived and named `<dirname>.tar.gz`; any other path
    /// is read verbatim and keeps its base name.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = fs::metadata(path).map_err(|source| ImportError::PathAccess {
            path: path.to_path_buf(),
            source,
        })?;

        if metadata.is_dir() {
            let root = resolve_directory(path)?;
            let data = build_archive(&root)?;
            Ok(Self {
                file_name: format!("{}{ARCHIVE_SUFFIX}", base_name(&root)),
                data,
                kind: PayloadKind::Archive,
            })
        } else {
            let data = read_file(path)?;
            debug!(size = data.len(), "read model file");
            Ok(Self {
                file_name: base_name(path),
                data,
                kind: PayloadKind::File,
            })
        }
    }
}

/// Walks `dir` and returns its gzip-compressed tar stream.
#[instrument(level = "debug", skip_all, fields(dir = %dir.display()))]
pub fn build_archive(dir: &Path) -> Result<Vec<u8>> {
    let entries = collect_entries(dir)?;
    let container = write_container(&entries)?;
    let compressed = compress(&container)?;
    info!(
        files = entries.len(),
        container_size = container.len(),
        compressed_size = compressed.len(),
        "archived model directory"
    );
    Ok(compressed)
}

/// Reads every regular file under `dir`, in file-name order.
///
/// Paths are relative to the parent of `dir`, so the directory's own name is
/// the first segment of each entry. Links to files are archived with the
/// target's contents under the link's path. Any unreadable file aborts the
/// walk.
pub fn collect_entries(dir: &Path) -> Result<Vec<ArchiveEntry>> {
    let base = dir.parent().ok_or_else(|| ImportError::PathResolution {
        path: dir.to_path_buf(),
        reason: "directory has no parent".into(),
    })?;

    let mut entries = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(dir).to_path_buf();
            ImportError::FileAccess {
                path,
                source: err.into(),
            }
        })?;

        let file_type = entry.file_type();
        if file_type.is_symlink() {
            let target = fs::metadata(entry.path()).map_err(|source| ImportError::FileAccess {
                path: entry.path().to_path_buf(),
                source,
            })?;
            if !target.is_file() {
                warn!(path = %entry.path().display(), "skipping link that is not a regular file");
                continue;
            }
        } else if !file_type.is_file() {
            continue;
        }

        let contents = read_file(entry.path())?;
        let path = archive_path(base, entry.path())?;
        debug!(%path, size = contents.len(), "collected archive entry");
        entries.push(ArchiveEntry { path, contents });
    }

    Ok(entries)
}

/// Writes the entries into an uncompressed tar container, in order.
pub fn write_container(entries: &[ArchiveEntry]) -> Result<Vec<u8>> {
    let mut builder = tar::Builder::new(Vec::new());

    for entry in entries {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_size(entry.contents.len() as u64);
        header.set_mode(ENTRY_MODE);
        header.set_mtime(0);
        builder
            .append_data(&mut header, &entry.path, entry.contents.as_slice())
            .map_err(ImportError::Archive)?;
    }

    builder.into_inner().map_err(ImportError::Archive)
}

/// Gzip-compresses a finished container.
pub fn compress(container: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(container).map_err(ImportError::Archive)?;
    encoder.finish().map_err(ImportError::Archive)
}

/// Absolute form of `dir` that keeps its final segment as given. Only the
/// parent is canonicalized, so a linked directory keeps the link's name.
fn resolve_directory(dir: &Path) -> Result<PathBuf> {
    let to_error = |source: std::io::Error| ImportError::PathAccess {
        path: dir.to_path_buf(),
        source,
    };

    match (dir.parent(), dir.file_name()) {
        (Some(parent), Some(name)) => {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            Ok(fs::canonicalize(parent).map_err(to_error)?.join(name))
        }
        // `.`, `..` and `/` name no segment of their own.
        _ => fs::canonicalize(dir).map_err(to_error),
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    let to_error = |source: std::io::Error| ImportError::FileAccess {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(to_error)?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents).map_err(to_error)?;
    Ok(contents)
}

fn archive_path(base: &Path, path: &Path) -> Result<String> {
    let resolution_error = |reason: String| ImportError::PathResolution {
        path: path.to_path_buf(),
        reason,
    };

    let relative = path
        .strip_prefix(base)
        .map_err(|err| resolution_error(err.to_string()))?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => {
                let segment = segment
                    .to_str()
                    .ok_or_else(|| resolution_error("path is not valid UTF-8".into()))?;
                segments.push(segment);
            }
            other => {
                return Err(resolution_error(format!(
                    "unexpected path component {other:?}"
                )));
            }
        }
    }

    Ok(segments.join("/"))
}

fn base_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
