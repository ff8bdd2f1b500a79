//! Watermark file lifecycle.
//!
//! Generated images live in a directory shared by every run for a project.
//! Files are named `{project}-{identifier}-{token}.png`; writing a new one
//! first deletes every file starting with `{project}-`, so at most one
//! current watermark exists per project.
//!
//! Writes are atomic: bytes are staged in a hidden temp file inside the target
//! directory and renamed into place. The staging name never starts with a
//! project prefix, so concurrent cleanups cannot remove it.

pub mod directory;
pub mod error;

pub use directory::{fallback_directory, resolve_or_fallback, CacheRootResolver, DirectoryResolver};
pub use error::StorageError;

use crate::constants::{FILE_TOKEN_LENGTH, WATERMARK_FILE_EXTENSION};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Replace every character outside `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_component(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Short random hex token disambiguating repeated writes.
pub fn unique_token() -> String {
    let mut token = uuid::Uuid::new_v4().simple().to_string();
    token.truncate(FILE_TOKEN_LENGTH);
    token
}

/// Prefix shared by every file generated for `project_name`.
pub fn project_prefix(project_name: &str) -> String {
    format!("{}-", sanitize_component(project_name))
}

/// `{project}-{identifier}-{token}.png`
pub fn watermark_file_name(project_name: &str, identifier_text: &str, token: &str) -> String {
    format!(
        "{}{}-{}.{}",
        project_prefix(project_name),
        sanitize_component(identifier_text),
        token,
        WATERMARK_FILE_EXTENSION
    )
}

/// Write `image_bytes` as the project's current watermark and return its
/// absolute path. Stale files for the same project are removed first.
pub fn write(
    directory: &Path,
    project_name: &str,
    identifier_text: &str,
    image_bytes: &[u8],
) -> Result<PathBuf, StorageError> {
    let directory = absolute(directory).map_err(|source| StorageError::CreateDir {
        path: directory.to_path_buf(),
        source,
    })?;

    std::fs::create_dir_all(&directory).map_err(|source| StorageError::CreateDir {
        path: directory.clone(),
        source,
    })?;

    let removed = remove_stale(&directory, &project_prefix(project_name));

    let target = directory.join(watermark_file_name(
        project_name,
        identifier_text,
        &unique_token(),
    ));
    write_atomic(&directory, &target, image_bytes).map_err(|source| StorageError::Write {
        path: target.clone(),
        source,
    })?;

    tracing::info!(
        path = %target.display(),
        bytes = image_bytes.len(),
        stale_removed = removed,
        "Watermark file written"
    );
    Ok(target)
}

/// Delete regular files in `directory` whose name starts with `prefix`.
///
/// Best effort: failures are logged and skipped, and a file that vanished
/// in the meantime counts as removed. Returns the number of files removed.
pub fn remove_stale(directory: &Path, prefix: &str) -> usize {
    let entries = match std::fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(
                dir = %directory.display(),
                error = %e,
                "Failed to scan watermark directory for stale files"
            );
            return 0;
        }
    };

    let mut removed = 0;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let is_stale = name.to_str().map_or(false, |n| n.starts_with(prefix));
        let is_file = entry.file_type().map_or(false, |t| t.is_file());
        if !is_stale || !is_file {
            continue;
        }

        let path = entry.path();
        match std::fs::remove_file(&path) {
            Ok(()) => {
                tracing::debug!(path = %path.display(), "Removed stale watermark");
                removed += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => removed += 1,
            Err(e) => tracing::warn!(
                path = %path.display(),
                error = %e,
                "Failed to remove stale watermark"
            ),
        }
    }
    removed
}

fn write_atomic(directory: &Path, target: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut staged = tempfile::Builder::new()
        .prefix(".staging-")
        .suffix(".tmp")
        .tempfile_in(directory)?;
    staged.write_all(bytes)?;
    staged.as_file().sync_all()?;
    staged.persist(target).map_err(|e| e.error)?;
    Ok(())
}

fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
