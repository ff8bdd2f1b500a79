//! Resolution of the directory that holds generated watermark files.

use super::sanitize_component;
use crate::constants::WATERMARK_DIR_NAME;
use std::io;
use std::path::PathBuf;

/// Supplies a writable, host-specific directory for generated files.
pub trait DirectoryResolver: Send + Sync {
    fn watermark_dir(&self, project_name: &str) -> io::Result<PathBuf>;
}

/// Places files under `<root>/project-identifier/<sanitized project>`, where
/// `root` is the host's per-application cache directory. Each project gets its
/// own directory, so one project's stale-file cleanup never reaches another's.
#[derive(Debug, Clone, Default)]
pub struct CacheRootResolver {
    root: Option<PathBuf>,
}

impl CacheRootResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// A resolver for hosts that expose no cache root; always fails.
    pub fn unavailable() -> Self {
        Self { root: None }
    }
}

impl DirectoryResolver for CacheRootResolver {
    fn watermark_dir(&self, project_name: &str) -> io::Result<PathBuf> {
        match &self.root {
            Some(root) => Ok(root
                .join(WATERMARK_DIR_NAME)
                .join(sanitize_component(project_name))),
            None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                "host cache directory is not available",
            )),
        }
    }
}

/// `<temp>/project-identifier/<sanitized project>`.
pub fn fallback_directory(project_name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(WATERMARK_DIR_NAME)
        .join(sanitize_component(project_name))
}

/// Ask `resolver` for a directory, falling back to the temp directory.
pub fn resolve_or_fallback(resolver: &dyn DirectoryResolver, project_name: &str) -> PathBuf {
    match resolver.watermark_dir(project_name) {
        Ok(dir) => dir,
        Err(e) => {
            let fallback = fallback_directory(project_name);
            tracing::warn!(
                error = %e,
                fallback = %fallback.display(),
                "Watermark directory unavailable; using temp directory"
            );
            fallback
        }
    }
}
