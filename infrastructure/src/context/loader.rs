//! Local file system context loader

use council_domain::ContextDocument;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ContextLoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} is not valid UTF-8 text")]
    NotText(PathBuf),

    #[error("{0} is not a regular file")]
    NotAFile(PathBuf),
}

/// Context loader that reads from the local file system.
#[derive(Debug, Clone, Default)]
pub struct LocalContextLoader;

impl LocalContextLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load one document, named after the file name.
    ///
    /// Empty files are loaded as-is; the document renderer skips them.
    pub fn load(&self, path: &Path) -> Result<ContextDocument, ContextLoadError> {
        if !path.is_file() {
            return Err(ContextLoadError::NotAFile(path.to_path_buf()));
        }
        let content = fs::read_to_string(path).map_err(|source| match source.kind() {
            std::io::ErrorKind::InvalidData => ContextLoadError::NotText(path.to_path_buf()),
            _ => ContextLoadError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        debug!("Loaded context document {} ({} bytes)", name, content.len());
        Ok(ContextDocument::new(name, content))
    }

    /// Load several documents, stopping at the first failure
    pub fn load_all<P: AsRef<Path>>(
        &self,
        paths: &[P],
    ) -> Result<Vec<ContextDocument>, ContextLoadError> {
        paths.iter().map(|p| self.load(p.as_ref())).collect()
    }
}
