//! Upload staging directory.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use docquery_types::Settings;

use crate::error::SessionError;

/// Directory where input documents are staged before processing.
///
/// Nothing is created until [`Workspace::init`] runs.
#[derive(Debug, Clone)]
pub struct Workspace {
    upload_dir: PathBuf,
}

impl Workspace {
    /// Create the upload directory (and parents) if missing.
    pub fn init(upload_dir: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let upload_dir = upload_dir.into();
        fs::create_dir_all(&upload_dir)?;
        info!(path = ?upload_dir, "Upload directory ready");
        Ok(Self { upload_dir })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, SessionError> {
        Self::init(settings.expanded_upload_dir())
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Copy `source` into the upload directory under its own file name.
    ///
    /// Files already inside the upload directory are returned as-is.
    pub fn stage(&self, source: &Path) -> Result<PathBuf, SessionError> {
        let file_name = source.file_name().ok_or_else(|| {
            SessionError::InvalidInput(format!("{} is not a file path", source.display()))
        })?;

        let source = fs::canonicalize(source)?;
        let upload_dir = fs::canonicalize(&self.upload_dir)?;
        if source.parent() == Some(upload_dir.as_path()) {
            return Ok(source);
        }

        let target = upload_dir.join(file_name);
        fs::copy(&source, &target)?;
        debug!(from = ?source, to = ?target, "Staged document");
        Ok(target)
    }
}
