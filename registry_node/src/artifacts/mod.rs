//! Uploaded-artifact plumbing
//!
//! Every upload is spooled under the temp directory and wrapped in a
//! [`TempArtifact`] guard. Unless the request finishes with an explicit
//! [`TempArtifact::keep`], the spooled file is deleted when the guard
//! drops, so validation failures, missing transactions and adapter crashes
//! all release the file without per-path cleanup code.

use log::{debug, warn};
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

/// 50 MB cap on consent videos, matching the upload limit the product
/// has always enforced
pub const MAX_VIDEO_BYTES: usize = 50 * 1024 * 1024;
/// 5 MB cap on signature images
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("{0}")]
    Rejected(String),
    #[error("artifact io error: {0}")]
    Io(#[from] std::io::Error),
}

/// What kind of upload is being accepted; drives the content-type and
/// size checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    ConsentVideo,
    SignatureImage,
}

impl ArtifactKind {
    fn content_type_prefix(&self) -> &'static str {
        match self {
            ArtifactKind::ConsentVideo => "video/",
            ArtifactKind::SignatureImage => "image/",
        }
    }

    fn max_bytes(&self) -> usize {
        match self {
            ArtifactKind::ConsentVideo => MAX_VIDEO_BYTES,
            ArtifactKind::SignatureImage => MAX_IMAGE_BYTES,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ArtifactKind::ConsentVideo => "video",
            ArtifactKind::SignatureImage => "image",
        }
    }
}

/// A spooled upload that deletes itself on drop unless kept
#[derive(Debug)]
pub struct TempArtifact {
    path: PathBuf,
    file_name: String,
    kept: bool,
}

impl TempArtifact {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Move the artifact into the archive directory and disarm the drop
    /// cleanup. Returns the archived filename.
    pub async fn keep(mut self, archive_dir: &Path) -> Result<String, ArtifactError> {
        let dest = archive_dir.join(&self.file_name);
        tokio::fs::rename(&self.path, &dest).await?;
        self.kept = true;
        debug!("artifact archived as {}", dest.display());
        Ok(self.file_name.clone())
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if self.kept {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("failed to remove temp artifact {}: {}", self.path.display(), e);
            }
        }
    }
}

/// Spool and archive directories for uploads
pub struct ArtifactStore {
    temp_dir: PathBuf,
    archive_dir: PathBuf,
}

impl ArtifactStore {
    pub fn open(temp_dir: PathBuf, archive_dir: PathBuf) -> Result<Self, ArtifactError> {
        std::fs::create_dir_all(&temp_dir)?;
        std::fs::create_dir_all(&archive_dir)?;
        Ok(Self {
            temp_dir,
            archive_dir,
        })
    }

    pub fn archive_dir(&self) -> &Path {
        &self.archive_dir
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Validate and spool an upload; the returned guard owns the temp file
    pub async fn spool(
        &self,
        kind: ArtifactKind,
        original_name: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<TempArtifact, ArtifactError> {
        if !content_type.starts_with(kind.content_type_prefix()) {
            return Err(ArtifactError::Rejected(format!(
                "only {} files are allowed, got {}",
                kind.label(),
                content_type
            )));
        }
        if data.is_empty() {
            return Err(ArtifactError::Rejected(format!(
                "uploaded {} is empty",
                kind.label()
            )));
        }
        if data.len() > kind.max_bytes() {
            return Err(ArtifactError::Rejected(format!(
                "{} exceeds the {} byte limit",
                kind.label(),
                kind.max_bytes()
            )));
        }

        // Keep the original name for operators, prefix with a uuid so
        // concurrent uploads never collide
        let safe_name: String = original_name
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
            .collect();
        let file_name = format!("{}-{}", Uuid::new_v4(), safe_name);
        let path = self.temp_dir.join(&file_name);
        tokio::fs::write(&path, data).await?;
        debug!("spooled {} upload to {}", kind.label(), path.display());

        Ok(TempArtifact {
            path,
            file_name,
            kept: false,
        })
    }
}
