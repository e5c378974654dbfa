//! Local filesystem adapter for the uploads store.
//!
//! Images land under `<root>/<namespace>/<uuid>.<ext>` and are referenced by
//! that relative path; the HTTP layer rewrites it into an absolute URL.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{ImageNamespace, ImageStore, ImageStoreError, validate_image_upload};

/// Filesystem-backed [`ImageStore`] rooted at the configured uploads
/// directory.
#[derive(Clone)]
pub struct LocalImageStore {
    root: PathBuf,
}

impl LocalImageStore {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// first save.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The uploads root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn io_error(err: &std::io::Error) -> ImageStoreError {
        ImageStoreError::Io {
            message: err.to_string(),
        }
    }

    /// Resolve a stored relative path, rejecting traversal outside the root.
    fn resolve(&self, relative: &str) -> Result<PathBuf, ImageStoreError> {
        let candidate = Path::new(relative);
        let escapes = candidate.components().any(|component| {
            !matches!(
                component,
                std::path::Component::Normal(_) | std::path::Component::CurDir
            )
        });
        if escapes {
            return Err(ImageStoreError::Io {
                message: format!("refusing path outside uploads root: {relative}"),
            });
        }
        Ok(self.root.join(candidate))
    }
}

#[async_trait]
impl ImageStore for LocalImageStore {
    async fn save(
        &self,
        namespace: ImageNamespace,
        filename_hint: &str,
        bytes: Vec<u8>,
    ) -> Result<String, ImageStoreError> {
        let ext = validate_image_upload(filename_hint, bytes.len())?;
        let relative = format!("{}/{}.{ext}", namespace.as_str(), Uuid::new_v4());
        let target = self.root.join(&relative);

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|err| Self::io_error(&err))?;
        }
        fs::write(&target, bytes)
            .await
            .map_err(|err| Self::io_error(&err))?;
        debug!(path = %target.display(), "stored uploaded image");
        Ok(relative)
    }

    async fn delete(&self, path: &str) -> Result<(), ImageStoreError> {
        let target = self.resolve(path)?;
        match fs::remove_file(&target).await {
            Ok(()) => Ok(()),
            // Already gone; deletion is best-effort at every call site.
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(Self::io_error(&err)),
        }
    }
}
