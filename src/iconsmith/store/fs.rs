use super::{ArtifactListing, ArtifactStore, SkippedEntry, sort_most_recent_first};
use crate::error::{IconError, Result};
use crate::model::{Artifact, ArtifactMetadata};
use crate::namer;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::{NamedTempFile, PersistError};

const IMAGE_EXT: &str = "png";
const METADATA_EXT: &str = "json";
const STAGING_PREFIX: &str = ".iconsmith-";

/// Points in [`FileStore::persist`] where a write can be cut short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitStep {
    StageImage,
    StageMetadata,
    PublishMetadata,
    PublishImage,
}

pub struct FileStore {
    root: PathBuf,
    #[cfg(test)]
    interrupt_at: Option<CommitStep>,
}

impl FileStore {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            #[cfg(test)]
            interrupt_at: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    #[cfg(test)]
    pub(crate) fn interrupt_at(mut self, step: CommitStep) -> Self {
        self.interrupt_at = Some(step);
        self
    }

    #[cfg(test)]
    fn checkpoint(&self, step: CommitStep) -> io::Result<()> {
        if self.interrupt_at == Some(step) {
            return Err(io::Error::other(format!("write interrupted at {step:?}")));
        }
        Ok(())
    }

    #[cfg(not(test))]
    fn checkpoint(&self, _step: CommitStep) -> io::Result<()> {
        Ok(())
    }

    fn ensure_dir(&self) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root).map_err(IconError::Io)?;
        }
        Ok(())
    }

    fn path_for(&self, base: &str, ext: &str) -> PathBuf {
        self.root.join(format!("{base}.{ext}"))
    }

    /// Write `bytes` to a hidden temp file in the output directory. The file
    /// is removed on drop unless it gets published.
    fn stage(&self, bytes: &[u8]) -> io::Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(".tmp")
            .tempfile_in(&self.root)?;
        file.write_all(bytes)?;
        file.flush()?;
        Ok(file)
    }

    /// Publish the pair under the first free name among `base`, `base-2`,
    /// `base-3`, ... and return that name.
    ///
    /// Every publish refuses to replace an existing file, so a name taken by
    /// a concurrent writer moves us on to the next suffix instead. The
    /// sidecar goes live first: listings are driven by images, so an image is
    /// never visible without its metadata.
    fn commit(&self, image: &[u8], sidecar: &str, base: &str) -> io::Result<String> {
        self.checkpoint(CommitStep::StageImage)?;
        let mut staged_image = self.stage(image)?;

        let mut attempt = 1;
        loop {
            let name = if attempt == 1 {
                base.to_string()
            } else {
                namer::disambiguate(base, attempt)
            };
            attempt += 1;

            self.checkpoint(CommitStep::StageMetadata)?;
            let staged_sidecar = self.stage(sidecar.as_bytes())?;
            self.checkpoint(CommitStep::PublishMetadata)?;
            let metadata_path = self.path_for(&name, METADATA_EXT);
            match staged_sidecar.persist_noclobber(&metadata_path) {
                Ok(_) => {}
                Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(e.error),
            }

            // The sidecar at `metadata_path` is ours from here on
            let published = match self.checkpoint(CommitStep::PublishImage) {
                Ok(()) => staged_image.persist_noclobber(self.path_for(&name, IMAGE_EXT)),
                Err(error) => Err(PersistError {
                    error,
                    file: staged_image,
                }),
            };
            match published {
                Ok(_) => return Ok(name),
                Err(e) => {
                    let _ = fs::remove_file(&metadata_path);
                    if e.error.kind() != io::ErrorKind::AlreadyExists {
                        return Err(e.error);
                    }
                    staged_image = e.file;
                }
            }
        }
    }

    fn read_artifact(&self, image_path: &Path) -> std::result::Result<Artifact, String> {
        let base = image_path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| "file name is not valid UTF-8".to_string())?
            .to_string();
        let metadata_path = self.path_for(&base, METADATA_EXT);
        if !metadata_path.exists() {
            return Err("missing sidecar metadata".to_string());
        }
        let content = fs::read_to_string(&metadata_path)
            .map_err(|e| format!("unreadable sidecar metadata: {e}"))?;
        let metadata: ArtifactMetadata = serde_json::from_str(&content)
            .map_err(|e| format!("malformed sidecar metadata: {e}"))?;
        Ok(Artifact {
            base_name: base,
            image_path: image_path.to_path_buf(),
            metadata_path,
            metadata,
        })
    }
}

impl ArtifactStore for FileStore {
    fn persist(&mut self, image: &[u8], metadata: ArtifactMetadata) -> Result<Artifact> {
        self.ensure_dir()?;

        let base = namer::base_name(
            metadata.created_at,
            &metadata.description,
            metadata.variant_index,
        );
        let sidecar = serde_json::to_string_pretty(&metadata).map_err(IconError::Serialization)?;

        let base = self.commit(image, &sidecar, &base).map_err(|e| {
            tracing::warn!(
                artifact = %base,
                error = %e,
                "persist failed, discarding partial files"
            );
            IconError::Io(e)
        })?;

        tracing::debug!(artifact = %base, "artifact persisted");
        Ok(Artifact {
            image_path: self.path_for(&base, IMAGE_EXT),
            metadata_path: self.path_for(&base, METADATA_EXT),
            base_name: base,
            metadata,
        })
    }

    fn list_artifacts(&self) -> Result<ArtifactListing> {
        let mut listing = ArtifactListing::default();
        if !self.root.exists() {
            return Ok(listing);
        }

        for entry in fs::read_dir(&self.root).map_err(IconError::Io)? {
            let path = entry.map_err(IconError::Io)?.path();
            let is_image = path.is_file()
                && path.extension().and_then(|e| e.to_str()) == Some(IMAGE_EXT)
                && !path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with('.'));
            if !is_image {
                continue;
            }

            match self.read_artifact(&path) {
                Ok(artifact) => listing.artifacts.push(artifact),
                Err(reason) => {
                    tracing::warn!(path = %path.display(), %reason, "skipping artifact");
                    listing.skipped.push(SkippedEntry { path, reason });
                }
            }
        }

        sort_most_recent_first(&mut listing.artifacts);
        listing.skipped.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(listing)
    }

    fn load_image(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(IconError::Io)
    }
}
