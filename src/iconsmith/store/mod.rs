//! # Storage Layer
//!
//! The [`ArtifactStore`] trait is the only way the rest of the crate touches
//! durable storage.
//!
//! ## Implementations
//!
//! - [`fs::FileStore`]: production storage in a single output directory
//! - [`memory::InMemoryStore`]: no persistence, for tests
//!
//! ## Storage Format
//!
//! ```text
//! Icon Composer Layers/
//! ├── 2026-03-04_050607_a-rocket_v1.png    # accepted image
//! ├── 2026-03-04_050607_a-rocket_v1.json   # sidecar metadata
//! ├── 2026-03-04_050607_a-rocket_v2.png
//! └── 2026-03-04_050607_a-rocket_v2.json
//! ```
//!
//! An artifact exists only as the pair. Persisting is all-or-nothing, and an
//! image whose sidecar is missing or unreadable is skipped by listings.
//!
//! ## Most recent artifact
//!
//! There is no "last generated" pointer anywhere. [`ArtifactStore::most_recent`]
//! is a query over the listing, ordered by the timestamp each artifact
//! carries.

use crate::error::Result;
use crate::model::{Artifact, ArtifactMetadata};
use std::path::{Path, PathBuf};

pub mod fs;
pub mod memory;

/// An image that was found but could not be listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ArtifactListing {
    /// Most recent first.
    pub artifacts: Vec<Artifact>,
    pub skipped: Vec<SkippedEntry>,
}

pub trait ArtifactStore {
    /// Write `image` and its sidecar. Both files exist afterwards, or neither.
    fn persist(&mut self, image: &[u8], metadata: ArtifactMetadata) -> Result<Artifact>;

    /// Every readable artifact, most recent first.
    fn list_artifacts(&self) -> Result<ArtifactListing>;

    /// Read image bytes to use as an edit source.
    fn load_image(&self, path: &Path) -> Result<Vec<u8>>;

    fn most_recent(&self) -> Result<Option<Artifact>> {
        Ok(self.list_artifacts()?.artifacts.into_iter().next())
    }
}

/// Most recent first; equal timestamps fall back to the base name so the
/// order never depends on directory iteration.
pub(crate) fn sort_most_recent_first(artifacts: &mut [Artifact]) {
    artifacts.sort_by(|a, b| {
        b.metadata
            .created_at
            .cmp(&a.metadata.created_at)
            .then_with(|| b.base_name.cmp(&a.base_name))
    });
}
