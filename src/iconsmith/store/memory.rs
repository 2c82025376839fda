use super::{ArtifactListing, ArtifactStore, sort_most_recent_first};
use crate::error::{IconError, Result};
use crate::model::{Artifact, ArtifactMetadata};
use crate::namer;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

const VIRTUAL_ROOT: &str = "memory";

/// Keeps artifacts in a map keyed by base name. Paths are virtual.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    artifacts: HashMap<String, (Artifact, Vec<u8>)>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    pub fn image_bytes(&self, base_name: &str) -> Option<&[u8]> {
        self.artifacts.get(base_name).map(|(_, bytes)| bytes.as_slice())
    }
}

impl ArtifactStore for InMemoryStore {
    fn persist(&mut self, image: &[u8], metadata: ArtifactMetadata) -> Result<Artifact> {
        let preferred = namer::base_name(
            metadata.created_at,
            &metadata.description,
            metadata.variant_index,
        );
        let mut base = preferred.clone();
        let mut attempt = 2;
        while self.artifacts.contains_key(&base) {
            base = namer::disambiguate(&preferred, attempt);
            attempt += 1;
        }

        let root = PathBuf::from(VIRTUAL_ROOT);
        let artifact = Artifact {
            base_name: base.clone(),
            image_path: root.join(format!("{base}.png")),
            metadata_path: root.join(format!("{base}.json")),
            metadata,
        };
        self.artifacts
            .insert(base, (artifact.clone(), image.to_vec()));
        Ok(artifact)
    }

    fn list_artifacts(&self) -> Result<ArtifactListing> {
        let mut artifacts: Vec<Artifact> =
            self.artifacts.values().map(|(a, _)| a.clone()).collect();
        sort_most_recent_first(&mut artifacts);
        Ok(ArtifactListing {
            artifacts,
            skipped: Vec::new(),
        })
    }

    fn load_image(&self, path: &Path) -> Result<Vec<u8>> {
        self.artifacts
            .values()
            .find(|(a, _)| a.image_path == path)
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| {
                IconError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("{} is not in the store", path.display()),
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::sample_metadata;

    #[test]
    fn persists_and_lists() {
        let mut store = InMemoryStore::new();
        let artifact = store
            .persist(b"img", sample_metadata("a rocket", 1, false))
            .unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.image_bytes(&artifact.base_name), Some(&b"img"[..]));
        assert_eq!(store.load_image(&artifact.image_path).unwrap(), b"img");
        assert_eq!(store.most_recent().unwrap(), Some(artifact));
    }

    #[test]
    fn unknown_path_is_not_found() {
        let store = InMemoryStore::new();
        let err = store.load_image(Path::new("memory/x.png")).unwrap_err();
        assert_eq!(err.kind(), crate::error::FailureKind::IoError);
    }

    #[test]
    fn collisions_are_disambiguated() {
        let mut store = InMemoryStore::new();
        let meta = sample_metadata("same", 1, false);
        let a = store.persist(b"1", meta.clone()).unwrap();
        let b = store.persist(b"2", meta).unwrap();
        assert_ne!(a.base_name, b.base_name);
        assert_eq!(store.len(), 2);
    }
}
