use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_VARIANTS: u32 = 3;
pub const METADATA_SCHEMA_VERSION: u32 = 1;

/// What the icon's empty area must look like.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackgroundMode {
    #[default]
    Black,
    Transparent,
}

impl BackgroundMode {
    pub fn describe(&self) -> &'static str {
        match self {
            BackgroundMode::Black => "pure black (RGB 0,0,0)",
            BackgroundMode::Transparent => "fully transparent",
        }
    }
}

impl fmt::Display for BackgroundMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackgroundMode::Black => f.write_str("black"),
            BackgroundMode::Transparent => f.write_str("transparent"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestKind {
    Generate,
    Edit,
}

/// One invocation's worth of work. Never persisted directly; its fields are
/// echoed into each artifact's sidecar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub kind: RequestKind,
    pub description: String,
    pub variant_count: u32,
    pub model: String,
    pub source_image_path: Option<PathBuf>,
}

impl GenerationRequest {
    pub fn generate(
        description: impl Into<String>,
        variant_count: u32,
        model: impl Into<String>,
    ) -> Self {
        Self {
            kind: RequestKind::Generate,
            description: description.into(),
            variant_count,
            model: model.into(),
            source_image_path: None,
        }
    }

    /// Edits always produce exactly one variant.
    pub fn edit(
        description: impl Into<String>,
        source_image_path: Option<PathBuf>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            kind: RequestKind::Edit,
            description: description.into(),
            variant_count: 1,
            model: model.into(),
            source_image_path,
        }
    }
}

/// Sidecar record written next to every accepted image.
///
/// Fields are additive only: readers ignore what they don't know, and
/// optional fields default when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub kind: RequestKind,
    pub description: String,
    #[serde(default)]
    pub compiled_prompt: String,
    pub model: String,
    pub variant_index: u32,
    pub created_at: DateTime<Utc>,
    pub retried: bool,
    pub validation_passed: bool,
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub background: BackgroundMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_image: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

fn default_schema_version() -> u32 {
    METADATA_SCHEMA_VERSION
}

/// A durable, accepted icon: image file plus sidecar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub base_name: String,
    pub image_path: PathBuf,
    pub metadata_path: PathBuf,
    pub metadata: ArtifactMetadata,
}
