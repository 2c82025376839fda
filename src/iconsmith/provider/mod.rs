//! # Image Provider Boundary
//!
//! The pipeline only ever sees [`ImageProvider`]: a prompt goes in, raw image
//! bytes (or a [`ProviderError`]) come out. Production uses
//! [`openai::OpenAiImageProvider`]; tests script responses through
//! `test_utils::ScriptedProvider`.

pub mod openai;

use crate::checker::CANVAS_SIZE;
use crate::error::ProviderError;
use async_trait::async_trait;
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "gpt-image-1";
pub const DEFAULT_QUALITY: &str = "high";

/// Reference image sent along with an edit request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

impl SourceImage {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("source.png")
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderRequest {
    pub prompt: String,
    pub model: String,
    /// e.g. "1024x1024"
    pub size: String,
    pub quality: String,
    pub source_image: Option<SourceImage>,
}

impl ProviderRequest {
    pub fn new(
        prompt: impl Into<String>,
        model: impl Into<String>,
        quality: impl Into<String>,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            size: format!("{CANVAS_SIZE}x{CANVAS_SIZE}"),
            quality: quality.into(),
            source_image: None,
        }
    }

    pub fn with_source_image(mut self, source: SourceImage) -> Self {
        self.source_image = Some(source);
        self
    }

    pub fn with_prompt(&self, prompt: String) -> Self {
        Self {
            prompt,
            ..self.clone()
        }
    }
}

/// A remote image generator.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    /// Produce one image. With a source image this is an edit of that image.
    async fn render(&self, request: &ProviderRequest) -> Result<Vec<u8>, ProviderError>;

    fn name(&self) -> &str;
}
