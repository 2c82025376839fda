//! # API Facade
//!
//! A thin facade over the command layer and the single entry point for every
//! iconsmith operation, whatever the UI.
//!
//! The facade dispatches to `commands/*.rs` and returns `Result<CmdResult>`.
//! It holds no business logic and never prints.
//!
//! ## Generic over store and provider
//!
//! `IconApi<S: ArtifactStore, P: ImageProvider>`:
//! - Production: `IconApi<FileStore, OpenAiImageProvider>`
//! - Testing: `IconApi<InMemoryStore, ScriptedProvider>`
//!
//! The provider is optional. Listing and storing a key work without a
//! credential; generate and edit fail with a `config-error` before any
//! network activity when no provider was attached.

use crate::commands::{self, RenderSettings};
use crate::error::{IconError, Result};
use crate::model::GenerationRequest;
use crate::provider::ImageProvider;
use crate::store::ArtifactStore;
use std::path::{Path, PathBuf};

pub struct IconApi<S: ArtifactStore, P: ImageProvider> {
    store: S,
    provider: Option<P>,
    settings: RenderSettings,
    config_dir: PathBuf,
}

impl<S: ArtifactStore, P: ImageProvider> IconApi<S, P> {
    pub fn new(store: S, settings: RenderSettings, config_dir: PathBuf) -> Self {
        Self {
            store,
            provider: None,
            settings,
            config_dir,
        }
    }

    pub fn with_provider(mut self, provider: P) -> Self {
        self.provider = Some(provider);
        self
    }

    pub async fn generate(
        &mut self,
        description: &str,
        variants: u32,
        model: &str,
    ) -> Result<commands::CmdResult> {
        let request = GenerationRequest::generate(description, variants, model);
        let provider = self.provider.as_ref().ok_or_else(missing_provider)?;
        commands::generate::run(provider, &mut self.store, &request, &self.settings).await
    }

    pub async fn edit(
        &mut self,
        change: &str,
        on: Option<PathBuf>,
        model: &str,
    ) -> Result<commands::CmdResult> {
        let request = GenerationRequest::edit(change, on, model);
        let provider = self.provider.as_ref().ok_or_else(missing_provider)?;
        commands::edit::run(provider, &mut self.store, &request, &self.settings).await
    }

    pub fn list(&self) -> Result<commands::CmdResult> {
        commands::list::run(&self.store)
    }

    pub fn set_key(&self, key: &str) -> Result<commands::CmdResult> {
        commands::set_key::run(&self.config_dir, key)
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }
}

fn missing_provider() -> IconError {
    IconError::Config("No image provider configured; set an API key first".to_string())
}

pub use crate::commands::{CmdMessage, CmdResult, MessageLevel, VariantOutcome, VariantStatus};
