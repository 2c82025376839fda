use crate::checker::Violation;
use crate::error::{FailureKind, IconError};
use crate::model::{Artifact, BackgroundMode};
use crate::provider::DEFAULT_QUALITY;
use std::path::PathBuf;

pub mod edit;
pub mod generate;
pub mod list;
pub mod pipeline;
pub mod set_key;

/// Knobs shared by every provider request in one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderSettings {
    pub quality: String,
    pub background: BackgroundMode,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY.to_string(),
            background: BackgroundMode::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

/// Terminal state of one variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantStatus {
    Accepted(Artifact),
    Failed {
        kind: FailureKind,
        message: String,
        /// Reasons from the last attempt, for `validation-failed` only.
        violations: Vec<Violation>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantOutcome {
    pub variant_index: u32,
    pub retried: bool,
    pub status: VariantStatus,
}

impl VariantOutcome {
    pub fn accepted(variant_index: u32, retried: bool, artifact: Artifact) -> Self {
        Self {
            variant_index,
            retried,
            status: VariantStatus::Accepted(artifact),
        }
    }

    pub fn failed(variant_index: u32, retried: bool, error: &IconError) -> Self {
        Self {
            variant_index,
            retried,
            status: VariantStatus::Failed {
                kind: error.kind(),
                message: error.to_string(),
                violations: error.violations().to_vec(),
            },
        }
    }

    pub fn artifact(&self) -> Option<&Artifact> {
        match &self.status {
            VariantStatus::Accepted(artifact) => Some(artifact),
            VariantStatus::Failed { .. } => None,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match &self.status {
            VariantStatus::Accepted(_) => None,
            VariantStatus::Failed { kind, .. } => Some(*kind),
        }
    }

    pub fn is_accepted(&self) -> bool {
        self.artifact().is_some()
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub outcomes: Vec<VariantOutcome>,
    pub listed_artifacts: Vec<Artifact>,
    pub config_path: Option<PathBuf>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_outcomes(mut self, outcomes: Vec<VariantOutcome>) -> Self {
        self.outcomes = outcomes;
        self
    }

    pub fn with_listed_artifacts(mut self, artifacts: Vec<Artifact>) -> Self {
        self.listed_artifacts = artifacts;
        self
    }

    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    /// Accepted artifacts, in variant order.
    pub fn accepted(&self) -> Vec<&Artifact> {
        self.outcomes.iter().filter_map(|o| o.artifact()).collect()
    }

    /// True when any requested variant ended in a terminal failure.
    pub fn any_failed(&self) -> bool {
        self.outcomes.iter().any(|o| !o.is_accepted())
    }
}
