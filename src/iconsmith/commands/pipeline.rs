//! # Variant Pipeline
//!
//! Drives one variant from prompt to stored artifact:
//!
//! ```text
//! Requested ──▶ CalledProvider ──▶ Validating ──▶ Accepted
//!                    ▲                 │
//!                    │                 ├──▶ Retrying ──┐ (first attempt only)
//!                    └─────────────────┼───────────────┘
//!                                      └──▶ Failed
//! ```
//!
//! - Provider and decode failures are terminal on any attempt.
//! - A failed validation on the first attempt retries once with a corrective
//!   prompt. A second failed validation is terminal and reports the second
//!   attempt's violations.
//! - The provider is called at most twice per variant.
//!
//! Variants never share state. The only thing a variant touches besides the
//! provider is the store, and only after it has been accepted.

use crate::checker;
use crate::commands::VariantOutcome;
use crate::error::{IconError, Result};
use crate::model::{
    Artifact, ArtifactMetadata, BackgroundMode, METADATA_SCHEMA_VERSION, RequestKind,
};
use crate::prompt;
use crate::provider::{ImageProvider, ProviderRequest};
use crate::store::ArtifactStore;
use chrono::{DateTime, Utc};
use std::fmt;
use std::path::PathBuf;

/// Hard ceiling on provider calls per variant.
pub const MAX_ATTEMPTS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantState {
    Requested,
    CalledProvider,
    Validating,
    Retrying,
    Accepted,
    Failed,
}

impl fmt::Display for VariantState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VariantState::Requested => "requested",
            VariantState::CalledProvider => "called-provider",
            VariantState::Validating => "validating",
            VariantState::Retrying => "retrying",
            VariantState::Accepted => "accepted",
            VariantState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Everything one variant needs, already compiled.
#[derive(Debug, Clone)]
pub struct VariantJob {
    pub kind: RequestKind,
    pub description: String,
    pub variant_index: u32,
    /// Carries the compiled first-attempt prompt.
    pub request: ProviderRequest,
    pub background: BackgroundMode,
    pub parent_image: Option<PathBuf>,
    /// Shared by all variants of one invocation so their names group together.
    pub created_at: DateTime<Utc>,
}

struct Run {
    variant: u32,
    attempt: u32,
    state: VariantState,
}

impl Run {
    fn advance(&mut self, next: VariantState) {
        tracing::debug!(
            variant = self.variant,
            attempt = self.attempt,
            from = %self.state,
            to = %next,
            "variant transition"
        );
        self.state = next;
    }

    fn retried(&self) -> bool {
        self.attempt > 1
    }
}

/// Run one variant to a terminal state. Failures are returned as outcomes,
/// never as errors.
pub async fn run_variant<S, P>(provider: &P, store: &mut S, job: &VariantJob) -> VariantOutcome
where
    S: ArtifactStore,
    P: ImageProvider + ?Sized,
{
    let mut run = Run {
        variant: job.variant_index,
        attempt: 0,
        state: VariantState::Requested,
    };

    match drive(provider, store, job, &mut run).await {
        Ok(artifact) => VariantOutcome::accepted(job.variant_index, run.retried(), artifact),
        Err(e) => {
            run.advance(VariantState::Failed);
            VariantOutcome::failed(job.variant_index, run.retried(), &e)
        }
    }
}

async fn drive<S, P>(
    provider: &P,
    store: &mut S,
    job: &VariantJob,
    run: &mut Run,
) -> Result<Artifact>
where
    S: ArtifactStore,
    P: ImageProvider + ?Sized,
{
    let mut request = job.request.clone();

    loop {
        run.attempt += 1;
        run.advance(VariantState::CalledProvider);
        let bytes = provider.render(&request).await.map_err(|e| {
            tracing::error!(
                variant = run.variant,
                provider = provider.name(),
                error = %e,
                "provider call failed"
            );
            IconError::Provider(e)
        })?;

        run.advance(VariantState::Validating);
        let image = checker::decode(&bytes)?;
        let result = checker::check(&image, job.background);

        if result.passed() {
            run.advance(VariantState::Accepted);
            let (width, height) = image.dimensions();
            let metadata = ArtifactMetadata {
                schema_version: METADATA_SCHEMA_VERSION,
                kind: job.kind,
                description: job.description.clone(),
                compiled_prompt: request.prompt.clone(),
                model: request.model.clone(),
                variant_index: job.variant_index,
                created_at: job.created_at,
                retried: run.retried(),
                validation_passed: true,
                width,
                height,
                background: job.background,
                parent_image: job.parent_image.clone(),
                warnings: result.warnings,
            };
            return store.persist(&bytes, metadata);
        }

        let reasons: Vec<String> = result.violations.iter().map(|v| v.to_string()).collect();
        tracing::warn!(
            variant = run.variant,
            attempt = run.attempt,
            violations = ?reasons,
            "validation failed"
        );

        if run.attempt >= MAX_ATTEMPTS {
            return Err(IconError::ValidationFailed(result.violations));
        }

        run.advance(VariantState::Retrying);
        request = job
            .request
            .with_prompt(prompt::corrective_prompt(&job.request.prompt, &result.violations));
    }
}
