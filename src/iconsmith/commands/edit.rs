use crate::commands::pipeline::{self, VariantJob};
use crate::commands::{CmdMessage, CmdResult, RenderSettings};
use crate::error::{IconError, Result};
use crate::model::GenerationRequest;
use crate::prompt;
use crate::provider::{ImageProvider, ProviderRequest, SourceImage};
use crate::store::ArtifactStore;
use chrono::Utc;
use std::io;
use std::path::PathBuf;

/// Edit one image: the given source, or the most recent artifact.
///
/// Source resolution happens before the provider is touched, so a missing
/// source never costs a call.
pub async fn run<S, P>(
    provider: &P,
    store: &mut S,
    request: &GenerationRequest,
    settings: &RenderSettings,
) -> Result<CmdResult>
where
    S: ArtifactStore,
    P: ImageProvider + ?Sized,
{
    let change = request.description.trim();
    if change.is_empty() {
        return Err(IconError::Api("Describe the change to make".to_string()));
    }

    let source = resolve_source(store, request.source_image_path.clone())?;
    tracing::debug!(source = %source.path.display(), "edit source resolved");

    let job = VariantJob {
        kind: request.kind,
        description: change.to_string(),
        variant_index: 1,
        request: ProviderRequest::new(
            prompt::build_edit_prompt(change, settings.background),
            &request.model,
            &settings.quality,
        )
        .with_source_image(source.clone()),
        background: settings.background,
        parent_image: Some(source.path),
        created_at: Utc::now(),
    };

    let outcome = pipeline::run_variant(provider, store, &job).await;
    let message = if outcome.is_accepted() {
        CmdMessage::success("Edit accepted")
    } else {
        CmdMessage::error("Edit failed")
    };

    let mut result = CmdResult::default().with_outcomes(vec![outcome]);
    result.add_message(message);
    Ok(result)
}

fn resolve_source<S: ArtifactStore>(store: &S, explicit: Option<PathBuf>) -> Result<SourceImage> {
    let path = match explicit {
        Some(path) => path,
        None => store
            .most_recent()?
            .map(|artifact| artifact.image_path)
            .ok_or_else(|| {
                IconError::NoSourceAvailable(
                    "no icons generated yet; run generate first or pass --on PATH".to_string(),
                )
            })?,
    };

    match store.load_image(&path) {
        Ok(bytes) => Ok(SourceImage { path, bytes }),
        Err(IconError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Err(
            IconError::NoSourceAvailable(format!("{} does not exist", path.display())),
        ),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use crate::model::RequestKind;
    use crate::store::memory::InMemoryStore;
    use crate::test_utils::fixtures::{IconFixture, ORANGE};
    use crate::test_utils::{ScriptedProvider, TestEnv, sample_metadata};

    fn valid_png() -> Vec<u8> {
        IconFixture::new().disk(ORANGE).png()
    }

    fn make_it_blue(on: Option<PathBuf>) -> GenerationRequest {
        GenerationRequest::edit("make it blue", on, "gpt-image-1")
    }

    #[tokio::test]
    async fn empty_store_means_no_source_and_no_calls() {
        let mut store = InMemoryStore::new();
        let provider = ScriptedProvider::new().respond(valid_png());

        let err = run(&provider, &mut store, &make_it_blue(None), &RenderSettings::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind(), FailureKind::NoSourceAvailable);
        assert_eq!(provider.calls(), 0);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn missing_explicit_path_means_no_source() {
        let mut env = TestEnv::new();
        let provider = ScriptedProvider::new().respond(valid_png());
        let missing = env.root.join("nope.png");

        let err = run(
            &provider,
            &mut env.store,
            &make_it_blue(Some(missing)),
            &RenderSettings::default(),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), FailureKind::NoSourceAvailable);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn defaults_to_most_recent_artifact() {
        let mut env = TestEnv::new();
        let mut older = sample_metadata("older", 1, false);
        older.created_at -= chrono::Duration::hours(1);
        env.store.persist(b"OLD", older).unwrap();
        let newest = env
            .store
            .persist(b"NEW", sample_metadata("newest", 1, false))
            .unwrap();

        let provider = ScriptedProvider::new().respond(valid_png());
        let result = run(&provider, &mut env.store, &make_it_blue(None), &RenderSettings::default())
            .await
            .unwrap();

        let sent = provider.requests();
        let source = sent[0].source_image.as_ref().unwrap();
        assert_eq!(source.path, newest.image_path);
        assert_eq!(source.bytes, b"NEW");
        assert!(sent[0].prompt.contains("REQUESTED CHANGE: make it blue"));

        let edited = result.accepted()[0].clone();
        assert_eq!(edited.metadata.kind, RequestKind::Edit);
        assert_eq!(edited.metadata.variant_index, 1);
        assert_eq!(edited.metadata.parent_image, Some(newest.image_path));
        assert!(edited.base_name.ends_with("_make-it-blue_v1"));
    }

    #[tokio::test]
    async fn explicit_source_is_used_as_given() {
        let mut env = TestEnv::new();
        let outside = env.root.join("hand-made.png");
        std::fs::write(&outside, b"HAND").unwrap();

        let provider = ScriptedProvider::new().respond(valid_png());
        let result = run(
            &provider,
            &mut env.store,
            &make_it_blue(Some(outside.clone())),
            &RenderSettings::default(),
        )
        .await
        .unwrap();

        assert!(!result.any_failed());
        let source = provider.requests()[0].source_image.clone().unwrap();
        assert_eq!(source.path, outside);
        assert_eq!(source.bytes, b"HAND");
    }

    #[tokio::test]
    async fn failed_edit_is_a_single_failed_outcome() {
        let mut store = InMemoryStore::new();
        store
            .persist(b"SRC", sample_metadata("base", 1, false))
            .unwrap();
        let garbage = b"not an image".to_vec();
        let provider = ScriptedProvider::new().respond(garbage);

        let result = run(&provider, &mut store, &make_it_blue(None), &RenderSettings::default())
            .await
            .unwrap();

        assert_eq!(result.outcomes.len(), 1);
        assert_eq!(
            result.outcomes[0].failure_kind(),
            Some(FailureKind::DecodeError)
        );
        assert!(result.any_failed());
        assert_eq!(store.len(), 1);
    }
}
