use crate::commands::pipeline::{self, VariantJob};
use crate::commands::{CmdMessage, CmdResult, RenderSettings};
use crate::error::{IconError, Result};
use crate::model::GenerationRequest;
use crate::prompt;
use crate::provider::{ImageProvider, ProviderRequest};
use crate::store::ArtifactStore;
use chrono::Utc;

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
    let description = request.description.trim();
    if description.is_empty() {
        return Err(IconError::Api("Description cannot be empty".to_string()));
    }
    if request.variant_count == 0 {
        return Err(IconError::Api("At least one variant is required".to_string()));
    }

    let created_at = Utc::now();
    let prompts = prompt::build_prompts(description, request.variant_count, settings.background);

    let mut outcomes = Vec::with_capacity(prompts.len());
    for (variant_index, compiled) in (1..).zip(prompts) {
        let job = VariantJob {
            kind: request.kind,
            description: description.to_string(),
            variant_index,
            request: ProviderRequest::new(compiled, &request.model, &settings.quality),
            background: settings.background,
            parent_image: None,
            created_at,
        };
        outcomes.push(pipeline::run_variant(provider, store, &job).await);
    }

    let accepted = outcomes.iter().filter(|o| o.is_accepted()).count();
    let total = outcomes.len();
    let summary = format!("{accepted} of {total} variant(s) accepted");
    let message = if accepted == total {
        CmdMessage::success(summary)
    } else if accepted == 0 {
        CmdMessage::error(summary)
    } else {
        CmdMessage::warning(summary)
    };

    let mut result = CmdResult::default().with_outcomes(outcomes);
    result.add_message(message);
    Ok(result)
}
