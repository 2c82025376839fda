use super::{ImageProvider, ProviderRequest};
use crate::error::ProviderError;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

/// Default `OpenAI` API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// `OpenAI` Images API client (generations and edits)
pub struct OpenAiImageProvider {
    client: Client,
    api_key: SecretString,
    base_url: String,
}

impl OpenAiImageProvider {
    pub fn new(api_key: SecretString, base_url: Option<String>) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key.expose_secret())
    }

    async fn send_generation(
        &self,
        request: &ProviderRequest,
    ) -> Result<reqwest::Response, reqwest::Error> {
        let url = format!("{}/images/generations", self.base_url);
        let wire = GenerationWire {
            prompt: &request.prompt,
            model: &request.model,
            n: 1,
            size: &request.size,
            quality: &request.quality,
            // gpt-image models always answer inline; dall-e needs asking
            response_format: request
                .model
                .starts_with("dall-e")
                .then_some("b64_json"),
        };
        self.client
            .post(&url)
            .header("Authorization", self.bearer())
            .json(&wire)
            .send()
            .await
    }

    async fn send_edit(
        &self,
        request: &ProviderRequest,
        source: &super::SourceImage,
    ) -> Result<reqwest::Response, ProviderError> {
        let url = format!("{}/images/edits", self.base_url);
        let image = reqwest::multipart::Part::bytes(source.bytes.clone())
            .file_name(source.file_name())
            .mime_str("image/png")
            .map_err(|e| ProviderError::Connection(format!("Invalid image part: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .part("image", image)
            .text("prompt", request.prompt.clone())
            .text("model", request.model.clone())
            .text("n", "1")
            .text("size", request.size.clone())
            .text("quality", request.quality.clone());

        self.client
            .post(&url)
            .header("Authorization", self.bearer())
            .multipart(form)
            .send()
            .await
            .map_err(connection_error)
    }
}

#[derive(Serialize)]
struct GenerationWire<'a> {
    prompt: &'a str,
    model: &'a str,
    n: u32,
    size: &'a str,
    quality: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<&'a str>,
}

#[derive(Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
    url: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

fn connection_error(e: reqwest::Error) -> ProviderError {
    tracing::error!(error = %e, "image request failed");
    ProviderError::Connection(format!("Failed to reach OpenAI images API: {e}"))
}

/// Map a non-success status and body to a provider error, keeping the
/// upstream message when the body is an `OpenAI` error envelope.
fn status_error(status: u16, body: &str) -> ProviderError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string());
    match status {
        401 | 403 => ProviderError::Authentication(message),
        429 => ProviderError::RateLimited(message),
        _ => ProviderError::Service { status, message },
    }
}

fn extract_image(body: &str) -> Result<Vec<u8>, ProviderError> {
    let parsed: ImagesResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("unreadable response body: {e}")))?;
    let datum = parsed
        .data
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::InvalidResponse("response contained no images".into()))?;
    match (datum.b64_json, datum.url) {
        (Some(b64), _) => STANDARD
            .decode(b64.trim())
            .map_err(|e| ProviderError::InvalidResponse(format!("bad base64 payload: {e}"))),
        (None, Some(_)) => Err(ProviderError::InvalidResponse(
            "provider returned a URL instead of inline image data".into(),
        )),
        (None, None) => Err(ProviderError::InvalidResponse(
            "image entry had no data".into(),
        )),
    }
}

#[async_trait]
impl ImageProvider for OpenAiImageProvider {
    async fn render(&self, request: &ProviderRequest) -> Result<Vec<u8>, ProviderError> {
        tracing::debug!(
            model = %request.model,
            edit = request.source_image.is_some(),
            "sending image request"
        );

        let response = match &request.source_image {
            Some(source) => self.send_edit(request, source).await?,
            None => self
                .send_generation(request)
                .await
                .map_err(connection_error)?,
        };

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("failed to read body: {e}")))?;

        if !status.is_success() {
            tracing::error!(status = %status, "OpenAI images API error");
            return Err(status_error(status.as_u16(), &body));
        }

        let bytes = extract_image(&body)?;
        tracing::debug!(bytes = bytes.len(), "image request complete");
        Ok(bytes)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
