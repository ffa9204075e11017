//! HTTP adapter for the MyAvatar backend

use async_trait::async_trait;
use reqwest::{multipart, Client, RequestBuilder, StatusCode};
use serde::Deserialize;

use crate::application::ports::{
    AvatarDirectory, CatalogError, FieldError, GenerationError, VideoGenerator, VideoLibrary,
};
use crate::domain::config::AppConfig;
use crate::domain::generation::{Avatar, JobId, StatusMapping, StatusSnapshot, VideoRecord};
use crate::domain::recording::AudioClip;

use super::{
    AUDIO_FIELD, AVATARS_PATH, AVATAR_FIELD, GENERATE_PATH, STATUS_PATH_PREFIX, TITLE_FIELD,
    VIDEOS_PATH,
};

/// Backend connection settings
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub base_url: String,
    /// Ambient credential forwarded as a bearer token; never inspected
    pub api_token: Option<String>,
}

impl BackendConfig {
    /// Build from the merged application config
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            base_url: config.backend_url_or_default().to_string(),
            api_token: config.api_token.clone(),
        }
    }
}

/// HTTP client for the backend's video surface.
///
/// Implements job submission, status reads, and the read-only catalogs.
/// Status responses are normalized here, at the transport boundary, through
/// the injected [`StatusMapping`]; nothing downstream sees provider
/// vocabulary.
pub struct HttpBackendClient {
    client: Client,
    config: BackendConfig,
    mapping: StatusMapping,
}

impl HttpBackendClient {
    /// Create a client with the default provider status mapping
    pub fn new(config: BackendConfig) -> Self {
        Self::with_mapping(config, StatusMapping::default())
    }

    /// Create a client with a custom provider status mapping
    pub fn with_mapping(config: BackendConfig, mapping: StatusMapping) -> Self {
        Self {
            client: Client::new(),
            config,
            mapping,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.config.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn build_form(
        &self,
        clip: &AudioClip,
        avatar_id: &str,
        title: Option<&str>,
    ) -> Result<multipart::Form, GenerationError> {
        let file_part = multipart::Part::bytes(clip.data().to_vec())
            .file_name(clip.file_name())
            .mime_str(clip.mime_type())
            .map_err(|e| GenerationError::InvalidResponse(format!("audio part: {}", e)))?;

        let mut form = multipart::Form::new()
            .part(AUDIO_FIELD, file_part)
            .text(AVATAR_FIELD, avatar_id.to_string());

        if let Some(title) = title {
            form = form.text(TITLE_FIELD, title.to_string());
        }

        Ok(form)
    }

    fn normalize(&self, body: StatusBody) -> StatusSnapshot {
        let word = body.status.or(body.state);
        let status = self
            .mapping
            .classify(word.as_deref(), body.video_url.is_some());

        StatusSnapshot {
            status,
            progress: body
                .progress
                .map(|value| value.clamp(0.0, 100.0).round() as u8),
            video_url: body.video_url,
            error: body.error.and_then(ErrorDetail::into_message),
        }
    }
}

// Response shapes. The backend wraps provider payloads in a `data`
// envelope on some routes and returns them flat on others; both are
// accepted, with `data` taking precedence (matching what the provider
// actually populates).

#[derive(Debug, Deserialize, Default)]
struct SubmitBody {
    #[serde(default)]
    video_id: Option<String>,
    #[serde(default)]
    job_id: Option<String>,
    #[serde(default)]
    id: Option<String>,
}

impl SubmitBody {
    fn job_id(self) -> Option<String> {
        self.video_id.or(self.job_id).or(self.id)
    }
}

#[derive(Debug, Deserialize, Default)]
struct SubmitResponse {
    #[serde(default)]
    data: Option<SubmitBody>,
    #[serde(flatten)]
    top: SubmitBody,
}

impl SubmitResponse {
    fn job_id(self) -> Option<String> {
        self.data.and_then(SubmitBody::job_id).or(self.top.job_id())
    }
}

#[derive(Debug, Deserialize, Default)]
struct StatusBody {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    progress: Option<f64>,
    #[serde(default)]
    video_url: Option<String>,
    #[serde(default)]
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    data: Option<StatusBody>,
    #[serde(flatten)]
    top: StatusBody,
}

impl StatusResponse {
    /// Prefer the `data` envelope, field by field, falling back to the top
    /// level (the original backend checks both)
    fn flatten(self) -> StatusBody {
        match self.data {
            Some(data) => StatusBody {
                status: data.status.or(self.top.status),
                state: data.state.or(self.top.state),
                progress: data.progress.or(self.top.progress),
                video_url: data.video_url.or(self.top.video_url),
                error: data.error.or(self.top.error),
            },
            None => self.top,
        }
    }
}

/// Provider error details arrive either as a bare string or as an object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Message(String),
    Object {
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        detail: Option<String>,
    },
}

impl ErrorDetail {
    fn into_message(self) -> Option<String> {
        match self {
            Self::Message(message) => Some(message),
            Self::Object { message, detail } => message.or(detail),
        }
    }
}

/// FastAPI-style validation envelope: `{"detail": [{"loc": [...], "msg": ...}]}`
#[derive(Debug, Deserialize)]
struct ValidationEnvelope {
    detail: ValidationDetail,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ValidationDetail {
    Fields(Vec<ValidationItem>),
    Message(String),
}

#[derive(Debug, Deserialize)]
struct ValidationItem {
    #[serde(default)]
    loc: Vec<serde_json::Value>,
    msg: String,
}

fn parse_validation_errors(raw_body: &str) -> Option<Vec<FieldError>> {
    let envelope: ValidationEnvelope = serde_json::from_str(raw_body).ok()?;

    let errors = match envelope.detail {
        ValidationDetail::Fields(items) => items
            .into_iter()
            .map(|item| FieldError {
                field: item
                    .loc
                    .iter()
                    .filter_map(|part| part.as_str())
                    .next_back()
                    .unwrap_or("request")
                    .to_string(),
                message: item.msg,
            })
            .collect(),
        ValidationDetail::Message(message) => vec![FieldError {
            field: "request".to_string(),
            message,
        }],
    };

    Some(errors)
}

/// Listing endpoints return either a bare array or a `data` envelope
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListEnvelope<T> {
    Bare(Vec<T>),
    Data { data: Vec<T> },
}

impl<T> ListEnvelope<T> {
    fn into_items(self) -> Vec<T> {
        match self {
            Self::Bare(items) => items,
            Self::Data { data } => data,
        }
    }
}

async fn upstream_error(response: reqwest::Response) -> GenerationError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if status == StatusCode::UNPROCESSABLE_ENTITY {
        if let Some(errors) = parse_validation_errors(&body) {
            return GenerationError::UpstreamValidationError { errors };
        }
    }

    GenerationError::UpstreamError {
        status: status.as_u16(),
        body,
    }
}

#[async_trait]
impl VideoGenerator for HttpBackendClient {
    async fn submit(
        &self,
        clip: &AudioClip,
        avatar_id: &str,
        title: Option<&str>,
    ) -> Result<JobId, GenerationError> {
        // Local validation first; neither failure issues a request.
        if clip.is_empty() {
            return Err(GenerationError::InvalidAudio);
        }
        let avatar_id = avatar_id.trim();
        if avatar_id.is_empty() {
            return Err(GenerationError::MissingAvatar);
        }

        let form = self.build_form(clip, avatar_id, title)?;

        // No explicit content-type: reqwest computes the multipart boundary.
        let response = self
            .authorize(self.client.post(self.url(GENERATE_PATH)))
            .multipart(form)
            .send()
            .await
            .map_err(|e| GenerationError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(upstream_error(response).await);
        }

        let raw_body = response
            .text()
            .await
            .map_err(|e| GenerationError::NetworkError(e.to_string()))?;

        let parsed: SubmitResponse = serde_json::from_str(&raw_body)
            .map_err(|_| GenerationError::MissingJobId(snippet(&raw_body)))?;

        match parsed.job_id() {
            Some(id) if !id.trim().is_empty() => Ok(JobId::new(id)),
            _ => Err(GenerationError::MissingJobId(snippet(&raw_body))),
        }
    }

    async fn fetch_status(&self, job_id: &JobId) -> Result<StatusSnapshot, GenerationError> {
        let url = format!("{}/{}", self.url(STATUS_PATH_PREFIX), job_id);

        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(|e| GenerationError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(upstream_error(response).await);
        }

        let parsed: StatusResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        Ok(self.normalize(parsed.flatten()))
    }
}

#[async_trait]
impl AvatarDirectory for HttpBackendClient {
    async fn list_avatars(&self) -> Result<Vec<Avatar>, CatalogError> {
        fetch_list(self, AVATARS_PATH).await
    }
}

#[async_trait]
impl VideoLibrary for HttpBackendClient {
    async fn list_videos(&self) -> Result<Vec<VideoRecord>, CatalogError> {
        fetch_list(self, VIDEOS_PATH).await
    }
}

async fn fetch_list<T: serde::de::DeserializeOwned>(
    client: &HttpBackendClient,
    path: &str,
) -> Result<Vec<T>, CatalogError> {
    let response = client
        .authorize(client.client.get(client.url(path)))
        .send()
        .await
        .map_err(|e| CatalogError::NetworkError(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CatalogError::RequestFailed {
            status: status.as_u16(),
            body,
        });
    }

    let envelope: ListEnvelope<T> = response
        .json()
        .await
        .map_err(|e| CatalogError::ParseError(e.to_string()))?;

    Ok(envelope.into_items())
}

/// Trim a response body for diagnostics without flooding the terminal
fn snippet(raw_body: &str) -> String {
    const MAX: usize = 200;
    if raw_body.len() <= MAX {
        raw_body.to_string()
    } else {
        format!("{}...", &raw_body[..MAX])
    }
}
