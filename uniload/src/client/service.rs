//! The two remote calls the orchestrator depends on.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::{ServiceError, ServiceResult};
use super::http::{AsyncHttpClient, HttpResponse};
use super::wire::{
    reported_error, DownloadPayload, DownloadRequestBody, ErrorPayload, InfoPayload,
    InfoRequestBody,
};
use crate::model::{DownloadTicket, MediaFormat, Phase, Quality, VideoMetadata};

/// Default service location, matching the reference backend.
pub const DEFAULT_SERVICE_BASE: &str = "http://localhost:5000";

const INFO_PATH: &str = "/api/info";
const DOWNLOAD_PATH: &str = "/api/download";

/// Contract of the remote metadata/conversion service.
///
/// Implementations must be cheap to share: the controller holds one behind
/// an `Arc` and calls it from spawned tasks.
pub trait RemoteService: Send + Sync + 'static {
    /// Fetch metadata for a source URL.
    fn fetch_metadata(
        &self,
        url: &str,
    ) -> impl Future<Output = ServiceResult<VideoMetadata>> + Send;

    /// Ask the service to produce the converted file.
    fn request_download(
        &self,
        url: &str,
        format: MediaFormat,
        quality: Quality,
    ) -> impl Future<Output = ServiceResult<DownloadTicket>> + Send;
}

/// [`RemoteService`] over HTTP+JSON.
pub struct HttpRemoteService<C: AsyncHttpClient> {
    http_client: C,
    base_url: String,
}

impl<C: AsyncHttpClient> HttpRemoteService<C> {
    /// Creates a service adapter rooted at `base_url`.
    ///
    /// Trailing slashes are removed so paths can be appended directly.
    pub fn new(http_client: C, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        Self {
            http_client,
            base_url,
        }
    }

    /// The service root all paths are appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Where the finished file can be fetched from.
    ///
    /// Absolute URLs from the service are used as-is.
    pub fn retrieval_target(&self, download_url: &str) -> String {
        let lowered = download_url.to_ascii_lowercase();
        if lowered.starts_with("http://") || lowered.starts_with("https://") {
            download_url.to_string()
        } else if download_url.starts_with('/') {
            format!("{}{}", self.base_url, download_url)
        } else {
            format!("{}/{}", self.base_url, download_url)
        }
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        phase: Phase,
        path: &str,
        body: &B,
    ) -> ServiceResult<T> {
        let url = self.endpoint(path);
        let body = serde_json::to_value(body).map_err(|e| ServiceError::Parse {
            phase,
            reason: format!("failed to encode request: {}", e),
        })?;
        tracing::debug!(%phase, url = %url, "Calling service");

        let response = self
            .http_client
            .post_json(&url, body)
            .await
            .map_err(|source| ServiceError::Network { phase, source })?;

        decode_response(phase, response)
    }
}

/// Classify a raw response into a typed payload or a [`ServiceError`].
fn decode_response<T: DeserializeOwned>(phase: Phase, response: HttpResponse) -> ServiceResult<T> {
    if !response.is_success() {
        let message = serde_json::from_slice::<ErrorPayload>(&response.body)
            .ok()
            .and_then(|p| reported_error(p.error));
        return Err(ServiceError::Http {
            phase,
            status: response.status,
            message,
        });
    }

    serde_json::from_slice(&response.body).map_err(|e| ServiceError::Parse {
        phase,
        reason: e.to_string(),
    })
}

impl<C: AsyncHttpClient> RemoteService for HttpRemoteService<C> {
    async fn fetch_metadata(&self, url: &str) -> ServiceResult<VideoMetadata> {
        let body = InfoRequestBody { url };
        let payload: InfoPayload = self.post(Phase::Metadata, INFO_PATH, &body).await?;

        if let Some(message) = reported_error(payload.error) {
            return Err(ServiceError::Application {
                phase: Phase::Metadata,
                message,
            });
        }

        Ok(VideoMetadata {
            title: payload.title,
            thumbnail_url: payload.thumbnail,
            duration: payload.duration,
            platform_label: payload.platform.unwrap_or_default(),
        })
    }

    async fn request_download(
        &self,
        url: &str,
        format: MediaFormat,
        quality: Quality,
    ) -> ServiceResult<DownloadTicket> {
        let body = DownloadRequestBody {
            url,
            format,
            quality,
        };
        let payload: DownloadPayload = self.post(Phase::Download, DOWNLOAD_PATH, &body).await?;

        if let Some(message) = reported_error(payload.error) {
            return Err(ServiceError::Application {
                phase: Phase::Download,
                message,
            });
        }

        let download_url = payload
            .download_url
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| ServiceError::Parse {
                phase: Phase::Download,
                reason: "response has no download_url".to_string(),
            })?;

        Ok(DownloadTicket {
            retrieval_target: self.retrieval_target(&download_url),
        })
    }
}
