//! HTTP access to the studio service behind the `StudioBackend` seam.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    error::StudioError,
    protocol::{
        ConvertTo3dRequest, ConvertTo3dResponse, ErrorBody, GenerateImageRequest,
        GenerateImageResponse, HealthReport, ServiceReply,
    },
};
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(360);
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

#[async_trait]
pub trait StudioBackend: Send + Sync {
    async fn generate_image(&self, idea: &str) -> Result<GenerateImageResponse, StudioError>;
    async fn convert_to_3d(&self, image_path: &str)
        -> Result<ConvertTo3dResponse, StudioError>;
    async fn health(&self) -> Result<HealthReport, StudioError>;
    async fn fetch_asset(&self, url: &Url) -> Result<Vec<u8>, StudioError>;
}

#[derive(Debug, Clone, Copy)]
pub struct TransportOptions {
    pub request_timeout: Duration,
    pub health_timeout: Duration,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
        }
    }
}

pub struct HttpStudioBackend {
    http: Client,
    api_base: Url,
    health_timeout: Duration,
}

impl HttpStudioBackend {
    pub fn new(api_base: Url, options: TransportOptions) -> Result<Self, StudioError> {
        let http = Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|err| StudioError::Transport(format!("failed to build http client: {err}")))?;
        Ok(Self {
            http,
            api_base,
            health_timeout: options.health_timeout,
        })
    }

    fn endpoint(&self, name: &str) -> Result<Url, StudioError> {
        let base = self.api_base.as_str().trim_end_matches('/');
        Url::parse(&format!("{base}/{name}")).map_err(|err| {
            StudioError::Transport(format!("invalid endpoint url for {name}: {err}"))
        })
    }

    async fn post_json<B, T>(&self, name: &str, body: &B) -> Result<T, StudioError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(name)?;
        debug!(%url, "posting studio request");
        let response = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let reply: ServiceReply = read_reply(response).await?;
        if !reply.success {
            return Err(StudioError::Rejected(reply.error));
        }
        reply
            .into_payload()
            .map_err(|err| StudioError::Transport(format!("malformed {name} response: {err}")))
    }
}

#[async_trait]
impl StudioBackend for HttpStudioBackend {
    async fn generate_image(&self, idea: &str) -> Result<GenerateImageResponse, StudioError> {
        self.post_json(
            "generate-image",
            &GenerateImageRequest {
                idea: idea.to_string(),
            },
        )
        .await
    }

    async fn convert_to_3d(
        &self,
        image_path: &str,
    ) -> Result<ConvertTo3dResponse, StudioError> {
        self.post_json(
            "convert-to-3d",
            &ConvertTo3dRequest {
                image_path: image_path.to_string(),
            },
        )
        .await
    }

    async fn health(&self) -> Result<HealthReport, StudioError> {
        let url = self.endpoint("health")?;
        let response = self
            .http
            .get(url)
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(StudioError::Http {
                status: status.as_u16(),
                message: None,
            });
        }

        let raw = response.text().await.map_err(transport_error)?;
        Ok(serde_json::from_str(&raw).unwrap_or_else(|err| {
            warn!(%err, "health payload not understood; treating service as reachable");
            HealthReport::default()
        }))
    }

    async fn fetch_asset(&self, url: &Url) -> Result<Vec<u8>, StudioError> {
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(StudioError::Http {
                status: status.as_u16(),
                message: None,
            });
        }
        let bytes = response.bytes().await.map_err(transport_error)?;
        Ok(bytes.to_vec())
    }
}

async fn read_reply(response: Response) -> Result<ServiceReply, StudioError> {
    let status = response.status();
    if !status.is_success() {
        let message = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.error);
        return Err(StudioError::Http {
            status: status.as_u16(),
            message,
        });
    }

    response
        .json::<ServiceReply>()
        .await
        .map_err(|err| StudioError::Transport(format!("malformed response body: {err}")))
}

fn transport_error(err: reqwest::Error) -> StudioError {
    if err.is_timeout() {
        StudioError::Transport("request timed out".to_string())
    } else if err.is_connect() {
        StudioError::Transport(format!("failed to connect: {err}"))
    } else {
        StudioError::Transport(err.to_string())
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
