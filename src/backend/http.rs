//! HTTP client for the detection backend, built on [`reqwest`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;

use crate::config::BackendConfig;
use crate::model::RegionPayload;
use crate::results::ResultSet;

use super::types::{
    AckResponse, ErrorBody, JobsResponse, ProcessResponse, ResultsResponse, UploadResponse,
};
use super::{
    Backend, BackendError, HardwareInfo, JobId, JobSummary, ProcessRequest, SaveRegionsRequest,
    StatusResponse, UploadedVideo, VideoSource,
};

/// Talks to one backend instance.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    api_url: String,
}

impl HttpBackend {
    /// * `api_url` - API root, e.g. `http://127.0.0.1:5000/api`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        Self { client, api_url }
    }

    /// Build a client from configuration, applying the request timeout where
    /// the platform supports one.
    pub fn from_config(config: &BackendConfig) -> Result<Self, BackendError> {
        #[allow(unused_mut)]
        let mut builder = reqwest::Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(std::time::Duration::from_secs(secs));
        }
        Ok(Self::with_client(builder.build()?, &config.base_url))
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path)
    }

    // ---- private helpers ----

    /// Pass 2xx responses through; turn anything else into
    /// [`BackendError::Api`], preferring the backend's `error` field.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|e| e.error)
            .unwrap_or(body);
        Err(BackendError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
        let response = Self::ensure_success(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
impl Backend for HttpBackend {
    async fn upload(&self, video: &VideoSource) -> Result<UploadedVideo, BackendError> {
        let mut part = Part::bytes(video.bytes.clone()).file_name(video.file_name.clone());
        if let Some(content_type) = &video.content_type {
            part = part.mime_str(content_type)?;
        }
        let form = Form::new().part("video", part);

        log::debug!("Uploading '{}' ({} bytes)", video.file_name, video.bytes.len());
        let response = self
            .client
            .post(self.url("upload"))
            .multipart(form)
            .send()
            .await?;
        Self::parse_response::<UploadResponse>(response)
            .await?
            .into_result()
    }

    async fn process(&self, request: &ProcessRequest) -> Result<JobId, BackendError> {
        let response = self
            .client
            .post(self.url("process"))
            .json(request)
            .send()
            .await?;
        Self::parse_response::<ProcessResponse>(response)
            .await?
            .into_result()
    }

    async fn status(&self, job: &JobId) -> Result<StatusResponse, BackendError> {
        let response = self
            .client
            .get(self.url(&format!("status/{}", job)))
            .send()
            .await?;
        Self::parse_response::<StatusResponse>(response)
            .await?
            .into_result()
    }

    async fn results(&self, job: &JobId) -> Result<ResultSet, BackendError> {
        let response = self
            .client
            .get(self.url(&format!("results/{}", job)))
            .send()
            .await?;
        Self::parse_response::<ResultsResponse>(response)
            .await?
            .into_result()
    }

    async fn export_csv(&self, job: &JobId) -> Result<Vec<u8>, BackendError> {
        let response = self
            .client
            .get(self.url(&format!("export-csv/{}", job)))
            .send()
            .await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn hardware_info(&self) -> Result<HardwareInfo, BackendError> {
        let response = self.client.get(self.url("hardware-info")).send().await?;
        Self::parse_response(response).await
    }

    async fn save_regions(&self, regions: &[RegionPayload]) -> Result<(), BackendError> {
        let body = SaveRegionsRequest {
            areas: regions.to_vec(),
        };
        let response = self
            .client
            .post(self.url("save_areas"))
            .json(&body)
            .send()
            .await?;
        Self::parse_response::<AckResponse>(response)
            .await?
            .into_result()
    }

    async fn jobs(&self) -> Result<BTreeMap<JobId, JobSummary>, BackendError> {
        let response = self.client.get(self.url("jobs")).send().await?;
        Self::parse_response::<JobsResponse>(response)
            .await?
            .into_result()
    }

    async fn cleanup(&self, job: &JobId) -> Result<(), BackendError> {
        let response = self
            .client
            .delete(self.url(&format!("cleanup/{}", job)))
            .send()
            .await?;
        Self::parse_response::<AckResponse>(response)
            .await?
            .into_result()
    }
}
