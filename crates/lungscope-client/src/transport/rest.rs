use std::time::Duration;

use serde_json::Value;
use url::Url;

use super::InferenceTransport;
use crate::config::TransportKind;
use crate::error::InferenceError;
use crate::http::{ResponseExt, build_http_client, join, parse_base_url};
use crate::image::ImageBlob;
use crate::schemas::{HealthStatus, Prediction};

/// Multipart field the prediction endpoint reads the image from.
pub const FILE_FIELD: &str = "file";

/// Direct multipart POST to `{base}/predict`.
#[derive(Debug, Clone)]
pub struct RestTransport {
    http: reqwest::blocking::Client,
    base_url: Url,
}

impl RestTransport {
    pub fn new(base_url: &str, request_timeout: Duration) -> Result<Self, InferenceError> {
        Ok(Self {
            http: build_http_client(Some(request_timeout))?,
            base_url: parse_base_url(base_url, crate::config::ENV_API_BASE)?,
        })
    }

    /// Check if the prediction server is up and which model it serves.
    pub fn health(&self) -> Result<HealthStatus, InferenceError> {
        let url = join(&self.base_url, "health")?;
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|e| InferenceError::Remote(e.to_string()))?
            .error_for_status_with_body()
            .map_err(|(status, body)| InferenceError::Api { status, body })?;

        response
            .json::<HealthStatus>()
            .map_err(|e| InferenceError::Remote(format!("Invalid health response: {e}")))
    }
}

impl InferenceTransport for RestTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Rest
    }

    fn predict(&self, image: &ImageBlob) -> Result<Prediction, InferenceError> {
        let url = join(&self.base_url, "predict")?;
        log::info!("POST {url} ({}, {} bytes)", image.filename(), image.size());

        let form = reqwest::blocking::multipart::Form::new().part(FILE_FIELD, image.to_part()?);
        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .map_err(|e| InferenceError::Remote(e.to_string()))?
            .error_for_status_with_body()
            .map_err(|(status, body)| InferenceError::Api { status, body })?;

        let raw = response
            .json::<Value>()
            .map_err(|e| InferenceError::Remote(format!("Invalid prediction response: {e}")))?;

        Ok(Prediction::from_raw(raw))
    }

    fn describe_remote_api(&self) -> Result<Value, InferenceError> {
        let health = self.health()?;
        serde_json::to_value(health)
            .map_err(|e| InferenceError::Remote(format!("Invalid health response: {e}")))
    }
}
