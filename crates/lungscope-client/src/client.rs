use std::sync::Arc;

use serde_json::Value;

use crate::config::{InferenceConfig, TransportKind};
use crate::error::InferenceError;
use crate::image::ImageBlob;
use crate::schemas::Prediction;
use crate::space::{HttpSpaceApi, SpaceRoutes};
use crate::transport::{
    GradioConnector, InferenceTransport, QueuedTransport, RestTransport, RpcTransport,
};

/// Entry point for predictions.
///
/// The client owns exactly one [`InferenceTransport`], chosen when it is
/// built. It keeps no per-call state and can be cloned and shared across
/// threads; concurrent calls complete in no particular order.
#[derive(Clone)]
pub struct InferenceClient {
    transport: Arc<dyn InferenceTransport>,
}

impl std::fmt::Debug for InferenceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceClient")
            .field("transport", &self.transport.kind())
            .finish()
    }
}

impl InferenceClient {
    /// Builds the transport selected by `config`. Fails if a setting it
    /// requires is missing. Performs no network I/O.
    pub fn from_config(config: &InferenceConfig) -> Result<Self, InferenceError> {
        config.validate()?;

        let transport: Arc<dyn InferenceTransport> = match config.transport {
            TransportKind::Rest => Arc::new(RestTransport::new(
                required(&config.api_base)?,
                config.request_timeout,
            )?),
            TransportKind::Queued => {
                let routes = SpaceRoutes::new(required(&config.space_url)?, "")?;
                let space =
                    HttpSpaceApi::new(routes, config.request_timeout, config.stream_timeout)?;
                Arc::new(QueuedTransport::new(
                    Arc::new(space),
                    config.api_name.clone(),
                    config.fn_index,
                    config.stream_timeout,
                ))
            }
            TransportKind::Rpc => Arc::new(RpcTransport::new(
                Arc::new(GradioConnector::new(
                    config.request_timeout,
                    config.stream_timeout,
                )),
                required(&config.space_id)?,
                config.api_name.clone(),
                config.api_param.clone(),
            )?),
        };

        log::debug!("Inference client using {} transport", config.transport);
        Ok(Self { transport })
    }

    /// Builds a client from the process environment.
    pub fn from_env() -> Result<Self, InferenceError> {
        Self::from_config(&InferenceConfig::from_env()?)
    }

    pub fn with_transport(transport: impl InferenceTransport + 'static) -> Self {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub fn transport_kind(&self) -> TransportKind {
        self.transport.kind()
    }

    /// Runs one prediction. `None` means no image was selected and fails
    /// without touching the network.
    pub fn predict(&self, image: Option<&ImageBlob>) -> Result<Prediction, InferenceError> {
        let image = image.ok_or_else(|| InferenceError::Input("No file selected.".to_string()))?;
        self.transport.predict(image)
    }

    /// Asks the backend to describe itself. Only runs when called.
    pub fn describe_remote_api(&self) -> Result<Value, InferenceError> {
        self.transport.describe_remote_api()
    }
}

fn required(value: &Option<String>) -> Result<&str, InferenceError> {
    value
        .as_deref()
        .ok_or_else(|| InferenceError::Configuration("Missing required setting".to_string()))
}
