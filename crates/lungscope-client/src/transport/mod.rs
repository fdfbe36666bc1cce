mod queued;
mod rest;
mod rpc;

pub use queued::{QueuedStage, QueuedTransport};
pub use rest::RestTransport;
pub use rpc::{CallArgs, Connect, GradioApp, GradioConnector, RemoteApp, RpcTransport};

use serde_json::Value;

use crate::config::TransportKind;
use crate::error::InferenceError;
use crate::image::ImageBlob;
use crate::schemas::Prediction;

/// One protocol binding to a remote inference backend.
pub trait InferenceTransport: Send + Sync {
    fn kind(&self) -> TransportKind;

    /// Runs one prediction. Implementations keep no state between calls.
    fn predict(&self, image: &ImageBlob) -> Result<Prediction, InferenceError>;

    /// Describes the remote side for diagnostics. Never called implicitly.
    fn describe_remote_api(&self) -> Result<Value, InferenceError>;
}
