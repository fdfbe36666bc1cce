use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use strum::Display;

use super::InferenceTransport;
use crate::config::TransportKind;
use crate::error::InferenceError;
use crate::image::ImageBlob;
use crate::schemas::Prediction;
use crate::space::{SpaceApi, await_completion};

/// Stages of one queued prediction, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum QueuedStage {
    Idle,
    Uploading,
    Enqueuing,
    Streaming,
    Completed,
    Failed,
}

/// Upload, enqueue, then wait on the job's event stream.
#[derive(Clone)]
pub struct QueuedTransport {
    space: Arc<dyn SpaceApi>,
    api_name: String,
    fn_index: u32,
    stream_timeout: Option<Duration>,
}

impl QueuedTransport {
    pub fn new(
        space: Arc<dyn SpaceApi>,
        api_name: impl Into<String>,
        fn_index: u32,
        stream_timeout: Option<Duration>,
    ) -> Self {
        Self {
            space,
            api_name: api_name.into(),
            fn_index,
            stream_timeout,
        }
    }

    fn run(&self, image: &ImageBlob, stage: &mut QueuedStage) -> Result<Value, InferenceError> {
        advance(stage, QueuedStage::Uploading);
        let handle = self.space.upload(image)?;

        advance(stage, QueuedStage::Enqueuing);
        let data = Value::Array(vec![serde_json::to_value(&handle).map_err(|e| {
            InferenceError::Enqueue(format!("Cannot encode file reference: {e}"))
        })?]);
        let job = self.space.enqueue(&self.api_name, data, Some(self.fn_index))?;

        advance(stage, QueuedStage::Streaming);
        let reader = self.space.open_stream(&self.api_name, &job)?;
        let payload = await_completion(reader, self.stream_timeout)?;

        advance(stage, QueuedStage::Completed);
        Ok(extract_result(payload))
    }
}

fn advance(stage: &mut QueuedStage, next: QueuedStage) {
    log::debug!("queued prediction: {stage} -> {next}");
    *stage = next;
}

/// `payload.data[0]`, else `payload.data`, else the payload itself.
pub(crate) fn extract_result(payload: Value) -> Value {
    match payload {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(mut items)) if !items.is_empty() => items.swap_remove(0),
            Some(data) => data,
            None => Value::Object(map),
        },
        other => other,
    }
}

impl InferenceTransport for QueuedTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Queued
    }

    fn predict(&self, image: &ImageBlob) -> Result<Prediction, InferenceError> {
        let mut stage = QueuedStage::Idle;
        match self.run(image, &mut stage) {
            Ok(raw) => Ok(Prediction::from_raw(raw)),
            Err(e) => {
                log::debug!("queued prediction failed while {stage}: {e}");
                advance(&mut stage, QueuedStage::Failed);
                Err(e)
            }
        }
    }

    fn describe_remote_api(&self) -> Result<Value, InferenceError> {
        self.space.api_info()
    }
}

#[cfg(test)]
mod tests;
