//! Values exchanged with the inference backends and handed to callers.
//!
//! - [`Prediction`] is what [`crate::InferenceClient::predict`] returns.
//! - [`PrimaryResult`] is the tagged view of the model output.
//! - [`UploadedFileHandle`] and [`JobHandle`] only live for one queued call.

use std::collections::BTreeMap;

use derive_new::new;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Key under which backends report the designated class.
pub const PREDICTED_CLASS_KEY: &str = "predicted_class";

/// Type discriminator the hosting platform expects on file references.
pub const FILE_DATA_TYPE: &str = "gradio.FileData";

/// Result of one prediction call.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// The backend result as received (REST/queued) or merged with `primary` (RPC).
    pub raw: Value,
    pub primary: PrimaryResult,
}

impl Prediction {
    /// Builds a prediction whose primary value is parsed from the whole payload.
    pub fn from_raw(raw: Value) -> Self {
        let primary = PrimaryResult::from_value(&raw);
        Self { raw, primary }
    }

    /// The class probabilities, when the backend returned a distribution.
    pub fn distribution(&self) -> Option<&NormalizedResult> {
        match &self.primary {
            PrimaryResult::Distribution(dist) => Some(dist),
            _ => None,
        }
    }
}

/// The shapes a model output is known to take.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimaryResult {
    /// A bare class label.
    Label(String),
    /// A label with a single confidence score.
    Labeled { label: String, confidence: f64 },
    /// A full per-class probability distribution.
    Distribution(NormalizedResult),
    /// Anything else; callers fall back to the raw JSON.
    Unrecognized(Value),
}

impl PrimaryResult {
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(label) => PrimaryResult::Label(label.clone()),
            Value::Object(map) => Self::from_object(map)
                .unwrap_or_else(|| PrimaryResult::Unrecognized(value.clone())),
            other => PrimaryResult::Unrecognized(other.clone()),
        }
    }

    fn from_object(map: &Map<String, Value>) -> Option<Self> {
        let label = map.get("label").and_then(Value::as_str);

        if let (Some(label), Some(confidence)) =
            (label, map.get("confidence").and_then(Value::as_f64))
        {
            return Some(PrimaryResult::Labeled {
                label: label.to_string(),
                confidence,
            });
        }

        // Label component output: {"label": .., "confidences": [{"label", "confidence"}]}
        if let (Some(label), Some(Value::Array(entries))) = (label, map.get("confidences")) {
            let probabilities = entries
                .iter()
                .filter_map(|entry| {
                    let name = entry.get("label")?.as_str()?;
                    let p = entry.get("confidence")?.as_f64()?;
                    Some((name.to_string(), p))
                })
                .collect::<BTreeMap<_, _>>();
            return Some(PrimaryResult::Distribution(NormalizedResult::new(
                label.to_string(),
                probabilities,
            )));
        }

        NormalizedResult::from_map(map).map(PrimaryResult::Distribution)
    }
}

/// Per-class probabilities plus the designated class.
#[derive(new, Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedResult {
    pub predicted_class: String,
    pub probabilities: BTreeMap<String, f64>,
}

impl NormalizedResult {
    /// Reads `{"<class>": p, ..., "predicted_class": "<class>"}`. Without an
    /// explicit `predicted_class` the most probable class is designated.
    pub fn from_map(map: &Map<String, Value>) -> Option<Self> {
        let probabilities = map
            .iter()
            .filter(|(key, _)| key.as_str() != PREDICTED_CLASS_KEY)
            .filter_map(|(key, value)| value.as_f64().map(|p| (key.clone(), p)))
            .collect::<BTreeMap<_, _>>();

        if probabilities.is_empty() {
            return None;
        }

        let predicted_class = match map.get(PREDICTED_CLASS_KEY).and_then(Value::as_str) {
            Some(class) => class.to_string(),
            None => argmax(&probabilities)?,
        };

        Some(Self {
            predicted_class,
            probabilities,
        })
    }

    /// Probability of the designated class, `0.0` when the backend omitted it.
    pub fn confidence(&self) -> f64 {
        self.probabilities
            .get(&self.predicted_class)
            .copied()
            .unwrap_or(0.0)
    }

    /// Classes ordered from most to least probable.
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut entries: Vec<_> = self
            .probabilities
            .iter()
            .map(|(class, p)| (class.as_str(), *p))
            .collect();
        entries.sort_by(|a, b| b.1.total_cmp(&a.1));
        entries
    }
}

fn argmax(probabilities: &BTreeMap<String, f64>) -> Option<String> {
    let mut best: Option<(&String, f64)> = None;
    for (class, p) in probabilities {
        if best.is_none_or(|(_, top)| *p > top) {
            best = Some((class, *p));
        }
    }
    best.map(|(class, _)| class.clone())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMeta {
    #[serde(rename = "_type")]
    pub kind: String,
}

/// Server-side reference to an uploaded image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedFileHandle {
    pub path: String,
    pub url: String,
    pub orig_name: String,
    pub size: u64,
    pub mime_type: String,
    pub meta: FileMeta,
}

impl UploadedFileHandle {
    pub fn new(
        path: String,
        url: String,
        orig_name: String,
        size: u64,
        mime_type: String,
    ) -> Self {
        Self {
            path,
            url,
            orig_name,
            size,
            mime_type,
            meta: FileMeta {
                kind: FILE_DATA_TYPE.to_string(),
            },
        }
    }
}

/// Identifier of an enqueued job, valid until its stream reaches a terminal event.
#[derive(new, Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub event_id: String,
}

#[derive(Debug, Serialize)]
pub struct EnqueueRequestSchema {
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fn_index: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct EnqueueResponseSchema {
    pub event_id: Option<String>,
}

/// Body of `GET /health` on the REST backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub model_version: Option<String>,
}
