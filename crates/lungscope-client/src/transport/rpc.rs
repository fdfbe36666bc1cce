use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use super::InferenceTransport;
use crate::config::TransportKind;
use crate::error::InferenceError;
use crate::image::ImageBlob;
use crate::schemas::{Prediction, PrimaryResult, UploadedFileHandle};
use crate::space::{HttpSpaceApi, SpaceApi, SpaceRoutes, await_completion};

/// Argument conventions a remote procedure may expect.
#[derive(Debug, Clone, PartialEq)]
pub enum CallArgs {
    Positional(Vec<Value>),
    Named(Map<String, Value>),
}

/// A connected remote app.
pub trait RemoteApp: Send {
    fn upload(&self, image: &ImageBlob) -> Result<UploadedFileHandle, InferenceError>;

    /// Invokes `api_name` and returns the response object (`{"data": .., ..}`).
    fn call(&self, api_name: &str, args: &CallArgs) -> Result<Value, InferenceError>;

    fn describe_api(&self) -> Result<Value, InferenceError>;
}

/// Opens a [`RemoteApp`] from an identifier.
pub trait Connect: Send + Sync {
    fn connect(&self, identifier: &str) -> Result<Box<dyn RemoteApp>, InferenceError>;
}

/// Connects per call and tries a positional then a named argument convention.
#[derive(Clone)]
pub struct RpcTransport {
    connector: Arc<dyn Connect>,
    identifier: String,
    api_name: String,
    api_param: String,
}

impl RpcTransport {
    pub fn new(
        connector: Arc<dyn Connect>,
        identifier: impl Into<String>,
        api_name: impl Into<String>,
        api_param: impl Into<String>,
    ) -> Result<Self, InferenceError> {
        let identifier = identifier.into();
        if identifier.trim().is_empty() {
            return Err(InferenceError::Configuration(format!(
                "{} is not set. Set it to the remote app identifier, e.g. owner/name.",
                crate::config::ENV_SPACE_ID
            )));
        }
        Ok(Self {
            connector,
            identifier,
            api_name: api_name.into(),
            api_param: api_param.into(),
        })
    }

    fn negotiate(&self, app: &dyn RemoteApp, file: Value) -> Result<Value, InferenceError> {
        let positional = CallArgs::Positional(vec![file.clone()]);
        let positional_err = match app.call(&self.api_name, &positional) {
            Ok(response) => return Ok(response),
            Err(e) => e,
        };
        log::warn!(
            "Positional call to {} failed ({positional_err}); retrying with named argument `{}`",
            self.api_name,
            self.api_param
        );

        let mut named = Map::new();
        named.insert(self.api_param.clone(), file);
        app.call(&self.api_name, &CallArgs::Named(named))
            .map_err(|named_err| InferenceError::Negotiation {
                positional: positional_err.to_string(),
                named: named_err.to_string(),
            })
    }
}

/// Adds `primary = data[0]` next to the response fields when `data` is an array.
pub(crate) fn normalize_response(response: Value) -> Prediction {
    let primary_value = response
        .get("data")
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .cloned();

    match (primary_value, response) {
        (Some(primary), Value::Object(mut map)) => {
            let parsed = PrimaryResult::from_value(&primary);
            map.insert("primary".to_string(), primary);
            Prediction {
                raw: Value::Object(map),
                primary: parsed,
            }
        }
        (_, response) => Prediction::from_raw(response),
    }
}

impl InferenceTransport for RpcTransport {
    fn kind(&self) -> TransportKind {
        TransportKind::Rpc
    }

    fn predict(&self, image: &ImageBlob) -> Result<Prediction, InferenceError> {
        log::info!("Calling {} on {}", self.api_name, self.identifier);
        let app = self.connector.connect(&self.identifier)?;
        let handle = app.upload(image)?;
        let file = serde_json::to_value(&handle)
            .map_err(|e| InferenceError::Upload(format!("Cannot encode file reference: {e}")))?;

        let response = self.negotiate(app.as_ref(), file)?;
        Ok(normalize_response(response))
    }

    fn describe_remote_api(&self) -> Result<Value, InferenceError> {
        self.connector.connect(&self.identifier)?.describe_api()
    }
}

/// [`Connect`] for apps hosted behind the Gradio HTTP API.
#[derive(Debug, Clone)]
pub struct GradioConnector {
    request_timeout: Duration,
    stream_timeout: Option<Duration>,
}

impl GradioConnector {
    pub fn new(request_timeout: Duration, stream_timeout: Option<Duration>) -> Self {
        Self {
            request_timeout,
            stream_timeout,
        }
    }
}

impl Connect for GradioConnector {
    fn connect(&self, identifier: &str) -> Result<Box<dyn RemoteApp>, InferenceError> {
        let root = resolve_app_root(identifier)?;
        log::debug!("Connecting to {identifier} at {root}");

        let bootstrap = HttpSpaceApi::new(
            SpaceRoutes::new(&root, "")?,
            self.request_timeout,
            self.stream_timeout,
        )?;
        let config = bootstrap.fetch_config().map_err(|e| {
            InferenceError::Remote(format!("Could not connect to `{identifier}`: {e}"))
        })?;
        let api_prefix = config
            .get("api_prefix")
            .and_then(Value::as_str)
            .unwrap_or_default();

        let space = HttpSpaceApi::new(
            SpaceRoutes::new(&root, api_prefix)?,
            self.request_timeout,
            self.stream_timeout,
        )?;
        Ok(Box::new(GradioApp::new(space, self.stream_timeout)))
    }
}

/// Resolves `owner/name` to its hosted URL; full URLs pass through.
pub(crate) fn resolve_app_root(identifier: &str) -> Result<String, InferenceError> {
    let identifier = identifier.trim();
    if identifier.starts_with("http://") || identifier.starts_with("https://") {
        return Ok(identifier.trim_end_matches('/').to_string());
    }

    match identifier.split_once('/') {
        Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
            let subdomain = format!("{owner}-{name}")
                .to_ascii_lowercase()
                .replace(['_', '.'], "-");
            Ok(format!("https://{subdomain}.hf.space"))
        }
        _ => Err(InferenceError::Configuration(format!(
            "`{identifier}` is not a valid app identifier; expected owner/name or a URL."
        ))),
    }
}

/// A connected Gradio app.
pub struct GradioApp<S: SpaceApi> {
    space: S,
    stream_timeout: Option<Duration>,
}

impl<S: SpaceApi> GradioApp<S> {
    pub fn new(space: S, stream_timeout: Option<Duration>) -> Self {
        Self {
            space,
            stream_timeout,
        }
    }

    /// Orders named values by the parameter list the app declares for `api_name`.
    fn positions_for(
        &self,
        api_name: &str,
        named: &Map<String, Value>,
    ) -> Result<Vec<Value>, InferenceError> {
        let endpoint = format!("/{}", api_name.trim_matches('/'));
        let info = self.space.api_info()?;
        let parameters = info
            .get("named_endpoints")
            .and_then(|endpoints| endpoints.get(&endpoint))
            .and_then(|endpoint| endpoint.get("parameters"))
            .and_then(Value::as_array)
            .ok_or_else(|| {
                InferenceError::Remote(format!("The app does not declare an endpoint `{endpoint}`"))
            })?;

        if let Some(unknown) = named.keys().find(|key| {
            !parameters
                .iter()
                .any(|p| p.get("parameter_name").and_then(Value::as_str) == Some(key.as_str()))
        }) {
            return Err(InferenceError::Remote(format!(
                "`{api_name}` has no parameter named `{unknown}`"
            )));
        }

        parameters
            .iter()
            .map(|parameter| {
                let name = parameter
                    .get("parameter_name")
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                match named.get(name) {
                    Some(value) => Ok(value.clone()),
                    None if parameter.get("parameter_has_default").and_then(Value::as_bool)
                        == Some(true) =>
                    {
                        Ok(parameter
                            .get("parameter_default")
                            .cloned()
                            .unwrap_or(Value::Null))
                    }
                    None => Err(InferenceError::Remote(format!(
                        "Missing value for parameter `{name}` of `{api_name}`"
                    ))),
                }
            })
            .collect()
    }
}

impl<S: SpaceApi> RemoteApp for GradioApp<S> {
    fn upload(&self, image: &ImageBlob) -> Result<UploadedFileHandle, InferenceError> {
        self.space.upload(image)
    }

    fn call(&self, api_name: &str, args: &CallArgs) -> Result<Value, InferenceError> {
        let data = match args {
            CallArgs::Positional(values) => values.clone(),
            CallArgs::Named(named) => self.positions_for(api_name, named)?,
        };

        let job = self.space.enqueue(api_name, Value::Array(data), None)?;
        let reader = self.space.open_stream(api_name, &job)?;
        let payload = await_completion(reader, self.stream_timeout)?;

        Ok(match payload {
            Value::Object(map) if map.contains_key("data") => Value::Object(map),
            data => serde_json::json!({ "data": data, "endpoint": api_name }),
        })
    }

    fn describe_api(&self) -> Result<Value, InferenceError> {
        self.space.api_info()
    }
}
