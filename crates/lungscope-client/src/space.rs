//! HTTP surface of a hosted demo app: file upload, queued calls and their
//! event streams, plus the declared-API and config documents.

use std::io::Read;
use std::time::Duration;

use reqwest::header::ACCEPT;
use serde_json::Value;
use url::Url;

use crate::error::InferenceError;
use crate::http::{ResponseExt, build_http_client, is_timeout, join, parse_base_url};
use crate::image::ImageBlob;
use crate::schemas::{EnqueueRequestSchema, EnqueueResponseSchema, JobHandle, UploadedFileHandle};
use crate::sse::{SseEvent, SseParser};

const READ_CHUNK: usize = 8 * 1024;

/// Byte stream of an event channel.
pub type EventReader = Box<dyn Read + Send>;

/// The three queued-call operations plus the declared-API lookup.
pub trait SpaceApi: Send + Sync {
    fn upload(&self, image: &ImageBlob) -> Result<UploadedFileHandle, InferenceError>;
    fn enqueue(
        &self,
        api_name: &str,
        data: Value,
        fn_index: Option<u32>,
    ) -> Result<JobHandle, InferenceError>;
    fn open_stream(&self, api_name: &str, job: &JobHandle) -> Result<EventReader, InferenceError>;
    fn api_info(&self) -> Result<Value, InferenceError>;
}

/// Route layout of a hosted app.
#[derive(Debug, Clone)]
pub struct SpaceRoutes {
    root: Url,
    api_prefix: String,
}

impl SpaceRoutes {
    pub fn new(root: &str, api_prefix: &str) -> Result<Self, InferenceError> {
        Ok(Self {
            root: parse_base_url(root, "space URL")?,
            api_prefix: api_prefix.trim_matches('/').to_string(),
        })
    }

    pub fn root(&self) -> &str {
        self.root.as_str().trim_end_matches('/')
    }

    fn api(&self, path: &str) -> Result<Url, InferenceError> {
        if self.api_prefix.is_empty() {
            join(&self.root, path)
        } else {
            join(&self.root, &format!("{}/{path}", self.api_prefix))
        }
    }

    pub fn upload(&self) -> Result<Url, InferenceError> {
        self.api("upload")
    }

    pub fn call(&self, api_name: &str) -> Result<Url, InferenceError> {
        self.api(&format!("call/{}", endpoint_name(api_name)))
    }

    pub fn stream(&self, api_name: &str, job: &JobHandle) -> Result<Url, InferenceError> {
        self.api(&format!("call/{}/{}", endpoint_name(api_name), job.event_id))
    }

    pub fn info(&self) -> Result<Url, InferenceError> {
        self.api("info")
    }

    pub fn config(&self) -> Result<Url, InferenceError> {
        join(&self.root, "config")
    }

    /// Download URL of an uploaded file.
    pub fn file_url(&self, path: &str) -> String {
        format!("{}/gradio_api/file={path}", self.root())
    }
}

fn endpoint_name(api_name: &str) -> &str {
    api_name.trim_matches('/')
}

/// [`SpaceApi`] over blocking reqwest.
#[derive(Debug, Clone)]
pub struct HttpSpaceApi {
    http: reqwest::blocking::Client,
    stream_http: reqwest::blocking::Client,
    routes: SpaceRoutes,
}

impl HttpSpaceApi {
    pub fn new(
        routes: SpaceRoutes,
        request_timeout: Duration,
        stream_timeout: Option<Duration>,
    ) -> Result<Self, InferenceError> {
        Ok(Self {
            http: build_http_client(Some(request_timeout))?,
            stream_http: build_http_client(stream_timeout)?,
            routes,
        })
    }

    pub fn routes(&self) -> &SpaceRoutes {
        &self.routes
    }

    /// Fetches the app's `config` document.
    pub fn fetch_config(&self) -> Result<Value, InferenceError> {
        let url = self.routes.config()?;
        self.get_json(url)
            .map_err(|e| InferenceError::Remote(format!("Could not fetch app config: {e}")))
    }

    fn get_json(&self, url: Url) -> Result<Value, String> {
        self.http
            .get(url)
            .send()
            .map_err(|e| e.to_string())?
            .error_for_status_with_body()
            .map_err(|(status, body)| format!("{status}: {body}"))?
            .json::<Value>()
            .map_err(|e| e.to_string())
    }
}

impl SpaceApi for HttpSpaceApi {
    fn upload(&self, image: &ImageBlob) -> Result<UploadedFileHandle, InferenceError> {
        let url = self.routes.upload()?;
        log::debug!("Uploading {} ({} bytes) to {url}", image.filename(), image.size());

        let form = reqwest::blocking::multipart::Form::new().part("files", image.to_part()?);
        let body = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .map_err(|e| InferenceError::Upload(e.to_string()))?
            .error_for_status_with_body()
            .map_err(|(status, body)| InferenceError::Upload(format!("{status}: {body}")))?
            .json::<Value>()
            .map_err(|e| InferenceError::Upload(format!("Invalid upload response: {e}")))?;

        let path = body
            .get(0)
            .and_then(Value::as_str)
            .ok_or_else(|| {
                InferenceError::Upload(format!("Upload response did not contain a file path: {body}"))
            })?;

        Ok(UploadedFileHandle::new(
            path.to_string(),
            self.routes.file_url(path),
            image.filename().to_string(),
            image.size(),
            image.mime_type().to_string(),
        ))
    }

    fn enqueue(
        &self,
        api_name: &str,
        data: Value,
        fn_index: Option<u32>,
    ) -> Result<JobHandle, InferenceError> {
        let url = self.routes.call(api_name)?;
        log::debug!("Enqueuing call to {url}");

        let response = self
            .http
            .post(url)
            .json(&EnqueueRequestSchema { data, fn_index })
            .send()
            .map_err(|e| InferenceError::Enqueue(e.to_string()))?
            .error_for_status_with_body()
            .map_err(|(status, body)| InferenceError::Enqueue(format!("{status}: {body}")))?
            .json::<EnqueueResponseSchema>()
            .map_err(|e| InferenceError::Enqueue(format!("Invalid enqueue response: {e}")))?;

        response
            .event_id
            .map(JobHandle::new)
            .ok_or_else(|| InferenceError::Enqueue("Response did not contain an event_id".into()))
    }

    fn open_stream(&self, api_name: &str, job: &JobHandle) -> Result<EventReader, InferenceError> {
        let url = self.routes.stream(api_name, job)?;
        log::debug!("Opening event stream {url}");

        let response = self
            .stream_http
            .get(url)
            .header(ACCEPT, "text/event-stream")
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Remote(format!("Timed out opening event stream: {e}"))
                } else {
                    InferenceError::Remote(format!("Could not open event stream: {e}"))
                }
            })?
            .error_for_status_with_body()
            .map_err(|(status, body)| InferenceError::Api { status, body })?;

        Ok(Box::new(response))
    }

    fn api_info(&self) -> Result<Value, InferenceError> {
        let url = self.routes.info()?;
        self.get_json(url)
            .map_err(|e| InferenceError::Remote(format!("Could not fetch the declared API: {e}")))
    }
}

/// Reads `reader` until a terminal event and returns the `complete` payload.
pub fn await_completion(
    mut reader: impl Read,
    timeout: Option<Duration>,
) -> Result<Value, InferenceError> {
    let mut parser = SseParser::new();
    let mut buf = vec![0u8; READ_CHUNK];

    loop {
        let read = match reader.read(&mut buf) {
            Ok(0) => {
                log::debug!(
                    "Event stream closed with {} unterminated bytes",
                    parser.pending()
                );
                return Err(InferenceError::StreamTerminated);
            }
            Ok(read) => read,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) if is_timeout(&e) => {
                return Err(InferenceError::StreamTimeout(timeout.unwrap_or_default()));
            }
            Err(e) => return Err(InferenceError::Remote(format!("Event stream failed: {e}"))),
        };

        for event in parser.feed(&buf[..read]) {
            if let Some(payload) = terminal_payload(event)? {
                return Ok(payload);
            }
        }
    }
}

fn terminal_payload(event: SseEvent) -> Result<Option<Value>, InferenceError> {
    match event.kind() {
        "complete" => serde_json::from_str(&event.data)
            .map(Some)
            .map_err(|e| InferenceError::Remote(format!("Malformed completion payload: {e}"))),
        "error" => Err(InferenceError::Remote(error_message(&event.data))),
        other => {
            log::trace!("Skipping `{other}` event");
            Ok(None)
        }
    }
}

fn error_message(data: &str) -> String {
    match serde_json::from_str::<Value>(data) {
        Ok(payload) => payload
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| payload.to_string()),
        Err(_) if data.trim().is_empty() => {
            "The remote app reported an error without details".to_string()
        }
        Err(_) => data.to_string(),
    }
}
