use std::io::Cursor;
use std::sync::Mutex;

use serde_json::json;

use super::*;
use crate::error::ErrorKind;
use crate::schemas::{JobHandle, UploadedFileHandle};
use crate::space::{EventReader, SpaceRoutes};

const SPACE: &str = "https://me-lungs.hf.space";

struct FakeSpace {
    upload_path: Option<&'static str>,
    event_id: Option<&'static str>,
    stream: &'static str,
    calls: Mutex<Vec<String>>,
    enqueued: Mutex<Option<(String, Value, Option<u32>)>>,
}

impl FakeSpace {
    fn new(stream: &'static str) -> Self {
        Self {
            upload_path: Some("/tmp/a.png"),
            event_id: Some("e1"),
            stream,
            calls: Mutex::new(Vec::new()),
            enqueued: Mutex::new(None),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl SpaceApi for FakeSpace {
    fn upload(&self, image: &ImageBlob) -> Result<UploadedFileHandle, InferenceError> {
        self.calls.lock().unwrap().push("upload".into());
        let path = self
            .upload_path
            .ok_or_else(|| InferenceError::Upload("Upload response did not contain a file path".into()))?;
        let routes = SpaceRoutes::new(SPACE, "")?;
        Ok(UploadedFileHandle::new(
            path.to_string(),
            routes.file_url(path),
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
        self.calls.lock().unwrap().push("enqueue".into());
        *self.enqueued.lock().unwrap() = Some((api_name.to_string(), data, fn_index));
        self.event_id
            .map(|id| JobHandle::new(id.to_string()))
            .ok_or_else(|| InferenceError::Enqueue("Response did not contain an event_id".into()))
    }

    fn open_stream(&self, api_name: &str, job: &JobHandle) -> Result<EventReader, InferenceError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("stream {api_name} {}", job.event_id));
        Ok(Box::new(Cursor::new(self.stream.as_bytes().to_vec())))
    }

    fn api_info(&self) -> Result<Value, InferenceError> {
        Ok(json!({"named_endpoints": {"/predict": {"parameters": []}}}))
    }
}

fn image() -> ImageBlob {
    ImageBlob::new(vec![1, 2, 3, 4], "a.png", "image/png").unwrap()
}

fn transport(space: Arc<FakeSpace>) -> QueuedTransport {
    QueuedTransport::new(space, "/predict", 2, None)
}

#[test]
fn end_to_end_resolves_first_data_element() {
    let space = Arc::new(FakeSpace::new(
        "event: generating\ndata: null\n\n\
         event: complete\n\
         data: {\"data\":[{\"lung_n\":0.95,\"lung_aca\":0.03,\"lung_scc\":0.02,\"predicted_class\":\"lung_n\"}]}\n\n",
    ));

    let prediction = transport(space.clone()).predict(&image()).unwrap();

    assert_eq!(
        prediction.raw,
        json!({"lung_n": 0.95, "lung_aca": 0.03, "lung_scc": 0.02, "predicted_class": "lung_n"})
    );
    let dist = prediction.distribution().unwrap();
    assert_eq!(dist.predicted_class, "lung_n");
    assert_eq!(dist.confidence(), 0.95);
    assert_eq!(
        space.calls(),
        vec!["upload", "enqueue", "stream /predict e1"]
    );
}

#[test]
fn enqueue_payload_carries_file_handle_and_fn_index() {
    let space = Arc::new(FakeSpace::new("event: complete\ndata: {\"data\":[\"lung_n\"]}\n\n"));
    transport(space.clone()).predict(&image()).unwrap();

    let (api_name, data, fn_index) = space.enqueued.lock().unwrap().clone().unwrap();
    assert_eq!(api_name, "/predict");
    assert_eq!(fn_index, Some(2));
    assert_eq!(data[0]["path"], "/tmp/a.png");
    assert_eq!(data[0]["url"], format!("{SPACE}/gradio_api/file=/tmp/a.png"));
    assert_eq!(data[0]["orig_name"], "a.png");
    assert_eq!(data[0]["size"], 4);
    assert_eq!(data[0]["mime_type"], "image/png");
    assert_eq!(data[0]["meta"]["_type"], "gradio.FileData");
}

#[test]
fn missing_upload_path_stops_before_enqueue() {
    let mut fake = FakeSpace::new("");
    fake.upload_path = None;
    let space = Arc::new(fake);

    let err = transport(space.clone()).predict(&image()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Upload);
    assert_eq!(space.calls(), vec!["upload"]);
}

#[test]
fn missing_event_id_stops_before_streaming() {
    let mut fake = FakeSpace::new("");
    fake.event_id = None;
    let space = Arc::new(fake);

    let err = transport(space.clone()).predict(&image()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Enqueue);
    assert_eq!(space.calls(), vec!["upload", "enqueue"]);
}

#[test]
fn stream_ending_without_terminal_event_fails() {
    let space = Arc::new(FakeSpace::new("event: generating\ndata: null\n\n"));
    let err = transport(space).predict(&image()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StreamTerminated);
}

#[test]
fn error_event_fails_with_remote_message() {
    let space = Arc::new(FakeSpace::new(
        "event: error\ndata: {\"message\":\"Could not decode image\"}\n\n",
    ));
    let err = transport(space).predict(&image()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Remote);
    assert!(err.to_string().contains("Could not decode image"));
}

#[test]
fn describe_remote_api_returns_declared_api() {
    let space = Arc::new(FakeSpace::new(""));
    let info = transport(space.clone()).describe_remote_api().unwrap();
    assert!(info["named_endpoints"]["/predict"].is_object());
    assert!(space.calls().is_empty());
}

#[test]
fn result_extraction_prefers_first_data_element() {
    assert_eq!(extract_result(json!({"data": ["a", "b"]})), json!("a"));
    assert_eq!(extract_result(json!({"data": {"k": 1}})), json!({"k": 1}));
    assert_eq!(extract_result(json!({"data": []})), json!([]));
    assert_eq!(extract_result(json!({"lung_n": 1.0})), json!({"lung_n": 1.0}));
    assert_eq!(extract_result(json!(["x"])), json!(["x"]));
}
