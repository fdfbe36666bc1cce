//! Client for the lung histopathology classifier.
//!
//! A [`InferenceClient`] sends one image to a remote backend and returns a
//! [`Prediction`]. The backend protocol is picked once from
//! [`InferenceConfig`]:
//!
//! - [`TransportKind::Rest`]: one multipart POST to `{base}/predict`.
//! - [`TransportKind::Queued`]: upload, enqueue, then follow an event stream.
//! - [`TransportKind::Rpc`]: connect to a hosted app and negotiate the call shape.

mod client;
pub mod config;
pub mod error;
mod http;
pub mod image;
pub mod schemas;
pub mod space;
pub mod sse;
pub mod transport;

pub use client::InferenceClient;
pub use config::{InferenceConfig, TransportKind};
pub use error::{ErrorKind, InferenceError};
pub use image::ImageBlob;
pub use schemas::{NormalizedResult, Prediction, PrimaryResult};
