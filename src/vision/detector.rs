//! Object detection client
//!
//! The detection model runs out of process behind a small HTTP inference API:
//! `GET /labels` returns the class-id to name mapping and `POST /detect`
//! returns boxes for one frame.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::Frame;
use crate::{Error, Result};

/// Axis-aligned box in frame pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// One detected object
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Class name, e.g. "person"
    pub label: String,
    /// Location in the frame
    pub bbox: BoundingBox,
    /// Detector confidence in `[0, 1]`
    pub confidence: f32,
}

/// Runs object detection on frames
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    /// Detect objects in a frame
    ///
    /// # Errors
    ///
    /// Returns error if the detector fails on this frame
    async fn detect(&self, frame: &Frame) -> Result<Vec<Detection>>;
}

/// Request body for `POST /detect`
#[derive(Debug, Serialize)]
struct DetectRequest<'a> {
    width: u32,
    height: u32,
    encoding: &'a str,
    image: String,
}

/// Response body of `POST /detect`
#[derive(Debug, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    detections: Vec<RawDetection>,
}

#[derive(Debug, Deserialize)]
struct RawDetection {
    class_id: u32,
    bbox: [f32; 4],
    confidence: f32,
}

/// HTTP inference server client
pub struct HttpDetector {
    client: reqwest::Client,
    base_url: String,
    names: HashMap<u32, String>,
}

impl HttpDetector {
    /// Connect to the inference server and load its label mapping
    ///
    /// # Errors
    ///
    /// Returns `Error::Detector` if the server is unreachable or returns no labels
    pub async fn connect(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Detector(format!("failed to create HTTP client: {e}")))?;
        let base_url = base_url.trim_end_matches('/').to_string();

        let response = client
            .get(format!("{base_url}/labels"))
            .send()
            .await
            .map_err(|e| Error::Detector(format!("detector unreachable at {base_url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Detector(format!("label request failed {status}: {body}")));
        }

        let names: HashMap<u32, String> = response
            .json()
            .await
            .map_err(|e| Error::Detector(format!("malformed label mapping: {e}")))?;

        if names.is_empty() {
            return Err(Error::Detector("detector reported no labels".to_string()));
        }

        tracing::info!(url = %base_url, labels = names.len(), "object detector loaded");

        Ok(Self {
            client,
            base_url,
            names,
        })
    }

    /// Resolve a class id to its name
    fn label_for(&self, class_id: u32) -> String {
        self.names
            .get(&class_id)
            .cloned()
            .unwrap_or_else(|| format!("class {class_id}"))
    }
}

#[async_trait]
impl ObjectDetector for HttpDetector {
    async fn detect(&self, frame: &Frame) -> Result<Vec<Detection>> {
        let request = DetectRequest {
            width: frame.width,
            height: frame.height,
            encoding: "rgb24",
            image: base64::engine::general_purpose::STANDARD.encode(&frame.pixels),
        };

        let response = self
            .client
            .post(format!("{}/detect", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Detector(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Detector(format!("detect failed {status}: {body}")));
        }

        let result: DetectResponse = response
            .json()
            .await
            .map_err(|e| Error::Detector(format!("malformed detect response: {e}")))?;

        let detections: Vec<Detection> = result
            .detections
            .into_iter()
            .map(|raw| {
                let [x1, y1, x2, y2] = raw.bbox;
                Detection {
                    label: self.label_for(raw.class_id),
                    bbox: BoundingBox { x1, y1, x2, y2 },
                    confidence: raw.confidence,
                }
            })
            .collect();

        tracing::trace!(frame = frame.index, count = detections.len(), "frame detected");
        Ok(detections)
    }
}
