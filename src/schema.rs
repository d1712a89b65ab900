//! Frame message wire schema.
//!
//! Pipeline stages exchange frame messages as serialized JSON. The selector
//! interprets the detection list and nothing else: every other field on the
//! message and on the individual detections is captured in a flattened map and
//! carried through untouched, so a forwarded message re-encodes to the same
//! value it was decoded from.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Codec failure surfaced to the surrounding pipeline.
///
/// Distinct from suppression: a suppressed message is a successful evaluation
/// that produced no output, a codec error is a per-message failure the
/// pipeline handles under its own skip or dead-letter policy.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("failed to decode frame message: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("failed to encode frame message: {0}")]
    Encode(#[source] serde_json::Error),
}

/// One frame's worth of detections plus opaque passthrough fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameMessage {
    /// Detections found in this frame, in detector order.
    #[serde(default)]
    pub detections: Vec<Detection>,

    /// Capture timestamp in milliseconds since the UNIX epoch, when the
    /// upstream stage provided one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_utc_ms: Option<u64>,

    /// Fields this stage does not interpret (image payload, source id, ...).
    /// Preserved verbatim for downstream stages.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single detection with its confidence and pixel-space bounding box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Detector confidence in 0.0..=1.0.
    pub confidence: f32,

    /// Pixel-space box the detection occupies.
    pub bounding_box: BoundingBox,

    /// Fields this stage does not interpret (class id, object id, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Axis-aligned bounding box in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
}

impl BoundingBox {
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }
}

impl FrameMessage {
    /// Decodes a frame message from its wire bytes.
    pub fn decode(bytes: &[u8]) -> Result<Self, CodecError> {
        serde_json::from_slice(bytes).map_err(CodecError::Decode)
    }

    /// Encodes the message back to wire bytes.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(self).map_err(CodecError::Encode)
    }
}
