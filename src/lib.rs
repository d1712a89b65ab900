//! Detection selector pipeline stage.
//!
//! This crate implements a single filtering stage for a video analytics
//! pipeline. Each incoming frame message carries the detections found in one
//! video frame; the selector decides whether the message is notable enough to
//! forward downstream, and either passes the bytes through unchanged or
//! suppresses them.
//!
//! A message is forwarded when any of the following holds:
//!
//! 1. **Below-threshold detection**: some detection falls below the configured
//!    confidence, width, or height thresholds.
//! 2. **Over quota**: the frame carries more detections than `max_detections`.
//! 3. **Periodic passthrough**: the configured interval has elapsed since the
//!    last timer-triggered forward.
//!
//! Everything above threshold and within quota is routine and is suppressed.
//! The polarity matters: the thresholds select *notable* messages for
//! forwarding, they do not discard bad detections.
//!
//! # Module Structure
//!
//! - `config`: selector configuration (file + environment) and the period grammar
//! - `schema`: frame message wire schema and codec
//! - `selector`: the filtering decision and the periodic-passthrough timer
//! - `transport`: MQTT endpoint plumbing for the `selectord` bridge

pub mod config;
pub mod schema;
pub mod selector;
pub mod transport;

pub use config::{parse_period, ConfigError, SelectorConfig};
pub use schema::{BoundingBox, CodecError, Detection, FrameMessage};
pub use selector::DetectionSelector;
