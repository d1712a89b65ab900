//! The filtering decision and its periodic-passthrough timer.

use std::time::{Duration, Instant};

use crate::config::{parse_period, ConfigError, SelectorConfig};
use crate::schema::{CodecError, Detection, FrameMessage};

/// Decides, one frame message at a time, whether the message is notable
/// enough to forward downstream.
///
/// The selector holds a single piece of mutable state: the instant of the
/// last timer-triggered forward. Evaluation takes `&mut self`, so a selector
/// shared across pipeline workers must sit behind a `Mutex` (or stay owned by
/// one worker); unsynchronized sharing does not compile.
pub struct DetectionSelector {
    config: SelectorConfig,
    interval: Duration,
    last_forward: Instant,
}

impl DetectionSelector {
    /// Builds a selector from its configuration.
    ///
    /// Fails when `time_past` does not parse under the period grammar. The
    /// interval is fixed for the lifetime of the selector.
    pub fn new(config: SelectorConfig) -> Result<Self, ConfigError> {
        let interval = parse_period(&config.time_past)?;
        Ok(Self {
            config,
            interval,
            last_forward: Instant::now(),
        })
    }

    /// Evaluates one serialized frame message.
    ///
    /// Returns the re-encoded message when it is forwarded and `None` when it
    /// is suppressed. The message itself is never modified. Codec failures
    /// propagate to the caller; the pipeline's skip or dead-letter policy
    /// applies there, not in this stage.
    pub fn evaluate(&mut self, bytes: &[u8]) -> Result<Option<Vec<u8>>, CodecError> {
        let msg = FrameMessage::decode(bytes)?;
        if self.decide(&msg, Instant::now()) {
            log::debug!(
                "forwarding frame message with {} detections",
                msg.detections.len()
            );
            Ok(Some(msg.encode()?))
        } else {
            log::debug!(
                "suppressing frame message with {} detections",
                msg.detections.len()
            );
            Ok(None)
        }
    }

    /// The forward/suppress decision for one decoded message.
    ///
    /// A message with no detections is always suppressed; none of the
    /// criteria run for it, the timer included. Otherwise three independent
    /// criteria each mark the message for forwarding:
    ///
    /// - some detection falls below a confidence or size threshold,
    /// - the frame carries more detections than allowed,
    /// - the periodic-passthrough interval has elapsed.
    ///
    /// The criteria are computed as separate steps and combined afterwards:
    /// the count check is not skipped when the scan already matched, and the
    /// interval check runs on every call so its firing re-arms the timer.
    fn decide(&mut self, msg: &FrameMessage, now: Instant) -> bool {
        if msg.detections.is_empty() {
            return false;
        }
        let below_threshold = self.any_below_threshold(&msg.detections);
        let over_quota = msg.detections.len() > self.config.max_detections;
        let interval_elapsed = self.interval_elapsed(now);
        below_threshold || over_quota || interval_elapsed
    }

    /// Scans detections in order, stopping at the first one below the
    /// confidence, width, or height threshold.
    fn any_below_threshold(&self, detections: &[Detection]) -> bool {
        detections.iter().any(|detection| {
            detection.confidence < self.config.min_confidence
                || detection.bounding_box.width() < self.config.min_width
                || detection.bounding_box.height() < self.config.min_height
        })
    }

    /// Periodic-passthrough check.
    ///
    /// True once `interval` has elapsed since the last firing, at which point
    /// the timer re-arms from `now`. Only its own firing moves
    /// `last_forward`; content-triggered forwards leave it alone.
    fn interval_elapsed(&mut self, now: Instant) -> bool {
        if now.duration_since(self.last_forward) >= self.interval {
            self.last_forward = now;
            true
        } else {
            false
        }
    }
}
