//! Mood sampling: turn a few seconds of noisy per-face emotion labels into
//! one mood.
//!
//! The loop keeps the last successfully classified mood. Capture failures end
//! sampling early, classifier failures only skip that face, and neither is
//! ever reported to the caller: the worst case is the default mood.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::camera::{Camera, CaptureError, FfmpegCamera};
use super::classifier::{DeepFaceClassifier, EmotionClassifier, FaceLocator, WholeFrame};
use super::feedback::{ConsoleFeedback, FeedbackControl, FeedbackSurface, Headless};
use super::frame::{Frame, Region};
use crate::config::{
    CameraSettings, ClassifierSettings, SamplerSettings, Settings, FINAL_MOOD_PAUSE,
    MOOD_TIME_BUDGET,
};
use crate::models::Mood;

/// Longest single wait for a frame before cancellation is rechecked
const READ_POLL: Duration = Duration::from_millis(50);

/// When to stop sampling and how long to show the result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingPolicy {
    pub time_budget: Duration,
    pub max_frames: Option<usize>,
    pub final_pause: Duration,
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        Self {
            time_budget: MOOD_TIME_BUDGET,
            max_frames: None,
            final_pause: FINAL_MOOD_PAUSE,
        }
    }
}

impl From<&SamplerSettings> for SamplingPolicy {
    fn from(settings: &SamplerSettings) -> Self {
        Self {
            time_budget: settings.time_budget(),
            max_frames: settings.max_frames,
            final_pause: settings.final_pause(),
        }
    }
}

/// Tears the feedback surface down however sampling ends
struct SurfaceGuard<'a> {
    surface: &'a mut dyn FeedbackSurface,
}

impl Drop for SurfaceGuard<'_> {
    fn drop(&mut self) {
        self.surface.teardown();
    }
}

/// Sample the camera until the budget runs out and return the mood.
///
/// The camera is released before the feedback surface is torn down, on every
/// exit path.
pub fn sample_mood(
    camera: &dyn Camera,
    locator: &mut dyn FaceLocator,
    classifier: &mut dyn EmotionClassifier,
    feedback: &mut dyn FeedbackSurface,
    policy: &SamplingPolicy,
    cancel: &CancellationToken,
) -> Mood {
    let feedback = SurfaceGuard { surface: feedback };

    let mut source = match camera.open() {
        Ok(source) => source,
        Err(e) => {
            warn!("Camera unavailable ({}); using default mood", e);
            return Mood::default();
        }
    };

    let start = Instant::now();
    let mut mood = Mood::default();
    let mut frames = 0usize;
    let mut classified = 0usize;
    let mut last: Option<(Frame, Vec<Region>)> = None;

    while !cancel.is_cancelled() {
        let remaining = policy.time_budget.saturating_sub(start.elapsed());
        let frame = match source.read_frame(remaining.min(READ_POLL)) {
            Ok(frame) => frame,
            Err(CaptureError::Timeout) => {
                if start.elapsed() >= policy.time_budget {
                    debug!("time budget ran out waiting for a frame");
                    break;
                }
                continue;
            }
            Err(CaptureError::EndOfStream) => {
                debug!("camera stream ended after {} frame(s)", frames);
                break;
            }
            Err(e) => {
                warn!("Frame capture failed: {}", e);
                break;
            }
        };
        frames += 1;

        let full = frame.full_region();
        let mut boxes = Vec::new();

        for region in locator.locate(&frame) {
            let Some(face) = frame.crop(&region) else {
                continue;
            };

            match classifier.classify(&face) {
                Ok(sample) => {
                    classified += 1;
                    if let Some(found) = sample.region {
                        boxes.push(found.offset(region.x, region.y));
                    } else if region != full {
                        boxes.push(region);
                    }

                    mood = sample.mood();
                    if mood == Mood::Happy {
                        break;
                    }
                }
                Err(e) => warn!("Emotion detection error: {}", e),
            }
        }

        let control = feedback.surface.show_frame(&frame, &boxes, mood);
        last = Some((frame, boxes));

        if control == FeedbackControl::Quit {
            debug!("sampling stopped by user");
            break;
        }
        if start.elapsed() > policy.time_budget {
            break;
        }
        if policy.max_frames.is_some_and(|max| frames >= max) {
            break;
        }
    }

    if let Some((frame, boxes)) = &last {
        feedback
            .surface
            .show_final(frame, boxes, mood, policy.final_pause);
    }

    drop(source);

    info!(
        "Detected mood {} from {} frame(s), {} classification(s) in {:.1}s",
        mood,
        frames,
        classified,
        start.elapsed().as_secs_f64()
    );
    mood
}

/// Produces one mood per recommendation request
pub trait MoodDetector: Send + Sync {
    fn detect(&self, cancel: &CancellationToken) -> Mood;
}

/// Samples the local webcam and a DeepFace service.
///
/// Requests are serialized so only one sampling run holds the device.
pub struct CameraMoodDetector {
    camera: CameraSettings,
    classifier: ClassifierSettings,
    policy: SamplingPolicy,
    snapshot_dir: Option<PathBuf>,
    headless: bool,
    device: Mutex<()>,
}

impl CameraMoodDetector {
    pub fn new(settings: &Settings, snapshot_dir: Option<PathBuf>, headless: bool) -> Self {
        Self {
            camera: settings.camera.clone(),
            classifier: settings.classifier.clone(),
            policy: SamplingPolicy::from(&settings.sampler),
            snapshot_dir,
            headless,
            device: Mutex::new(()),
        }
    }
}

impl MoodDetector for CameraMoodDetector {
    fn detect(&self, cancel: &CancellationToken) -> Mood {
        let _device = self.device.lock();

        let mut classifier = match DeepFaceClassifier::new(&self.classifier) {
            Ok(classifier) => classifier,
            Err(e) => {
                warn!("Emotion classifier unavailable ({}); using default mood", e);
                return Mood::default();
            }
        };

        let camera = FfmpegCamera::new(self.camera.clone());
        let mut feedback: Box<dyn FeedbackSurface> = if self.headless {
            Box::new(Headless)
        } else {
            Box::new(ConsoleFeedback::new(self.snapshot_dir.clone()))
        };

        sample_mood(
            &camera,
            &mut WholeFrame,
            &mut classifier,
            feedback.as_mut(),
            &self.policy,
            cancel,
        )
    }
}
