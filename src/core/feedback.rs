//! Presentation of the running and final mood while sampling.
//!
//! Nothing here can influence the mood the sampler returns.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::frame::{Frame, Region};
use crate::models::Mood;

const FACE_BOX_COLOR: [u8; 3] = [0, 255, 0];

/// What the sampler should do after a frame was shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackControl {
    Continue,
    /// The user asked to stop sampling early
    Quit,
}

pub trait FeedbackSurface {
    fn show_frame(&mut self, _frame: &Frame, _faces: &[Region], _mood: Mood) -> FeedbackControl {
        FeedbackControl::Continue
    }

    /// Shown once after the loop, only if at least one frame was captured
    fn show_final(&mut self, _frame: &Frame, _faces: &[Region], _mood: Mood, _pause: Duration) {}

    fn teardown(&mut self) {}
}

/// No presentation at all
#[derive(Debug, Clone, Copy, Default)]
pub struct Headless;

impl FeedbackSurface for Headless {}

/// Logs mood changes and the final mood, optionally saving an annotated
/// snapshot of the last frame.
#[derive(Debug, Default)]
pub struct ConsoleFeedback {
    snapshot_dir: Option<PathBuf>,
    last_mood: Option<Mood>,
    frames_shown: usize,
}

impl ConsoleFeedback {
    pub fn new(snapshot_dir: Option<PathBuf>) -> Self {
        Self {
            snapshot_dir,
            last_mood: None,
            frames_shown: 0,
        }
    }

    fn save_snapshot(&self, frame: &Frame, faces: &[Region], mood: Mood) -> Option<PathBuf> {
        let dir = self.snapshot_dir.as_ref()?;

        let mut annotated = frame.clone();
        for face in faces {
            annotated.draw_box(face, FACE_BOX_COLOR, 2);
        }

        let name = format!(
            "{}-{}.png",
            chrono::Local::now().format("%Y%m%d-%H%M%S%.3f"),
            mood
        );
        let path = dir.join(name);

        match annotated.save_png(&path) {
            Ok(()) => Some(path),
            Err(e) => {
                warn!("Failed to write mood snapshot {:?}: {}", path, e);
                None
            }
        }
    }
}

impl FeedbackSurface for ConsoleFeedback {
    fn show_frame(&mut self, frame: &Frame, faces: &[Region], mood: Mood) -> FeedbackControl {
        self.frames_shown += 1;
        if self.last_mood != Some(mood) {
            info!(
                "Mood: {} ({} face(s) in frame {})",
                mood,
                faces.len(),
                self.frames_shown
            );
            self.last_mood = Some(mood);
        }
        debug!(
            "frame {}x{}, faces {:?}",
            frame.width(),
            frame.height(),
            faces
        );

        FeedbackControl::Continue
    }

    fn show_final(&mut self, frame: &Frame, faces: &[Region], mood: Mood, pause: Duration) {
        match self.save_snapshot(frame, faces, mood) {
            Some(path) => info!("Final mood: {} (snapshot {:?})", mood, path),
            None => info!("Final mood: {}", mood),
        }

        if !pause.is_zero() {
            std::thread::sleep(pause);
        }
    }

    fn teardown(&mut self) {
        debug!("feedback closed after {} frame(s)", self.frames_shown);
        self.last_mood = None;
        self.frames_shown = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_snapshot_is_written() {
        let temp_dir = TempDir::new().unwrap();
        let mut feedback = ConsoleFeedback::new(Some(temp_dir.path().to_path_buf()));
        let frame = Frame::filled(16, 16, [10, 10, 10]);

        feedback.show_final(&frame, &[Region::new(2, 2, 8, 8)], Mood::Happy, Duration::ZERO);

        let written: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(written.len(), 1);
        let name = written[0].file_name().to_string_lossy().into_owned();
        assert!(name.ends_with("-happy.png"));
    }

    #[test]
    fn test_console_never_quits() {
        let mut feedback = ConsoleFeedback::new(None);
        let frame = Frame::filled(2, 2, [0, 0, 0]);
        for mood in [Mood::Sad, Mood::Happy, Mood::Happy] {
            assert_eq!(
                feedback.show_frame(&frame, &[], mood),
                FeedbackControl::Continue
            );
        }
        assert_eq!(feedback.frames_shown, 3);
        feedback.teardown();
        assert_eq!(feedback.frames_shown, 0);
    }
}
