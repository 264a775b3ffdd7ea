//! Webcam capture through ffmpeg-sidecar
//!
//! ffmpeg reads the local capture device and writes raw rgb24 frames to a
//! pipe; each sampling run spawns its own ffmpeg child and kills it on drop.

use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::{debug, info};

use ffmpeg_sidecar::command::FfmpegCommand;
use ffmpeg_sidecar::event::OutputVideoFrame;

use super::frame::Frame;
use crate::config::CameraSettings;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("camera stream ended")]
    EndOfStream,
    #[error("no frame arrived in time")]
    Timeout,
    #[error("camera device error: {0}")]
    Device(String),
    #[error("malformed frame: {0}")]
    Malformed(String),
}

/// A capture device that can be opened for one sampling run
pub trait Camera {
    /// Acquire the device. Dropping the returned source releases it.
    fn open(&self) -> Result<Box<dyn FrameSource + '_>, CaptureError>;
}

/// An open capture session
pub trait FrameSource {
    /// Wait at most `timeout` for the next frame, then give up with `Timeout`
    fn read_frame(&mut self, timeout: Duration) -> Result<Frame, CaptureError>;
}

/// Frames buffered between the reader thread and the sampler
const FRAME_QUEUE: usize = 2;

/// Frames produced on a reader thread, so a stalled device can't block the
/// caller past its deadline
struct ChannelSource {
    frames: Receiver<Result<Frame, CaptureError>>,
}

impl ChannelSource {
    fn spawn<I>(frames: I) -> Result<Self, CaptureError>
    where
        I: Iterator<Item = Result<Frame, CaptureError>> + Send + 'static,
    {
        let (tx, rx) = mpsc::sync_channel(FRAME_QUEUE);
        thread::Builder::new()
            .name("camera-reader".to_string())
            .spawn(move || {
                for frame in frames {
                    // receiver gone means the session was dropped
                    if tx.send(frame).is_err() {
                        break;
                    }
                }
            })
            .map_err(|e| CaptureError::Device(e.to_string()))?;

        Ok(Self { frames: rx })
    }

    fn recv(&self, timeout: Duration) -> Result<Frame, CaptureError> {
        match self.frames.recv_timeout(timeout) {
            Ok(frame) => frame,
            Err(RecvTimeoutError::Timeout) => Err(CaptureError::Timeout),
            Err(RecvTimeoutError::Disconnected) => Err(CaptureError::EndOfStream),
        }
    }
}

/// ensures ffmpeg is available, downloading if necessary
pub fn ensure_ffmpeg() -> Result<()> {
    if !ffmpeg_sidecar::command::ffmpeg_is_installed() {
        info!("ffmpeg not found, downloading...");
        ffmpeg_sidecar::download::auto_download().context("failed to download ffmpeg")?;
        info!("ffmpeg downloaded successfully");
    }
    Ok(())
}

/// The local webcam, read through ffmpeg
#[derive(Debug, Clone)]
pub struct FfmpegCamera {
    settings: CameraSettings,
}

impl FfmpegCamera {
    pub fn new(settings: CameraSettings) -> Self {
        Self { settings }
    }

    fn command(&self) -> FfmpegCommand {
        let s = &self.settings;
        let mut cmd = FfmpegCommand::new();
        cmd.hide_banner().format(&s.format);

        if let Some(fps) = s.framerate {
            cmd.args(["-framerate", &fps.to_string()]);
        }
        if let (Some(w), Some(h)) = (s.width, s.height) {
            cmd.args(["-video_size", &format!("{}x{}", w, h)]);
        }

        cmd.input(&s.device).rawvideo();
        cmd
    }
}

impl Camera for FfmpegCamera {
    fn open(&self) -> Result<Box<dyn FrameSource + '_>, CaptureError> {
        debug!(
            "opening camera {} ({})",
            self.settings.device, self.settings.format
        );

        let mut child = self
            .command()
            .spawn()
            .map_err(|e| CaptureError::Device(e.to_string()))?;

        let frames = match child.iter() {
            Ok(events) => events.filter_frames(),
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CaptureError::Device(e.to_string()));
            }
        };

        let frames = match ChannelSource::spawn(frames.map(decode_frame)) {
            Ok(frames) => frames,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        };

        Ok(Box::new(FfmpegSession { child, frames }))
    }
}

fn decode_frame(out: OutputVideoFrame) -> Result<Frame, CaptureError> {
    if out.pix_fmt != "rgb24" {
        return Err(CaptureError::Malformed(format!(
            "unexpected pixel format {}",
            out.pix_fmt
        )));
    }

    let (width, height, len) = (out.width, out.height, out.data.len());
    Frame::from_rgb(width, height, out.data).ok_or_else(|| {
        CaptureError::Malformed(format!("{} bytes for a {}x{} frame", len, width, height))
    })
}

struct FfmpegSession {
    child: ffmpeg_sidecar::child::FfmpegChild,
    frames: ChannelSource,
}

impl FrameSource for FfmpegSession {
    fn read_frame(&mut self, timeout: Duration) -> Result<Frame, CaptureError> {
        self.frames.recv(timeout)
    }
}

impl Drop for FfmpegSession {
    fn drop(&mut self) {
        if let Err(e) = self.child.kill() {
            debug!("ffmpeg already exited: {}", e);
        }
        // killing ffmpeg closes its pipes, which ends the reader thread
        let _ = self.child.wait();
        debug!("camera released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_includes_device_options() {
        let camera = FfmpegCamera::new(CameraSettings {
            format: "v4l2".to_string(),
            device: "/dev/video3".to_string(),
            width: Some(640),
            height: Some(480),
            framerate: Some(15),
        });

        let mut cmd = camera.command();
        let args: Vec<String> = cmd
            .as_inner()
            .get_args()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        let joined = args.join(" ");
        assert!(joined.contains("-f v4l2"));
        assert!(joined.contains("-framerate 15"));
        assert!(joined.contains("-video_size 640x480"));
        assert!(joined.contains("-i /dev/video3"));
        assert!(joined.contains("rgb24"));
    }

    fn blank() -> Result<Frame, CaptureError> {
        Frame::from_rgb(1, 1, vec![0; 3]).ok_or(CaptureError::EndOfStream)
    }

    #[test]
    fn test_channel_source_delivers_then_ends() {
        let source = ChannelSource::spawn(vec![blank(), blank()].into_iter()).unwrap();

        assert!(source.recv(Duration::from_secs(5)).is_ok());
        assert!(source.recv(Duration::from_secs(5)).is_ok());
        assert!(matches!(
            source.recv(Duration::from_secs(5)),
            Err(CaptureError::EndOfStream)
        ));
    }

    #[test]
    fn test_channel_source_times_out_on_stalled_device() {
        let stalled = std::iter::from_fn(|| {
            thread::sleep(Duration::from_secs(3));
            None
        });
        let source = ChannelSource::spawn(stalled).unwrap();

        let started = std::time::Instant::now();
        let result = source.recv(Duration::from_millis(100));

        assert!(matches!(result, Err(CaptureError::Timeout)));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_ffmpeg_check_does_not_panic() {
        let _ = ffmpeg_sidecar::command::ffmpeg_is_installed();
    }
}
