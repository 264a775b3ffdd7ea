//! Face localization and emotion classification oracles
//!
//! The sampler only sees the traits; `DeepFaceClassifier` talks to a
//! DeepFace-compatible `/analyze` service over HTTP.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::frame::{Frame, Region};
use crate::config::ClassifierSettings;
use crate::models::EmotionSample;

const JPEG_QUALITY: u8 = 85;

/// Per-frame classifier failure. Every variant is transient: the sampler logs
/// it and keeps the previous mood.
#[derive(Debug, Error)]
pub enum ClassifierError {
    #[error("classifier request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("could not encode face image: {0}")]
    Encode(#[from] image::ImageError),
    #[error("classifier rejected the image: {0}")]
    Rejected(String),
    #[error("classifier returned no faces")]
    EmptyResult,
}

/// Finds face regions in a frame. Zero regions is a normal answer.
pub trait FaceLocator {
    fn locate(&mut self, frame: &Frame) -> Vec<Region>;
}

/// No localization: the whole frame is treated as the face
#[derive(Debug, Clone, Copy, Default)]
pub struct WholeFrame;

impl FaceLocator for WholeFrame {
    fn locate(&mut self, frame: &Frame) -> Vec<Region> {
        vec![frame.full_region()]
    }
}

/// Labels the dominant emotion of a face image
pub trait EmotionClassifier {
    fn classify(&mut self, face: &Frame) -> Result<EmotionSample, ClassifierError>;
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    img: String,
    actions: [&'a str; 1],
    enforce_detection: bool,
    detector_backend: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AnalyzeResponse {
    Wrapped { results: Vec<AnalyzeResult> },
    Bare(Vec<AnalyzeResult>),
    Failed { error: String },
}

#[derive(Debug, Deserialize)]
struct AnalyzeResult {
    dominant_emotion: String,
    #[serde(default)]
    emotion: HashMap<String, f64>,
    #[serde(default)]
    region: Option<WireRegion>,
}

#[derive(Debug, Deserialize)]
struct WireRegion {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

impl From<WireRegion> for Region {
    fn from(r: WireRegion) -> Self {
        let px = |v: f64| v.max(0.0).round() as u32;
        Region::new(px(r.x), px(r.y), px(r.w), px(r.h))
    }
}

impl AnalyzeResponse {
    fn into_sample(self) -> Result<EmotionSample, ClassifierError> {
        let results = match self {
            AnalyzeResponse::Wrapped { results } | AnalyzeResponse::Bare(results) => results,
            AnalyzeResponse::Failed { error } => return Err(ClassifierError::Rejected(error)),
        };

        let first = results
            .into_iter()
            .next()
            .ok_or(ClassifierError::EmptyResult)?;

        // scores are percentages
        let confidence = first
            .emotion
            .get(&first.dominant_emotion)
            .map(|score| (*score / 100.0) as f32)
            .unwrap_or(0.0);

        let mut sample = EmotionSample::new(first.dominant_emotion, confidence);
        if let Some(region) = first.region {
            let region = Region::from(region);
            if region.w > 0 && region.h > 0 {
                sample = sample.with_region(region);
            }
        }
        Ok(sample)
    }
}

/// Client for a DeepFace-compatible emotion analysis service
pub struct DeepFaceClassifier {
    client: reqwest::blocking::Client,
    endpoint: String,
    detector_backend: String,
}

impl DeepFaceClassifier {
    /// Build the blocking client. Must not be called from async code.
    pub fn new(settings: &ClassifierSettings) -> Result<Self, ClassifierError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(settings.timeout())
            .build()?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            detector_backend: settings.detector_backend.clone(),
        })
    }
}

impl EmotionClassifier for DeepFaceClassifier {
    fn classify(&mut self, face: &Frame) -> Result<EmotionSample, ClassifierError> {
        let jpeg = face.encode_jpeg(JPEG_QUALITY)?;
        let request = AnalyzeRequest {
            img: format!("data:image/jpeg;base64,{}", STANDARD.encode(jpeg)),
            actions: ["emotion"],
            enforce_detection: false,
            detector_backend: &self.detector_backend,
        };

        let response = self.client.post(&self.endpoint).json(&request).send()?;
        let status = response.status();
        let body: AnalyzeResponse = response.json()?;

        if !status.is_success() {
            if let AnalyzeResponse::Failed { error } = body {
                return Err(ClassifierError::Rejected(error));
            }
            return Err(ClassifierError::Rejected(format!("status {}", status)));
        }

        let sample = body.into_sample()?;
        debug!(
            "classifier says {} ({:.2})",
            sample.label, sample.confidence
        );
        Ok(sample)
    }
}
