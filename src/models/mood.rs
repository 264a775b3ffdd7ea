//! Mood and per-face emotion samples

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::frame::Region;

/// Binary mood derived from webcam emotion analysis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Happy,
    #[default]
    Sad,
}

impl Mood {
    /// Collapse a dominant emotion label into a mood.
    ///
    /// Only `happy` is distinguished; every other label, known or not, maps to `Sad`.
    pub fn from_label(label: &str) -> Self {
        if label.trim().eq_ignore_ascii_case("happy") {
            Mood::Happy
        } else {
            Mood::Sad
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Happy => "happy",
            Mood::Sad => "sad",
        }
    }

    /// Whether a track with this valence fits the mood
    pub fn accepts_valence(&self, valence: f64) -> bool {
        match self {
            Mood::Happy => valence > crate::config::VALENCE_SPLIT,
            Mood::Sad => valence <= crate::config::VALENCE_SPLIT,
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classifier answer for one face
#[derive(Debug, Clone, PartialEq)]
pub struct EmotionSample {
    /// Dominant emotion label, open vocabulary
    pub label: String,
    /// Confidence of the dominant label in [0, 1]
    pub confidence: f32,
    /// Face box reported by the classifier, relative to the image it was given
    pub region: Option<Region>,
}

impl EmotionSample {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence: confidence.clamp(0.0, 1.0),
            region: None,
        }
    }

    pub fn with_region(mut self, region: Region) -> Self {
        self.region = Some(region);
        self
    }

    pub fn mood(&self) -> Mood {
        Mood::from_label(&self.label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mood_is_sad() {
        assert_eq!(Mood::default(), Mood::Sad);
    }

    #[test]
    fn test_label_mapping() {
        assert_eq!(Mood::from_label("happy"), Mood::Happy);
        assert_eq!(Mood::from_label(" Happy "), Mood::Happy);
        assert_eq!(Mood::from_label("sad"), Mood::Sad);
        assert_eq!(Mood::from_label("angry"), Mood::Sad);
        assert_eq!(Mood::from_label("surprise"), Mood::Sad);
        assert_eq!(Mood::from_label(""), Mood::Sad);
        assert_eq!(Mood::from_label("happyish"), Mood::Sad);
    }

    #[test]
    fn test_valence_predicate() {
        assert!(Mood::Happy.accepts_valence(0.51));
        assert!(!Mood::Happy.accepts_valence(0.5));
        assert!(Mood::Sad.accepts_valence(0.5));
        assert!(Mood::Sad.accepts_valence(0.0));
        assert!(!Mood::Sad.accepts_valence(0.9));
    }

    #[test]
    fn test_serialization() {
        assert_eq!(serde_json::to_string(&Mood::Happy).unwrap(), "\"happy\"");
        assert_eq!(serde_json::to_string(&Mood::Sad).unwrap(), "\"sad\"");
        let mood: Mood = serde_json::from_str("\"happy\"").unwrap();
        assert_eq!(mood, Mood::Happy);
        assert_eq!(Mood::Happy.to_string(), "happy");
    }

    #[test]
    fn test_sample_confidence_is_clamped() {
        let sample = EmotionSample::new("happy", 97.3);
        assert_eq!(sample.confidence, 1.0);
        assert_eq!(sample.mood(), Mood::Happy);
    }
}
