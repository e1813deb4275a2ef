//! rollcall-core: face recognition and presence tracking for attendance.
//!
//! Detection runs SCRFD and encoding runs ArcFace, both through ONNX Runtime
//! on RGB frames. The presence tracker turns per-frame sightings into
//! check-in and check-out decisions.

pub mod alignment;
pub mod detector;
pub mod recognizer;
pub mod tracker;
pub mod types;

pub use detector::FaceDetector;
pub use recognizer::FaceRecognizer;
pub use tracker::{Action, Outcome, PresencePolicy, PresenceTracker, Sighting, Zone};
pub use types::{BoundingBox, CosineMatcher, Encoding, FaceMatch, KnownFace, Matcher};

/// Default directory for the ONNX model files.
pub fn default_model_dir() -> std::path::PathBuf {
    std::path::PathBuf::from("/usr/share/rollcall/models")
}
