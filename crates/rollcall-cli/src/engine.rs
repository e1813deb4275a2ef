use crate::config::Config;
use rollcall_core::{CosineMatcher, Encoding, FaceDetector, FaceRecognizer, KnownFace, Matcher, Sighting};
use rollcall_hw::Frame;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("detector error: {0}")]
    Detector(#[from] rollcall_core::detector::DetectorError),
    #[error("recognizer error: {0}")]
    Recognizer(#[from] rollcall_core::recognizer::RecognizerError),
    #[error("no face detected in any captured frame; look at the camera and try again")]
    NoFaceDetected,
}

/// Best face found while registering.
pub struct Enrollment {
    pub encoding: Encoding,
    /// Frame the face came from, kept as the profile image.
    pub frame: Frame,
}

/// Detection and encoding models, run synchronously on the caller's thread.
pub struct Engine {
    detector: FaceDetector,
    recognizer: FaceRecognizer,
}

impl Engine {
    /// Load both ONNX models. Fails fast if either is missing.
    pub fn load(config: &Config) -> Result<Self, EngineError> {
        let scrfd = config.scrfd_model_path();
        let arcface = config.arcface_model_path();

        let detector = FaceDetector::load(&scrfd)?;
        let recognizer = FaceRecognizer::load(&arcface)?;
        tracing::info!(detector = %scrfd, recognizer = %arcface, "face models loaded");

        Ok(Self {
            detector,
            recognizer,
        })
    }

    /// Pick the most confident face across `frames` and encode it.
    pub fn enroll(&mut self, frames: Vec<Frame>) -> Result<Enrollment, EngineError> {
        let mut best: Option<(usize, rollcall_core::BoundingBox)> = None;

        for (i, frame) in frames.iter().enumerate() {
            let faces = self.detector.detect(&frame.data, frame.width, frame.height)?;
            let Some(face) = faces.into_iter().next() else {
                continue;
            };
            if best.as_ref().map_or(true, |(_, b)| face.confidence > b.confidence) {
                best = Some((i, face));
            }
        }

        let (idx, face) = best.ok_or(EngineError::NoFaceDetected)?;
        let frame = frames
            .into_iter()
            .nth(idx)
            .ok_or(EngineError::NoFaceDetected)?;
        tracing::info!(confidence = face.confidence, frame = idx, "enroll: best face selected");

        let encoding = self.recognizer.encode(&frame.data, frame.width, frame.height, &face)?;
        Ok(Enrollment {
            encoding,
            frame,
        })
    }

    /// Detect, encode and match every face in one frame.
    ///
    /// Faces that match no registered employee are dropped.
    pub fn recognize(
        &mut self,
        frame: &Frame,
        known: &[KnownFace],
        threshold: f32,
    ) -> Result<Vec<Sighting>, EngineError> {
        let faces = self.detector.detect(&frame.data, frame.width, frame.height)?;
        let mut sightings = Vec::with_capacity(faces.len());

        for face in faces {
            let encoding = self
                .recognizer
                .encode(&frame.data, frame.width, frame.height, &face)?;
            let result = CosineMatcher.compare(&encoding, known, threshold);
            match result.name {
                Some(name) => sightings.push(Sighting {
                    name,
                    bbox: face,
                    similarity: result.similarity,
                }),
                None => tracing::trace!(similarity = result.similarity, "unrecognized face"),
            }
        }

        Ok(sightings)
    }
}
