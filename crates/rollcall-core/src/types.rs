use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bounding box for a detected face, with optional facial landmarks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    /// Five-point facial landmarks: [left_eye, right_eye, nose, left_mouth, right_mouth].
    pub landmarks: Option<[(f32, f32); 5]>,
}

impl BoundingBox {
    /// Center point of the box in frame coordinates.
    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EncodingError {
    #[error("encoding blob length {0} is not a multiple of 4")]
    BadLength(usize),
    #[error("encoding blob is empty")]
    Empty,
}

/// Face encoding vector (512-dimensional for ArcFace).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Encoding {
    pub values: Vec<f32>,
}

impl Encoding {
    pub fn new(values: Vec<f32>) -> Self {
        Self { values }
    }

    /// Cosine similarity in [-1, 1]. Higher = more similar.
    pub fn similarity(&self, other: &Encoding) -> f32 {
        let mut dot = 0.0f32;
        let mut norm_a = 0.0f32;
        let mut norm_b = 0.0f32;

        for (a, b) in self.values.iter().zip(other.values.iter()) {
            dot += a * b;
            norm_a += a * a;
            norm_b += b * b;
        }

        let denom = norm_a.sqrt() * norm_b.sqrt();
        if denom > 0.0 { dot / denom } else { 0.0 }
    }

    /// Serialize as little-endian `f32` bytes for the `employees.encoding` column.
    pub fn to_blob(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.values.len() * 4);
        for v in &self.values {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        bytes
    }

    /// Inverse of [`to_blob`](Self::to_blob).
    pub fn from_blob(bytes: &[u8]) -> Result<Self, EncodingError> {
        if bytes.is_empty() {
            return Err(EncodingError::Empty);
        }
        if bytes.len() % 4 != 0 {
            return Err(EncodingError::BadLength(bytes.len()));
        }
        let values = bytes
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect();
        Ok(Self::new(values))
    }
}

/// A registered employee's face, as loaded for matching.
#[derive(Debug, Clone)]
pub struct KnownFace {
    pub name: String,
    pub encoding: Encoding,
}

/// Result of matching one observed encoding against the known set.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceMatch {
    /// Name of the matched employee, if any entry cleared the threshold.
    pub name: Option<String>,
    /// Similarity of the matched entry, or the best similarity seen when unmatched.
    pub similarity: f32,
}

impl FaceMatch {
    pub fn matched(&self) -> bool {
        self.name.is_some()
    }
}

/// Strategy for comparing an observed encoding against the known faces.
pub trait Matcher {
    fn compare(&self, probe: &Encoding, known: &[KnownFace], threshold: f32) -> FaceMatch;
}

/// Cosine similarity matcher.
///
/// Returns the first known face in enrollment order whose similarity reaches
/// the threshold. Every entry is still scored so the walk does not depend on
/// where the match sits.
pub struct CosineMatcher;

impl Matcher for CosineMatcher {
    fn compare(&self, probe: &Encoding, known: &[KnownFace], threshold: f32) -> FaceMatch {
        let mut first: Option<(usize, f32)> = None;
        let mut best_sim = f32::NEG_INFINITY;

        for (i, face) in known.iter().enumerate() {
            let sim = probe.similarity(&face.encoding);
            if sim > best_sim {
                best_sim = sim;
            }
            if first.is_none() && sim >= threshold {
                first = Some((i, sim));
            }
        }

        match first {
            Some((idx, sim)) => FaceMatch {
                name: Some(known[idx].name.clone()),
                similarity: sim,
            },
            None => FaceMatch {
                name: None,
                similarity: if best_sim == f32::NEG_INFINITY { 0.0 } else { best_sim },
            },
        }
    }
}
