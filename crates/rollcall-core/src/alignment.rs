//! Face alignment for the encoder.
//!
//! Fits a 4-DOF similarity transform (scale, rotation, translation) from the
//! five detected landmarks to the InsightFace reference layout, then warps
//! the RGB frame into a 112×112 crop.

/// ArcFace reference landmarks for a 112×112 crop.
pub const REFERENCE_LANDMARKS: [(f32, f32); 5] = [
    (38.2946, 51.6963), // left eye
    (73.5318, 51.5014), // right eye
    (56.0252, 71.7366), // nose
    (41.5493, 92.3655), // left mouth
    (70.7299, 92.2041), // right mouth
];

pub const ALIGNED_SIZE: usize = 112;

/// Similarity transform `dst = [a -b; b a] * src + [tx; ty]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Similarity {
    pub a: f32,
    pub b: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Similarity {
    const IDENTITY: Similarity = Similarity { a: 1.0, b: 0.0, tx: 0.0, ty: 0.0 };

    /// Least-squares fit of `src` onto `dst` using centered coordinates.
    pub fn estimate(src: &[(f32, f32); 5], dst: &[(f32, f32); 5]) -> Self {
        let mean = |pts: &[(f32, f32); 5]| {
            let (sx, sy) = pts.iter().fold((0.0, 0.0), |(ax, ay), (x, y)| (ax + x, ay + y));
            (sx / 5.0, sy / 5.0)
        };
        let (smx, smy) = mean(src);
        let (dmx, dmy) = mean(dst);

        let mut dot = 0.0f32;
        let mut cross = 0.0f32;
        let mut var = 0.0f32;
        for (&(sx, sy), &(dx, dy)) in src.iter().zip(dst.iter()) {
            let (sx, sy) = (sx - smx, sy - smy);
            let (dx, dy) = (dx - dmx, dy - dmy);
            dot += sx * dx + sy * dy;
            cross += sx * dy - sy * dx;
            var += sx * sx + sy * sy;
        }

        if var < 1e-12 {
            return Self::IDENTITY;
        }

        let a = dot / var;
        let b = cross / var;
        Self {
            a,
            b,
            tx: dmx - (a * smx - b * smy),
            ty: dmy - (b * smx + a * smy),
        }
    }

    pub fn apply(&self, (x, y): (f32, f32)) -> (f32, f32) {
        (self.a * x - self.b * y + self.tx, self.b * x + self.a * y + self.ty)
    }

    /// Inverse mapping, or `None` for a degenerate transform.
    fn invert(&self, (x, y): (f32, f32)) -> Option<(f32, f32)> {
        let det = self.a * self.a + self.b * self.b;
        if det < 1e-12 {
            return None;
        }
        let (dx, dy) = (x - self.tx, y - self.ty);
        Some(((self.a * dx + self.b * dy) / det, (-self.b * dx + self.a * dy) / det))
    }
}

/// Bilinear sample of one RGB channel; out-of-bounds reads are black.
fn sample(rgb: &[u8], width: usize, height: usize, x: f32, y: f32, c: usize) -> f32 {
    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;

    let px = |xi: i64, yi: i64| -> f32 {
        if xi < 0 || yi < 0 || xi >= width as i64 || yi >= height as i64 {
            return 0.0;
        }
        rgb.get((yi as usize * width + xi as usize) * 3 + c)
            .copied()
            .unwrap_or(0) as f32
    };

    px(x0, y0) * (1.0 - fx) * (1.0 - fy)
        + px(x0 + 1, y0) * fx * (1.0 - fy)
        + px(x0, y0 + 1) * (1.0 - fx) * fy
        + px(x0 + 1, y0 + 1) * fx * fy
}

/// Warp the face described by `landmarks` into a 112×112 packed RGB crop.
pub fn align_face(rgb: &[u8], width: u32, height: u32, landmarks: &[(f32, f32); 5]) -> Vec<u8> {
    let transform = Similarity::estimate(landmarks, &REFERENCE_LANDMARKS);
    let (w, h) = (width as usize, height as usize);
    let mut out = vec![0u8; ALIGNED_SIZE * ALIGNED_SIZE * 3];

    for oy in 0..ALIGNED_SIZE {
        for ox in 0..ALIGNED_SIZE {
            let Some((sx, sy)) = transform.invert((ox as f32, oy as f32)) else {
                continue;
            };
            for c in 0..3 {
                let v = sample(rgb, w, h, sx, sy, c);
                out[(oy * ALIGNED_SIZE + ox) * 3 + c] = v.round().clamp(0.0, 255.0) as u8;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_estimate() {
        let t = Similarity::estimate(&REFERENCE_LANDMARKS, &REFERENCE_LANDMARKS);
        assert!((t.a - 1.0).abs() < 1e-4, "a = {}", t.a);
        assert!(t.b.abs() < 1e-4);
        assert!(t.tx.abs() < 1e-3 && t.ty.abs() < 1e-3);
    }

    #[test]
    fn test_half_scale_estimate() {
        let src = REFERENCE_LANDMARKS.map(|(x, y)| (x * 2.0 + 10.0, y * 2.0 + 4.0));
        let t = Similarity::estimate(&src, &REFERENCE_LANDMARKS);
        assert!((t.a - 0.5).abs() < 1e-3, "a = {}", t.a);
        let (x, y) = t.apply(src[2]);
        assert!((x - REFERENCE_LANDMARKS[2].0).abs() < 1e-2);
        assert!((y - REFERENCE_LANDMARKS[2].1).abs() < 1e-2);
    }

    #[test]
    fn test_degenerate_landmarks_fall_back_to_identity() {
        let src = [(5.0, 5.0); 5];
        assert_eq!(Similarity::estimate(&src, &REFERENCE_LANDMARKS), Similarity::IDENTITY);
    }

    #[test]
    fn test_align_output_size() {
        let frame = vec![128u8; 640 * 480 * 3];
        let aligned = align_face(&frame, 640, 480, &REFERENCE_LANDMARKS);
        assert_eq!(aligned.len(), ALIGNED_SIZE * ALIGNED_SIZE * 3);
        assert_eq!(aligned[(56 * ALIGNED_SIZE + 56) * 3], 128);
    }

    #[test]
    fn test_left_eye_lands_on_reference() {
        let (w, h) = (200usize, 200usize);
        let mut frame = vec![0u8; w * h * 3];
        let src: [(f32, f32); 5] = [
            (80.0, 60.0),
            (120.0, 60.0),
            (100.0, 85.0),
            (85.0, 110.0),
            (115.0, 110.0),
        ];

        // red 5×5 patch on the left eye
        for y in 58..63 {
            for x in 78..83 {
                frame[(y * w + x) * 3] = 255;
            }
        }

        let aligned = align_face(&frame, w as u32, h as u32, &src);
        let (rx, ry) = (REFERENCE_LANDMARKS[0].0.round() as usize, REFERENCE_LANDMARKS[0].1.round() as usize);
        let red = aligned[(ry * ALIGNED_SIZE + rx) * 3];
        let green = aligned[(ry * ALIGNED_SIZE + rx) * 3 + 1];
        assert!(red > 100, "expected red near reference left eye, got {red}");
        assert_eq!(green, 0);
    }
}
