//! Hand landmarks as delivered by a hand tracker, and the per-frame
//! [`GestureSample`] derived from them.
//!
//! Coordinates are normalized to the frame: `x` and `y` in `0.0..=1.0` of the
//! frame width and height.  Indices follow the usual 21-point hand model.

use serde::{Deserialize, Serialize};

use crate::error::LandmarkError;
use crate::target::Point;

/// Default open-hand threshold in normalized units.
pub const DEFAULT_OPEN_THRESHOLD: f32 = 0.1;

/// Landmark indices of the 21-point hand model.
pub mod landmarks {
    pub const THUMB_TIP:  usize = 4;
    pub const INDEX_TIP:  usize = 8;
    pub const MIDDLE_TIP: usize = 12;
    pub const RING_TIP:   usize = 16;
    pub const PINKY_TIP:  usize = 20;

    /// Number of landmarks per hand.
    pub const COUNT: usize = 21;

    /// Fingertips from thumb to pinky.
    pub const FINGERTIPS: [usize; 5] = [THUMB_TIP, INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];
}

/// Bone segments of the hand skeleton, for drawing.
pub const HAND_CONNECTIONS: [(usize, usize); 21] = [
    (0, 1), (1, 2), (2, 3), (3, 4),
    (0, 5), (5, 6), (6, 7), (7, 8),
    (5, 9), (9, 10), (10, 11), (11, 12),
    (9, 13), (13, 14), (14, 15), (15, 16),
    (13, 17), (0, 17), (17, 18), (18, 19), (19, 20),
];

// ════════════════════════════════════════════════════════════════════════════
// Landmark
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    /// Depth relative to the wrist; unused by the keyboard.
    #[serde(default)]
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32) -> Self {
        Landmark { x, y, z: 0.0 }
    }

    /// Distance in the image plane, ignoring depth.
    pub fn planar_distance(&self, other: &Landmark) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Scale to frame pixels, truncating toward zero.
    pub fn to_pixel(&self, width: u32, height: u32) -> Point {
        Point::new((self.x * width as f32) as i32, (self.y * height as f32) as i32)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HandLandmarks
// ════════════════════════════════════════════════════════════════════════════

/// One detected hand.
#[derive(Clone, Debug, PartialEq)]
pub struct HandLandmarks {
    points: Vec<Landmark>,
}

impl HandLandmarks {
    pub fn new(points: Vec<Landmark>) -> Result<Self, LandmarkError> {
        if points.len() < landmarks::COUNT {
            return Err(LandmarkError::TooFewLandmarks {
                expected: landmarks::COUNT,
                got:      points.len(),
            });
        }
        Ok(HandLandmarks { points })
    }

    pub fn points(&self) -> &[Landmark] {
        &self.points
    }

    pub fn get(&self, index: usize) -> Landmark {
        self.points[index]
    }

    pub fn index_tip(&self) -> Landmark {
        self.points[landmarks::INDEX_TIP]
    }

    /// Open hand: every adjacent fingertip pair is further apart than
    /// `threshold`.  Sensitive to hand orientation and camera distance.
    pub fn is_open(&self, threshold: f32) -> bool {
        landmarks::FINGERTIPS
            .windows(2)
            .all(|pair| self.points[pair[0]].planar_distance(&self.points[pair[1]]) > threshold)
    }

    /// Pointer position (index fingertip) in frame pixels.
    pub fn pointer(&self, frame_width: u32, frame_height: u32) -> Point {
        self.index_tip().to_pixel(frame_width, frame_height)
    }
}

impl From<[Landmark; landmarks::COUNT]> for HandLandmarks {
    fn from(points: [Landmark; landmarks::COUNT]) -> Self {
        HandLandmarks { points: points.to_vec() }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureSample
// ════════════════════════════════════════════════════════════════════════════

/// Pointer and trigger for one hand in one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GestureSample {
    pub pointer:        Point,
    pub trigger_active: bool,
}

impl GestureSample {
    pub fn from_hand(hand: &HandLandmarks, frame_width: u32, frame_height: u32, open_threshold: f32) -> Self {
        GestureSample {
            pointer:        hand.pointer(frame_width, frame_height),
            trigger_active: hand.is_open(open_threshold),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    /// Hand with the five fingertips at the given x positions on one line.
    fn hand_with_tips(xs: [f32; 5]) -> HandLandmarks {
        let mut pts = vec![Landmark::new(0.5, 0.9); landmarks::COUNT];
        for (tip, x) in landmarks::FINGERTIPS.iter().zip(xs) {
            pts[*tip] = Landmark::new(x, 0.3);
        }
        HandLandmarks::new(pts).unwrap()
    }

    #[test]
    fn rejects_short_landmark_list() {
        let err = HandLandmarks::new(vec![Landmark::default(); 5]).unwrap_err();
        assert_eq!(err, LandmarkError::TooFewLandmarks { expected: 21, got: 5 });
    }

    #[test]
    fn spread_fingers_are_open() {
        let h = hand_with_tips([0.1, 0.25, 0.4, 0.55, 0.7]);
        assert!(h.is_open(DEFAULT_OPEN_THRESHOLD));
    }

    #[test]
    fn one_close_pair_makes_hand_closed() {
        let h = hand_with_tips([0.1, 0.25, 0.4, 0.45, 0.7]);
        assert!(!h.is_open(DEFAULT_OPEN_THRESHOLD));
    }

    #[test]
    fn threshold_is_strict() {
        let h = hand_with_tips([0.0, 0.5, 1.0, 1.5, 2.0]);
        assert!(!h.is_open(0.5));
        assert!(h.is_open(0.49));
    }

    #[test]
    fn depth_is_ignored() {
        let mut pts = hand_with_tips([0.1, 0.11, 0.12, 0.13, 0.14]).points().to_vec();
        for tip in landmarks::FINGERTIPS {
            pts[tip].z = tip as f32;
        }
        assert!(!HandLandmarks::new(pts).unwrap().is_open(0.1));
    }

    #[test]
    fn pointer_truncates_to_pixels() {
        let mut pts = vec![Landmark::default(); landmarks::COUNT];
        pts[landmarks::INDEX_TIP] = Landmark::new(0.1299, 0.5);
        let h = HandLandmarks::new(pts).unwrap();
        assert_eq!(h.pointer(640, 480), Point::new(83, 240));
    }

    #[test]
    fn sample_from_hand() {
        let h = hand_with_tips([0.1, 0.25, 0.4, 0.55, 0.7]);
        let s = GestureSample::from_hand(&h, 640, 480, DEFAULT_OPEN_THRESHOLD);
        assert_eq!(s.pointer, Point::new(160, 144));
        assert!(s.trigger_active);
    }

    #[test]
    fn landmark_z_defaults_when_missing() {
        let lm: Landmark = serde_json::from_str(r#"{"x":0.25,"y":0.5}"#).unwrap();
        assert_eq!(lm, Landmark::new(0.25, 0.5));
    }
}
