//! Hand trackers: LeapMotion hardware, landmark replay files, and a
//! mouse-driven simulation.
//!
//! Every source implements [`HandTracker`] and yields one [`TrackedFrame`]
//! per call: the hands seen in that frame as 21-point landmark sets.  The
//! keyboard does not care which source produced them.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::mpsc::{Receiver, TryRecvError};

use keyboard_core::hand::landmarks;
use keyboard_core::{HandLandmarks, Landmark, LandmarkError};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

// ════════════════════════════════════════════════════════════════════════════
// TrackedFrame / TrackerError
// ════════════════════════════════════════════════════════════════════════════

/// Hands detected in one frame, in detection order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackedFrame {
    pub hands: Vec<HandLandmarks>,
}

/// Why a tracker could not supply a frame.  Always ends the frame loop.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("end of landmark stream")]
    EndOfStream,

    #[error("failed to read landmarks: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: malformed frame: {source}")]
    Parse { line: usize, source: serde_json::Error },

    #[error("line {line}: {source}")]
    Landmarks { line: usize, source: LandmarkError },

    #[error("input window went away")]
    Disconnected,

    #[error("tracking device error: {0}")]
    Device(String),
}

// ════════════════════════════════════════════════════════════════════════════
// HandTracker trait
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver hand landmarks frame by frame.
pub trait HandTracker {
    fn next_frame(&mut self) -> Result<TrackedFrame, TrackerError>;
}

// ════════════════════════════════════════════════════════════════════════════
// LeapTracker: real hardware (feature = "leap")
// ════════════════════════════════════════════════════════════════════════════

/// Consecutive poll failures tolerated before a device counts as lost.
const MAX_POLL_FAILURES: u32 = 50;

/// Failure budget for a polled device.  Any success refills it.
#[cfg_attr(not(feature = "leap"), allow(dead_code))]
#[derive(Debug)]
struct RetryBudget {
    limit:    u32,
    failures: u32,
}

#[cfg_attr(not(feature = "leap"), allow(dead_code))]
impl RetryBudget {
    fn new(limit: u32) -> Self {
        RetryBudget { limit, failures: 0 }
    }

    fn success(&mut self) {
        self.failures = 0;
    }

    /// Record a failure; errors once `limit` failures happen in a row.
    fn failure(&mut self, cause: &str) -> Result<(), TrackerError> {
        self.failures += 1;
        if self.failures >= self.limit {
            return Err(TrackerError::Device(format!("{} ({} failures in a row)", cause, self.failures)));
        }
        debug!(failures = self.failures, cause, "device poll failed");
        Ok(())
    }
}

/// Tracker backed by a real LeapMotion controller.
///
/// Requires the `leap` feature flag and the LeapC shared library installed.
///
/// Leap reports millimetres above the device; positions inside a 400 mm
/// wide box are projected onto the normalized image plane, with the palm as
/// the wrist landmark and each digit contributing its metacarpal and distal
/// joints.
///
/// Each call polls once.  When no tracking event arrives the previous
/// frame is repeated, so held keys stay latched and the window keeps
/// refreshing.  A long run of poll errors is reported as
/// [`TrackerError::Device`].
#[cfg(feature = "leap")]
pub struct LeapTracker {
    connection: leaprs::Connection,
    last:       TrackedFrame,
    retries:    RetryBudget,
}

#[cfg(feature = "leap")]
impl LeapTracker {
    pub fn open() -> Result<Self, TrackerError> {
        use leaprs::*;

        let mut connection = Connection::create(ConnectionConfig::default())
            .map_err(|e| TrackerError::Device(format!("failed to open LeapC connection: {:?}", e)))?;
        connection
            .open()
            .map_err(|e| TrackerError::Device(format!("failed to open LeapMotion device: {:?}", e)))?;
        Ok(LeapTracker {
            connection,
            last:    TrackedFrame::default(),
            retries: RetryBudget::new(MAX_POLL_FAILURES),
        })
    }
}

#[cfg(feature = "leap")]
impl HandTracker for LeapTracker {
    fn next_frame(&mut self) -> Result<TrackedFrame, TrackerError> {
        use leaprs::*;

        // Interaction box, mm
        const HALF_WIDTH: f32 = 200.0;
        const FLOOR:      f32 = 50.0;
        const HEIGHT:     f32 = 400.0;

        let project = |x: f32, y: f32| {
            Landmark::new((x + HALF_WIDTH) / (2.0 * HALF_WIDTH), 1.0 - (y - FLOOR) / HEIGHT)
        };

        let msg = match self.connection.poll(100) {
            Ok(m)  => m,
            Err(e) => {
                self.retries.failure(&format!("LeapMotion poll failed: {:?}", e))?;
                return Ok(self.last.clone());
            }
        };
        self.retries.success();

        if let Event::Tracking(frame) = msg.event() {
            let hands = frame
                .hands()
                .filter_map(|hand| {
                    let palm = hand.palm().position();
                    let mut pts = vec![project(palm.x, palm.y)];
                    for digit in hand.digits() {
                        let base = digit.metacarpal();
                        let tip  = digit.distal();
                        for joint in [base.prev_joint(), base.next_joint(), tip.prev_joint(), tip.next_joint()] {
                            pts.push(project(joint.x, joint.y));
                        }
                    }
                    HandLandmarks::new(pts).ok()
                })
                .collect();
            self.last = TrackedFrame { hands };
        }
        Ok(self.last.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ReplayTracker: recorded landmarks, one JSON frame per line
// ════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize)]
struct ReplayFrame {
    #[serde(default)]
    hands: Vec<Vec<Landmark>>,
}

/// Replays frames from a JSON-lines file:
///
/// ```text
/// {"hands": []}
/// {"hands": [[{"x": 0.12, "y": 0.48}, ... 21 landmarks ...]]}
/// ```
///
/// Blank lines are skipped.  End of input is reported as
/// [`TrackerError::EndOfStream`].
pub struct ReplayTracker<R> {
    reader: R,
    line:   usize,
}

impl ReplayTracker<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, TrackerError> {
        Ok(Self::from_reader(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> ReplayTracker<R> {
    pub fn from_reader(reader: R) -> Self {
        ReplayTracker { reader, line: 0 }
    }
}

impl<R: BufRead> HandTracker for ReplayTracker<R> {
    fn next_frame(&mut self) -> Result<TrackedFrame, TrackerError> {
        let mut buf = String::new();
        loop {
            buf.clear();
            if self.reader.read_line(&mut buf)? == 0 {
                return Err(TrackerError::EndOfStream);
            }
            self.line += 1;
            if !buf.trim().is_empty() { break; }
        }

        let line = self.line;
        let raw: ReplayFrame = serde_json::from_str(&buf)
            .map_err(|source| TrackerError::Parse { line, source })?;
        let hands = raw
            .hands
            .into_iter()
            .map(HandLandmarks::new)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|source| TrackerError::Landmarks { line, source })?;
        debug!(line, hands = hands.len(), "replayed frame");
        Ok(TrackedFrame { hands })
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SimTracker: mouse simulation (always available)
// ════════════════════════════════════════════════════════════════════════════

/// Raw pointer state from the simulation window.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimInput {
    /// Mouse over the window at pixel (x, y); `open` while the left button
    /// is held.
    Pointer { x: f32, y: f32, open: bool },
    /// Mouse outside the window.
    Away,
}

/// Tracker fed by [`SimInput`] events from the visualizer's window.
///
/// The visualizer sends pointer state over a channel; this tracker turns
/// the latest state into a synthetic hand whose index fingertip sits under
/// the mouse.  Holding the left button spreads the fingers (open hand).
pub struct SimTracker {
    rx:           Receiver<SimInput>,
    frame_width:  u32,
    frame_height: u32,
    latest:       SimInput,
}

impl SimTracker {
    pub fn new(rx: Receiver<SimInput>, frame_width: u32, frame_height: u32) -> Self {
        SimTracker { rx, frame_width, frame_height, latest: SimInput::Away }
    }
}

impl HandTracker for SimTracker {
    fn next_frame(&mut self) -> Result<TrackedFrame, TrackerError> {
        loop {
            match self.rx.try_recv() {
                Ok(input) => self.latest = input,
                Err(TryRecvError::Empty)        => break,
                Err(TryRecvError::Disconnected) => return Err(TrackerError::Disconnected),
            }
        }
        let hands = match self.latest {
            SimInput::Away => Vec::new(),
            // aim at the pixel centre so projecting back lands on the same pixel
            SimInput::Pointer { x, y, open } => vec![synthetic_hand(
                (x.floor() + 0.5) / self.frame_width as f32,
                (y.floor() + 0.5) / self.frame_height as f32,
                open,
            )],
        };
        Ok(TrackedFrame { hands })
    }
}

/// Build a 21-point hand with the index fingertip at normalized (x, y).
///
/// Fingertip offsets (dx, dy) from the index tip, thumb to pinky.  Open
/// tips are more than 0.1 apart pairwise; closed ones bunch together.
pub fn synthetic_hand(x: f32, y: f32, open: bool) -> HandLandmarks {
    const OPEN:   [(f32, f32); 5] = [(-0.16, 0.08), (0.0, 0.0), (0.12, 0.01), (0.24, 0.03), (0.36, 0.06)];
    const CLOSED: [(f32, f32); 5] = [(-0.03, 0.08), (0.0, 0.0), (0.02, 0.01), (0.04, 0.03), (0.06, 0.06)];

    let wrist = Landmark::new(x + 0.08, y + 0.35);
    let tips  = if open { OPEN } else { CLOSED };

    let mut pts = [wrist; landmarks::COUNT];
    for (finger, (dx, dy)) in tips.iter().enumerate() {
        let tip = Landmark::new(x + dx, y + dy);
        for joint in 1..=4 {
            let t = joint as f32 / 4.0;
            pts[finger * 4 + joint] = Landmark::new(
                wrist.x + (tip.x - wrist.x) * t,
                wrist.y + (tip.y - wrist.y) * t,
            );
        }
        // exact tip, free of interpolation rounding
        pts[finger * 4 + 4] = tip;
    }
    HandLandmarks::from(pts)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use keyboard_core::hand::DEFAULT_OPEN_THRESHOLD;
    use keyboard_core::Point;
    use std::io::Cursor;
    use std::sync::mpsc;

    fn hand_json(x: f32, y: f32) -> String {
        let pts: Vec<String> = (0..21).map(|_| format!(r#"{{"x":{},"y":{}}}"#, x, y)).collect();
        format!("[{}]", pts.join(","))
    }

    #[test]
    fn replay_reads_frames_then_ends() {
        let data = format!("{{\"hands\": []}}\n\n{{\"hands\": [{}]}}\n", hand_json(0.5, 0.5));
        let mut t = ReplayTracker::from_reader(Cursor::new(data));
        assert!(t.next_frame().unwrap().hands.is_empty());
        let f = t.next_frame().unwrap();
        assert_eq!(f.hands.len(), 1);
        assert_eq!(f.hands[0].pointer(640, 480), Point::new(320, 240));
        assert!(matches!(t.next_frame(), Err(TrackerError::EndOfStream)));
    }

    #[test]
    fn replay_reports_bad_json_line() {
        let data = "{\"hands\": []}\nnot json\n";
        let mut t = ReplayTracker::from_reader(Cursor::new(data));
        t.next_frame().unwrap();
        match t.next_frame() {
            Err(TrackerError::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn replay_rejects_short_hands() {
        let data = r#"{"hands": [[{"x": 0.1, "y": 0.1}]]}"#;
        let mut t = ReplayTracker::from_reader(Cursor::new(data));
        assert!(matches!(t.next_frame(), Err(TrackerError::Landmarks { line: 1, .. })));
    }

    #[test]
    fn replay_open_missing_file() {
        assert!(matches!(
            ReplayTracker::open(Path::new("/nonexistent/frames.jsonl")),
            Err(TrackerError::Io(_))
        ));
    }

    #[test]
    fn retry_budget_gives_up_after_consecutive_failures() {
        let mut budget = RetryBudget::new(3);
        assert!(budget.failure("timeout").is_ok());
        assert!(budget.failure("timeout").is_ok());
        let err = budget.failure("timeout").unwrap_err();
        assert!(matches!(err, TrackerError::Device(ref m) if m.contains("3 failures")));
    }

    #[test]
    fn retry_budget_refills_on_success() {
        let mut budget = RetryBudget::new(2);
        for _ in 0..10 {
            assert!(budget.failure("timeout").is_ok());
            budget.success();
        }
    }

    #[test]
    fn synthetic_hand_open_and_closed() {
        let open = synthetic_hand(0.3, 0.4, true);
        let closed = synthetic_hand(0.3, 0.4, false);
        assert!(open.is_open(DEFAULT_OPEN_THRESHOLD));
        assert!(!closed.is_open(DEFAULT_OPEN_THRESHOLD));
        assert_eq!(open.index_tip(), Landmark::new(0.3, 0.4));
        assert_eq!(closed.index_tip(), Landmark::new(0.3, 0.4));
    }

    #[test]
    fn sim_tracks_latest_pointer() {
        let (tx, rx) = mpsc::channel();
        let mut t = SimTracker::new(rx, 640, 480);
        assert!(t.next_frame().unwrap().hands.is_empty());

        tx.send(SimInput::Pointer { x: 10.0, y: 10.0, open: false }).unwrap();
        tx.send(SimInput::Pointer { x: 320.0, y: 240.0, open: true }).unwrap();
        let f = t.next_frame().unwrap();
        assert_eq!(f.hands.len(), 1);
        assert_eq!(f.hands[0].pointer(640, 480), Point::new(320, 240));
        assert!(f.hands[0].is_open(DEFAULT_OPEN_THRESHOLD));

        // no new input: same hand again
        assert_eq!(t.next_frame().unwrap(), f);

        tx.send(SimInput::Away).unwrap();
        assert!(t.next_frame().unwrap().hands.is_empty());
    }

    #[test]
    fn sim_pointer_lands_on_the_mouse_pixel() {
        let (tx, rx) = mpsc::channel();
        let mut t = SimTracker::new(rx, 640, 480);
        for px in 0..640 {
            let py = px % 480;
            tx.send(SimInput::Pointer { x: px as f32, y: py as f32, open: false }).unwrap();
            let f = t.next_frame().unwrap();
            assert_eq!(f.hands[0].pointer(640, 480), Point::new(px, py), "pixel {}", px);
        }
    }

    #[test]
    fn sim_disconnect_ends_stream() {
        let (tx, rx) = mpsc::channel::<SimInput>();
        let mut t = SimTracker::new(rx, 640, 480);
        drop(tx);
        assert!(matches!(t.next_frame(), Err(TrackerError::Disconnected)));
    }
}
