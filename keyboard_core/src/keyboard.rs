//! The per-frame keyboard controller.
//!
//! `VirtualKeyboard` owns both target groups (keys, then suggestions), the
//! typing session and the suggestion table.  Each frame it receives the
//! detected hands, runs a first-match scan over each group per hand, and
//! applies whatever fired to the session.

use std::thread;
use std::time::Duration;

use tracing::{debug, info};

use crate::error::KeyboardError;
use crate::hand::{GestureSample, HandLandmarks, DEFAULT_OPEN_THRESHOLD};
use crate::layout::{Key, KeyboardLayout};
use crate::session::{KeyAction, KeyOutcome, TypingSession};
use crate::suggest::SuggestionTable;
use crate::target::{self, InteractiveTarget, Point, TargetState, DEFAULT_TOLERANCE};

/// Delay after a typed character before suggestions are recomputed.
pub const DEFAULT_PRESS_DELAY: Duration = Duration::from_millis(200);

// ════════════════════════════════════════════════════════════════════════════
// KeyboardEvent
// ════════════════════════════════════════════════════════════════════════════

/// Something that happened to the session during a frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeyboardEvent {
    Typed { ch: char },
    ShiftToggled { active: bool },
    CapsToggled { active: bool },
    SuggestionAccepted { suggestion: String },
}

// ════════════════════════════════════════════════════════════════════════════
// KeyboardSettings
// ════════════════════════════════════════════════════════════════════════════

/// Tunables for hit-testing and activation.
#[derive(Clone, Debug, PartialEq)]
pub struct KeyboardSettings {
    pub tolerance:      i32,
    pub open_threshold: f32,
    /// Blocking pause after each typed character.
    pub press_delay:    Duration,
    pub frame_width:    u32,
    pub frame_height:   u32,
}

impl Default for KeyboardSettings {
    fn default() -> Self {
        KeyboardSettings {
            tolerance:      DEFAULT_TOLERANCE,
            open_threshold: DEFAULT_OPEN_THRESHOLD,
            press_delay:    DEFAULT_PRESS_DELAY,
            frame_width:    640,
            frame_height:   480,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// VirtualKeyboard
// ════════════════════════════════════════════════════════════════════════════

pub struct VirtualKeyboard {
    keys:        Vec<Key>,
    suggestions: Vec<InteractiveTarget>,
    session:     TypingSession,
    table:       SuggestionTable,
    settings:    KeyboardSettings,
}

impl VirtualKeyboard {
    pub fn new(
        layout:   &KeyboardLayout,
        table:    SuggestionTable,
        settings: KeyboardSettings,
    ) -> Result<Self, KeyboardError> {
        table.validate()?;
        Ok(VirtualKeyboard {
            keys:        layout.build_keys()?,
            suggestions: layout.build_suggestions()?,
            session:     TypingSession::new(),
            table,
            settings,
        })
    }

    pub fn session(&self) -> &TypingSession     { &self.session }
    pub fn settings(&self) -> &KeyboardSettings { &self.settings }
    pub fn keys(&self) -> &[Key]                { &self.keys }
    pub fn suggestions(&self) -> &[InteractiveTarget] { &self.suggestions }

    /// Every target, keys first, with its render state for `pointer`.
    pub fn target_states(&self, pointer: Option<Point>) -> Vec<(&InteractiveTarget, TargetState)> {
        let tol = self.settings.tolerance;
        self.keys
            .iter()
            .map(|k| &k.target)
            .chain(self.suggestions.iter())
            .map(|t| (t, t.state(pointer, tol)))
            .collect()
    }

    /// Convert a detected hand into a sample using the configured frame
    /// size and open-hand threshold.
    pub fn sample(&self, hand: &HandLandmarks) -> GestureSample {
        GestureSample::from_hand(
            hand,
            self.settings.frame_width,
            self.settings.frame_height,
            self.settings.open_threshold,
        )
    }

    /// Process one frame of tracker output.
    ///
    /// With no hands every target is released.  Otherwise each hand is
    /// scanned against the keys, then the suggestions, each group stopping
    /// at its first hovered target.
    pub fn process_frame(&mut self, hands: &[HandLandmarks]) -> Vec<KeyboardEvent> {
        if hands.is_empty() {
            self.release_all();
            return Vec::new();
        }
        let samples: Vec<GestureSample> = hands.iter().map(|h| self.sample(h)).collect();
        let mut events = Vec::new();
        for s in &samples {
            self.apply_sample(s, &mut events);
        }
        events
    }

    /// Run one sample through both groups.
    pub fn apply_sample(&mut self, sample: &GestureSample, events: &mut Vec<KeyboardEvent>) {
        let tol = self.settings.tolerance;

        let outcome = target::scan(&mut self.keys, sample, tol);
        if let Some(i) = outcome.fired_index() {
            let action = self.keys[i].action;
            events.push(self.on_key(action));
        }

        let outcome = target::scan(&mut self.suggestions, sample, tol);
        if let Some(i) = outcome.fired_index() {
            if let Some(e) = self.on_suggestion(i) {
                events.push(e);
            }
        }
    }

    /// Release every latch in both groups.
    pub fn release_all(&mut self) {
        target::release_all(&mut self.keys);
        target::release_all(&mut self.suggestions);
    }

    fn on_key(&mut self, action: KeyAction) -> KeyboardEvent {
        match self.session.press(action) {
            KeyOutcome::Typed(ch) => {
                info!("Typed Text: {}", self.session.text());
                if !self.settings.press_delay.is_zero() {
                    thread::sleep(self.settings.press_delay);
                }
                self.refresh_suggestions();
                KeyboardEvent::Typed { ch }
            }
            KeyOutcome::ShiftToggled(active) => {
                debug!(active, "shift toggled");
                KeyboardEvent::ShiftToggled { active }
            }
            KeyOutcome::CapsToggled(active) => {
                debug!(active, "caps toggled");
                KeyboardEvent::CapsToggled { active }
            }
        }
    }

    /// Blank slots are still hit-tested but type nothing.
    fn on_suggestion(&mut self, index: usize) -> Option<KeyboardEvent> {
        let suggestion = self.suggestions[index].label.clone();
        if suggestion.is_empty() {
            return None;
        }
        self.session.accept_suggestion(&suggestion);
        info!("Typed Text: {}", self.session.text());
        Some(KeyboardEvent::SuggestionAccepted { suggestion })
    }

    /// Relabel the suggestion row from the table, blanking surplus slots.
    pub fn refresh_suggestions(&mut self) {
        let picked = self.table.pick(self.session.text());
        for (i, slot) in self.suggestions.iter_mut().enumerate() {
            slot.label = picked.get(i).cloned().unwrap_or_default();
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::{landmarks, Landmark};
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing_subscriber::fmt::MakeWriter;

    fn keyboard() -> VirtualKeyboard {
        let settings = KeyboardSettings { press_delay: Duration::ZERO, ..KeyboardSettings::default() };
        VirtualKeyboard::new(&KeyboardLayout::default(), SuggestionTable::default(), settings).unwrap()
    }

    /// A hand whose index tip sits on pixel (px, py) of a 640x480 frame.
    fn hand_at(px: i32, py: i32, open: bool) -> HandLandmarks {
        let (x, y) = (px as f32 / 640.0 + 0.0001, py as f32 / 480.0 + 0.0001);
        let spacing = if open { 0.15 } else { 0.02 };
        let mut pts = vec![Landmark::new(x, (y + 0.3).min(1.0)); landmarks::COUNT];
        for (n, tip) in landmarks::FINGERTIPS.iter().enumerate() {
            pts[*tip] = Landmark::new(x + (n as f32 - 1.0) * spacing, y);
        }
        HandLandmarks::new(pts).unwrap()
    }

    fn centre(kb: &VirtualKeyboard, label: &str) -> (i32, i32) {
        let t = kb.keys().iter().map(|k| &k.target).find(|t| t.label == label).unwrap();
        (t.pos.x + t.width as i32 / 2, t.pos.y + t.height as i32 / 2)
    }

    fn tap(kb: &mut VirtualKeyboard, label: &str) -> Vec<KeyboardEvent> {
        let (x, y) = centre(kb, label);
        let events = kb.process_frame(&[hand_at(x, y, true)]);
        kb.process_frame(&[]);
        events
    }

    fn type_str(kb: &mut VirtualKeyboard, s: &str) {
        for c in s.chars() {
            tap(kb, &c.to_ascii_uppercase().to_string());
        }
    }

    fn labels(kb: &VirtualKeyboard) -> Vec<String> {
        kb.suggestions().iter().map(|t| t.label.clone()).collect()
    }

    #[test]
    fn types_hello() {
        let mut kb = keyboard();
        type_str(&mut kb, "hello");
        assert_eq!(kb.session().text(), "hello");
    }

    #[test]
    fn types_hello_with_caps() {
        let mut kb = keyboard();
        tap(&mut kb, "Caps");
        type_str(&mut kb, "hello");
        assert_eq!(kb.session().text(), "HELLO");
    }

    #[test]
    fn huge_tolerance_hits_first_target() {
        let settings = KeyboardSettings {
            tolerance:   i32::MAX,
            press_delay: Duration::ZERO,
            ..KeyboardSettings::default()
        };
        let mut kb = VirtualKeyboard::new(&KeyboardLayout::default(), SuggestionTable::default(), settings).unwrap();
        let events = kb.process_frame(&[hand_at(320, 240, true)]);
        assert_eq!(events[0], KeyboardEvent::Typed { ch: 'q' });
        assert!(kb.keys()[0].target.is_activated());
    }

    /// Collects formatted log output.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> { Ok(()) }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;
        fn make_writer(&'a self) -> Self::Writer { self.clone() }
    }

    #[test]
    fn typing_logs_the_whole_buffer() {
        let out = Captured::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(out.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut kb = keyboard();
            tap(&mut kb, "Shift");
            type_str(&mut kb, "hi");
            // first suggestion slot
            kb.process_frame(&[hand_at(200, 130, true)]);
        });

        let logs = String::from_utf8(out.0.lock().unwrap().clone()).unwrap();
        let typed: Vec<&str> = logs
            .lines()
            .filter_map(|l| l.split_once("Typed Text: ").map(|(_, t)| t))
            .collect();
        assert_eq!(typed, vec![
            "H",
            "Hi",
            "Hi Hii my name is Ishu-Parul and we are from IGDTUW",
        ]);
    }

    #[test]
    fn held_open_hand_types_once() {
        let mut kb = keyboard();
        let (x, y) = centre(&kb, "Q");
        for _ in 0..10 {
            kb.process_frame(&[hand_at(x, y, true)]);
        }
        assert_eq!(kb.session().text(), "q");
    }

    #[test]
    fn closed_hand_never_types() {
        let mut kb = keyboard();
        let (x, y) = centre(&kb, "Q");
        assert!(kb.process_frame(&[hand_at(x, y, false)]).is_empty());
        assert_eq!(kb.session().text(), "");
    }

    #[test]
    fn moving_between_keys_rearms() {
        let mut kb = keyboard();
        let (qx, qy) = centre(&kb, "Q");
        let (wx, wy) = centre(&kb, "W");
        for (x, y) in [(qx, qy), (wx, wy), (qx, qy)] {
            kb.process_frame(&[hand_at(x, y, true)]);
        }
        assert_eq!(kb.session().text(), "qwq");
    }

    #[test]
    fn no_hand_releases_latches() {
        let mut kb = keyboard();
        let (x, y) = centre(&kb, "Q");
        kb.process_frame(&[hand_at(x, y, true)]);
        assert!(kb.keys()[0].target.is_activated());
        kb.process_frame(&[]);
        assert!(kb.keys().iter().all(|k| !k.target.is_activated()));
        kb.process_frame(&[hand_at(x, y, true)]);
        assert_eq!(kb.session().text(), "qq");
    }

    #[test]
    fn shift_then_letter() {
        let mut kb = keyboard();
        assert_eq!(tap(&mut kb, "Shift"), vec![KeyboardEvent::ShiftToggled { active: true }]);
        assert_eq!(tap(&mut kb, "A"), vec![KeyboardEvent::Typed { ch: 'A' }]);
        assert!(!kb.session().is_shift_active());
        tap(&mut kb, "A");
        assert_eq!(kb.session().text(), "Aa");
    }

    #[test]
    fn shift_twice_is_inactive() {
        let mut kb = keyboard();
        tap(&mut kb, "Shift");
        tap(&mut kb, "Shift");
        assert!(!kb.session().is_shift_active());
        assert_eq!(kb.session().text(), "");
    }

    #[test]
    fn suggestions_follow_typed_text() {
        let mut kb = keyboard();
        assert_eq!(labels(&kb), vec!["Hello", "How", "Are", "You"]);

        type_str(&mut kb, "x");
        assert_eq!(labels(&kb)[2], "How can I help you today?");
        assert_eq!(labels(&kb)[3], "");

        tap(&mut kb, "Shift");
        type_str(&mut kb, "hello");
        assert_eq!(kb.session().text(), "xHello");
        assert!(labels(&kb)[..3].iter().all(|l| l.starts_with("Hello, ")));

        tap(&mut kb, "Shift");
        type_str(&mut kb, "hii");
        assert!(labels(&kb)[..3].iter().all(|l| l.starts_with("Hii my name is")));
    }

    #[test]
    fn accepting_a_suggestion_appends_it() {
        let mut kb = keyboard();
        let s = &kb.suggestions()[0];
        let (x, y) = (s.pos.x + 20, s.pos.y + 20);
        let events = kb.process_frame(&[hand_at(x, y, true)]);
        assert_eq!(events, vec![KeyboardEvent::SuggestionAccepted { suggestion: "Hello".into() }]);
        assert_eq!(kb.session().text(), " Hello");
        // suggestion activation does not refresh the row
        assert_eq!(labels(&kb)[1], "How");
    }

    #[test]
    fn blank_suggestion_types_nothing() {
        let mut kb = keyboard();
        type_str(&mut kb, "x");
        kb.release_all();
        let blank = GestureSample { pointer: Point::new(1000, 120), trigger_active: true };
        let mut events = Vec::new();
        kb.apply_sample(&blank, &mut events);
        assert!(events.is_empty());
        assert!(kb.suggestions()[3].is_activated());
        assert_eq!(kb.session().text(), "x");
    }

    #[test]
    fn target_states_mark_latched_key() {
        let mut kb = keyboard();
        let (x, y) = centre(&kb, "Q");
        kb.process_frame(&[hand_at(x, y, true)]);
        let states = kb.target_states(Some(Point::new(x, y)));
        assert_eq!(states.len(), 32);
        assert_eq!(states[0].1, TargetState::HoveredLatched);
        assert_eq!(states[1].1, TargetState::Idle);
    }
}
