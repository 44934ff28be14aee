//! Top-level application state and the frame loop.
//!
//! `AppState` owns the `VirtualKeyboard` and the most recent hands.  Each
//! iteration pulls one frame from the tracker, feeds it to the keyboard,
//! and presents the result.

use std::path::PathBuf;
use std::sync::mpsc;

use keyboard_core::{HandLandmarks, KeyboardEvent, VirtualKeyboard};
use tracing::{error, info};

use crate::config::AppConfig;
use crate::tracker::{HandTracker, ReplayTracker, SimTracker, TrackedFrame};
use crate::visualizer::{NullSurface, Scene, Surface, Visualizer};

// ════════════════════════════════════════════════════════════════════════════
// Mode
// ════════════════════════════════════════════════════════════════════════════

/// Where hands come from and where frames go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    /// Mouse-driven hand in a window.
    Simulation,
    /// Landmarks from a JSON-lines file, shown in a window unless headless.
    Replay { path: PathBuf, headless: bool },
    /// LeapMotion hardware (feature `leap`).
    #[cfg(feature = "leap")]
    Leap,
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    keyboard:  VirtualKeyboard,
    max_hands: usize,
    hands:     Vec<HandLandmarks>,
    pub status: String,
}

impl AppState {
    pub fn new(cfg: &AppConfig) -> anyhow::Result<Self> {
        let keyboard = VirtualKeyboard::new(&cfg.layout, cfg.suggestions.clone(), cfg.keyboard_settings())?;
        let settings = keyboard.settings();
        info!(
            keys      = keyboard.keys().len(),
            tolerance = settings.tolerance,
            frame     = %format!("{}x{}", settings.frame_width, settings.frame_height),
            "keyboard ready"
        );
        Ok(AppState {
            keyboard,
            max_hands: cfg.max_hands,
            hands:     Vec::new(),
            status:    "Ready: point at a key and open your hand".to_string(),
        })
    }

    pub fn keyboard(&self) -> &VirtualKeyboard { &self.keyboard }
    pub fn typed(&self) -> &str                { self.keyboard.session().text() }

    // ── process one TrackedFrame ─────────────────────────────────────────

    pub fn handle_frame(&mut self, frame: TrackedFrame) -> Vec<KeyboardEvent> {
        self.hands = frame.hands;
        self.hands.truncate(self.max_hands);

        let events = self.keyboard.process_frame(&self.hands);
        if let Some(last) = events.last() {
            self.status = match last {
                KeyboardEvent::Typed { ch }                 => format!("Typed '{}'", ch),
                KeyboardEvent::ShiftToggled { active }      => format!("Shift {}", on_off(*active)),
                KeyboardEvent::CapsToggled { active }       => format!("Caps {}", on_off(*active)),
                KeyboardEvent::SuggestionAccepted { .. }    => "Suggestion accepted".to_string(),
            };
        }
        events
    }

    /// Snapshot for the renderer.
    pub fn scene(&self) -> Scene<'_> {
        let pointer = self.hands.first().map(|h| self.keyboard.sample(h).pointer);
        Scene {
            targets: self.keyboard.target_states(pointer),
            hands:   &self.hands,
            typed:   self.typed(),
            status:  &self.status,
        }
    }
}

fn on_off(active: bool) -> &'static str {
    if active { "on" } else { "off" }
}

// ════════════════════════════════════════════════════════════════════════════
// run()
// ════════════════════════════════════════════════════════════════════════════

/// Drive `app` until the tracker runs dry or the surface asks to quit.
///
/// A tracker failure is the only way the loop fails; it is logged and the
/// loop ends normally.
pub fn run_loop(app: &mut AppState, tracker: &mut dyn HandTracker, surface: &mut dyn Surface) {
    loop {
        let frame = match tracker.next_frame() {
            Ok(f)  => f,
            Err(e) => {
                error!("Failed to capture frame: {}", e);
                break;
            }
        };
        app.handle_frame(frame);

        if !surface.present(&app.scene()) {
            info!("quit requested");
            break;
        }
    }
}

/// Run the full application.
///
/// This is the entry point called from `main.rs`.  It builds the tracker and
/// surface for `mode` and returns the final typed text.
pub fn run(cfg: AppConfig, mode: Mode) -> anyhow::Result<String> {
    let mut app = AppState::new(&cfg)?;

    match mode {
        Mode::Simulation => {
            let (sim_tx, sim_rx) = mpsc::channel();
            let mut vis = Visualizer::new(cfg.frame_width, cfg.frame_height, cfg.transparency, Some(sim_tx))?;
            let mut tracker = SimTracker::new(sim_rx, cfg.frame_width, cfg.frame_height);
            run_loop(&mut app, &mut tracker, &mut vis);
        }
        Mode::Replay { path, headless } => {
            let mut tracker = ReplayTracker::open(&path)?;
            if headless {
                run_loop(&mut app, &mut tracker, &mut NullSurface);
            } else {
                let mut vis = Visualizer::new(cfg.frame_width, cfg.frame_height, cfg.transparency, None)?;
                run_loop(&mut app, &mut tracker, &mut vis);
            }
        }
        #[cfg(feature = "leap")]
        Mode::Leap => {
            let mut tracker = crate::tracker::LeapTracker::open()?;
            let mut vis = Visualizer::new(cfg.frame_width, cfg.frame_height, cfg.transparency, None)?;
            run_loop(&mut app, &mut tracker, &mut vis);
        }
    }

    Ok(app.typed().to_string())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
