//! # air_keyboard
//!
//! Fingertip-driven virtual keyboard.  The index fingertip is the pointer;
//! spreading all five fingers "presses" whatever it is over.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Over | Action |
//! |---|---|---|
//! | Open hand (fingers spread) | Letter key | Type the letter (upper case under Shift or Caps) |
//! | Open hand | `Shift` | Toggle one-shot shift |
//! | Open hand | `Caps` | Toggle caps lock |
//! | Open hand | Suggestion | Append `" " + suggestion` |
//! | Closed hand / move away | Anything | Re-arm the target for the next press |
//! | No hand in frame | anything | Re-arm every target |
//!
//! ## Visualization
//!
//! Keys and suggestions are drawn as translucent tiles over the frame.  A
//! hovered tile gets a white border and turns green while latched.  The
//! tracked hand is drawn as a skeleton, and the typed text runs along the
//! status bar at the bottom.
//!
//! ## Feature flags
//!
//! * (default): **Simulation mode**: the mouse is the index fingertip.
//! * `leap`: **Hardware mode**: polls a real LeapMotion controller via LeapC.
//!
//! ### Simulation controls
//!
//! | Input | Gesture |
//! |---|---|
//! | Mouse move | Index fingertip |
//! | Left button held | Open hand |
//! | Mouse leaves window | Hand lost |
//! | `Q` | Quit |

pub mod config;
pub mod tracker;
pub mod visualizer;
pub mod app;
