//! # keyboard_core
//!
//! The input model behind a fingertip-driven virtual keyboard.
//!
//! A hand tracker reports, per video frame, zero or more hands as lists of
//! 21 normalized landmarks.  Each hand becomes a [`GestureSample`]: the
//! index fingertip is the pointer, and an open hand (all fingertips spread
//! apart) is the "click".
//!
//! Keys and suggestion buttons are [`InteractiveTarget`]s.  A target fires
//! once when an open hand points at it and then stays latched until the
//! pointer leaves, so holding still over a key types one character.
//!
//! ## Per-frame rules
//!
//! | Situation | Effect |
//! |---|---|
//! | No hand in frame | every target re-arms |
//! | Pointer over a key, hand open, key armed | key fires and latches |
//! | Pointer over a latched key | nothing |
//! | Pointer leaves a key | key re-arms |
//! | Several targets under the pointer | only the first in layout order is evaluated |
//!
//! ## Quick start
//!
//! ```rust
//! use keyboard_core::{KeyboardLayout, KeyboardSettings, SuggestionTable, VirtualKeyboard};
//!
//! let mut kb = VirtualKeyboard::new(
//!     &KeyboardLayout::default(),
//!     SuggestionTable::default(),
//!     KeyboardSettings::default(),
//! ).unwrap();
//!
//! // no hands this frame
//! assert!(kb.process_frame(&[]).is_empty());
//! assert_eq!(kb.session().text(), "");
//! ```

pub mod error;
pub mod hand;
pub mod keyboard;
pub mod layout;
pub mod session;
pub mod suggest;
pub mod target;

pub use error::{KeyboardError, LandmarkError};
pub use hand::{GestureSample, HandLandmarks, Landmark};
pub use keyboard::{KeyboardEvent, KeyboardSettings, VirtualKeyboard};
pub use layout::{Grid, Key, KeyboardLayout};
pub use session::{KeyAction, KeyOutcome, TypingSession};
pub use suggest::{SuggestionRule, SuggestionTable};
pub use target::{InteractiveTarget, Point, ScanOutcome, TargetState};
