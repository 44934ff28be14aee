//! Error types for layout validation and landmark parsing.

use thiserror::Error;

/// Problems found while building a keyboard from a layout description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyboardError {
    #[error("layout has no key rows")]
    EmptyLayout,

    #[error("key row {0} is empty")]
    EmptyRow(usize),

    #[error("suggestion row is empty")]
    NoSuggestionSlots,

    #[error("{what} must have a non-zero width and height (got {width}x{height})")]
    ZeroSize { what: &'static str, width: u32, height: u32 },

    #[error("{what} grid does not fit in pixel coordinates")]
    OutOfRange { what: &'static str },

    #[error("unknown key label {0:?}: expected a single character, \"Shift\" or \"Caps\"")]
    UnknownKey(String),

    #[error("suggestion rule {0} has an empty trigger")]
    EmptyTrigger(usize),
}

/// A tracked hand did not carry the full landmark set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LandmarkError {
    #[error("expected {expected} landmarks, got {got}")]
    TooFewLandmarks { expected: usize, got: usize },
}
