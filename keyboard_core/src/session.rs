//! Typed-text buffer with Shift and Caps state.

use crate::error::KeyboardError;

/// What a key does when activated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Char(char),
    Shift,
    Caps,
}

impl KeyAction {
    /// Parse a key label: `"Shift"`, `"Caps"`, or a single character.
    pub fn parse(label: &str) -> Result<Self, KeyboardError> {
        match label {
            "Shift" => Ok(KeyAction::Shift),
            "Caps"  => Ok(KeyAction::Caps),
            _ => {
                let mut chars = label.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(KeyAction::Char(c)),
                    _ => Err(KeyboardError::UnknownKey(label.to_string())),
                }
            }
        }
    }
}

/// Effect of a key press on the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyOutcome {
    /// A character was appended to the buffer.
    Typed(char),
    ShiftToggled(bool),
    CapsToggled(bool),
}

/// Typed text plus modifier flags.  Starts empty with both flags off.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypingSession {
    text:  String,
    shift: bool,
    caps:  bool,
}

impl TypingSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_shift_active(&self) -> bool {
        self.shift
    }

    pub fn is_caps_active(&self) -> bool {
        self.caps
    }

    /// Apply a key.  Shift is single-shot: it clears after the next
    /// character, while Caps stays on until toggled again.
    pub fn press(&mut self, action: KeyAction) -> KeyOutcome {
        match action {
            KeyAction::Shift => {
                self.shift = !self.shift;
                KeyOutcome::ShiftToggled(self.shift)
            }
            KeyAction::Caps => {
                self.caps = !self.caps;
                KeyOutcome::CapsToggled(self.caps)
            }
            KeyAction::Char(c) => {
                let folded = if self.shift || self.caps {
                    c.to_uppercase().next().unwrap_or(c)
                } else {
                    c.to_lowercase().next().unwrap_or(c)
                };
                self.text.push(folded);
                self.shift = false;
                KeyOutcome::Typed(folded)
            }
        }
    }

    /// Append a suggestion after a single space separator.
    pub fn accept_suggestion(&mut self, suggestion: &str) {
        self.text.push(' ');
        self.text.push_str(suggestion);
    }
}
