//! Static layout description for the key grid and the suggestion row.

use serde::{Deserialize, Serialize};

use crate::error::KeyboardError;
use crate::session::KeyAction;
use crate::target::{saturate, InteractiveTarget, Point};

/// A grid of equally sized buttons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grid {
    pub origin: Point,
    pub width:  u32,
    pub height: u32,
    pub gap:    u32,
}

impl Grid {
    fn cell(&self, row: usize, col: usize) -> Point {
        let (x, y) = self.offset(row, col);
        Point::new(saturate(x), saturate(y))
    }

    /// Top-left of a cell, widened.
    fn offset(&self, row: usize, col: usize) -> (i64, i64) {
        let step_x = self.width as i64 + self.gap as i64;
        let step_y = self.height as i64 + self.gap as i64;
        (
            self.origin.x as i64 + (col as i64).saturating_mul(step_x),
            self.origin.y as i64 + (row as i64).saturating_mul(step_y),
        )
    }

    /// Non-zero cells, and a `rows`×`cols` block whose far corner stays
    /// within `i32`.
    fn check(&self, what: &'static str, rows: usize, cols: usize) -> Result<(), KeyboardError> {
        if self.width == 0 || self.height == 0 {
            return Err(KeyboardError::ZeroSize { what, width: self.width, height: self.height });
        }
        let (x, y) = self.offset(rows.saturating_sub(1), cols.saturating_sub(1));
        let right  = x.saturating_add(self.width as i64);
        let bottom = y.saturating_add(self.height as i64);
        if right > i32::MAX as i64 || bottom > i32::MAX as i64 {
            return Err(KeyboardError::OutOfRange { what });
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyboardLayout {
    /// Key labels, row by row.
    pub rows:        Vec<Vec<String>>,
    pub keys:        Grid,
    /// Initial suggestion labels; also fixes the number of suggestion slots.
    pub suggestions: Vec<String>,
    pub suggestion:  Grid,
}

impl Default for KeyboardLayout {
    fn default() -> Self {
        let row = |s: &str| s.split(' ').map(str::to_string).collect::<Vec<_>>();
        KeyboardLayout {
            rows: vec![
                row("Q W E R T Y U I O P"),
                row("A S D F G H J K L"),
                row("Z X C V B N M Shift Caps"),
            ],
            keys:        Grid { origin: Point::new(50, 200), width: 60,  height: 60, gap: 10 },
            suggestions: row("Hello How Are You"),
            suggestion:  Grid { origin: Point::new(50, 100), width: 300, height: 60, gap: 10 },
        }
    }
}

/// A key target together with what it does.
#[derive(Clone, Debug, PartialEq)]
pub struct Key {
    pub target: InteractiveTarget,
    pub action: KeyAction,
}

impl AsMut<InteractiveTarget> for Key {
    fn as_mut(&mut self) -> &mut InteractiveTarget {
        &mut self.target
    }
}

impl KeyboardLayout {
    pub fn validate(&self) -> Result<(), KeyboardError> {
        if self.rows.is_empty() {
            return Err(KeyboardError::EmptyLayout);
        }
        if let Some(i) = self.rows.iter().position(Vec::is_empty) {
            return Err(KeyboardError::EmptyRow(i));
        }
        if self.suggestions.is_empty() {
            return Err(KeyboardError::NoSuggestionSlots);
        }
        let widest = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        self.keys.check("key", self.rows.len(), widest)?;
        self.suggestion.check("suggestion", 1, self.suggestions.len())?;
        for label in self.rows.iter().flatten() {
            KeyAction::parse(label)?;
        }
        Ok(())
    }

    /// Key targets in row-major order.
    pub fn build_keys(&self) -> Result<Vec<Key>, KeyboardError> {
        self.validate()?;
        let mut keys = Vec::new();
        for (r, row) in self.rows.iter().enumerate() {
            for (c, label) in row.iter().enumerate() {
                keys.push(Key {
                    target: InteractiveTarget::new(self.keys.cell(r, c), self.keys.width, self.keys.height, label.as_str()),
                    action: KeyAction::parse(label)?,
                });
            }
        }
        Ok(keys)
    }

    /// Suggestion targets, left to right.
    pub fn build_suggestions(&self) -> Result<Vec<InteractiveTarget>, KeyboardError> {
        self.validate()?;
        Ok(self
            .suggestions
            .iter()
            .enumerate()
            .map(|(i, s)| {
                InteractiveTarget::new(self.suggestion.cell(0, i), self.suggestion.width, self.suggestion.height, s.as_str())
            })
            .collect())
    }
}
