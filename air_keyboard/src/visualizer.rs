//! Software-rendered keyboard overlay using `minifb`.
//!
//! Layout (default 640×480):
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │  [ suggestion 0 ][ suggestion 1 ]…               │
//! │                                                  │
//! │  [Q][W][E][R][T][Y][U][I][O][P]                  │
//! │  [A][S][D][F][G][H][J][K][L]                     │
//! │  [Z][X][C][V][B][N][M][Shift][Caps]              │
//! │                                                  │
//! │  typed text / status bar                         │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! Targets are blended over the frame at the configured transparency: green
//! once latched, blue otherwise.  Detected hands are drawn as a skeleton.

use std::sync::mpsc::Sender;
use std::time::Duration;

use anyhow::Context;
use keyboard_core::hand::HAND_CONNECTIONS;
use keyboard_core::{HandLandmarks, InteractiveTarget, Point, TargetState};
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use crate::tracker::SimInput;

// ════════════════════════════════════════════════════════════════════════════
// Colors
// ════════════════════════════════════════════════════════════════════════════

const BG_COLOR:      u32 = 0xFF1A1A2E;
const KEY_COLOR:     u32 = 0xFF0000FF;  // blue
const LATCHED_COLOR: u32 = 0xFF00FF00;  // green
const HOVER_BORDER:  u32 = 0xFFFFFFFF;
const LABEL_COLOR:   u32 = 0xFFFFFFFF;
const BONE_COLOR:    u32 = 0xFFEEEEEE;
const JOINT_COLOR:   u32 = 0xFFFF3030;
const TEXT_BG:       u32 = 0xFF0F3460;
const STATUS_H:      usize = 40;

// ════════════════════════════════════════════════════════════════════════════
// Scene / Surface
// ════════════════════════════════════════════════════════════════════════════

/// Everything needed to draw one frame.
pub struct Scene<'a> {
    /// Keys then suggestions, each with its state under the first hand's
    /// pointer.
    pub targets: Vec<(&'a InteractiveTarget, TargetState)>,
    pub hands:   &'a [HandLandmarks],
    pub typed:   &'a str,
    pub status:  &'a str,
}

/// Where frames are shown.
pub trait Surface {
    /// Show `scene`.  Returns false once the user asked to quit.
    fn present(&mut self, scene: &Scene<'_>) -> bool;
}

/// Draws nothing and never quits; used for headless replay.
#[derive(Debug, Default)]
pub struct NullSurface;

impl Surface for NullSurface {
    fn present(&mut self, _scene: &Scene<'_>) -> bool {
        true
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Visualizer
// ════════════════════════════════════════════════════════════════════════════

pub struct Visualizer {
    window:       Window,
    buf:          Vec<u32>,
    width:        usize,
    height:       usize,
    transparency: f32,
    sim_tx:       Option<Sender<SimInput>>,
}

impl Visualizer {
    /// Open the window.  When `sim_tx` is given, mouse state is forwarded
    /// to the simulation tracker every frame.
    pub fn new(
        width:        u32,
        height:       u32,
        transparency: f32,
        sim_tx:       Option<Sender<SimInput>>,
    ) -> anyhow::Result<Self> {
        let (width, height) = (width as usize, height as usize);
        let mut window = Window::new(
            "Air Keyboard (press Q to quit)",
            width, height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        )
        .context("Failed to open visualizer window")?;

        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        Ok(Visualizer {
            window,
            buf: vec![BG_COLOR; width * height],
            width,
            height,
            transparency,
            sim_tx,
        })
    }

    /// Forward mouse state to the sim tracker.
    fn poll_pointer(&mut self) {
        let Some(tx) = &self.sim_tx else { return };
        let input = match self.window.get_mouse_pos(MouseMode::Discard) {
            Some((x, y)) => SimInput::Pointer {
                x,
                y,
                open: self.window.get_mouse_down(MouseButton::Left),
            },
            None => SimInput::Away,
        };
        let _ = tx.send(input);
    }

    fn render(&mut self, scene: &Scene<'_>) {
        self.buf.fill(BG_COLOR);

        // ── Targets ───────────────────────────────────────────────────────
        for (target, state) in &scene.targets {
            let color = if target.is_activated() { LATCHED_COLOR } else { KEY_COLOR };
            let top_left     = self.clamp_to_frame(target.pos);
            let bottom_right = self.clamp_to_frame(Point::new(target.right(), target.bottom()));
            let (x, y) = (top_left.x, top_left.y);
            let (w, h) = (bottom_right.x - x, bottom_right.y - y);
            self.blend_rect(x, y, w, h, color, self.transparency);
            if *state != TargetState::Idle {
                self.draw_border(x, y, w, h, HOVER_BORDER);
            }
            self.draw_label_centered(&target.label, x, y, w, h, LABEL_COLOR);
        }

        // ── Hands ─────────────────────────────────────────────────────────
        let (fw, fh) = (self.width as u32, self.height as u32);
        for hand in scene.hands {
            for &(a, b) in HAND_CONNECTIONS.iter() {
                let pa = self.clamp_to_frame(hand.get(a).to_pixel(fw, fh));
                let pb = self.clamp_to_frame(hand.get(b).to_pixel(fw, fh));
                self.draw_line(pa, pb, BONE_COLOR);
            }
            for lm in hand.points() {
                let p = self.clamp_to_frame(lm.to_pixel(fw, fh));
                self.fill_rect(p.x - 2, p.y - 2, 5, 5, JOINT_COLOR);
            }
        }

        // ── Status bar ────────────────────────────────────────────────────
        let status_y = self.height.saturating_sub(STATUS_H) as i32;
        self.fill_rect(0, status_y, self.width as i32, STATUS_H as i32, TEXT_BG);
        let typed = format!("Typed: {}", scene.typed);
        self.draw_label(&typed, 8, status_y + 6, 2, LABEL_COLOR);
        self.draw_label(scene.status, 8, status_y + 24, 2, 0xFF888888);

        self.window.update_with_buffer(&self.buf, self.width, self.height).ok();
    }

    // ── Primitive drawing helpers ─────────────────────────────────────────

    fn clamp_to_frame(&self, p: Point) -> Point {
        clamp_point(p, self.width, self.height)
    }

    fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.buf[y as usize * self.width + x as usize] = color;
        }
    }

    /// Clip a rectangle to the buffer, returning pixel ranges.
    fn clip(&self, x: i32, y: i32, w: i32, h: i32) -> (std::ops::Range<usize>, std::ops::Range<usize>) {
        let x0 = x.clamp(0, self.width as i32) as usize;
        let x1 = (x + w).clamp(0, self.width as i32) as usize;
        let y0 = y.clamp(0, self.height as i32) as usize;
        let y1 = (y + h).clamp(0, self.height as i32) as usize;
        (x0..x1, y0..y1)
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        let (cols, rows) = self.clip(x, y, w, h);
        for row in rows {
            for col in cols.clone() {
                self.buf[row * self.width + col] = color;
            }
        }
    }

    /// Mix `color` into whatever is underneath at opacity `alpha`.
    fn blend_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32, alpha: f32) {
        let (cols, rows) = self.clip(x, y, w, h);
        for row in rows {
            for col in cols.clone() {
                let i = row * self.width + col;
                self.buf[i] = blend(self.buf[i], color, alpha);
            }
        }
    }

    fn draw_border(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        for col in x..x + w {
            self.set_pixel(col, y, color);
            self.set_pixel(col, y + h - 1, color);
        }
        for row in y..y + h {
            self.set_pixel(x, row, color);
            self.set_pixel(x + w - 1, row, color);
        }
    }

    fn draw_line(&mut self, a: Point, b: Point, color: u32) {
        let steps = (b.x - a.x).abs().max((b.y - a.y).abs()).max(1);
        for i in 0..=steps {
            let t = i as f32 / steps as f32;
            let x = a.x as f32 + (b.x - a.x) as f32 * t;
            let y = a.y as f32 + (b.y - a.y) as f32 * t;
            self.set_pixel(x.round() as i32, y.round() as i32, color);
        }
    }

    /// Centre `text` in a box, using the largest scale that fits.
    fn draw_label_centered(&mut self, text: &str, x: i32, y: i32, w: i32, h: i32, color: u32) {
        let len = text.chars().count() as i32;
        let scale = (1..=4)
            .rev()
            .find(|s| len * 4 * s <= w - 4 && 5 * s <= h - 4)
            .unwrap_or(1);
        let text_w = (len * 4 - 1).max(0) * scale;
        let text_h = 5 * scale;
        self.draw_label(text, x + (w - text_w) / 2, y + (h - text_h) / 2, scale, color);
    }

    /// Minimal bitmap font: 3×5 glyphs, magnified by `scale`.
    fn draw_label(&mut self, text: &str, x: i32, y: i32, scale: i32, color: u32) {
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..3i32 {
                    if bits & (1 << (2 - col)) != 0 {
                        self.fill_rect(cx + col * scale, y + row as i32 * scale, scale, scale, color);
                    }
                }
            }
            cx += 4 * scale; // 3 wide + 1 gap
            if cx >= self.width as i32 { break; }
        }
    }
}

impl Surface for Visualizer {
    fn present(&mut self, scene: &Scene<'_>) -> bool {
        if !self.window.is_open() || self.window.is_key_pressed(Key::Q, KeyRepeat::No) {
            return false;
        }
        self.poll_pointer();
        self.render(scene);
        true
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Minimal 3×5 bitmap font
// ────────────────────────────────────────────────────────────────────────────

/// Glyph rows, top to bottom; bit 2 is the leftmost column.  Letters are
/// stored upper-case only.
const GLYPHS: [(char, [u8; 5]); 45] = [
    ('0', [0b111, 0b101, 0b101, 0b101, 0b111]),
    ('1', [0b010, 0b110, 0b010, 0b010, 0b111]),
    ('2', [0b111, 0b001, 0b111, 0b100, 0b111]),
    ('3', [0b111, 0b001, 0b111, 0b001, 0b111]),
    ('4', [0b101, 0b101, 0b111, 0b001, 0b001]),
    ('5', [0b111, 0b100, 0b111, 0b001, 0b111]),
    ('6', [0b111, 0b100, 0b111, 0b101, 0b111]),
    ('7', [0b111, 0b001, 0b001, 0b001, 0b001]),
    ('8', [0b111, 0b101, 0b111, 0b101, 0b111]),
    ('9', [0b111, 0b101, 0b111, 0b001, 0b111]),
    ('A', [0b111, 0b101, 0b111, 0b101, 0b101]),
    ('B', [0b110, 0b101, 0b110, 0b101, 0b110]),
    ('C', [0b111, 0b100, 0b100, 0b100, 0b111]),
    ('D', [0b110, 0b101, 0b101, 0b101, 0b110]),
    ('E', [0b111, 0b100, 0b111, 0b100, 0b111]),
    ('F', [0b111, 0b100, 0b111, 0b100, 0b100]),
    ('G', [0b111, 0b100, 0b101, 0b101, 0b111]),
    ('H', [0b101, 0b101, 0b111, 0b101, 0b101]),
    ('I', [0b111, 0b010, 0b010, 0b010, 0b111]),
    ('J', [0b001, 0b001, 0b001, 0b101, 0b111]),
    ('K', [0b101, 0b101, 0b110, 0b101, 0b101]),
    ('L', [0b100, 0b100, 0b100, 0b100, 0b111]),
    ('M', [0b101, 0b111, 0b101, 0b101, 0b101]),
    ('N', [0b111, 0b101, 0b101, 0b101, 0b101]),
    ('O', [0b111, 0b101, 0b101, 0b101, 0b111]),
    ('P', [0b111, 0b101, 0b111, 0b100, 0b100]),
    ('Q', [0b111, 0b101, 0b101, 0b111, 0b001]),
    ('R', [0b110, 0b101, 0b110, 0b101, 0b101]),
    ('S', [0b111, 0b100, 0b111, 0b001, 0b111]),
    ('T', [0b111, 0b010, 0b010, 0b010, 0b010]),
    ('U', [0b101, 0b101, 0b101, 0b101, 0b111]),
    ('V', [0b101, 0b101, 0b101, 0b010, 0b010]),
    ('W', [0b101, 0b101, 0b101, 0b111, 0b101]),
    ('X', [0b101, 0b101, 0b010, 0b101, 0b101]),
    ('Y', [0b101, 0b101, 0b111, 0b010, 0b010]),
    ('Z', [0b111, 0b001, 0b010, 0b100, 0b111]),
    ('?', [0b111, 0b001, 0b011, 0b000, 0b010]),
    ('!', [0b010, 0b010, 0b010, 0b000, 0b010]),
    ('\'', [0b010, 0b010, 0b000, 0b000, 0b000]),
    ('/', [0b001, 0b001, 0b010, 0b100, 0b100]),
    ('-', [0b000, 0b000, 0b111, 0b000, 0b000]),
    ('.', [0b000, 0b000, 0b000, 0b000, 0b010]),
    (',', [0b000, 0b000, 0b000, 0b010, 0b100]),
    (':', [0b000, 0b010, 0b000, 0b010, 0b000]),
    (' ', [0b000, 0b000, 0b000, 0b000, 0b000]),
];

/// Shown for anything missing from [`GLYPHS`].
const UNKNOWN_GLYPH: [u8; 5] = [0b000, 0b000, 0b010, 0b000, 0b000];

fn char_glyph(c: char) -> [u8; 5] {
    let c = c.to_ascii_uppercase();
    GLYPHS
        .iter()
        .find(|(g, _)| *g == c)
        .map_or(UNKNOWN_GLYPH, |(_, rows)| *rows)
}

/// Mix `over` onto `under` at opacity `alpha`.  The result is opaque.
fn blend(under: u32, over: u32, alpha: f32) -> u32 {
    let alpha = alpha.clamp(0.0, 1.0);
    [16, 8, 0].iter().fold(0xFF00_0000, |acc, &shift| {
        let u = ((under >> shift) & 0xFF) as f32;
        let o = ((over >> shift) & 0xFF) as f32;
        acc | (((u + (o - u) * alpha) as u32) << shift)
    })
}

/// Pull `p` into the frame plus a small margin, so off-screen landmarks
/// still draw as short edges rather than huge spans.
fn clamp_point(p: Point, width: usize, height: usize) -> Point {
    const MARGIN: i32 = 8;
    let w = i32::try_from(width).unwrap_or(i32::MAX - MARGIN);
    let h = i32::try_from(height).unwrap_or(i32::MAX - MARGIN);
    Point::new(p.x.clamp(-MARGIN, w + MARGIN), p.y.clamp(-MARGIN, h + MARGIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(KEY_COLOR, LATCHED_COLOR, 0.0), KEY_COLOR);
        assert_eq!(blend(KEY_COLOR, LATCHED_COLOR, 1.0), LATCHED_COLOR);
    }

    #[test]
    fn blend_half_is_opaque_mix() {
        let c = blend(0xFF000000, 0xFF00FF00, 0.5);
        assert_eq!(c >> 24, 0xFF);
        assert_eq!((c >> 8) & 0xFF, 127);
    }

    #[test]
    fn far_off_points_are_pulled_into_frame() {
        assert_eq!(clamp_point(Point::new(i32::MIN, i32::MAX), 640, 480), Point::new(-8, 488));
        assert_eq!(clamp_point(Point::new(100, 200), 640, 480), Point::new(100, 200));
        // a line between two clamped corners stays short
        let a = clamp_point(Point::new(i32::MIN, i32::MIN), 640, 480);
        let b = clamp_point(Point::new(i32::MAX, i32::MAX), 640, 480);
        assert!((b.x - a.x).abs() <= 656 && (b.y - a.y).abs() <= 496);
    }

    #[test]
    fn glyph_lookup_ignores_case() {
        assert_eq!(char_glyph('q'), char_glyph('Q'));
        assert_eq!(char_glyph('\u{1}'), UNKNOWN_GLYPH);
    }

    #[test]
    fn every_layout_letter_has_a_glyph() {
        let fallback = char_glyph('\u{1}');
        for c in "QWERTYUIOPASDFGHJKLZXCVBNM?,'".chars() {
            assert_ne!(char_glyph(c), fallback, "no glyph for {:?}", c);
        }
    }
}
