//! Text-to-brick layout
//!
//! Words are packed left to right into rows no wider than `max_row_width`.
//! Every closed row is justified so its bricks span the full width.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{MAX_BRICK_UNITS, MIN_BRICK_UNITS, ROW_GAP};

/// A destructible target generated from one word
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brick {
    /// Zero-based position of the word in the source text
    pub id: u32,
    pub text: String,
    /// Top-left corner in layout space
    pub pos: Vec2,
    pub size: Vec2,
    /// Cosmetic hue (0-359) hashed from `text`
    pub hue: u16,
    pub destroyed: bool,
    /// Set by the reveal animation
    pub visible: bool,
}

impl Brick {
    #[inline]
    pub fn min(&self) -> Vec2 {
        self.pos
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.pos + self.size
    }

    /// Still takes part in collisions
    #[inline]
    pub fn is_live(&self) -> bool {
        !self.destroyed
    }

    /// Mark destroyed; returns false if it already was
    pub fn destroy(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        self.destroyed = true;
        true
    }

    /// Mark visible; returns false if it already was
    pub fn reveal(&mut self) -> bool {
        if self.visible {
            return false;
        }
        self.visible = true;
        true
    }

    /// CSS-style color string for renderers
    pub fn css_color(&self) -> String {
        format!("hsl({} 70% 50%)", self.hue)
    }
}

/// Deterministic hue for a word
///
/// 32-bit wrapping `h * 31 + unit` over UTF-16 code units, folded to 0..360.
pub fn hue_for(text: &str) -> u16 {
    let hash = text
        .encode_utf16()
        .fold(0i32, |h, unit| h.wrapping_mul(31).wrapping_add(unit as i32));
    (hash.unsigned_abs() % 360) as u16
}

/// Brick width for a word: clamped letter count times `unit_size`, capped at the row width
#[inline]
pub fn brick_width(word: &str, unit_size: f32, max_row_width: f32) -> f32 {
    let units = word.chars().count().clamp(MIN_BRICK_UNITS, MAX_BRICK_UNITS);
    (units as f32 * unit_size).min(max_row_width)
}

/// Convert text into an ordered, justified brick set
///
/// Brick ids equal word order. Empty or whitespace-only text yields no bricks.
pub fn generate(text: &str, unit_size: f32, max_row_width: f32) -> Vec<Brick> {
    generate_with_gap(text, unit_size, max_row_width, ROW_GAP)
}

/// [`generate`] with an explicit vertical gap between rows
pub fn generate_with_gap(text: &str, unit_size: f32, max_row_width: f32, row_gap: f32) -> Vec<Brick> {
    debug_assert!(unit_size > 0.0 && max_row_width > 0.0);

    let mut bricks: Vec<Brick> = Vec::new();
    let mut row_start = 0usize;
    let mut x_cursor = 0.0f32;
    let mut y_cursor = 0.0f32;
    let mut row_count = 0usize;

    for (index, word) in text.split_whitespace().enumerate() {
        let width = brick_width(word, unit_size, max_row_width);
        let height = unit_size;

        if row_start < bricks.len() && x_cursor + width > max_row_width {
            justify_row(&mut bricks[row_start..], max_row_width);
            row_start = bricks.len();
            x_cursor = 0.0;
            y_cursor += height + row_gap;
        }
        if row_start == bricks.len() {
            row_count += 1;
        }

        bricks.push(Brick {
            id: index as u32,
            text: word.to_string(),
            pos: Vec2::new(x_cursor, y_cursor),
            size: Vec2::new(width, height),
            hue: hue_for(word),
            destroyed: false,
            visible: false,
        });

        x_cursor += width;
    }

    justify_row(&mut bricks[row_start..], max_row_width);

    log::debug!("Laid out {} bricks in {} rows", bricks.len(), row_count);
    bricks
}

/// Spread leftover width evenly between the bricks of one row
fn justify_row(row: &mut [Brick], max_row_width: f32) {
    match row.len() {
        0 => {}
        1 => row[0].pos.x = 0.0,
        count => {
            let used: f32 = row.iter().map(|b| b.size.x).sum();
            let gap = (max_row_width - used) / (count - 1) as f32;

            let mut cursor = 0.0;
            for brick in row.iter_mut() {
                brick.pos.x = cursor;
                cursor += brick.size.x + gap;
            }
            // Snap the last brick flush to the edge (float drift)
            let last = &mut row[count - 1];
            last.pos.x = max_row_width - last.size.x;
        }
    }
}
