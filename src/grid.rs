// Copyright (c) 2026 rezky_nightky

use std::io::Result;

use crate::runtime::Style;

/// A character-cell display the simulation draws into.
///
/// Coordinates are `(row, col)` with row 0 at the top. Drawing outside the
/// current dimensions is a silent no-op: drops near the edge and a shrinking
/// terminal both produce stale coordinates, and a skipped glyph is redrawn
/// correctly on the next tick.
pub trait Grid {
    /// Current `(height, width)`. May change between calls.
    fn dimensions(&mut self) -> (u16, u16);

    fn set(&mut self, row: u16, col: u16, glyph: char, style: Style);

    fn erase(&mut self, row: u16, col: u16);

    fn clear(&mut self);

    fn present(&mut self) -> Result<()>;
}

/// One drawing command produced by a simulation step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawIntent {
    Put {
        row: u16,
        col: u16,
        glyph: char,
        style: Style,
    },
    Erase {
        row: u16,
        col: u16,
    },
}

pub fn render<G: Grid + ?Sized>(grid: &mut G, intents: &[DrawIntent]) {
    for intent in intents {
        match *intent {
            DrawIntent::Put {
                row,
                col,
                glyph,
                style,
            } => grid.set(row, col, glyph, style),
            DrawIntent::Erase { row, col } => grid.erase(row, col),
        }
    }
}

/// Writes `text` left to right from `(row, col)`, stopping at `max_len` chars.
pub fn put_str<G: Grid + ?Sized>(
    grid: &mut G,
    row: u16,
    col: u16,
    text: &str,
    max_len: usize,
    style: Style,
) {
    for (i, ch) in text.chars().take(max_len).enumerate() {
        let Ok(offset) = u16::try_from(i) else {
            break;
        };
        grid.set(row, col.saturating_add(offset), ch, style);
    }
}
