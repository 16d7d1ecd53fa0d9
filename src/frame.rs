// Copyright (c) 2026 rezky_nightky

use crate::cell::Cell;
use crate::grid::Grid;
use crate::palette::Palette;
use crate::runtime::Style;

/// Off-screen back buffer. Tracks which cells changed since the last
/// [`Frame::clear_dirty`] so the terminal only rewrites what moved.
#[derive(Clone, Debug)]
pub struct Frame {
    pub width: u16,
    pub height: u16,
    palette: Palette,
    cells: Vec<Cell>,
    gen: u32,
    cell_gen: Vec<u32>,
    dirty_all: bool,
    dirty_map: Vec<bool>,
    dirty: Vec<usize>,
}

impl Frame {
    pub fn new(width: u16, height: u16, palette: Palette) -> Self {
        let len = width as usize * height as usize;
        let gen = 1u32;
        Self {
            width,
            height,
            palette,
            cells: vec![Cell::BLANK; len],
            gen,
            cell_gen: vec![gen; len],
            dirty_all: true,
            dirty_map: vec![false; len],
            dirty: Vec::new(),
        }
    }

    /// Reallocates for a new size. Everything is blank and dirty afterwards.
    pub fn resize(&mut self, width: u16, height: u16) {
        if width == self.width && height == self.height {
            return;
        }
        *self = Frame::new(width, height, self.palette.clone());
    }

    /// Blanks every cell, marking only the ones that held something as dirty.
    pub fn blank_all(&mut self) {
        if !self.dirty_all {
            for i in 0..self.cells.len() {
                if self.cell_gen[i] == self.gen && self.cells[i] != Cell::BLANK && !self.dirty_map[i]
                {
                    self.dirty_map[i] = true;
                    self.dirty.push(i);
                }
            }
        }
        self.gen = self.gen.wrapping_add(1);
        if self.gen == 0 {
            self.cell_gen.fill(0);
            self.gen = 1;
        }
    }

    pub fn is_dirty_all(&self) -> bool {
        self.dirty_all
    }

    pub fn dirty_indices(&self) -> &[usize] {
        &self.dirty
    }

    pub fn clear_dirty(&mut self) {
        if self.dirty_all {
            self.dirty_all = false;
            self.dirty_map.fill(false);
            self.dirty.clear();
            return;
        }

        for &i in &self.dirty {
            if let Some(v) = self.dirty_map.get_mut(i) {
                *v = false;
            }
        }
        self.dirty.clear();
    }

    pub fn index(&self, row: u16, col: u16) -> Option<usize> {
        if col >= self.width || row >= self.height {
            return None;
        }
        Some(row as usize * self.width as usize + col as usize)
    }

    #[cfg(test)]
    pub fn get(&self, row: u16, col: u16) -> Option<Cell> {
        self.index(row, col).map(|i| self.cell_at_index(i))
    }

    pub fn cell_at_index(&self, i: usize) -> Cell {
        if self.cell_gen.get(i).copied() == Some(self.gen) {
            self.cells[i]
        } else {
            Cell::BLANK
        }
    }

    pub fn put_cell(&mut self, row: u16, col: u16, cell: Cell) {
        let Some(i) = self.index(row, col) else {
            return;
        };
        if self.cell_at_index(i) == cell {
            return;
        }

        self.cells[i] = cell;
        self.cell_gen[i] = self.gen;
        if !self.dirty_all && !self.dirty_map[i] {
            self.dirty_map[i] = true;
            self.dirty.push(i);
        }
    }

    #[cfg(test)]
    pub fn row_text(&self, row: u16) -> String {
        (0..self.width)
            .map(|col| self.get(row, col).map_or(' ', |c| c.ch))
            .collect()
    }
}

impl Grid for Frame {
    fn dimensions(&mut self) -> (u16, u16) {
        (self.height, self.width)
    }

    fn set(&mut self, row: u16, col: u16, glyph: char, style: Style) {
        let cell = self.palette.cell(glyph, style);
        self.put_cell(row, col, cell);
    }

    fn erase(&mut self, row: u16, col: u16) {
        self.put_cell(row, col, Cell::BLANK);
    }

    fn clear(&mut self) {
        self.blank_all();
    }

    fn present(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
