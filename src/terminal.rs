// Copyright (c) 2026 rezky_nightky

use std::io::{stdout, Result, Stdout, Write};
use std::time::Duration;

use crossterm::{
    cursor, event,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
    terminal, ExecutableCommand, QueueableCommand,
};

use crate::cell::Cell;
use crate::frame::Frame;
use crate::grid::Grid;
use crate::palette::Palette;
use crate::runtime::Style;

struct LastFrame {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl LastFrame {
    fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::BLANK; width as usize * height as usize],
        }
    }
}

/// Pen state while queueing a frame, so attributes are only sent on change.
#[derive(Default)]
struct Pen {
    fg: Option<Color>,
    bold: bool,
    pos: Option<(u16, u16)>,
}

impl Pen {
    fn style(&mut self, out: &mut Stdout, cell: &Cell) -> Result<()> {
        if cell.fg != self.fg {
            out.queue(SetForegroundColor(cell.fg.unwrap_or(Color::Reset)))?;
            self.fg = cell.fg;
        }
        if cell.bold != self.bold {
            out.queue(SetAttribute(if cell.bold {
                Attribute::Bold
            } else {
                Attribute::NormalIntensity
            }))?;
            self.bold = cell.bold;
        }
        Ok(())
    }
}

/// The real display: raw mode, alternate screen, hidden cursor. Drawing goes
/// into a [`Frame`] and [`Grid::present`] writes only the changed cells.
pub struct Terminal {
    stdout: Stdout,
    frame: Frame,
    last: Option<LastFrame>,
    run_buf: String,
}

impl Terminal {
    pub fn new(palette: Palette) -> Result<Self> {
        let mut out = stdout();
        terminal::enable_raw_mode()?;
        let init_res: Result<()> = (|| {
            out.execute(terminal::EnterAlternateScreen)?;
            out.execute(cursor::Hide)?;
            let _ = out.execute(terminal::DisableLineWrap);
            out.execute(SetAttribute(Attribute::Reset))?;
            out.execute(ResetColor)?;
            out.execute(terminal::Clear(terminal::ClearType::All))?;
            out.flush()?;
            Ok(())
        })();
        if let Err(e) = init_res {
            restore_terminal_best_effort();
            return Err(e);
        }

        let (w, h) = terminal::size()?;
        Ok(Self {
            stdout: out,
            frame: Frame::new(w, h, palette),
            last: None,
            run_buf: String::with_capacity(64),
        })
    }

    pub fn poll_event(timeout: Duration) -> Result<bool> {
        event::poll(timeout)
    }

    pub fn read_event() -> Result<event::Event> {
        event::read()
    }

    /// Forgets what is on screen so the next present repaints every cell.
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    fn draw(&mut self) -> Result<()> {
        let frame = &mut self.frame;
        let mut pen = Pen::default();

        let size_changed = self
            .last
            .as_ref()
            .map_or(true, |l| l.width != frame.width || l.height != frame.height);
        if size_changed {
            self.stdout
                .queue(terminal::Clear(terminal::ClearType::All))?;
            self.last = Some(LastFrame::new(frame.width, frame.height));
        }

        let total_cells = frame.width as usize * frame.height as usize;
        let dirty_is_large = total_cells > 0 && frame.dirty_indices().len() >= total_cells / 3;
        let Some(last) = self.last.as_mut() else {
            return Ok(());
        };

        if size_changed || frame.is_dirty_all() || dirty_is_large {
            for y in 0..frame.height {
                self.stdout.queue(cursor::MoveTo(0, y))?;
                for x in 0..frame.width {
                    let idx = y as usize * frame.width as usize + x as usize;
                    let cell = frame.cell_at_index(idx);
                    pen.style(&mut self.stdout, &cell)?;
                    self.stdout.queue(Print(cell.ch))?;
                    last.cells[idx] = cell;
                }
            }
        } else {
            let mut dirty = frame.dirty_indices().to_vec();
            dirty.sort_unstable();
            let width = frame.width as usize;

            let mut i = 0usize;
            while i < dirty.len() {
                let idx0 = dirty[i];
                let cell0 = frame.cell_at_index(idx0);
                if last.cells[idx0] == cell0 {
                    i += 1;
                    continue;
                }
                last.cells[idx0] = cell0;

                let x0 = (idx0 % width) as u16;
                let y0 = (idx0 / width) as u16;

                // Coalesce same-styled neighbours on one row into a single print.
                self.run_buf.clear();
                self.run_buf.push(cell0.ch);
                let mut run_len: u16 = 1;
                let mut j = i + 1;
                while j < dirty.len() {
                    let idx1 = dirty[j];
                    if idx1 != idx0 + run_len as usize || idx1 / width != idx0 / width {
                        break;
                    }
                    let cell1 = frame.cell_at_index(idx1);
                    if last.cells[idx1] == cell1 || cell1.fg != cell0.fg || cell1.bold != cell0.bold
                    {
                        break;
                    }
                    self.run_buf.push(cell1.ch);
                    last.cells[idx1] = cell1;
                    run_len = run_len.saturating_add(1);
                    j += 1;
                }

                if pen.pos != Some((x0, y0)) {
                    self.stdout.queue(cursor::MoveTo(x0, y0))?;
                }
                pen.style(&mut self.stdout, &cell0)?;
                self.stdout.queue(Print(self.run_buf.as_str()))?;
                let next_x = x0.saturating_add(run_len);
                pen.pos = (next_x < frame.width).then_some((next_x, y0));

                i = j;
            }
        }

        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(ResetColor)?;
        self.stdout.flush()?;
        frame.clear_dirty();
        Ok(())
    }
}

impl Grid for Terminal {
    fn dimensions(&mut self) -> (u16, u16) {
        match terminal::size() {
            Ok((w, h)) => {
                if w != self.frame.width || h != self.frame.height {
                    log::debug!(
                        "terminal resized {}x{} -> {}x{}",
                        self.frame.width,
                        self.frame.height,
                        w,
                        h
                    );
                    self.frame.resize(w, h);
                }
            }
            Err(e) => log::warn!("failed to query terminal size: {}", e),
        }
        self.frame.dimensions()
    }

    fn set(&mut self, row: u16, col: u16, glyph: char, style: Style) {
        self.frame.set(row, col, glyph, style);
    }

    fn erase(&mut self, row: u16, col: u16) {
        self.frame.erase(row, col);
    }

    fn clear(&mut self) {
        self.frame.clear();
    }

    fn present(&mut self) -> Result<()> {
        self.draw()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.stdout.flush();
        restore_terminal_best_effort();
    }
}

pub fn restore_terminal_best_effort() {
    let mut out = stdout();
    let _ = out.execute(SetAttribute(Attribute::Reset));
    let _ = out.execute(ResetColor);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::EnableLineWrap);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();
}
