// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

use crate::cell::Cell;
use crate::runtime::{ColorMode, Style};

const RAIN_RGB: (u8, u8, u8) = (64, 120, 255);
const SPLASH_RGB: (u8, u8, u8) = (0, 215, 230);
const FLASH_RGB: (u8, u8, u8) = (255, 255, 255);
const BANNER_RGB: (u8, u8, u8) = (175, 215, 255);

fn dist2(a: (u8, u8, u8), b: (u8, u8, u8)) -> i32 {
    let dr = (a.0 as i32) - (b.0 as i32);
    let dg = (a.1 as i32) - (b.1 as i32);
    let db = (a.2 as i32) - (b.2 as i32);
    (dr * dr) + (dg * dg) + (db * db)
}

fn rgb_to_ansi256(r: u8, g: u8, b: u8) -> u8 {
    const CUBE_LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

    let r6 = ((r as u16 * 5) + 127) / 255;
    let g6 = ((g as u16 * 5) + 127) / 255;
    let b6 = ((b as u16 * 5) + 127) / 255;

    let cube = (
        CUBE_LEVELS[r6 as usize],
        CUBE_LEVELS[g6 as usize],
        CUBE_LEVELS[b6 as usize],
    );
    let cube_idx = 16 + (36 * r6 as u8) + (6 * g6 as u8) + (b6 as u8);

    let avg = ((r as u16 + g as u16 + b as u16) / 3) as u8;
    let (gray_idx, gray) = if avg < 8 {
        (16, (0, 0, 0))
    } else if avg > 238 {
        (231, (255, 255, 255))
    } else {
        let idx = 232 + ((avg - 8) / 10);
        let v = 8 + 10 * (idx - 232);
        (idx, (v, v, v))
    };

    if dist2((r, g, b), gray) < dist2((r, g, b), cube) {
        gray_idx
    } else {
        cube_idx
    }
}

fn rgb_to_color16(r: u8, g: u8, b: u8) -> Color {
    const TABLE: [(Color, (u8, u8, u8)); 8] = [
        (Color::DarkGrey, (128, 128, 128)),
        (Color::Grey, (192, 192, 192)),
        (Color::White, (255, 255, 255)),
        (Color::DarkBlue, (0, 0, 128)),
        (Color::Blue, (0, 0, 255)),
        (Color::DarkCyan, (0, 128, 128)),
        (Color::Cyan, (0, 255, 255)),
        (Color::Black, (0, 0, 0)),
    ];

    let mut best = Color::White;
    let mut best_d = i32::MAX;
    for (c, rgb) in TABLE {
        let d = dist2((r, g, b), rgb);
        if d < best_d {
            best_d = d;
            best = c;
        }
    }
    best
}

fn color_for(mode: ColorMode, (r, g, b): (u8, u8, u8)) -> Option<Color> {
    match mode {
        ColorMode::Mono => None,
        ColorMode::TrueColor => Some(Color::Rgb { r, g, b }),
        ColorMode::Color256 => Some(Color::AnsiValue(rgb_to_ansi256(r, g, b))),
        ColorMode::Color16 => Some(rgb_to_color16(r, g, b)),
    }
}

/// Resolved look of every [`Style`] for one color mode.
#[derive(Clone, Debug)]
pub struct Palette {
    rain: Option<Color>,
    splash: Option<Color>,
    flash: Option<Color>,
    banner: Option<Color>,
}

impl Palette {
    pub fn new(mode: ColorMode) -> Self {
        Self {
            rain: color_for(mode, RAIN_RGB),
            splash: color_for(mode, SPLASH_RGB),
            flash: color_for(mode, FLASH_RGB),
            banner: color_for(mode, BANNER_RGB),
        }
    }

    pub fn cell(&self, ch: char, style: Style) -> Cell {
        let (fg, bold) = match style {
            Style::Rain => (self.rain, false),
            Style::Splash => (self.splash, false),
            // Mono terminals only have bold to make a flash stand out.
            Style::Flash => (self.flash, true),
            Style::Hud => (None, false),
            Style::Banner => (self.banner, true),
        };
        Cell { ch, fg, bold }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mono_palette_has_no_colors_but_keeps_flash_bold() {
        let p = Palette::new(ColorMode::Mono);
        assert_eq!(p.cell('|', Style::Rain).fg, None);
        assert!(p.cell('|', Style::Flash).bold);
        assert!(!p.cell('|', Style::Rain).bold);
    }

    #[test]
    fn truecolor_rain_and_splash_differ() {
        let p = Palette::new(ColorMode::TrueColor);
        let rain = p.cell('|', Style::Rain);
        let splash = p.cell('~', Style::Splash);
        assert!(rain.fg.is_some());
        assert_ne!(rain.fg, splash.fg);
    }

    #[test]
    fn ansi256_maps_white_to_the_top_of_the_cube() {
        assert_eq!(rgb_to_ansi256(255, 255, 255), 231);
        assert_eq!(rgb_to_ansi256(0, 0, 0), 16);
    }

    #[test]
    fn color16_picks_nearest_table_entry() {
        assert_eq!(rgb_to_color16(0, 250, 250), Color::Cyan);
        assert_eq!(rgb_to_color16(10, 10, 240), Color::Blue);
    }
}
