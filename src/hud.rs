// Copyright (c) 2026 rezky_nightky

use crate::grid::{put_str, Grid};
use crate::runtime::Style;
use crate::weather::Weather;

pub const FAREWELL: &str = "The rain has stopped. Thanks for watching!";

pub fn status_line(weather: &Weather) -> String {
    format!(
        "Intensity: {:.2}  Wind: {:+}  Lightning: {}",
        weather.intensity,
        weather.wind,
        if weather.lightning { "ON" } else { "OFF" }
    )
}

/// Overlays the status line on the bottom row, one column short of the edge.
pub fn draw_status<G: Grid + ?Sized>(grid: &mut G, weather: &Weather) {
    let (height, width) = grid.dimensions();
    if height == 0 || width == 0 {
        return;
    }
    let max_len = width as usize - 1;
    put_str(
        grid,
        height - 1,
        0,
        &status_line(weather),
        max_len,
        Style::Hud,
    );
}

/// Centres the closing message on an otherwise blank screen.
pub fn draw_farewell<G: Grid + ?Sized>(grid: &mut G) {
    let (height, width) = grid.dimensions();
    if height == 0 || width == 0 {
        return;
    }
    let len = FAREWELL.chars().count().min(width as usize);
    let col = (width as usize - len) / 2;
    grid.clear();
    put_str(grid, height / 2, col as u16, FAREWELL, len, Style::Banner);
}
