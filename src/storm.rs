// Copyright (c) 2026 rezky_nightky

//! The rain simulation.
//!
//! A [`Storm`] owns every live drop and splash. Each [`Storm::tick`] is a pure
//! state transition against the grid size of that frame: it returns the draw
//! commands for the frame instead of touching a display, so the whole thing
//! runs headless under test.

use std::collections::HashMap;
use std::time::Duration;

use rand::{
    distr::{Distribution, Uniform},
    rngs::StdRng,
    seq::IndexedRandom,
};

use crate::grid::DrawIntent;
use crate::runtime::Style;
use crate::weather::{Control, DynamicWeather, Weather};

pub const RAIN_GLYPH: char = '|';
pub const SPLASH_GLYPHS: [char; 3] = ['~', '.', '\''];
pub const FLASH_SPLASH_GLYPH: char = '~';

/// How long a splash stays on the floor.
pub const SPLASH_LIFETIME: Duration = Duration::from_millis(500);
/// How long the screen stays lit during a lightning flash.
pub const FLASH_HOLD: Duration = Duration::from_millis(200);

const STORM_INTENSITY: f64 = 0.7;
const STORM_FLASH_CHANCE: f64 = 0.02;
const CALM_FLASH_CHANCE: f64 = 0.005;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Raindrop {
    pub row: u16,
    pub col: u16,
}

/// `col` moved by `wind`, wrapped into `[0, width)`. Also folds columns left
/// over from a wider terminal back onto the grid.
pub fn wind_shift(col: u16, wind: i32, width: u16) -> u16 {
    if width == 0 {
        return 0;
    }
    (i64::from(col) + i64::from(wind)).rem_euclid(i64::from(width)) as u16
}

/// Per-tick probability of a lightning flash; heavy rain flashes more often.
pub fn flash_chance(intensity: f64) -> f64 {
    if intensity > STORM_INTENSITY {
        STORM_FLASH_CHANCE
    } else {
        CALM_FLASH_CHANCE
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickOutcome {
    pub intents: Vec<DrawIntent>,
    pub spawned: usize,
    pub landed: usize,
    pub faded: usize,
}

pub struct Storm {
    pub weather: Weather,
    dynamic: Option<DynamicWeather>,
    drops: Vec<Raindrop>,
    // Column -> time the splash landed, measured from the start of the run.
    splashes: HashMap<u16, Duration>,
    rng: StdRng,
    rand_chance: Uniform<f64>,
    ticks: u64,
}

impl Storm {
    pub fn new(weather: Weather, dynamic: Option<DynamicWeather>, rng: StdRng) -> Self {
        Self {
            weather,
            dynamic,
            drops: Vec::new(),
            splashes: HashMap::new(),
            rng,
            rand_chance: Uniform::new(0.0, 1.0).expect("valid range"),
            ticks: 0,
        }
    }

    pub fn drops(&self) -> &[Raindrop] {
        &self.drops
    }

    #[cfg(test)]
    pub fn splash_at(&self, col: u16) -> Option<Duration> {
        self.splashes.get(&col).copied()
    }

    pub fn splash_count(&self) -> usize {
        self.splashes.len()
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_dynamic(&self) -> bool {
        self.dynamic.is_some()
    }

    pub fn apply(&mut self, control: Control) {
        self.weather.apply(control);
        log::debug!("{:?} -> {:?}", control, self.weather);
    }

    /// Lets dynamic mode overwrite intensity and wind. No-op otherwise.
    pub fn update_weather(&mut self) {
        if let Some(dynamic) = self.dynamic.as_mut() {
            dynamic.advance(&mut self.weather, &mut self.rng);
        }
    }

    pub fn lightning_strikes(&mut self) -> bool {
        if !self.weather.lightning {
            return false;
        }
        self.rand_chance.sample(&mut self.rng) < flash_chance(self.weather.intensity)
    }

    /// Advances the simulation one frame on a `height` x `width` grid.
    ///
    /// Spawns new drops along the top row, moves every drop down one row with
    /// the wind, turns drops reaching the floor row into splashes and retires
    /// splashes older than [`SPLASH_LIFETIME`].
    pub fn tick(&mut self, height: u16, width: u16, now: Duration) -> TickOutcome {
        self.ticks = self.ticks.wrapping_add(1);
        let mut out = TickOutcome::default();

        for col in 0..width {
            if self.rand_chance.sample(&mut self.rng) < self.weather.intensity {
                self.drops.push(Raindrop { row: 0, col });
                out.spawned += 1;
            }
        }

        let wind = self.weather.wind;
        let floor = height.saturating_sub(1);
        let mut next = Vec::with_capacity(self.drops.len());

        for drop in self.drops.drain(..) {
            let below = drop.row.saturating_add(1);
            if width == 0 || below >= height {
                continue;
            }
            let col = wind_shift(drop.col, wind, width);

            out.intents.push(DrawIntent::Erase {
                row: drop.row,
                col: drop.col,
            });

            if below == floor {
                self.splashes.insert(col, now);
                let glyph = SPLASH_GLYPHS
                    .choose(&mut self.rng)
                    .copied()
                    .unwrap_or(FLASH_SPLASH_GLYPH);
                out.intents.push(DrawIntent::Put {
                    row: below,
                    col,
                    glyph,
                    style: Style::Splash,
                });
                out.landed += 1;
            } else {
                out.intents.push(DrawIntent::Put {
                    row: below,
                    col,
                    glyph: RAIN_GLYPH,
                    style: Style::Rain,
                });
                next.push(Raindrop { row: below, col });
            }
        }
        self.drops = next;

        let before = self.splashes.len();
        let intents = &mut out.intents;
        self.splashes.retain(|&col, &mut landed| {
            let alive = now.saturating_sub(landed) <= SPLASH_LIFETIME;
            if !alive {
                intents.push(DrawIntent::Erase { row: floor, col });
            }
            alive
        });
        out.faded = before - self.splashes.len();

        out
    }

    /// Every drop and splash redrawn in the flash style.
    pub fn flash_intents(&self, height: u16) -> Vec<DrawIntent> {
        let floor = height.saturating_sub(1);
        let drops = self.drops.iter().map(|d| DrawIntent::Put {
            row: d.row,
            col: d.col,
            glyph: RAIN_GLYPH,
            style: Style::Flash,
        });
        let splashes = self.splashes.keys().map(|&col| DrawIntent::Put {
            row: floor,
            col,
            glyph: FLASH_SPLASH_GLYPH,
            style: Style::Flash,
        });
        drops.chain(splashes).collect()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use rand::SeedableRng;

    use super::*;
    use crate::weather::{DYNAMIC_WIND_LIMIT, INTENSITY_MAX, INTENSITY_MIN};

    fn storm(intensity: f64, wind: i32) -> Storm {
        let weather = Weather {
            intensity,
            wind,
            ..Weather::default()
        };
        Storm::new(weather, None, StdRng::seed_from_u64(0x5eed))
    }

    fn at(ms: u64) -> Duration {
        Duration::from_millis(ms)
    }

    #[test]
    fn full_intensity_fills_every_column_then_falls_one_row() {
        let mut s = storm(1.0, 0);
        let out = s.tick(20, 10, at(0));

        assert_eq!(out.spawned, 10);
        assert_eq!(s.drops().len(), 10);
        for (col, d) in s.drops().iter().enumerate() {
            assert_eq!(*d, Raindrop { row: 1, col: col as u16 });
        }
        assert!(out.intents.contains(&DrawIntent::Put {
            row: 1,
            col: 0,
            glyph: RAIN_GLYPH,
            style: Style::Rain,
        }));
    }

    #[test]
    fn zero_intensity_never_spawns() {
        let mut s = storm(0.0, 0);
        for t in 0..50 {
            let out = s.tick(20, 10, at(t * 100));
            assert_eq!(out.spawned, 0);
        }
        assert!(s.drops().is_empty());
    }

    #[test]
    fn spawns_stack_in_the_same_column_without_dedup() {
        let mut s = storm(0.0, 0);
        s.drops = vec![Raindrop { row: 0, col: 2 }, Raindrop { row: 0, col: 2 }];
        s.tick(10, 5, at(0));
        assert_eq!(
            s.drops(),
            &[Raindrop { row: 1, col: 2 }, Raindrop { row: 1, col: 2 }]
        );
    }

    #[test]
    fn drop_above_the_floor_becomes_a_splash() {
        let mut s = storm(0.0, 0);
        s.drops = vec![Raindrop { row: 3, col: 2 }];

        let out = s.tick(5, 8, at(1_000));

        assert!(s.drops().is_empty());
        assert_eq!(out.landed, 1);
        assert_eq!(s.splash_at(2), Some(at(1_000)));
        assert_eq!(out.intents[0], DrawIntent::Erase { row: 3, col: 2 });
        match out.intents[1] {
            DrawIntent::Put {
                row, col, glyph, style,
            } => {
                assert_eq!((row, col, style), (4, 2, Style::Splash));
                assert!(SPLASH_GLYPHS.contains(&glyph));
            }
            other => panic!("expected a splash, got {:?}", other),
        }
    }

    #[test]
    fn splash_lands_at_the_wind_shifted_column() {
        let mut s = storm(0.0, -3);
        s.drops = vec![Raindrop { row: 3, col: 1 }];
        s.tick(5, 8, at(0));
        assert_eq!(s.splash_at(6), Some(at(0)));
        assert_eq!(s.splash_at(1), None);
    }

    #[test]
    fn drop_on_the_floor_row_is_discarded() {
        let mut s = storm(0.0, 0);
        s.drops = vec![Raindrop { row: 4, col: 1 }, Raindrop { row: 9, col: 1 }];
        let out = s.tick(5, 8, at(0));
        assert!(s.drops().is_empty());
        assert_eq!(s.splash_count(), 0);
        assert!(out.intents.is_empty());
    }

    #[test]
    fn tiny_grids_do_not_keep_drops() {
        for (h, w) in [(0, 10), (1, 10), (10, 0)] {
            let mut s = storm(1.0, 0);
            s.tick(h, w, at(0));
            assert!(s.drops().is_empty(), "{}x{}", h, w);
        }
    }

    #[test]
    fn newer_splash_overwrites_older_one_in_the_same_column() {
        let mut s = storm(0.0, 0);
        s.drops = vec![Raindrop { row: 3, col: 4 }];
        s.tick(5, 8, at(0));
        s.drops = vec![Raindrop { row: 3, col: 4 }];
        s.tick(5, 8, at(300));
        assert_eq!(s.splash_count(), 1);
        assert_eq!(s.splash_at(4), Some(at(300)));
    }

    #[test]
    fn splash_fades_after_half_a_second() {
        let mut s = storm(0.0, 0);
        s.splashes.insert(3, at(0));

        let out = s.tick(10, 8, at(300));
        assert_eq!(s.splash_at(3), Some(at(0)));
        assert_eq!(out.faded, 0);

        let out = s.tick(10, 8, at(500));
        assert_eq!(s.splash_at(3), Some(at(0)));
        assert_eq!(out.faded, 0);

        let out = s.tick(10, 8, at(600));
        assert_eq!(s.splash_at(3), None);
        assert_eq!(out.faded, 1);
        assert!(out.intents.contains(&DrawIntent::Erase { row: 9, col: 3 }));
    }

    #[test]
    fn stale_columns_wrap_after_the_terminal_shrinks() {
        let mut s = storm(0.0, 0);
        s.drops = vec![Raindrop { row: 2, col: 35 }];
        s.tick(20, 10, at(0));
        assert_eq!(s.drops(), &[Raindrop { row: 3, col: 5 }]);
    }

    #[test]
    fn disabled_lightning_never_flashes() {
        let mut s = storm(1.0, 0);
        s.weather.lightning = false;
        assert!((0..10_000).all(|_| !s.lightning_strikes()));
    }

    #[test]
    fn enabled_lightning_flashes_now_and_then() {
        let mut s = storm(1.0, 0);
        s.weather.lightning = true;
        let flashes = (0..10_000).filter(|_| s.lightning_strikes()).count();
        assert!(flashes > 0 && flashes < 1_000, "{} flashes", flashes);
    }

    #[test]
    fn heavy_rain_flashes_more_often() {
        assert_eq!(flash_chance(0.8), 0.02);
        assert_eq!(flash_chance(0.7), 0.005);
        assert_eq!(flash_chance(0.1), 0.005);
    }

    #[test]
    fn flash_redraws_drops_and_splashes_bright() {
        let mut s = storm(0.0, 0);
        s.drops = vec![Raindrop { row: 2, col: 1 }];
        s.splashes.insert(4, at(0));
        let intents = s.flash_intents(6);
        assert_eq!(intents.len(), 2);
        assert!(intents.contains(&DrawIntent::Put {
            row: 2,
            col: 1,
            glyph: RAIN_GLYPH,
            style: Style::Flash,
        }));
        assert!(intents.contains(&DrawIntent::Put {
            row: 5,
            col: 4,
            glyph: FLASH_SPLASH_GLYPH,
            style: Style::Flash,
        }));
    }

    #[test]
    fn dynamic_mode_overrides_manual_weather() {
        let weather = Weather {
            intensity: 1.0,
            wind: 10,
            ..Weather::default()
        };
        let mut s = Storm::new(
            weather,
            Some(DynamicWeather::new(0.0)),
            StdRng::seed_from_u64(1),
        );
        s.update_weather();
        assert!(s.is_dynamic());
        assert!((INTENSITY_MIN..=INTENSITY_MAX).contains(&s.weather.intensity));
        assert!(s.weather.wind.abs() <= DYNAMIC_WIND_LIMIT);
        assert!(s.weather.intensity < 1.0);
    }

    proptest! {
        #[test]
        fn wind_shift_stays_on_the_grid(col in any::<u16>(), wind in any::<i32>(), width in 1u16..=u16::MAX) {
            prop_assert!(wind_shift(col, wind, width) < width);
        }

        #[test]
        fn ticks_never_leak_drops_or_leave_the_grid(
            seed in any::<u64>(),
            height in 0u16..40,
            width in 0u16..60,
            wind in -20i32..20,
            intensity in 0.0f64..=1.0,
            ticks in 1usize..30,
        ) {
            let weather = Weather { intensity, wind, ..Weather::default() };
            let mut s = Storm::new(weather, None, StdRng::seed_from_u64(seed));
            for t in 0..ticks {
                let before = s.drops().len();
                let out = s.tick(height, width, Duration::from_millis(t as u64 * 100));
                prop_assert!(s.drops().len() + out.landed <= before + out.spawned);
                for d in s.drops() {
                    prop_assert!(d.row < height);
                    prop_assert!(d.row + 1 < height);
                    prop_assert!(d.col < width);
                }
                prop_assert!(s.splash_count() <= width as usize);
            }
        }
    }
}
