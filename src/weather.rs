// Copyright (c) 2026 rezky_nightky

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use rand::Rng;

pub const INTENSITY_MIN: f64 = 0.1;
pub const INTENSITY_MAX: f64 = 1.0;
pub const INTENSITY_STEP: f64 = 0.1;
pub const WIND_LIMIT: i32 = 10;
pub const DYNAMIC_WIND_LIMIT: i32 = 5;

/// A keyboard command, applied once per tick before anything else moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Control {
    Quit,
    MoreRain,
    LessRain,
    WindLeft,
    WindRight,
    ToggleLightning,
    ToggleHud,
}

impl Control {
    pub fn from_key(key: KeyEvent) -> Option<Self> {
        match key.code {
            // Raw mode swallows SIGINT, so Ctrl-C arrives as a key.
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Control::Quit)
            }
            KeyCode::Char('q') | KeyCode::Esc => Some(Control::Quit),
            KeyCode::Char('+') => Some(Control::MoreRain),
            KeyCode::Char('-') => Some(Control::LessRain),
            KeyCode::Char('[') => Some(Control::WindLeft),
            KeyCode::Char(']') => Some(Control::WindRight),
            KeyCode::Char('l') => Some(Control::ToggleLightning),
            KeyCode::Char('h') => Some(Control::ToggleHud),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Weather {
    /// Chance that a new drop appears in any given column on a tick.
    pub intensity: f64,
    /// Columns of horizontal drift per tick; negative blows left.
    pub wind: i32,
    pub lightning: bool,
    pub show_hud: bool,
}

impl Default for Weather {
    fn default() -> Self {
        Self {
            intensity: 0.4,
            wind: 0,
            lightning: false,
            show_hud: true,
        }
    }
}

impl Weather {
    pub fn apply(&mut self, control: Control) {
        match control {
            Control::Quit => {}
            Control::MoreRain => {
                self.intensity = (self.intensity + INTENSITY_STEP).min(INTENSITY_MAX);
            }
            Control::LessRain => {
                self.intensity = (self.intensity - INTENSITY_STEP).max(INTENSITY_MIN);
            }
            Control::WindLeft => {
                self.wind = self.wind.saturating_sub(1).clamp(-WIND_LIMIT, WIND_LIMIT);
            }
            Control::WindRight => {
                self.wind = self.wind.saturating_add(1).clamp(-WIND_LIMIT, WIND_LIMIT);
            }
            Control::ToggleLightning => self.lightning = !self.lightning,
            Control::ToggleHud => self.show_hud = !self.show_hud,
        }
    }
}

/// Slowly drifting intensity and wind with a little noise on top.
#[derive(Clone, Debug)]
pub struct DynamicWeather {
    phase: f64,
    randomness: f64,
}

impl DynamicWeather {
    pub const PHASE_STEP: f64 = 0.05;
    const INTENSITY_BASE: f64 = 0.5;
    const INTENSITY_AMPLITUDE: f64 = 0.2;
    const WIND_AMPLITUDE: f64 = 2.0;

    pub fn new(randomness: f64) -> Self {
        Self {
            phase: 0.0,
            randomness: randomness.clamp(0.0, 1.0),
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Steps the oscillator and overwrites intensity and wind.
    pub fn advance<R: Rng>(&mut self, weather: &mut Weather, rng: &mut R) {
        self.phase += Self::PHASE_STEP;
        let (intensity, wind) =
            Self::sample(self.phase, self.randomness, rng.random(), rng.random());
        weather.intensity = intensity;
        weather.wind = wind;
    }

    /// Intensity and wind at `phase`. `noise_i` and `noise_w` are uniform
    /// draws in `[0, 1)`; each becomes jitter centred on zero.
    pub fn sample(phase: f64, randomness: f64, noise_i: f64, noise_w: f64) -> (f64, i32) {
        let jitter_i = (noise_i - 0.5) * randomness;
        let jitter_w = (noise_w - 0.5) * 10.0 * randomness;

        let intensity = Self::INTENSITY_BASE + Self::INTENSITY_AMPLITUDE * phase.sin() + jitter_i;
        let intensity = if intensity.is_finite() {
            intensity.clamp(INTENSITY_MIN, INTENSITY_MAX)
        } else {
            Self::INTENSITY_BASE
        };

        let wind = (Self::WIND_AMPLITUDE * (phase / 3.0).sin() + jitter_w).round();
        let wind = if wind.is_finite() {
            wind.clamp(-DYNAMIC_WIND_LIMIT as f64, DYNAMIC_WIND_LIMIT as f64) as i32
        } else {
            0
        };

        (intensity, wind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn keys_map_to_controls() {
        assert_eq!(Control::from_key(key(KeyCode::Char('q'))), Some(Control::Quit));
        assert_eq!(Control::from_key(key(KeyCode::Char('+'))), Some(Control::MoreRain));
        assert_eq!(Control::from_key(key(KeyCode::Char('-'))), Some(Control::LessRain));
        assert_eq!(Control::from_key(key(KeyCode::Char('['))), Some(Control::WindLeft));
        assert_eq!(Control::from_key(key(KeyCode::Char(']'))), Some(Control::WindRight));
        assert_eq!(Control::from_key(key(KeyCode::Char('l'))), Some(Control::ToggleLightning));
        assert_eq!(Control::from_key(key(KeyCode::Char('h'))), Some(Control::ToggleHud));
        assert_eq!(Control::from_key(key(KeyCode::Char('x'))), None);
        assert_eq!(Control::from_key(key(KeyCode::Enter)), None);
    }

    #[test]
    fn ctrl_c_and_escape_quit() {
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(Control::from_key(ctrl_c), Some(Control::Quit));
        assert_eq!(Control::from_key(key(KeyCode::Esc)), Some(Control::Quit));
        assert_eq!(Control::from_key(key(KeyCode::Char('c'))), None);
    }

    #[test]
    fn toggles_flip_flags() {
        let mut w = Weather::default();
        w.apply(Control::ToggleLightning);
        w.apply(Control::ToggleHud);
        assert!(w.lightning);
        assert!(!w.show_hud);
        w.apply(Control::ToggleLightning);
        assert!(!w.lightning);
    }

    #[test]
    fn wind_steps_from_out_of_range_values_land_in_range() {
        let mut w = Weather {
            wind: i32::MAX,
            ..Weather::default()
        };
        w.apply(Control::WindRight);
        assert_eq!(w.wind, WIND_LIMIT);

        w.wind = i32::MIN;
        w.apply(Control::WindLeft);
        assert_eq!(w.wind, -WIND_LIMIT);

        w.wind = 50;
        w.apply(Control::WindLeft);
        assert_eq!(w.wind, WIND_LIMIT);
    }

    #[test]
    fn intensity_steps_by_a_tenth() {
        let mut w = Weather::default();
        w.apply(Control::MoreRain);
        assert!((w.intensity - 0.5).abs() < 1e-9);
        w.apply(Control::LessRain);
        w.apply(Control::LessRain);
        assert!((w.intensity - 0.3).abs() < 1e-9);
    }

    #[test]
    fn dynamic_without_randomness_follows_the_sine() {
        let (intensity, wind) = DynamicWeather::sample(std::f64::consts::FRAC_PI_2, 0.0, 0.9, 0.1);
        assert!((intensity - 0.7).abs() < 1e-9);
        assert_eq!(wind, 1);
    }

    #[test]
    fn dynamic_advance_moves_the_phase() {
        let mut dynamic = DynamicWeather::new(0.2);
        let mut weather = Weather::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10 {
            dynamic.advance(&mut weather, &mut rng);
        }
        assert!((dynamic.phase() - 0.5).abs() < 1e-9);
        assert!((INTENSITY_MIN..=INTENSITY_MAX).contains(&weather.intensity));
    }

    fn control() -> impl Strategy<Value = Control> {
        prop_oneof![
            Just(Control::MoreRain),
            Just(Control::LessRain),
            Just(Control::WindLeft),
            Just(Control::WindRight),
            Just(Control::ToggleLightning),
        ]
    }

    proptest! {
        #[test]
        fn manual_controls_stay_in_range(presses in prop::collection::vec(control(), 0..200)) {
            let mut w = Weather::default();
            for c in presses {
                w.apply(c);
                prop_assert!((INTENSITY_MIN..=INTENSITY_MAX).contains(&w.intensity));
                prop_assert!((-WIND_LIMIT..=WIND_LIMIT).contains(&w.wind));
            }
        }

        #[test]
        fn dynamic_weather_stays_in_range(
            phase in -1.0e6f64..1.0e6,
            randomness in 0.0f64..=1.0,
            noise_i in 0.0f64..1.0,
            noise_w in 0.0f64..1.0,
        ) {
            let (intensity, wind) = DynamicWeather::sample(phase, randomness, noise_i, noise_w);
            prop_assert!((INTENSITY_MIN..=INTENSITY_MAX).contains(&intensity));
            prop_assert!((-DYNAMIC_WIND_LIMIT..=DYNAMIC_WIND_LIMIT).contains(&wind));
        }
    }
}
