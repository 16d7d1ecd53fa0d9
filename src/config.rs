// Copyright (c) 2026 rezky_nightky

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use clap::error::ErrorKind;
use clap::Parser;
use thiserror::Error;

use crate::runtime::ColorMode;
use crate::weather::{Weather, INTENSITY_MAX, INTENSITY_MIN, WIND_LIMIT};

pub const CONTROLS_HELP: &str = "\
CONTROLS:
  q      quit
  + / -  more / less rain
  [ / ]  wind to the left / right
  l      toggle lightning
  h      toggle the status line";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid --intensity: {0} (allowed: 0.1 to 1.0)")]
    Intensity(f64),
    #[error("invalid --dynamic: {0} (allowed: 0.0 to 1.0)")]
    Randomness(f64),
    #[error("invalid --duration: {0} (allowed: finite seconds above 0)")]
    Duration(f64),
    #[error("invalid --colormode: {0} (allowed: 0, 16, 256, 24)")]
    ColorMode(u16),
}

/// Exit status for a failed parse: help and version requests succeed, every
/// malformed command line exits with 1.
pub fn parse_exit_code(err: &clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

pub fn color_enabled_stdout() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(std::env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "raintty",
    about = "A whimsical terminal rain simulator.",
    after_help = CONTROLS_HELP,
    disable_version_flag = true
)]
pub struct Args {
    #[arg(
        short = 'i',
        long = "intensity",
        default_value_t = 0.4,
        help_heading = "WEATHER",
        help = "Rain intensity (min 0.1 max 1.0)"
    )]
    pub intensity: f64,

    #[arg(
        short = 'd',
        long = "duration",
        allow_negative_numbers = true,
        help_heading = "GENERAL",
        help = "Stop after N seconds (default: run until q)"
    )]
    pub duration: Option<f64>,

    #[arg(
        short = 'w',
        long = "wind",
        default_value_t = 0,
        allow_negative_numbers = true,
        help_heading = "WEATHER",
        help = "Initial wind, in columns per frame (negative blows left)"
    )]
    pub wind: i32,

    #[arg(
        short = 'l',
        long = "lightning",
        help_heading = "WEATHER",
        help = "Enable lightning flashes"
    )]
    pub lightning: bool,

    #[arg(
        long = "dynamic",
        value_name = "RANDOMNESS",
        num_args = 0..=1,
        default_missing_value = "0.2",
        help_heading = "WEATHER",
        help = "Enable dynamic weather transitions with optional randomness (min 0 max 1, default 0.2)"
    )]
    pub dynamic: Option<f64>,

    #[arg(
        long = "seed",
        help_heading = "GENERAL",
        help = "Seed the random source for a reproducible storm"
    )]
    pub seed: Option<u64>,

    #[arg(
        long = "no-hud",
        help_heading = "APPEARANCE",
        help = "Start with the status line hidden"
    )]
    pub no_hud: bool,

    #[arg(
        long = "colormode",
        help_heading = "APPEARANCE",
        help = "Force color mode (allowed: 0, 16, 256, 24). Default: detected from NO_COLOR, COLORTERM and TERM"
    )]
    pub colormode: Option<u16>,

    #[arg(
        long = "log-file",
        value_name = "PATH",
        help_heading = "GENERAL",
        help = "Write logs to PATH (filter with RUST_LOG, default warn)"
    )]
    pub log_file: Option<PathBuf>,

    #[arg(
        long = "info",
        help_heading = "HELP",
        help = "Print version info and exit"
    )]
    pub info: bool,

    #[arg(
        short = 'v',
        long = "version",
        help_heading = "HELP",
        help = "Print version and exit"
    )]
    pub version: bool,
}

/// Validated run configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Settings {
    pub weather: Weather,
    pub duration: Option<Duration>,
    /// Randomness of dynamic mode; `None` keeps the weather manual.
    pub dynamic: Option<f64>,
    pub seed: Option<u64>,
    pub color_mode: ColorMode,
}

impl Args {
    pub fn settings<F>(&self, env: F) -> Result<Settings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let intensity = self.intensity;
        if !(INTENSITY_MIN..=INTENSITY_MAX).contains(&intensity) {
            return Err(ConfigError::Intensity(intensity));
        }

        if let Some(r) = self.dynamic {
            if !(0.0..=1.0).contains(&r) {
                return Err(ConfigError::Randomness(r));
            }
        }

        let duration = self
            .duration
            .map(|s| match Duration::try_from_secs_f64(s) {
                Ok(d) if !d.is_zero() => Ok(d),
                _ => Err(ConfigError::Duration(s)),
            })
            .transpose()?;

        Ok(Settings {
            weather: Weather {
                intensity,
                wind: self.wind.clamp(-WIND_LIMIT, WIND_LIMIT),
                lightning: self.lightning,
                show_hud: !self.no_hud,
            },
            duration,
            dynamic: self.dynamic,
            seed: self.seed,
            color_mode: detect_color_mode(self.colormode, env)?,
        })
    }
}

pub fn detect_color_mode<F>(forced: Option<u16>, env: F) -> Result<ColorMode, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(m) = forced {
        return match m {
            0 => Ok(ColorMode::Mono),
            16 => Ok(ColorMode::Color16),
            8 | 256 => Ok(ColorMode::Color256),
            24 | 32 => Ok(ColorMode::TrueColor),
            _ => Err(ConfigError::ColorMode(m)),
        };
    }

    if env("NO_COLOR").is_some() {
        return Ok(ColorMode::Mono);
    }

    let colorterm = env("COLORTERM").unwrap_or_default().to_ascii_lowercase();
    if colorterm.contains("truecolor") || colorterm.contains("24bit") {
        return Ok(ColorMode::TrueColor);
    }

    let term = env("TERM").unwrap_or_default().to_ascii_lowercase();
    if term == "dumb" {
        return Ok(ColorMode::Mono);
    }
    if term.contains("256color") {
        return Ok(ColorMode::Color256);
    }

    Ok(ColorMode::Color16)
}
