// Copyright (c) 2026 rezky_nightky

mod cell;
mod config;
mod frame;
mod grid;
mod hud;
mod palette;
mod runtime;
mod storm;
mod terminal;
mod weather;

use std::fs::File;
use std::io;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::builder::styling::{AnsiColor as ClapAnsiColor, Color as ClapColor};
use clap::builder::styling::{Effects as ClapEffects, Style as ClapStyle};
use clap::builder::Styles as ClapStyles;
use clap::{CommandFactory, FromArgMatches};
use crossterm::event::{Event, KeyEventKind};
use rand::{rngs::StdRng, SeedableRng};

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use crate::config::{color_enabled_stdout, parse_exit_code, Args, Settings};
use crate::grid::{render, Grid};
use crate::palette::Palette;
use crate::storm::{Storm, FLASH_HOLD};
use crate::terminal::{restore_terminal_best_effort, Terminal};
use crate::weather::{Control, DynamicWeather};

/// Pause between frames.
const FRAME_INTERVAL: Duration = Duration::from_millis(100);
/// How long the closing message stays up.
const FAREWELL_HOLD: Duration = Duration::from_secs(1);

const HELP_TEMPLATE_PLAIN: &str = "\
{before-help}{about-with-newline}
USAGE:
  {usage}

{all-args}{after-help}";

const HELP_TEMPLATE_COLOR: &str = "\
{before-help}{about-with-newline}
\x1b[1;36mUSAGE:\x1b[0m
  {usage}

{all-args}{after-help}";

fn build_info() -> &'static str {
    env!("RAINTTY_BUILD")
}

fn clap_styles() -> ClapStyles {
    ClapStyles::styled()
        .header(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Cyan))),
        )
        .usage(
            ClapStyle::new()
                .effects(ClapEffects::BOLD)
                .fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Blue))),
        )
        .literal(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Yellow))))
        .placeholder(ClapStyle::new().fg_color(Some(ClapColor::Ansi(ClapAnsiColor::Magenta))))
}

fn init_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    let env = env_logger::Env::default().default_filter_or("warn");
    let mut builder = env_logger::Builder::from_env(env);

    match log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }
        // Stderr shares the screen with the rain; only log there when asked to.
        None if std::env::var_os("RUST_LOG").is_none() => return Ok(()),
        None => {}
    }

    builder.try_init().context("failed to install logger")
}

fn install_signal_handlers() {
    #[cfg(unix)]
    {
        match Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            Ok(mut signals) => {
                thread::spawn(move || {
                    if let Some(sig) = signals.forever().next() {
                        restore_terminal_best_effort();
                        std::process::exit(128 + sig);
                    }
                });
            }
            Err(e) => log::warn!("failed to install signal handlers: {}", e),
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = ctrlc::set_handler(|| {
            restore_terminal_best_effort();
            std::process::exit(130);
        }) {
            log::warn!("failed to install Ctrl-C handler: {}", e);
        }
    }
}

/// Waits out the lightning: everything lit up for [`FLASH_HOLD`], then dark.
fn flash<G: Grid + ?Sized>(
    grid: &mut G,
    storm: &Storm,
    height: u16,
    mut pause: impl FnMut(Duration),
) -> io::Result<()> {
    grid.clear();
    render(grid, &storm.flash_intents(height));
    grid.present()?;
    pause(FLASH_HOLD);
    grid.clear();
    grid.present()
}

/// One frame after input: weather, lightning, simulation, overlay, present.
fn step<G: Grid + ?Sized>(
    grid: &mut G,
    storm: &mut Storm,
    now: Duration,
    pause: impl FnMut(Duration),
) -> io::Result<()> {
    storm.update_weather();
    let lightning = storm.lightning_strikes();

    grid.clear();
    let (height, width) = grid.dimensions();
    let outcome = storm.tick(height, width, now);
    log::trace!(
        "tick {}: {}x{} spawned {} landed {} faded {} drops {} splashes {}",
        storm.ticks(),
        width,
        height,
        outcome.spawned,
        outcome.landed,
        outcome.faded,
        storm.drops().len(),
        storm.splash_count()
    );
    render(grid, &outcome.intents);

    if lightning {
        log::debug!("lightning at tick {}", storm.ticks());
        flash(grid, storm, height, pause)?;
    }

    if storm.weather.show_hud {
        hud::draw_status(grid, &storm.weather);
    }

    grid.present()
}

/// Handles pending terminal events, stopping after the first key press so
/// each frame acts on at most one key. Returns `false` once the user quits.
fn handle_input(term: &mut Terminal, storm: &mut Storm) -> io::Result<bool> {
    while Terminal::poll_event(Duration::ZERO)? {
        match Terminal::read_event()? {
            Event::Resize(w, h) => {
                log::debug!("resize event {}x{}", w, h);
                term.invalidate();
            }
            Event::Key(k) if k.kind == KeyEventKind::Press => {
                match Control::from_key(k) {
                    Some(Control::Quit) => return Ok(false),
                    Some(control) => storm.apply(control),
                    None => {}
                }
                break;
            }
            _ => {}
        }
    }
    Ok(true)
}

fn run(settings: &Settings, term: &mut Terminal) -> anyhow::Result<u64> {
    let rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut storm = Storm::new(
        settings.weather.clone(),
        settings.dynamic.map(DynamicWeather::new),
        rng,
    );
    if storm.is_dynamic() {
        log::info!("dynamic weather enabled");
    }

    let start = Instant::now();
    let end = settings.duration.map(|d| start + d);

    loop {
        if end.is_some_and(|end| Instant::now() >= end) {
            break;
        }
        if !handle_input(term, &mut storm).context("failed to read terminal input")? {
            break;
        }
        step(term, &mut storm, start.elapsed(), thread::sleep).context("failed to draw frame")?;
        thread::sleep(FRAME_INTERVAL);
    }

    hud::draw_farewell(term);
    term.present().context("failed to draw frame")?;
    thread::sleep(FAREWELL_HOLD);

    Ok(storm.ticks())
}

fn main() -> anyhow::Result<()> {
    std::panic::set_hook(Box::new(|info| {
        restore_terminal_best_effort();
        eprintln!("{}", info);
    }));

    let mut cmd = Args::command().styles(clap_styles());
    let help_template = if color_enabled_stdout() {
        HELP_TEMPLATE_COLOR
    } else {
        HELP_TEMPLATE_PLAIN
    };
    cmd = cmd.help_template(help_template);
    let args = match cmd
        .try_get_matches()
        .and_then(|matches| Args::from_arg_matches(&matches))
    {
        Ok(args) => args,
        Err(e) => {
            let code = parse_exit_code(&e);
            if code == 0 {
                e.exit();
            }
            let _ = e.print();
            std::process::exit(code);
        }
    };

    if args.version {
        println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if args.info {
        println!("Version: v{}", env!("CARGO_PKG_VERSION"));
        println!("Build: {}", build_info());
        println!("Copyright: (c) 2026 {}", env!("CARGO_PKG_AUTHORS"));
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        println!("Source: {}", env!("CARGO_PKG_REPOSITORY"));
        return Ok(());
    }

    let settings = match args.settings(|k| std::env::var(k).ok()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(args.log_file.as_deref())?;
    install_signal_handlers();
    if settings.weather.wind != args.wind {
        log::warn!("--wind {} clamped to {}", args.wind, settings.weather.wind);
    }
    log::debug!("starting with {:?}", settings);

    let mut term =
        Terminal::new(Palette::new(settings.color_mode)).context("failed to set up terminal")?;
    let ticks = run(&settings, &mut term)?;
    drop(term);

    log::info!("stopped after {} frames", ticks);
    Ok(())
}
