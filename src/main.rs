mod app;
mod cli;
mod color;
mod config;
mod control;
mod display;
mod error;
mod field;
mod mqtt;
mod player;
mod projection;
mod scheduler;
mod surface;
mod trajectory;
mod util;

use app::App;
use clap::Parser;
use cli::Cli;
use config::AppConfig;
use control::{Command, Controller};
use display::{Display, InputEvent, PixelBuffer, RenderTarget};
use error::Result;
use field::ParticleField;
use mqtt::MqttSource;
use player::TrajectoryPlayer;
use sdl2::keyboard::Keycode;
use trajectory::{FileSource, Offline, TrajectorySource};
use util::{Clock, Rng};

/// Pick the trajectory source: MQTT broker, then response file, then none
fn open_source(config: &AppConfig) -> Box<dyn TrajectorySource> {
    if config.mqtt.host.is_some() {
        match MqttSource::connect(&config.mqtt) {
            Ok(source) => return Box::new(source),
            Err(e) => log::warn!("{}", e),
        }
    }
    match &config.data_file {
        Some(path) => Box::new(FileSource::new(path)),
        None => Box::new(Offline),
    }
}

/// Keys that map straight onto a remote command
fn key_command(key: Keycode) -> Option<Command> {
    let digit = match key {
        Keycode::Num0 => 0,
        Keycode::Num1 => 1,
        Keycode::Num2 => 2,
        Keycode::Num3 => 3,
        Keycode::Num4 => 4,
        Keycode::Num5 => 5,
        Keycode::Num6 => 6,
        Keycode::Num7 => 7,
        Keycode::Num8 => 8,
        Keycode::Num9 => 9,
        Keycode::L => return Some(Command::Load),
        Keycode::Escape => return Some(Command::Quit),
        _ => return None,
    };
    Some(Command::Seek(digit))
}

fn handle_key<S: surface::RenderSurface>(app: &mut App<S>, key: Keycode, now: f64) {
    match key {
        Keycode::Space => app.toggle_active(now),
        Keycode::Left => app.step(-1),
        Keycode::Right => app.step(1),
        Keycode::H => app.toggle_visibility(),
        Keycode::Tab => app.toggle_mode(),
        Keycode::G => app.toggle_extent(),
        other => {
            if let Some(command) = key_command(other) {
                app.apply(command, now);
            }
        },
    }
}

fn print_controls(config: &AppConfig) {
    println!("=== currentfield ===");
    println!("Resolution: {}x{}", config.window.width, config.window.height);
    println!("Controls:");
    println!("  Space      - Start/stop field, play/pause trajectories");
    println!("  Left/Right - Step one forecast time");
    println!("  0-9        - Jump to forecast time");
    println!("  L          - Reload trajectories");
    println!("  H          - Hide/show trajectories");
    println!("  Tab        - Switch field / trajectories");
    println!("  G          - Toggle global / regional extent");
    println!("  Escape     - Quit");
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(level) = cli.log_level() {
        logger.filter_level(level);
    }
    logger.init();

    let config = AppConfig::from_cli(&cli)?;
    if let Some(path) = &cli.write_config {
        config.save(path)?;
        println!("Configuration written to {}", path.display());
        return Ok(());
    }
    let (width, height) = (config.window.width, config.window.height);
    let (bg_r, bg_g, bg_b) = config.window.background;
    let surface = || PixelBuffer::with_size(width, height).with_background(bg_r, bg_g, bg_b);

    let mut rng = config.seed.map_or_else(Rng::from_time, Rng::new);
    let player_rng = Rng::new(rng.next_u64());
    let field_rng = Rng::new(rng.next_u64());

    let (mut display, texture_creator) =
        Display::with_options("currentfield", width, height, config.window.vsync)?;
    let mut target = RenderTarget::with_size(&texture_creator, width, height)?;

    let player = TrajectoryPlayer::new(surface(), config.effective_extent(), player_rng)?;
    let field = ParticleField::new(surface(), config.simulation.clone(), field_rng)?;

    let source = open_source(&config);
    let mut app = App::new(player, field, source, config.request.clone(), config.mode);

    let controller = if config.control_socket {
        match Controller::new() {
            Ok(c) => Some(c),
            Err(e) => {
                log::warn!("Remote control unavailable: {}", e);
                None
            },
        }
    } else {
        None
    };

    if !cli.quiet {
        print_controls(&config);
    }

    let clock = Clock::new();
    app.startup(clock.now());

    while app.is_running() {
        let now = clock.now();

        for event in display.poll_events() {
            match event {
                InputEvent::Quit => app.apply(Command::Quit, now),
                InputEvent::KeyDown(key) => handle_key(&mut app, key, now),
            }
        }
        if let Some(controller) = &controller {
            for command in controller.poll() {
                app.apply(command, now);
            }
        }

        app.frame(now);
        display.present(&mut target, app.active_surface())?;
    }

    log::info!("Exiting: {}", app.status());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_keys_seek() {
        assert_eq!(key_command(Keycode::Num0), Some(Command::Seek(0)));
        assert_eq!(key_command(Keycode::Num7), Some(Command::Seek(7)));
        assert_eq!(key_command(Keycode::L), Some(Command::Load));
        assert_eq!(key_command(Keycode::Escape), Some(Command::Quit));
        assert_eq!(key_command(Keycode::Q), None);
    }
}
