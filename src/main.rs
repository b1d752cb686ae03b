use anyhow::Context;
use cpal::traits::{DeviceTrait, HostTrait};
use crossbeam_channel as chan;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod audio;
mod ui;

use audio::{create_audio_stream, start_spectrum_analyzer};
use rezvibe::config::ActuatorConfig;
use rezvibe::{
    Actuator, ChannelSource, Config, DeviceFileActuator, LogActuator, NoActuator, Session,
    Snapshot, SpectrumSource,
};
use ui::{App, Command, TerminalType, draw_ui, handle_events, init_terminal, restore_terminal};

/// Loopback capture has no player volume; report full scale.
const HOST_VOLUME: i32 = 100;

fn init_logging(path: &Path) -> Result<(), anyhow::Error> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {:?}", path))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn make_actuator(cfg: &ActuatorConfig) -> Box<dyn Actuator> {
    match (&cfg.device, cfg.dry_run) {
        (_, true) => Box::new(LogActuator::default()),
        (Some(path), false) => Box::new(DeviceFileActuator::new(path)),
        (None, false) => Box::new(NoActuator),
    }
}

fn main() -> Result<(), anyhow::Error> {
    let config = Config::load();
    init_logging(&config.log_file())?;
    config.beat.validate().context("invalid beat configuration")?;

    let host = cpal::default_host();

    let default_out = host
        .default_output_device()
        .context("no default output device")?;

    let device_name = default_out
        .name()
        .unwrap_or_else(|_| "Unknown Device".to_string());

    let output_cfg = default_out
        .default_output_config()
        .context("failed to get default output stream config")?;

    let cfg = output_cfg.config();
    let sample_rate = cfg.sample_rate.0;
    info!(
        "capturing '{}' ({} ch @ {} Hz)",
        device_name, cfg.channels, sample_rate
    );

    let (tx_frames, rx_frames) = chan::bounded::<Vec<f32>>(16);
    let (tx_snap, rx_snap) = chan::bounded::<Snapshot>(8);

    start_spectrum_analyzer(
        rx_frames,
        tx_snap,
        cfg.channels as usize,
        config.beat.spectrum_bins,
        config.audio.clone(),
    );

    let _stream = create_audio_stream(&default_out, output_cfg.sample_format(), &cfg, tx_frames)?;
    let mut source = ChannelSource::new(rx_snap);

    let actuator = make_actuator(&config.actuator);
    let mut session = Session::start(&config.beat, actuator, config.actuator.timeout())
        .context("failed to start session")?;

    let quit = Arc::new(AtomicBool::new(false));
    let quit_flag = Arc::clone(&quit);
    ctrlc::set_handler(move || quit_flag.store(true, Ordering::SeqCst))
        .context("failed to set Ctrl-C handler")?;

    let mut terminal = init_terminal()?;
    let mut app = App::new(sample_rate, device_name);

    let result = run(
        &mut terminal,
        &mut app,
        &mut session,
        &mut source,
        config.beat.tick_interval(),
        &quit,
    );

    restore_terminal()?;
    session.end();
    result
}

fn run<A: Actuator, S: SpectrumSource>(
    terminal: &mut TerminalType,
    app: &mut App,
    session: &mut Session<A>,
    source: &mut S,
    tick: Duration,
    quit: &AtomicBool,
) -> Result<(), anyhow::Error> {
    session.surface_shown();
    session.playback_started(HOST_VOLUME);

    loop {
        if let Some(command) = handle_events()? {
            match command {
                Command::Quit => app.should_quit = true,
                Command::TogglePause if session.playing() => session.playback_paused(),
                Command::TogglePause => session.playback_resumed(),
                Command::Play => {
                    session.reset_detection();
                    session.playback_started(HOST_VOLUME);
                }
                Command::Stop => session.playback_stopped(),
                Command::ToggleSurface if session.surface_active() => session.surface_hidden(),
                Command::ToggleSurface => session.surface_shown(),
            }
        }

        if app.should_quit || quit.load(Ordering::SeqCst) {
            break;
        }

        let snapshot = source.snapshot();
        if session.playing() {
            session.render(snapshot.as_ref());
        } else {
            session.idle();
        }

        app.sync(session);
        terminal.draw(|f| draw_ui(f, app))?;

        std::thread::sleep(tick);
    }

    Ok(())
}
