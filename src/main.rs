mod audio;
mod cli;
mod config;
mod control;
mod encode;
mod error;
mod host;
mod playback;
mod render;

use anyhow::Result;
use clap::Parser;
use std::cell::RefCell;
use std::rc::Rc;

use audio::analyser::FftAnalyser;
use audio::graph::AudioGraph;
use audio::media::MediaSource;
use cli::Cli;
use config::Config;
use control::remote::MessageBus;
use control::script::Script;
use encode::ffmpeg::{EncoderSettings, FfmpegEncoder};
use host::clock::HostClock;
use host::indicator::SpinnerIndicator;
use host::Session;
use playback::controller::{ControllerSettings, PlaybackController};
use playback::scheduler::AnimationClock;
use render::canvas::PixelCanvas;
use render::frame::FrameRenderer;
use render::CanvasVisualizer;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    let mut cfg = match config::find_config(cli.config.as_deref()) {
        Some(path) => match config::load_config(&path) {
            Ok(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            // An explicitly requested config must load; a discovered one may be skipped.
            Err(err) if cli.config.is_some() => return Err(err),
            Err(err) => {
                log::warn!("Ignoring config {}: {:#}", path.display(), err);
                Config::default()
            }
        },
        None => Config::default(),
    };

    // CLI flags override the config file
    if let Some(width) = cli.width { cfg.canvas.width = width; }
    if let Some(height) = cli.height { cfg.canvas.height = height; }
    if let Some(fps) = cli.fps { cfg.playback.fps = fps; }
    if let Some(fft_size) = cli.fft_size { cfg.analyser.fft_size = fft_size; }
    if let Some(smoothing) = cli.smoothing { cfg.analyser.smoothing = smoothing; }
    if cli.waveform { cfg.canvas.waveform_overlay = true; }
    cfg.validate()?;

    let mut script = match cli.script {
        Some(ref path) => Script::load(path)?,
        None => Script::new(),
    };
    script.add_toggles(&cli.toggle_at)?;
    if cli.output.is_some() && script.resizes_canvas() {
        anyhow::bail!("Scripted canvas resizes cannot be combined with --output");
    }

    let input = cli.input.as_deref().map(MediaSource::parse);
    let default_track = if cfg.playback.default_track.is_empty() {
        None
    } else {
        Some(MediaSource::parse(&cfg.playback.default_track))
    };

    log::info!("castviz - live spectrum visualizer");
    match &input {
        Some(source) => log::info!("Input: {}", source),
        None => log::info!("No input, play will load the default track"),
    }
    log::info!(
        "Canvas: {}x{} @ {}fps, fft size {}, smoothing {:.2}",
        cfg.canvas.width,
        cfg.canvas.height,
        cfg.playback.fps,
        cfg.analyser.fft_size,
        cfg.analyser.smoothing
    );
    if !script.is_empty() {
        log::info!("Scripted events: {}", script.len());
    }

    // Composition root: everything the controller talks to is built here.
    let clock = HostClock::new();
    let canvas = Rc::new(RefCell::new(PixelCanvas::new(cfg.canvas.width, cfg.canvas.height)?));
    let analyser = FftAnalyser::new(
        cfg.analyser.fft_size,
        cfg.analyser.smoothing,
        cfg.analyser.min_decibels,
        cfg.analyser.max_decibels,
    );
    let audio = AudioGraph::new(clock.clone(), analyser);
    let visualizer = CanvasVisualizer::new(
        FrameRenderer::new(cfg.canvas.waveform_overlay),
        canvas.clone(),
    );
    let settings = ControllerSettings {
        fft_size: cfg.analyser.fft_size,
        smoothing: cfg.analyser.smoothing,
        default_track: default_track.clone(),
    };
    let controller = PlaybackController::new(
        settings,
        audio,
        AnimationClock::new(),
        Box::new(SpinnerIndicator::new("Loading audio...")),
        Box::new(visualizer),
    );

    let soundtrack = if script.is_empty() {
        input.clone().or(default_track)
    } else {
        None
    };

    let bus = MessageBus::new(cfg.remote.namespace.clone());
    log::info!("Listening for remote messages on {}", bus.namespace());
    let mut session = Session::new(clock, controller, canvas, bus, script, cfg.playback.fps)
        .with_max_seconds(cli.max_seconds);

    if let Some(ref output) = cli.output {
        let audio_path = soundtrack.as_ref().and_then(|s| s.local_path());
        if audio_path.is_none() {
            log::warn!("Writing video without a soundtrack");
        }
        let encoder = FfmpegEncoder::new(
            output,
            audio_path,
            &EncoderSettings {
                width: cfg.canvas.width,
                height: cfg.canvas.height,
                fps: cfg.playback.fps,
                codec: &cfg.output.codec,
                pix_fmt: &cfg.output.pix_fmt,
                crf: cfg.output.crf,
            },
        )?;
        session = session.with_encoder(encoder);
    }

    let summary = session.run(input)?;

    log::info!(
        "Done: {} at {:.2}s, {} frames drawn over {} refreshes",
        summary.state,
        summary.position,
        summary.frames_drawn,
        summary.refreshes
    );
    if let Some(output) = cli.output {
        log::info!("Output: {}", output.display());
    }
    Ok(())
}
