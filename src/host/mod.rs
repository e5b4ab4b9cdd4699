pub mod clock;
pub mod indicator;

use anyhow::Result;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::audio::graph::AudioGraph;
use crate::audio::media::MediaSource;
use crate::control::remote::{MessageBus, RemoteCommand};
use crate::control::script::{Script, ScriptAction};
use crate::encode::ffmpeg::FfmpegEncoder;
use crate::playback::controller::PlaybackController;
use crate::playback::scheduler::AnimationClock;
use crate::playback::state::PlaybackState;
use crate::playback::AudioEvent;
use crate::render::canvas::PixelCanvas;
use clock::HostClock;

pub type Controller = PlaybackController<AudioGraph, AnimationClock>;

const LOAD_POLL: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub struct SessionSummary {
    pub state: PlaybackState,
    pub position: f64,
    pub frames_drawn: u64,
    pub refreshes: u64,
}

/// Headless page: owns the controller and every input feeding it, and
/// pumps them from one loop driven by a simulated display refresh.
pub struct Session {
    clock: HostClock,
    controller: Controller,
    canvas: Rc<RefCell<PixelCanvas>>,
    bus: MessageBus,
    script: Script,
    encoder: Option<FfmpegEncoder>,
    refresh_interval: f64,
    max_seconds: Option<f64>,
    refreshes: u64,
}

impl Session {
    pub fn new(
        clock: HostClock,
        controller: Controller,
        canvas: Rc<RefCell<PixelCanvas>>,
        bus: MessageBus,
        script: Script,
        fps: u32,
    ) -> Self {
        Self {
            clock,
            controller,
            canvas,
            bus,
            script,
            encoder: None,
            refresh_interval: 1.0 / fps.max(1) as f64,
            max_seconds: None,
            refreshes: 0,
        }
    }

    pub fn with_encoder(mut self, encoder: FfmpegEncoder) -> Self {
        self.encoder = Some(encoder);
        self
    }

    pub fn with_max_seconds(mut self, max_seconds: Option<f64>) -> Self {
        self.max_seconds = max_seconds;
        self
    }

    /// Play `initial`, or press play on the empty session when `None`, and
    /// keep refreshing until playback finishes or nothing can resume it.
    pub fn run(mut self, initial: Option<MediaSource>) -> Result<SessionSummary> {
        match initial {
            Some(source) => self.controller.load(source),
            None => self.controller.toggle_pause(),
        }
        if self.controller.state() == PlaybackState::Unstarted {
            anyhow::bail!("Nothing to play: no input given and no default track configured");
        }

        loop {
            if self.controller.state() == PlaybackState::Loading {
                if let Some(event) = self.controller.audio_mut().wait_for_load(LOAD_POLL) {
                    self.dispatch_audio(event)?;
                }
                continue;
            }

            self.refresh()?;

            if self.should_stop() {
                break;
            }
        }

        if let Some(encoder) = self.encoder.take() {
            encoder.finish()?;
        }

        Ok(SessionSummary {
            state: self.controller.state(),
            position: self.controller.position(),
            frames_drawn: self.controller.frames_drawn(),
            refreshes: self.refreshes,
        })
    }

    /// One display refresh: inputs and resizes, audio events, due frames,
    /// then output.
    fn refresh(&mut self) -> Result<()> {
        self.clock.advance(self.refresh_interval);
        self.refreshes += 1;
        let now = self.clock.now();

        for action in self.script.take_due(now) {
            match action {
                ScriptAction::Input(event) if event.is_play_pause() => {
                    self.controller.toggle_pause()
                }
                ScriptAction::Input(event) => log::debug!("Unbound input {:?}", event),
                ScriptAction::Remote(message) => self.bus.deliver(message),
                ScriptAction::Resize { width, height } => self.resize_canvas(width, height)?,
            }
        }
        for command in self.bus.take_commands() {
            match command {
                RemoteCommand::TogglePause => self.controller.toggle_pause(),
            }
        }

        while let Some(event) = self.controller.audio_mut().poll_event() {
            self.dispatch_audio(event)?;
        }

        for token in self.controller.scheduler_mut().refresh() {
            self.controller.on_frame(token);
        }

        if let Some(encoder) = self.encoder.as_mut() {
            encoder.write_frame(self.canvas.borrow().pixels())?;
        }
        Ok(())
    }

    fn resize_canvas(&mut self, width: u32, height: u32) -> Result<()> {
        if self.encoder.is_some() {
            anyhow::bail!("Cannot resize the canvas to {}x{} while encoding video", width, height);
        }
        self.canvas.borrow_mut().resize(width, height)?;
        log::info!("Canvas resized to {}x{}", width, height);
        Ok(())
    }

    fn dispatch_audio(&mut self, event: AudioEvent) -> Result<()> {
        let failed = matches!(event, AudioEvent::LoadFailed(_));
        self.controller.handle_audio_event(event);
        if failed {
            // The controller never retries, so a headless run has nothing left to wait for.
            let source = self
                .controller
                .source()
                .map(|s| s.to_string())
                .unwrap_or_default();
            anyhow::bail!("Could not load {}", source);
        }
        Ok(())
    }

    fn should_stop(&self) -> bool {
        if let Some(limit) = self.max_seconds {
            if self.clock.now() >= limit {
                log::info!("Reached {:.1}s limit", limit);
                return true;
            }
        }
        match self.controller.state() {
            PlaybackState::Finished => true,
            PlaybackState::Paused if self.script.is_empty() => {
                log::info!("Paused with no further input scheduled");
                true
            }
            _ => false,
        }
    }
}
