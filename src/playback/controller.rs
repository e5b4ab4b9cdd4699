use super::scheduler::{FrameScheduler, FrameToken};
use super::state::{PlaybackClock, PlaybackState};
use super::{Analyser, AudioEvent, AudioSource, LoadingIndicator, Visualizer};
use crate::audio::media::MediaSource;
use crate::error::PlaybackError;

#[derive(Clone, Debug)]
pub struct ControllerSettings {
    /// Transform size handed to the analyser; the snapshot length is half of it.
    pub fft_size: usize,
    pub smoothing: f32,
    /// Track loaded when play is pressed on an unstarted session.
    pub default_track: Option<MediaSource>,
}

pub struct PlaybackController<A, S>
where
    A: AudioSource + Analyser,
    S: FrameScheduler,
{
    settings: ControllerSettings,
    state: PlaybackState,
    clock: PlaybackClock,
    source: Option<MediaSource>,
    pending_frame: Option<FrameToken>,
    frequencies: Vec<u8>,
    times: Vec<u8>,
    frames_drawn: u64,
    audio: A,
    scheduler: S,
    indicator: Box<dyn LoadingIndicator>,
    visualizer: Box<dyn Visualizer>,
}

impl<A, S> PlaybackController<A, S>
where
    A: AudioSource + Analyser,
    S: FrameScheduler,
{
    pub fn new(
        settings: ControllerSettings,
        audio: A,
        scheduler: S,
        indicator: Box<dyn LoadingIndicator>,
        visualizer: Box<dyn Visualizer>,
    ) -> Self {
        Self {
            settings,
            state: PlaybackState::Unstarted,
            clock: PlaybackClock::default(),
            source: None,
            pending_frame: None,
            frequencies: Vec::new(),
            times: Vec::new(),
            frames_drawn: 0,
            audio,
            scheduler,
            indicator,
            visualizer,
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn source(&self) -> Option<&MediaSource> {
        self.source.as_ref()
    }

    #[allow(dead_code)]
    pub fn pending_frame(&self) -> Option<FrameToken> {
        self.pending_frame
    }

    pub fn frames_drawn(&self) -> u64 {
        self.frames_drawn
    }

    /// Effective elapsed playback time in seconds.
    pub fn position(&self) -> f64 {
        match self.state {
            PlaybackState::Playing => self.clock.running_position(self.audio.current_time()),
            _ => self.clock.start_offset,
        }
    }

    #[allow(dead_code)]
    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn load(&mut self, source: MediaSource) {
        if !self.allowed(
            "load",
            &[PlaybackState::Unstarted, PlaybackState::Finished],
        ) {
            return;
        }

        log::info!("Loading {}", source);
        self.cancel_pending_frame();
        self.clock = PlaybackClock::default();
        self.state = PlaybackState::Loading;
        self.indicator.show();
        self.audio.request_load(&source);
        self.source = Some(source);
    }

    pub fn handle_audio_event(&mut self, event: AudioEvent) {
        match event {
            AudioEvent::Ready => self.on_ready(),
            AudioEvent::LoadFailed(err) => self.on_load_failed(err),
            AudioEvent::Ended => self.on_ended(),
        }
    }

    pub fn on_ready(&mut self) {
        if !self.allowed("ready", &[PlaybackState::Loading]) {
            return;
        }

        self.audio.connect();
        self.audio
            .configure(self.settings.fft_size, self.settings.smoothing);

        // Sized once per session; ticks only ever overwrite in place.
        let bin_count = self.audio.frequency_bin_count();
        self.frequencies.clear();
        self.frequencies.resize(bin_count, 0);
        self.times.clear();
        self.times.resize(bin_count, 128);

        self.clock = PlaybackClock::begin(self.audio.current_time());
        self.audio.start(0.0);
        self.state = PlaybackState::Playing;
        self.indicator.hide();

        log::info!(
            "Playing {:.1}s of audio, {} frequency bins",
            self.audio.duration(),
            bin_count
        );
        self.pending_frame = Some(self.scheduler.schedule_next_frame());
    }

    /// Load failures leave the session in `Loading`; nothing retries.
    pub fn on_load_failed(&mut self, err: PlaybackError) {
        if !self.allowed("load failure", &[PlaybackState::Loading]) {
            return;
        }
        log::error!("{}", err);
    }

    pub fn on_ended(&mut self) {
        if !self.allowed("end of media", &[PlaybackState::Playing]) {
            return;
        }

        self.clock.suspend(self.audio.current_time());
        self.cancel_pending_frame();
        self.state = PlaybackState::Finished;
        log::info!(
            "Finished after {:.2}s, {} frames drawn",
            self.clock.start_offset,
            self.frames_drawn
        );
    }

    /// Entry point for a fired animation frame. Tokens that are not the
    /// currently pending frame are stale and dropped.
    pub fn on_frame(&mut self, token: FrameToken) {
        if self.state != PlaybackState::Playing || self.pending_frame != Some(token) {
            log::debug!("Dropping stale frame {:?} while {}", token, self.state);
            return;
        }
        self.tick();
    }

    fn tick(&mut self) {
        // Reschedule before drawing so the loop outlives a bad frame.
        self.pending_frame = Some(self.scheduler.schedule_next_frame());

        self.audio.copy_frequencies(&mut self.frequencies);
        self.audio.copy_times(&mut self.times);
        self.visualizer
            .draw(self.frequencies.len(), &self.frequencies, &self.times);
        self.frames_drawn += 1;
    }

    pub fn toggle_pause(&mut self) {
        match self.state {
            PlaybackState::Unstarted => match self.settings.default_track.clone() {
                Some(track) => self.load(track),
                None => log::warn!("Play pressed with nothing loaded and no default track"),
            },
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused => self.resume(),
            state => log::debug!("Ignoring play/pause while {}", state),
        }
    }

    fn pause(&mut self) {
        self.audio.stop();
        self.clock.suspend(self.audio.current_time());
        self.cancel_pending_frame();
        self.state = PlaybackState::Paused;
        log::info!("Paused at {:.2}s", self.clock.start_offset);
    }

    fn resume(&mut self) {
        let now = self.audio.current_time();
        let offset = self.clock.resume(now, self.audio.duration());
        self.audio.start(offset);
        self.state = PlaybackState::Playing;
        log::info!("Resumed at {:.2}s", offset);
        self.pending_frame = Some(self.scheduler.schedule_next_frame());
    }

    fn cancel_pending_frame(&mut self) {
        if let Some(token) = self.pending_frame.take() {
            self.scheduler.cancel(token);
        }
    }

    fn allowed(&self, operation: &'static str, from: &[PlaybackState]) -> bool {
        if from.contains(&self.state) {
            return true;
        }
        let err = PlaybackError::InvalidTransition {
            operation,
            state: self.state,
        };
        log::debug!("Ignored: {}", err);
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playback::scheduler::AnimationClock;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    #[derive(Default)]
    struct FakeAudio {
        now: f64,
        duration: f64,
        loads: Vec<MediaSource>,
        starts: Vec<f64>,
        stops: usize,
        connected: bool,
        configured: Option<(usize, f32)>,
        level: u8,
    }

    impl AudioSource for FakeAudio {
        fn request_load(&mut self, source: &MediaSource) {
            self.loads.push(source.clone());
        }
        fn current_time(&self) -> f64 {
            self.now
        }
        fn duration(&self) -> f64 {
            self.duration
        }
        fn start(&mut self, offset: f64) {
            self.starts.push(offset);
        }
        fn stop(&mut self) {
            self.stops += 1;
        }
    }

    impl Analyser for FakeAudio {
        fn connect(&mut self) {
            self.connected = true;
        }
        fn configure(&mut self, fft_size: usize, smoothing: f32) {
            self.configured = Some((fft_size, smoothing));
        }
        fn frequency_bin_count(&self) -> usize {
            self.configured.map_or(0, |(size, _)| size / 2)
        }
        fn copy_frequencies(&mut self, out: &mut [u8]) {
            self.level = self.level.wrapping_add(1);
            out.fill(self.level);
        }
        fn copy_times(&mut self, out: &mut [u8]) {
            out.fill(128);
        }
    }

    struct FlagIndicator(Rc<Cell<bool>>);

    impl LoadingIndicator for FlagIndicator {
        fn show(&mut self) {
            self.0.set(true);
        }
        fn hide(&mut self) {
            self.0.set(false);
        }
    }

    #[derive(Clone, Default)]
    struct Frames(Rc<RefCell<Vec<(usize, Vec<u8>, Vec<u8>)>>>);

    impl Visualizer for Frames {
        fn draw(&mut self, bin_count: usize, frequencies: &[u8], times: &[u8]) {
            self.0
                .borrow_mut()
                .push((bin_count, frequencies.to_vec(), times.to_vec()));
        }
    }

    struct Harness {
        controller: PlaybackController<FakeAudio, AnimationClock>,
        loading: Rc<Cell<bool>>,
        frames: Frames,
    }

    fn harness(default_track: Option<&str>) -> Harness {
        let loading = Rc::new(Cell::new(false));
        let frames = Frames::default();
        let settings = ControllerSettings {
            fft_size: 8,
            smoothing: 0.8,
            default_track: default_track.map(MediaSource::parse),
        };
        let audio = FakeAudio {
            duration: 10.0,
            ..Default::default()
        };
        let controller = PlaybackController::new(
            settings,
            audio,
            AnimationClock::new(),
            Box::new(FlagIndicator(loading.clone())),
            Box::new(frames.clone()),
        );
        Harness {
            controller,
            loading,
            frames,
        }
    }

    /// Fire one display refresh and deliver every due frame.
    fn refresh(c: &mut PlaybackController<FakeAudio, AnimationClock>) -> usize {
        let due = c.scheduler_mut().refresh();
        let n = due.len();
        for token in due {
            c.on_frame(token);
        }
        n
    }

    fn playing(h: &mut Harness) {
        h.controller.load(MediaSource::parse("track.mp3"));
        h.controller.on_ready();
    }

    #[test]
    fn session_lifecycle() {
        let mut h = harness(None);
        let c = &mut h.controller;

        c.load(MediaSource::parse("track.mp3"));
        assert_eq!(c.state(), PlaybackState::Loading);
        assert!(h.loading.get());
        assert_eq!(c.audio().loads, vec![MediaSource::parse("track.mp3")]);

        c.on_ready();
        assert_eq!(c.state(), PlaybackState::Playing);
        assert!(!h.loading.get());
        assert!(c.audio().connected);
        assert_eq!(c.audio().configured, Some((8, 0.8)));
        assert_eq!(c.audio().starts, vec![0.0]);
        assert_eq!(c.scheduler_mut().pending_count(), 1);

        for _ in 0..5 {
            assert_eq!(refresh(c), 1);
        }
        assert_eq!(c.frames_drawn(), 5);

        c.on_ended();
        assert_eq!(c.state(), PlaybackState::Finished);
        assert_eq!(c.scheduler_mut().pending_count(), 0);
        assert_eq!(refresh(c), 0);
        assert_eq!(c.frames_drawn(), 5);
    }

    #[test]
    fn tick_reuses_snapshot_buffers() {
        let mut h = harness(None);
        playing(&mut h);
        refresh(&mut h.controller);
        refresh(&mut h.controller);

        let frames = h.frames.0.borrow();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].0, 4);
        assert_eq!(frames[0].1, vec![1; 4]);
        assert_eq!(frames[1].1, vec![2; 4]);
        assert_eq!(frames[1].2, vec![128; 4]);
    }

    #[test]
    fn pause_cancels_pending_frame() {
        let mut h = harness(None);
        playing(&mut h);
        refresh(&mut h.controller);

        h.controller.toggle_pause();
        assert_eq!(h.controller.state(), PlaybackState::Paused);
        assert_eq!(h.controller.pending_frame(), None);
        assert_eq!(h.controller.audio().stops, 1);

        for _ in 0..3 {
            h.controller.audio_mut().now += 1.0 / 60.0;
            assert_eq!(refresh(&mut h.controller), 0);
        }
        assert_eq!(h.controller.frames_drawn(), 1);
    }

    #[test]
    fn stale_token_is_dropped() {
        let mut h = harness(None);
        playing(&mut h);
        let stale = h.controller.pending_frame().unwrap();

        h.controller.toggle_pause();
        h.controller.toggle_pause();
        h.controller.on_frame(stale);
        assert_eq!(h.controller.frames_drawn(), 0);
    }

    #[test]
    fn pause_resume_keeps_position() {
        let mut h = harness(None);
        playing(&mut h);

        h.controller.audio_mut().now = 3.0;
        h.controller.toggle_pause();
        assert!((h.controller.position() - 3.0).abs() < 1e-9);

        h.controller.audio_mut().now = 7.0;
        assert!((h.controller.position() - 3.0).abs() < 1e-9);

        h.controller.toggle_pause();
        assert_eq!(h.controller.state(), PlaybackState::Playing);
        assert!((h.controller.audio().starts[1] - 3.0).abs() < 1e-9);
        assert!((h.controller.position() - 3.0).abs() < 1e-9);
        assert_eq!(h.controller.scheduler_mut().pending_count(), 1);

        h.controller.audio_mut().now = 8.0;
        assert!((h.controller.position() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn resume_wraps_offset_past_duration() {
        let mut h = harness(None);
        playing(&mut h);

        h.controller.audio_mut().now = 12.5;
        h.controller.toggle_pause();
        h.controller.toggle_pause();
        assert!((h.controller.audio().starts[1] - 2.5).abs() < 1e-9);
    }

    #[test]
    fn invalid_operations_are_no_ops() {
        let mut h = harness(None);
        let c = &mut h.controller;

        // unstarted
        c.on_ready();
        c.on_ended();
        c.toggle_pause();
        assert_eq!(c.state(), PlaybackState::Unstarted);

        // loading
        c.load(MediaSource::parse("a.mp3"));
        c.load(MediaSource::parse("b.mp3"));
        c.on_ended();
        c.toggle_pause();
        assert_eq!(c.state(), PlaybackState::Loading);
        assert_eq!(c.audio().loads.len(), 1);

        // playing
        c.on_ready();
        c.on_ready();
        c.load(MediaSource::parse("c.mp3"));
        assert_eq!(c.state(), PlaybackState::Playing);
        assert_eq!(c.audio().starts.len(), 1);

        // paused
        c.toggle_pause();
        c.on_ready();
        c.on_ended();
        c.load(MediaSource::parse("d.mp3"));
        assert_eq!(c.state(), PlaybackState::Paused);

        // finished
        c.toggle_pause();
        c.on_ended();
        c.on_ended();
        c.toggle_pause();
        c.on_ready();
        assert_eq!(c.state(), PlaybackState::Finished);
        assert_eq!(c.audio().loads.len(), 1);
    }

    #[test]
    fn load_failure_stays_loading() {
        let mut h = harness(None);
        h.controller.load(MediaSource::parse("broken.mp3"));
        h.controller
            .handle_audio_event(AudioEvent::LoadFailed(PlaybackError::Decode {
                source_ref: "broken.mp3".into(),
                reason: "bad header".into(),
            }));
        assert_eq!(h.controller.state(), PlaybackState::Loading);
        assert!(h.loading.get());
        assert_eq!(h.controller.audio().loads.len(), 1);
    }

    #[test]
    fn finished_session_can_reload() {
        let mut h = harness(None);
        playing(&mut h);
        h.controller.audio_mut().now = 10.0;
        h.controller.handle_audio_event(AudioEvent::Ended);

        h.controller.load(MediaSource::parse("next.mp3"));
        assert_eq!(h.controller.state(), PlaybackState::Loading);
        assert_eq!(h.controller.position(), 0.0);
        h.controller.handle_audio_event(AudioEvent::Ready);
        assert_eq!(h.controller.state(), PlaybackState::Playing);
    }

    #[test]
    fn toggle_on_unstarted_loads_default_track() {
        let mut h = harness(Some("chrono.mp3"));
        h.controller.toggle_pause();
        assert_eq!(h.controller.state(), PlaybackState::Loading);
        assert_eq!(
            h.controller.source(),
            Some(&MediaSource::parse("chrono.mp3"))
        );
    }

    #[test]
    fn toggle_on_unstarted_without_default_does_nothing() {
        let mut h = harness(None);
        h.controller.toggle_pause();
        assert_eq!(h.controller.state(), PlaybackState::Unstarted);
        assert!(h.controller.audio().loads.is_empty());
    }
}
