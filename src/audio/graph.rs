use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use super::analyser::FftAnalyser;
use super::decode::decode_audio;
use super::media::{MediaBuffer, MediaSource};
use crate::error::PlaybackError;
use crate::host::clock::HostClock;
use crate::playback::{Analyser, AudioEvent, AudioSource};

type LoadResult = Result<MediaBuffer, PlaybackError>;

#[derive(Clone, Copy, Debug)]
struct Segment {
    started_at: f64,
    offset: f64,
}

/// Buffer source -> analyser -> output, played against the host clock.
pub struct AudioGraph {
    clock: HostClock,
    analyser: FftAnalyser,
    connected: bool,
    media: Option<MediaBuffer>,
    loading: Option<Receiver<LoadResult>>,
    segment: Option<Segment>,
}

impl AudioGraph {
    pub fn new(clock: HostClock, analyser: FftAnalyser) -> Self {
        Self {
            clock,
            analyser,
            connected: false,
            media: None,
            loading: None,
            segment: None,
        }
    }

    #[allow(dead_code)]
    pub fn is_loading(&self) -> bool {
        self.loading.is_some()
    }

    /// Media time under the playhead, if a segment is playing.
    pub fn playhead(&self) -> Option<f64> {
        self.segment
            .map(|s| s.offset + (self.clock.now() - s.started_at))
    }

    /// Next pending event without blocking.
    pub fn poll_event(&mut self) -> Option<AudioEvent> {
        if let Some(rx) = &self.loading {
            match rx.try_recv() {
                Ok(result) => return Some(self.finish_load(result)),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => {
                    return Some(self.finish_load(Err(loader_vanished())));
                }
            }
        }

        let duration = self.duration();
        match self.playhead() {
            Some(position) if position >= duration => {
                self.segment = None;
                Some(AudioEvent::Ended)
            }
            _ => None,
        }
    }

    /// Block until the pending load resolves or `timeout` passes.
    pub fn wait_for_load(&mut self, timeout: Duration) -> Option<AudioEvent> {
        let rx = self.loading.as_ref()?;
        match rx.recv_timeout(timeout) {
            Ok(result) => Some(self.finish_load(result)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(self.finish_load(Err(loader_vanished()))),
        }
    }

    fn finish_load(&mut self, result: LoadResult) -> AudioEvent {
        self.loading = None;
        match result {
            Ok(media) => {
                self.media = Some(media);
                AudioEvent::Ready
            }
            Err(err) => AudioEvent::LoadFailed(err),
        }
    }

    /// Samples leading up to the playhead; empty while stopped.
    fn recent_samples(&self) -> &[f32] {
        match (&self.media, self.playhead()) {
            (Some(media), Some(position)) if self.connected => {
                let end = (position.max(0.0) * media.sample_rate as f64) as usize;
                &media.samples[..end.min(media.samples.len())]
            }
            _ => &[],
        }
    }
}

fn loader_vanished() -> PlaybackError {
    PlaybackError::Transport {
        source_ref: "<unknown>".into(),
        reason: "loader thread exited without a result".into(),
    }
}

fn load(source: &MediaSource) -> LoadResult {
    let bytes = source.fetch().map_err(|e| PlaybackError::Transport {
        source_ref: source.to_string(),
        reason: format!("{:#}", e),
    })?;
    let ext = source.extension();
    decode_audio(bytes, ext.as_deref()).map_err(|e| PlaybackError::Decode {
        source_ref: source.to_string(),
        reason: format!("{:#}", e),
    })
}

impl AudioSource for AudioGraph {
    fn request_load(&mut self, source: &MediaSource) {
        self.segment = None;
        self.media = None;
        self.connected = false;
        self.analyser.reset();

        let (tx, rx) = mpsc::channel();
        let source = source.clone();
        std::thread::spawn(move || {
            // The receiver may be gone if another load replaced this one.
            let _ = tx.send(load(&source));
        });
        self.loading = Some(rx);
    }

    fn current_time(&self) -> f64 {
        self.clock.now()
    }

    fn duration(&self) -> f64 {
        self.media.as_ref().map_or(0.0, MediaBuffer::duration)
    }

    fn start(&mut self, offset: f64) {
        self.segment = Some(Segment {
            started_at: self.clock.now(),
            offset,
        });
    }

    fn stop(&mut self) {
        self.segment = None;
    }
}

impl Analyser for AudioGraph {
    fn connect(&mut self) {
        self.connected = true;
    }

    fn configure(&mut self, fft_size: usize, smoothing: f32) {
        self.analyser.configure(fft_size, smoothing);
    }

    fn frequency_bin_count(&self) -> usize {
        self.analyser.frequency_bin_count()
    }

    fn copy_frequencies(&mut self, out: &mut [u8]) {
        let end = self.recent_samples().len();
        let Some(media) = &self.media else {
            self.analyser.byte_frequency_data(&[], out);
            return;
        };
        self.analyser.byte_frequency_data(&media.samples[..end], out);
    }

    fn copy_times(&mut self, out: &mut [u8]) {
        self.analyser.byte_time_domain_data(self.recent_samples(), out);
    }
}
