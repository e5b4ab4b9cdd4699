pub mod controller;
pub mod scheduler;
pub mod state;

use crate::audio::media::MediaSource;
use crate::error::PlaybackError;

/// Audio playback collaborator. Loading is asynchronous: the outcome comes
/// back later as an [`AudioEvent`] delivered by the host.
pub trait AudioSource {
    fn request_load(&mut self, source: &MediaSource);
    /// Monotonic clock reading, in seconds.
    fn current_time(&self) -> f64;
    /// Length of the loaded media, in seconds.
    fn duration(&self) -> f64;
    fn start(&mut self, offset: f64);
    fn stop(&mut self);
}

/// Analysis node sitting between the audio source and the output.
pub trait Analyser {
    fn connect(&mut self);
    fn configure(&mut self, fft_size: usize, smoothing: f32);
    fn frequency_bin_count(&self) -> usize;
    fn copy_frequencies(&mut self, out: &mut [u8]);
    fn copy_times(&mut self, out: &mut [u8]);
}

pub trait LoadingIndicator {
    fn show(&mut self);
    fn hide(&mut self);
}

/// Consumer of one analysis snapshot pair per animation frame.
pub trait Visualizer {
    fn draw(&mut self, bin_count: usize, frequencies: &[u8], times: &[u8]);
}

#[derive(Debug)]
pub enum AudioEvent {
    Ready,
    LoadFailed(PlaybackError),
    Ended,
}
