use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

pub const MIN_FFT_SIZE: usize = 32;
pub const MAX_FFT_SIZE: usize = 32768;

/// Byte-scaled spectrum and waveform snapshots over a sliding window of
/// audio, with exponential smoothing between consecutive spectrum reads.
pub struct FftAnalyser {
    fft_size: usize,
    smoothing: f32,
    min_decibels: f32,
    max_decibels: f32,
    planner: FftPlanner<f32>,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    smoothed: Vec<f32>,
}

pub fn is_valid_fft_size(size: usize) -> bool {
    size.is_power_of_two() && (MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&size)
}

impl FftAnalyser {
    pub fn new(fft_size: usize, smoothing: f32, min_decibels: f32, max_decibels: f32) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        Self {
            fft_size,
            smoothing,
            min_decibels,
            max_decibels,
            planner,
            fft,
            window: blackman_window(fft_size),
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            smoothed: vec![0.0; fft_size / 2],
        }
    }

    pub fn configure(&mut self, fft_size: usize, smoothing: f32) {
        if !is_valid_fft_size(fft_size) {
            log::warn!("Ignoring invalid fft size {}, keeping {}", fft_size, self.fft_size);
        } else if fft_size != self.fft_size {
            self.fft_size = fft_size;
            self.fft = self.planner.plan_fft_forward(fft_size);
            self.window = blackman_window(fft_size);
            self.buffer = vec![Complex::new(0.0, 0.0); fft_size];
            self.smoothed = vec![0.0; fft_size / 2];
        }
        self.smoothing = smoothing.clamp(0.0, 0.999);
    }

    #[allow(dead_code)]
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn frequency_bin_count(&self) -> usize {
        self.fft_size / 2
    }

    pub fn reset(&mut self) {
        self.smoothed.fill(0.0);
    }

    /// `recent` holds the samples leading up to the playhead; only the last
    /// `fft_size` are used and a shorter history is zero padded in front.
    pub fn byte_frequency_data(&mut self, recent: &[f32], out: &mut [u8]) {
        let n = self.fft_size;
        let tail = &recent[recent.len().saturating_sub(n)..];
        let pad = n - tail.len();

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { tail[i - pad] };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }
        self.fft.process(&mut self.buffer);

        let tau = self.smoothing;
        let scale = 1.0 / n as f32;
        for (prev, bin) in self.smoothed.iter_mut().zip(self.buffer.iter()) {
            *prev = tau * *prev + (1.0 - tau) * bin.norm() * scale;
        }

        let range = self.max_decibels - self.min_decibels;
        for (byte, &mag) in out.iter_mut().zip(self.smoothed.iter()) {
            *byte = if mag <= 0.0 {
                0
            } else {
                let db = 20.0 * mag.log10();
                (255.0 / range * (db - self.min_decibels)).floor().clamp(0.0, 255.0) as u8
            };
        }
    }

    pub fn byte_time_domain_data(&self, recent: &[f32], out: &mut [u8]) {
        let n = self.fft_size;
        let tail = &recent[recent.len().saturating_sub(n)..];
        let pad = n - tail.len();

        for (i, byte) in out.iter_mut().take(n).enumerate() {
            let sample = if i < pad { 0.0 } else { tail[i - pad] };
            *byte = (128.0 * (1.0 + sample)).floor().clamp(0.0, 255.0) as u8;
        }
    }
}

fn blackman_window(size: usize) -> Vec<f32> {
    let a0 = 0.42;
    let a1 = 0.5;
    let a2 = 0.08;
    (0..size)
        .map(|i| {
            let x = 2.0 * std::f32::consts::PI * i as f32 / size as f32;
            a0 - a1 * x.cos() + a2 * (2.0 * x).cos()
        })
        .collect()
}
