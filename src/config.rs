use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::audio::analyser::{is_valid_fft_size, MAX_FFT_SIZE, MIN_FFT_SIZE};
use crate::control::remote::DEFAULT_NAMESPACE;
use crate::render::canvas::{frame_len, MAX_DIMENSION};

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub analyser: AnalyserConfig,
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub remote: RemoteConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct AnalyserConfig {
    #[serde(default = "default_fft_size")]
    pub fft_size: usize,
    #[serde(default = "default_smoothing")]
    pub smoothing: f32,
    #[serde(default = "default_min_decibels")]
    pub min_decibels: f32,
    #[serde(default = "default_max_decibels")]
    pub max_decibels: f32,
}

#[derive(Debug, Deserialize)]
pub struct CanvasConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
    #[serde(default)]
    pub waveform_overlay: bool,
}

#[derive(Debug, Deserialize)]
pub struct PlaybackConfig {
    /// Empty string disables lazy loading on play.
    #[serde(default = "default_track")]
    pub default_track: String,
    #[serde(default = "default_fps")]
    pub fps: u32,
}

#[derive(Debug, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

#[derive(Debug, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_codec")]
    pub codec: String,
    #[serde(default = "default_pix_fmt")]
    pub pix_fmt: String,
    #[serde(default = "default_crf")]
    pub crf: u32,
}

impl Default for AnalyserConfig {
    fn default() -> Self {
        Self {
            fft_size: default_fft_size(),
            smoothing: default_smoothing(),
            min_decibels: default_min_decibels(),
            max_decibels: default_max_decibels(),
        }
    }
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            waveform_overlay: false,
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_track: default_track(),
            fps: default_fps(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            codec: default_codec(),
            pix_fmt: default_pix_fmt(),
            crf: default_crf(),
        }
    }
}

fn default_fft_size() -> usize { 2048 }
fn default_smoothing() -> f32 { 0.8 }
fn default_min_decibels() -> f32 { -140.0 }
fn default_max_decibels() -> f32 { 0.0 }
fn default_width() -> u32 { 640 }
fn default_height() -> u32 { 360 }
fn default_track() -> String { "chrono.mp3".into() }
fn default_fps() -> u32 { 60 }
fn default_namespace() -> String { DEFAULT_NAMESPACE.into() }
fn default_codec() -> String { "libx264".into() }
fn default_pix_fmt() -> String { "yuv420p".into() }
fn default_crf() -> u32 { 18 }

impl Config {
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Invalid config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let a = &self.analyser;
        if !is_valid_fft_size(a.fft_size) {
            anyhow::bail!(
                "fft_size must be a power of two between {} and {}, got {}",
                MIN_FFT_SIZE,
                MAX_FFT_SIZE,
                a.fft_size
            );
        }
        if !(0.0..1.0).contains(&a.smoothing) {
            anyhow::bail!("smoothing must be in [0, 1), got {}", a.smoothing);
        }
        if a.min_decibels >= a.max_decibels {
            anyhow::bail!(
                "min_decibels ({}) must be below max_decibels ({})",
                a.min_decibels,
                a.max_decibels
            );
        }
        if frame_len(self.canvas.width, self.canvas.height).is_none() {
            anyhow::bail!(
                "canvas must be between 1x1 and {}x{}, got {}x{}",
                MAX_DIMENSION,
                MAX_DIMENSION,
                self.canvas.width,
                self.canvas.height
            );
        }
        if self.playback.fps == 0 {
            anyhow::bail!("fps must be positive");
        }
        Ok(())
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config: {}", path.display()))?;
    Config::parse(&content).with_context(|| format!("In {}", path.display()))
}

/// Explicit path, else `castviz.toml` in the working directory, else the
/// per-user config locations.
pub fn find_config(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from("castviz.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("castviz").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("castviz").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = Config::parse("").unwrap();
        assert_eq!(cfg.analyser.fft_size, 2048);
        assert_eq!(cfg.analyser.smoothing, 0.8);
        assert_eq!(cfg.canvas.width, 640);
        assert_eq!(cfg.canvas.height, 360);
        assert_eq!(cfg.playback.default_track, "chrono.mp3");
        assert_eq!(cfg.remote.namespace, DEFAULT_NAMESPACE);
    }

    #[test]
    fn partial_sections_merge_with_defaults() {
        let cfg = Config::parse(
            r#"
            [analyser]
            fft_size = 1024

            [canvas]
            waveform_overlay = true
            "#,
        )
        .unwrap();
        assert_eq!(cfg.analyser.fft_size, 1024);
        assert_eq!(cfg.analyser.max_decibels, 0.0);
        assert!(cfg.canvas.waveform_overlay);
        assert_eq!(cfg.canvas.width, 640);
    }

    #[test]
    fn rejects_bad_values() {
        assert!(Config::parse("[analyser]\nfft_size = 1000").is_err());
        assert!(Config::parse("[analyser]\nsmoothing = 1.0").is_err());
        assert!(Config::parse("[analyser]\nmin_decibels = 0.0").is_err());
        assert!(Config::parse("[canvas]\nwidth = 0").is_err());
        assert!(Config::parse("[canvas]\nwidth = 70000\nheight = 70000").is_err());
        assert!(Config::parse("[canvas]\nheight = 16385").is_err());
        assert!(Config::parse("[playback]\nfps = 0").is_err());
        assert!(Config::parse("[unknown]\nx = 1").is_err());
    }

    #[test]
    fn explicit_path_wins() {
        let path = Path::new("/tmp/somewhere.toml");
        assert_eq!(find_config(Some(path)), Some(path.to_path_buf()));
    }
}
