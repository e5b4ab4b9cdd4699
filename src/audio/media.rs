use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};

/// Where a track comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaSource {
    File(PathBuf),
    Url(String),
}

impl MediaSource {
    pub fn parse(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            MediaSource::Url(s.to_string())
        } else {
            MediaSource::File(PathBuf::from(s))
        }
    }

    /// File extension used as a probe hint for the decoder.
    pub fn extension(&self) -> Option<String> {
        let path = match self {
            MediaSource::File(path) => path.as_path(),
            MediaSource::Url(url) => {
                let without_query = url.split(['?', '#']).next().unwrap_or(url);
                Path::new(without_query)
            }
        };
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
    }

    pub fn local_path(&self) -> Option<&Path> {
        match self {
            MediaSource::File(path) => Some(path.as_path()),
            MediaSource::Url(_) => None,
        }
    }

    /// Read the whole encoded stream into memory.
    pub fn fetch(&self) -> Result<Vec<u8>> {
        match self {
            MediaSource::File(path) => std::fs::read(path)
                .with_context(|| format!("Failed to read audio file: {}", path.display())),
            MediaSource::Url(url) => {
                let response = reqwest::blocking::get(url)
                    .with_context(|| format!("Request failed: {}", url))?
                    .error_for_status()
                    .with_context(|| format!("Bad response from {}", url))?;
                let bytes = response
                    .bytes()
                    .with_context(|| format!("Failed to read body from {}", url))?;
                Ok(bytes.to_vec())
            }
        }
    }
}

impl fmt::Display for MediaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaSource::File(path) => write!(f, "{}", path.display()),
            MediaSource::Url(url) => f.write_str(url),
        }
    }
}

/// Decoded, mono-downmixed audio.
#[derive(Clone, Debug)]
pub struct MediaBuffer {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl MediaBuffer {
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}
