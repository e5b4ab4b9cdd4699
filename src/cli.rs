use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "castviz", about = "Play a track and paint its live spectrum, headless")]
pub struct Cli {
    /// Audio file or http(s) URL. Without it, play loads the default track.
    pub input: Option<String>,

    /// Config file (defaults to castviz.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write the rendered canvas to a video file through ffmpeg
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Canvas width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Canvas height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Display refresh rate driving the animation frames
    #[arg(long)]
    pub fps: Option<u32>,

    /// Analyser transform size (power of two)
    #[arg(long)]
    pub fft_size: Option<usize>,

    /// Analyser smoothing constant (0.0-1.0, exclusive)
    #[arg(long)]
    pub smoothing: Option<f32>,

    /// Overlay the waveform on the bars
    #[arg(long)]
    pub waveform: bool,

    /// Press the space bar at these times, in seconds
    #[arg(long, value_delimiter = ',')]
    pub toggle_at: Vec<f64>,

    /// JSON-lines file of timed key, click and remote events
    #[arg(long)]
    pub script: Option<PathBuf>,

    /// Stop after this many seconds of simulated time
    #[arg(long)]
    pub max_seconds: Option<f64>,
}
