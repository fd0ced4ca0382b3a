use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "beatlane", about = "Audio-driven lane-dodging game core")]
pub struct Cli {
    /// Input audio file (WAV, MP3, FLAC, OGG)
    pub input: Option<PathBuf>,

    /// Config file path (defaults to beatlane.toml / ~/.config/beatlane/config.toml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Simulation ticks per second
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    /// Energy window duration in milliseconds
    #[arg(long, default_value_t = 100)]
    pub window_ms: u32,

    /// Trailing windows averaged into the loudness baseline
    #[arg(long, default_value_t = 50)]
    pub baseline_windows: usize,

    /// Spawn RNG seed (random when omitted; always logged)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Run the whole track as a fast simulation without audio output
    #[arg(long)]
    pub headless: bool,

    /// Move-intent policy driving the session (dodge, hold)
    #[arg(long, default_value = "dodge")]
    pub autopilot: String,

    /// Write a JSON run summary to this path
    #[arg(long)]
    pub report: Option<PathBuf>,
}
