mod audio;
mod cli;
mod config;
mod game;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::thread;
use std::time::{Duration, Instant};

use audio::analysis::EnergyTrack;
use audio::decode::DecodedAudio;
use audio::playback::Playback;
use cli::Cli;
use config::Config;
use game::obstacle::Obstacle;
use game::{GameSession, MoveIntent};

/// Obstacles arriving later than this are ignored by the dodge policy.
const DODGE_HORIZON_SECS: f32 = 2.0;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let mut cli = Cli::parse();

    // Load config: explicit --config path, or auto-detect beatlane.toml / global config
    let config_path = cli.config.clone().or_else(|| {
        let local = std::path::PathBuf::from("beatlane.toml");
        if local.exists() {
            return Some(local);
        }
        if let Some(home) = dirs::home_dir() {
            let xdg = home.join(".config").join("beatlane").join("config.toml");
            if xdg.exists() {
                return Some(xdg);
            }
        }
        if let Some(config_dir) = dirs::config_dir() {
            let platform = config_dir.join("beatlane").join("config.toml");
            if platform.exists() {
                return Some(platform);
            }
        }
        None
    });

    let mut cfg = Config::default();
    if let Some(ref path) = config_path {
        if let Some(loaded) = config::load_config(path) {
            log::info!("Loaded config from {}", path.display());
            cfg = loaded;
        } else {
            log::warn!("Failed to load config from {}", path.display());
        }
    }
    // Merge: config values apply only when CLI is at its default
    if cli.fps == 60 {
        cli.fps = cfg.run.fps;
    }
    if cli.window_ms == 100 {
        cli.window_ms = cfg.audio.window_ms;
    }
    if cli.baseline_windows == 50 {
        cli.baseline_windows = cfg.audio.baseline_windows;
    }

    let input = cli.input.as_ref().context("Input audio file is required")?;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    let autopilot = Autopilot::parse(&cli.autopilot)?;

    log::info!("beatlane - audio-driven lane dodger");
    log::info!("Input: {}", input.display());
    log::info!(
        "Mode: {} @ {} ticks/s, autopilot={}",
        if cli.headless { "headless" } else { "live" },
        cli.fps,
        cli.autopilot
    );

    // 1. Decode audio
    log::info!("Decoding audio...");
    let decoded = audio::decode::decode_audio(input)?;

    // 2. Precompute the energy profile
    log::info!("Analyzing energy profile...");
    let track = EnergyTrack::build(
        &decoded.samples,
        decoded.channels,
        decoded.sample_rate,
        cli.window_ms,
        cli.baseline_windows,
    );
    let windows = track.num_windows();
    log::info!("Energy analysis: {} windows of {}ms", windows, cli.window_ms);

    // 3. Seed the spawn RNG (always logged so any run can be replayed)
    let seed = cli.seed.unwrap_or_else(rand::random);
    log::info!("Spawn seed: {}", seed);

    let duration_ms = decoded.duration_ms();
    let mut session = GameSession::new(
        track,
        cfg.field.clone(),
        cfg.spawn.clone(),
        StdRng::seed_from_u64(seed),
    );

    // 4. Drive the tick loop
    let collided = if cli.headless {
        run_headless(&mut session, autopilot, cli.fps, duration_ms)
    } else {
        run_live(&mut session, &decoded, autopilot, cli.fps)?
    };

    let stats = session.stats();
    log::info!("Score: {:.0}  Dodged: {}", session.score(), session.dodged());
    log::info!(
        "Spawns: {} low, {} medium, {} high, {} boredom",
        stats.low_spawns,
        stats.medium_spawns,
        stats.high_spawns,
        stats.boredom_spawns
    );

    if let Some(ref path) = cli.report {
        let report = RunReport {
            input: input.display().to_string(),
            mode: if cli.headless { "headless" } else { "live" }.to_string(),
            seed,
            fps: cli.fps,
            duration_ms,
            windows,
            ticks: stats.ticks,
            score: session.score(),
            dodged: session.dodged(),
            collided,
            spawns: SpawnCounts {
                low: stats.low_spawns,
                medium: stats.medium_spawns,
                high: stats.high_spawns,
                boredom: stats.boredom_spawns,
            },
        };
        std::fs::write(path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        log::info!("Report written to {}", path.display());
    }

    Ok(())
}

/// Tick the session against real playback, paced to the frame clock.
fn run_live(
    session: &mut GameSession,
    decoded: &DecodedAudio,
    autopilot: Autopilot,
    fps: u32,
) -> Result<bool> {
    let playback = Playback::start(decoded)?;
    let dt = 1.0 / fps as f32;
    let frame = Duration::from_secs_f64(1.0 / fps as f64);
    let started = Instant::now();

    while playback.is_playing() {
        let tick_start = Instant::now();

        let mut now_ms = playback.position_ms();
        if now_ms < 0 {
            // Stream not rendering yet: fall back to the wall clock.
            now_ms = started.elapsed().as_millis() as i64;
        }

        let intent = autopilot.decide(session);
        let out = session.tick(now_ms, dt, intent);
        if out.collided {
            log::info!("Collision at {:.1}s", now_ms as f64 / 1000.0);
            return Ok(true);
        }

        if let Some(remaining) = frame.checked_sub(tick_start.elapsed()) {
            thread::sleep(remaining);
        }
    }

    log::info!("Track finished");
    Ok(false)
}

/// Tick the whole track as fast as possible on a simulated clock.
fn run_headless(
    session: &mut GameSession,
    autopilot: Autopilot,
    fps: u32,
    duration_ms: i64,
) -> bool {
    let dt = 1.0 / fps as f32;
    let step_ms = 1000.0 / fps as f64;
    let total_ticks = (duration_ms as f64 / step_ms).ceil() as u64;

    let pb = ProgressBar::new(total_ticks);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} ticks ({eta} remaining)")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut clock_ms = 0.0f64;
    for tick in 0..total_ticks {
        let intent = autopilot.decide(session);
        let out = session.tick(clock_ms as i64, dt, intent);
        if out.collided {
            pb.finish_with_message("collision");
            return true;
        }
        clock_ms += step_ms;
        pb.set_position(tick + 1);
    }

    pb.finish_with_message("track complete");
    false
}

/// Move-intent policy standing in for an interactive frontend.
#[derive(Clone, Copy, Debug)]
enum Autopilot {
    /// Step toward the closer open side of the nearest threat.
    Dodge,
    /// Never move; exercises the boredom spawn path.
    Hold,
}

impl Autopilot {
    fn parse(s: &str) -> Result<Self> {
        match s {
            "dodge" => Ok(Self::Dodge),
            "hold" => Ok(Self::Hold),
            other => anyhow::bail!("Unknown autopilot policy: {}", other),
        }
    }

    fn decide(&self, session: &GameSession) -> MoveIntent {
        match self {
            Self::Hold => MoveIntent::Stay,
            Self::Dodge => dodge_intent(session),
        }
    }
}

fn dodge_intent(session: &GameSession) -> MoveIntent {
    let player = session.player();
    // Wait out an in-flight move before planning the next one.
    if player.target_lane() != player.lane {
        return MoveIntent::Stay;
    }

    let field = session.field();
    let lane = player.lane;
    let lanes = field.lanes();

    // Nearest obstacle ahead that covers the player's lane.
    let mut threat: Option<&Obstacle> = None;
    let mut nearest = f32::MAX;
    for o in field.obstacles() {
        if o.x + o.width < field.player_x() {
            continue;
        }
        let eta = field.arrival_secs(o.x);
        if eta > DODGE_HORIZON_SECS {
            continue;
        }
        if lane >= o.lane_start && lane < o.lane_start + o.lane_count && eta < nearest {
            nearest = eta;
            threat = Some(o);
        }
    }
    let Some(o) = threat else {
        return MoveIntent::Stay;
    };

    // Step toward the closer open side.
    let up_steps = if o.lane_start > 0 {
        lane - o.lane_start + 1
    } else {
        usize::MAX
    };
    let down_steps = if o.lane_start + o.lane_count < lanes {
        o.lane_start + o.lane_count - lane
    } else {
        usize::MAX
    };
    if up_steps == usize::MAX && down_steps == usize::MAX {
        return MoveIntent::Stay;
    }
    if up_steps <= down_steps {
        MoveIntent::Up
    } else {
        MoveIntent::Down
    }
}

#[derive(Serialize)]
struct RunReport {
    input: String,
    mode: String,
    seed: u64,
    fps: u32,
    duration_ms: i64,
    windows: usize,
    ticks: u64,
    score: f64,
    dodged: u64,
    collided: bool,
    spawns: SpawnCounts,
}

#[derive(Serialize)]
struct SpawnCounts {
    low: u64,
    medium: u64,
    high: u64,
    boredom: u64,
}
