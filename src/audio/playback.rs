use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

use super::decode::DecodedAudio;

#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("no audio output device available")]
    NoDevice,
    #[error("failed to build output stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),
    #[error("failed to start playback: {0}")]
    Play(#[from] cpal::PlayStreamError),
}

struct Shared {
    /// Interleaved source samples at the file's channel count.
    samples: Vec<f32>,
    channels: usize,
    frames: usize,
    sample_rate: u32,
    /// Next source frame the callback will render.
    cursor: AtomicUsize,
    /// False until the first callback has run; the clock reports its
    /// negative sentinel before that.
    started: AtomicBool,
    exhausted: AtomicBool,
}

/// Plays a decoded track on the default output device and exposes a
/// sample-accurate playback clock. The stream renders the first two
/// source channels (mono is duplicated); the analysis side still sees
/// every channel.
pub struct Playback {
    shared: Arc<Shared>,
    _stream: cpal::Stream,
}

impl Playback {
    pub fn start(audio: &DecodedAudio) -> Result<Self, PlaybackError> {
        let host = cpal::default_host();
        let device = host.default_output_device().ok_or(PlaybackError::NoDevice)?;

        let shared = Arc::new(Shared {
            samples: audio.samples.clone(),
            channels: audio.channels.max(1),
            frames: audio.frames(),
            sample_rate: audio.sample_rate,
            cursor: AtomicUsize::new(0),
            started: AtomicBool::new(false),
            exhausted: AtomicBool::new(false),
        });

        let config = cpal::StreamConfig {
            channels: 2,
            sample_rate: cpal::SampleRate(audio.sample_rate),
            buffer_size: cpal::BufferSize::Default,
        };

        log::info!(
            "Playback: {} @ {}Hz",
            device.name().unwrap_or_else(|_| "unknown device".to_string()),
            audio.sample_rate
        );

        let cb_shared = Arc::clone(&shared);
        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                cb_shared.started.store(true, Ordering::Relaxed);
                let mut frame = cb_shared.cursor.load(Ordering::Relaxed);
                let ch = cb_shared.channels;
                for out in data.chunks_mut(2) {
                    if frame < cb_shared.frames {
                        let left = cb_shared.samples[frame * ch];
                        let right = cb_shared.samples[frame * ch + (ch - 1).min(1)];
                        out[0] = left;
                        if out.len() > 1 {
                            out[1] = right;
                        }
                        frame += 1;
                    } else {
                        out.fill(0.0);
                        cb_shared.exhausted.store(true, Ordering::Relaxed);
                    }
                }
                cb_shared.cursor.store(frame, Ordering::Relaxed);
            },
            |err| log::warn!("Playback stream error: {}", err),
            None,
        )?;

        stream.play()?;

        Ok(Self {
            shared,
            _stream: stream,
        })
    }

    /// Elapsed playback in milliseconds, or -1 before the stream has
    /// rendered anything. Callers fall back to a wall clock on the
    /// sentinel.
    pub fn position_ms(&self) -> i64 {
        if !self.shared.started.load(Ordering::Relaxed) {
            return -1;
        }
        let frames = self.shared.cursor.load(Ordering::Relaxed) as i64;
        frames * 1000 / self.shared.sample_rate.max(1) as i64
    }

    pub fn is_playing(&self) -> bool {
        !self.shared.exhausted.load(Ordering::Relaxed)
    }
}
