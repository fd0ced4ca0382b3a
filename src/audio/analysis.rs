use rayon::prelude::*;

const EPS: f32 = 1e-9;

/// Precomputed per-window energy profile of a track, with a causal
/// running-average baseline used as the local loudness reference.
///
/// Built once at load time; immutable afterwards. The tick loop reads it
/// by playback timestamp.
pub struct EnergyTrack {
    window_ms: u32,
    energy: Vec<f32>,
    baseline: Vec<f32>,
}

impl EnergyTrack {
    /// Analyze interleaved PCM: downmix to mono by per-frame channel
    /// average, peak-normalize, then aggregate mean squared amplitude
    /// over fixed non-overlapping windows of `window_ms`.
    ///
    /// An empty buffer yields a single zero-energy window so downstream
    /// classification always sees a valid (quiet) profile.
    pub fn build(
        samples: &[f32],
        channels: usize,
        sample_rate: u32,
        window_ms: u32,
        baseline_windows: usize,
    ) -> Self {
        let mono = normalize(downmix(samples, channels));

        let samples_per_window =
            ((sample_rate as f64 * window_ms as f64 / 1000.0).round() as usize).max(1);
        let num_windows = mono.len().div_ceil(samples_per_window).max(1);

        let energy: Vec<f32> = (0..num_windows)
            .into_par_iter()
            .map(|i| {
                let start = (i * samples_per_window).min(mono.len());
                let end = ((i + 1) * samples_per_window).min(mono.len());
                let window = &mono[start..end];
                window.iter().map(|s| s * s).sum::<f32>() / (window.len() as f32 + EPS)
            })
            .collect();

        let baseline = running_baseline(&energy, baseline_windows);

        Self {
            window_ms,
            energy,
            baseline,
        }
    }

    pub fn num_windows(&self) -> usize {
        self.energy.len()
    }

    /// Window index for a playback timestamp, clamped into range for any
    /// input including negatives.
    pub fn window_index_for_ms(&self, ms_since_start: i64) -> usize {
        let idx = ms_since_start / self.window_ms as i64;
        idx.clamp(0, self.energy.len() as i64 - 1) as usize
    }

    pub fn energy_for_ms(&self, ms_since_start: i64) -> f32 {
        self.energy[self.window_index_for_ms(ms_since_start)]
    }

    /// Local loudness reference at a timestamp; carries a small epsilon
    /// so energy-to-baseline ratios never divide by zero.
    pub fn baseline_for_ms(&self, ms_since_start: i64) -> f32 {
        self.baseline[self.window_index_for_ms(ms_since_start)]
    }
}

fn downmix(samples: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return samples.to_vec();
    }
    samples
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

fn normalize(mut samples: Vec<f32>) -> Vec<f32> {
    let peak = samples.iter().map(|s| s.abs()).fold(0.0f32, f32::max);
    let peak = if peak > 0.0 { peak } else { 1.0 };
    for s in samples.iter_mut() {
        *s /= peak;
    }
    samples
}

/// Trailing mean over at most `max_windows` energies, causal only.
/// Maintained with a running sum, O(1) per window.
fn running_baseline(energy: &[f32], max_windows: usize) -> Vec<f32> {
    let cap = max_windows.max(1);
    let mut sum = 0.0f32;
    let mut baseline = Vec::with_capacity(energy.len());
    for (i, &e) in energy.iter().enumerate() {
        sum += e;
        if i >= cap {
            sum -= energy[i - cap];
        }
        let len = (i + 1).min(cap) as f32;
        baseline.push(sum / len + EPS);
    }
    baseline
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(samples: &[f32], sample_rate: u32) -> EnergyTrack {
        EnergyTrack::build(samples, 1, sample_rate, 100, 50)
    }

    #[test]
    fn window_count_matches_sample_count() {
        // 100ms windows at 1kHz -> 100 samples per window
        let t = track(&vec![0.5; 250], 1000);
        assert_eq!(t.num_windows(), 3);

        let t = track(&vec![0.5; 200], 1000);
        assert_eq!(t.num_windows(), 2);

        let t = track(&[0.5], 1000);
        assert_eq!(t.num_windows(), 1);
    }

    #[test]
    fn empty_buffer_yields_single_quiet_window() {
        let t = track(&[], 44100);
        assert_eq!(t.num_windows(), 1);
        assert_eq!(t.energy_for_ms(0), 0.0);
        assert!(t.baseline_for_ms(0) > 0.0);
    }

    #[test]
    fn energy_is_mean_squared_amplitude() {
        // Constant full-scale signal: peak normalization keeps it at 1.0,
        // so every full window has energy ~1.
        let t = track(&vec![1.0; 300], 1000);
        for ms in [0, 100, 200] {
            assert!((t.energy_for_ms(ms) - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn peak_normalization_is_scale_invariant() {
        let loud = track(&vec![0.8; 100], 1000);
        let quiet = track(&vec![0.01; 100], 1000);
        assert!((loud.energy_for_ms(0) - quiet.energy_for_ms(0)).abs() < 1e-5);
    }

    #[test]
    fn stereo_downmix_averages_frames() {
        // Perfectly out-of-phase stereo cancels to silence.
        let interleaved: Vec<f32> = (0..200).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let t = EnergyTrack::build(&interleaved, 2, 1000, 100, 50);
        assert_eq!(t.num_windows(), 1);
        assert_eq!(t.energy_for_ms(0), 0.0);
    }

    #[test]
    fn baseline_is_trailing_mean() {
        // One loud window followed by a quiet one.
        let mut samples = vec![1.0; 100];
        samples.extend(vec![0.0; 100]);
        let t = track(&samples, 1000);
        assert_eq!(t.num_windows(), 2);
        assert!((t.baseline_for_ms(0) - 1.0).abs() < 1e-4);
        assert!((t.baseline_for_ms(100) - 0.5).abs() < 1e-4);
    }

    #[test]
    fn baseline_caps_at_buffer_length() {
        // With a 1-window buffer the baseline tracks the energy exactly.
        let mut samples = vec![1.0; 100];
        samples.extend(vec![0.0; 100]);
        let t = EnergyTrack::build(&samples, 1, 1000, 100, 1);
        assert!((t.baseline_for_ms(100) - t.energy_for_ms(100)).abs() < 1e-6);
    }

    #[test]
    fn index_is_clamped_and_monotonic() {
        let t = track(&vec![0.5; 500], 1000);
        assert_eq!(t.window_index_for_ms(-5000), 0);
        assert_eq!(t.window_index_for_ms(0), 0);
        assert_eq!(t.window_index_for_ms(250), 2);
        assert_eq!(t.window_index_for_ms(1_000_000), t.num_windows() - 1);

        let mut last = 0;
        for ms in (-500..2000).step_by(50) {
            let idx = t.window_index_for_ms(ms);
            assert!(idx >= last);
            last = idx;
        }
    }
}
