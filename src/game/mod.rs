pub mod obstacle;
pub mod player;
pub mod spawner;

use rand::rngs::StdRng;

use crate::audio::analysis::EnergyTrack;
use crate::config::{FieldConfig, SpawnConfig};
use obstacle::ObstacleField;
use player::Player;
use spawner::{SpawnPlanner, Tier, TickSpawns};

/// Obstacles between the player column and this far past the right field
/// edge count as "near" for the boredom lull timer.
const NEAR_ZONE_MARGIN: f32 = 200.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveIntent {
    Stay,
    Up,
    Down,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TickOutcome {
    /// Terminal: the driver should stop ticking.
    pub collided: bool,
    pub score_delta: f64,
    pub dodged_delta: u32,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SessionStats {
    pub ticks: u64,
    pub low_spawns: u64,
    pub medium_spawns: u64,
    pub high_spawns: u64,
    pub boredom_spawns: u64,
}

/// One playthrough: the energy profile of a track plus all mutable game
/// state, advanced one tick per frame by an external driver.
pub struct GameSession {
    track: EnergyTrack,
    field: ObstacleField,
    player: Player,
    planner: SpawnPlanner,
    field_cfg: FieldConfig,
    last_near_ms: i64,
    score: f64,
    dodged: u64,
    over: bool,
    stats: SessionStats,
}

impl GameSession {
    pub fn new(track: EnergyTrack, field_cfg: FieldConfig, spawn_cfg: SpawnConfig, rng: StdRng) -> Self {
        Self {
            track,
            field: ObstacleField::new(&field_cfg),
            player: Player::new(&field_cfg),
            planner: SpawnPlanner::new(spawn_cfg, rng),
            field_cfg,
            last_near_ms: 0,
            score: 0.0,
            dodged: 0,
            over: false,
            stats: SessionStats::default(),
        }
    }

    /// Advance the simulation by one frame. `now_ms` comes from the
    /// playback clock, `dt` from the frame clock.
    pub fn tick(&mut self, now_ms: i64, dt: f32, intent: MoveIntent) -> TickOutcome {
        match intent {
            MoveIntent::Up => self.player.move_up(),
            MoveIntent::Down => self.player.move_down(),
            MoveIntent::Stay => {}
        }
        self.player.update(now_ms);

        let ratio = self.track.energy_for_ms(now_ms) / self.track.baseline_for_ms(now_ms);
        let spawns = self.planner.update(
            now_ms,
            ratio,
            self.last_near_ms,
            &mut self.field,
            &mut self.player,
        );
        self.count_spawns(spawns);

        self.field.advance(dt);

        let near = self.field.obstacles().iter().any(|o| {
            o.x > self.field_cfg.player_x && o.x < self.field_cfg.width + NEAR_ZONE_MARGIN
        });
        if near {
            self.last_near_ms = now_ms;
        }

        let collided = self.field.collides(&self.player.rect());
        let dodged_delta = self.field.consume_passed(self.player.lane);

        self.score += dt as f64;
        self.dodged += dodged_delta as u64;
        self.stats.ticks += 1;
        if collided {
            self.over = true;
        }

        TickOutcome {
            collided,
            score_delta: dt as f64,
            dodged_delta,
        }
    }

    fn count_spawns(&mut self, spawns: TickSpawns) {
        match spawns.energy {
            Some(Tier::Low) => self.stats.low_spawns += 1,
            Some(Tier::Medium) => self.stats.medium_spawns += 1,
            Some(Tier::High) => self.stats.high_spawns += 1,
            None => {}
        }
        if spawns.boredom {
            self.stats.boredom_spawns += 1;
        }
    }

    pub fn field(&self) -> &ObstacleField {
        &self.field
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn dodged(&self) -> u64 {
        self.dodged
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    pub fn is_over(&self) -> bool {
        self.over
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    /// Session over a silent track: energy-driven spawns stay quiet
    /// except for the rare quiet-region roll.
    fn quiet_session() -> GameSession {
        let track = EnergyTrack::build(&[], 1, 44100, 100, 50);
        GameSession::new(
            track,
            FieldConfig::default(),
            SpawnConfig::default(),
            StdRng::seed_from_u64(7),
        )
    }

    #[test]
    fn score_accrues_per_tick() {
        let mut s = quiet_session();
        let mut delta_sum = 0.0;
        for t in 0..10 {
            delta_sum += s.tick(t * 100, 0.1, MoveIntent::Stay).score_delta;
        }
        assert!((s.score() - 1.0).abs() < 1e-9);
        assert!((delta_sum - s.score()).abs() < 1e-9);
        assert_eq!(s.stats().ticks, 10);
    }

    #[test]
    fn collision_is_terminal() {
        let mut s = quiet_session();
        s.field.spawn(4, 2);
        s.field.obstacles_mut()[0].x = 100.0;

        let out = s.tick(0, 0.016, MoveIntent::Stay);
        assert!(out.collided);
        assert!(s.is_over());
    }

    #[test]
    fn adjacent_pass_scores_a_dodge() {
        let mut s = quiet_session();

        // Step down one lane and let the easing settle.
        s.tick(0, 0.016, MoveIntent::Down);
        for t in 1..30 {
            s.tick(t * 16, 0.016, MoveIntent::Stay);
        }
        assert_eq!(s.player.lane, 6);

        // Park an obstacle over lanes 4..6 just right of the player:
        // one lane away from the player's edge, never overlapping.
        s.field.spawn(4, 2);
        if let Some(o) = s.field.obstacles_mut().last_mut() {
            o.x = 150.0;
        }

        let mut dodged = 0;
        let mut collided = false;
        for t in 30..60 {
            let out = s.tick(t * 16, 0.016, MoveIntent::Stay);
            dodged += out.dodged_delta;
            collided |= out.collided;
        }
        assert!(!collided);
        assert_eq!(dodged, 1);
    }

    #[test]
    fn loud_spike_spawns_a_heavy_wall() {
        // Two quiet seconds, then a full-scale second: the spike ratio
        // clears the high threshold at 2000ms.
        let mut samples = vec![0.1; 2000];
        samples.extend(vec![1.0; 1000]);
        let track = EnergyTrack::build(&samples, 1, 1000, 100, 50);
        assert!(track.energy_for_ms(2000) / track.baseline_for_ms(2000) > 2.2);

        let mut s = GameSession::new(
            track,
            FieldConfig::default(),
            SpawnConfig::default(),
            StdRng::seed_from_u64(7),
        );
        // Keep the boredom path out of this tick.
        s.player.last_lane_change_ms = 1_900;

        s.tick(2_000, 0.016, MoveIntent::Stay);
        assert_eq!(s.stats().high_spawns, 1);
        let spawned = s.field.obstacles().last().unwrap();
        assert!(spawned.lane_count >= 4);
    }
}
