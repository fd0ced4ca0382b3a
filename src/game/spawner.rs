use rand::rngs::StdRng;
use rand::Rng;

use crate::config::SpawnConfig;
use super::obstacle::ObstacleField;
use super::player::Player;

const PLACEMENT_TRIALS: usize = 8;
/// Obstacles arriving at the player within this window of a candidate
/// count toward its lane occupancy.
const ARRIVAL_CLEARANCE_SECS: f32 = 0.6;
/// Boredom spawns push obstacles arriving within this window forward.
const BOREDOM_CONFLICT_SECS: f32 = 0.4;
const BOREDOM_SHIFT_FACTOR: f32 = 0.6;
/// Spawns this wide or wider arm the heavy cooldown.
const HEAVY_LANE_COUNT: usize = 4;
const STREAK_CAP: u32 = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tier {
    Low,
    Medium,
    High,
}

/// What a single planner tick inserted, for logging and run stats.
#[derive(Clone, Copy, Debug, Default)]
pub struct TickSpawns {
    pub energy: Option<Tier>,
    pub boredom: bool,
}

/// Stateful spawn decision engine. Owns every cooldown timestamp, the
/// high-streak counter, and the RNG used for all randomized decisions,
/// so a seeded planner replays identically.
pub struct SpawnPlanner {
    cfg: SpawnConfig,
    rng: StdRng,
    last_spawn_ms: i64,
    last_heavy_ms: i64,
    high_streak: u32,
}

impl SpawnPlanner {
    pub fn new(cfg: SpawnConfig, rng: StdRng) -> Self {
        Self {
            cfg,
            rng,
            last_spawn_ms: -10_000,
            last_heavy_ms: -10_000,
            high_streak: 0,
        }
    }

    /// Run one tick of spawn logic: the energy-driven pipeline behind the
    /// minimum-interval gate, then the boredom check. `last_near_ms` is
    /// the last time any obstacle was near the player's visible zone.
    pub fn update(
        &mut self,
        now_ms: i64,
        ratio: f32,
        last_near_ms: i64,
        field: &mut ObstacleField,
        player: &mut Player,
    ) -> TickSpawns {
        let mut spawned = TickSpawns::default();

        if now_ms - self.last_spawn_ms >= self.cfg.min_spawn_interval_ms {
            let tier = match self.classify(ratio) {
                Some(tier) => tier,
                // A failed quiet-region roll idles the whole spawn
                // routine for this tick, boredom check included.
                None => return spawned,
            };

            let tier = if tier == Tier::High
                && now_ms - self.last_heavy_ms < self.cfg.heavy_cooldown_ms
            {
                Tier::Medium
            } else {
                tier
            };

            let lane_count = self.pick_lane_count(tier, field.lanes());
            if let Some(lane_start) = self.find_open_start(lane_count, field) {
                field.spawn(lane_start, lane_count);
                self.last_spawn_ms = now_ms;
                if lane_count >= HEAVY_LANE_COUNT {
                    self.last_heavy_ms = now_ms;
                }
                spawned.energy = Some(tier);
                log::debug!(
                    "Spawn {:?} at {}ms: lanes {}..{} (ratio {:.2})",
                    tier,
                    now_ms,
                    lane_start,
                    lane_start + lane_count,
                    ratio
                );
            } else {
                log::debug!("Placement exhausted at {}ms, spawn skipped", now_ms);
            }
        }

        if now_ms - player.last_lane_change_ms > self.cfg.boredom_idle_ms
            && now_ms - last_near_ms > self.cfg.boredom_lull_ms
        {
            self.spawn_boredom(now_ms, field, player);
            spawned.boredom = true;
        }

        spawned
    }

    /// Map the energy ratio to a tier, tracking the high streak: the
    /// first consecutive high tick spawns high, the second medium, the
    /// rest low. Below the low threshold there is a small chance of a
    /// low spawn; otherwise the tick spawns nothing and the streak is
    /// left as is.
    fn classify(&mut self, ratio: f32) -> Option<Tier> {
        if ratio >= self.cfg.high_threshold {
            let tier = match self.high_streak {
                0 => Tier::High,
                1 => Tier::Medium,
                _ => Tier::Low,
            };
            self.high_streak = (self.high_streak + 1).min(STREAK_CAP);
            Some(tier)
        } else if ratio >= self.cfg.medium_threshold {
            self.high_streak = 0;
            Some(Tier::Medium)
        } else if ratio >= self.cfg.low_threshold {
            self.high_streak = 0;
            Some(Tier::Low)
        } else if self.rng.random::<f32>() < self.cfg.quiet_spawn_chance {
            self.high_streak = 0;
            Some(Tier::Low)
        } else {
            None
        }
    }

    fn pick_lane_count(&mut self, tier: Tier, lanes: usize) -> usize {
        let sizes = match tier {
            Tier::Low => &self.cfg.low_sizes,
            Tier::Medium => &self.cfg.medium_sizes,
            Tier::High => &self.cfg.high_sizes,
        };
        if sizes.is_empty() {
            return 1;
        }
        sizes[self.rng.random_range(0..sizes.len())].clamp(1, lanes)
    }

    /// Random placement trials. A trial is accepted only if, among all
    /// obstacles arriving at the player within the clearance window of
    /// the candidate, at least one lane stays free: no spawn may wall
    /// off the field within a single temporal slice.
    fn find_open_start(&mut self, lane_count: usize, field: &ObstacleField) -> Option<usize> {
        let lanes = field.lanes();
        let t_new = field.arrival_secs(field.spawn_x());

        for _ in 0..PLACEMENT_TRIALS {
            let start = self.rng.random_range(0..=lanes - lane_count);

            let mut blocked = vec![false; lanes];
            for o in field.obstacles() {
                if (field.arrival_secs(o.x) - t_new).abs() < ARRIVAL_CLEARANCE_SECS {
                    for lane in o.lane_start..(o.lane_start + o.lane_count).min(lanes) {
                        blocked[lane] = true;
                    }
                }
            }
            for lane in start..start + lane_count {
                blocked[lane] = true;
            }

            if blocked.iter().any(|b| !b) {
                return Some(start);
            }
        }
        None
    }

    /// Drop a single-lane obstacle onto an inactive player's lane,
    /// first pushing forward anything that would arrive at the same
    /// time as the nudge.
    fn spawn_boredom(&mut self, now_ms: i64, field: &mut ObstacleField, player: &mut Player) {
        let spawn_x = field.spawn_x();
        let player_x = field.player_x();
        let speed = field.speed();
        let shift = speed * BOREDOM_SHIFT_FACTOR;

        for o in field.obstacles_mut() {
            if o.x > player_x && ((o.x - spawn_x) / speed).abs() < BOREDOM_CONFLICT_SECS {
                o.x += shift;
            }
        }

        field.spawn(player.lane, 1);
        self.last_spawn_ms = now_ms;
        player.last_lane_change_ms = now_ms;
        log::debug!("Boredom spawn at {}ms in lane {}", now_ms, player.lane);
    }
}
