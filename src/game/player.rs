use crate::config::FieldConfig;
use super::obstacle::Rect;

const PLAYER_WIDTH: f32 = 40.0;
/// Fraction of the lane height the player body fills.
const LANE_FILL: f32 = 0.8;
/// Per-tick approach factor toward the target lane center.
const SMOOTHING: f32 = 0.4;

/// Discrete lane position with a smoothed vertical position. The lane
/// value (and its change timestamp) only commits once the interpolated
/// position has reached the target.
pub struct Player {
    pub lane: usize,
    target_lane: usize,
    y: f32,
    width: f32,
    height: f32,
    lanes: usize,
    lane_height: f32,
    player_x: f32,
    pub last_lane_change_ms: i64,
}

impl Player {
    pub fn new(cfg: &FieldConfig) -> Self {
        let lane_height = cfg.lane_height();
        let height = lane_height * LANE_FILL;
        let lane = cfg.lanes / 2;
        let mut player = Self {
            lane,
            target_lane: lane,
            y: 0.0,
            width: PLAYER_WIDTH,
            height,
            lanes: cfg.lanes,
            lane_height,
            player_x: cfg.player_x,
            last_lane_change_ms: 0,
        };
        player.y = player.lane_to_y(lane);
        player
    }

    fn lane_to_y(&self, lane: usize) -> f32 {
        let center = lane as f32 * self.lane_height + self.lane_height / 2.0;
        center - self.height / 2.0
    }

    pub fn target_lane(&self) -> usize {
        self.target_lane
    }

    pub fn move_up(&mut self) {
        self.target_lane = self.target_lane.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        self.target_lane = (self.target_lane + 1).min(self.lanes - 1);
    }

    /// Ease toward the target lane center; snap and commit the lane
    /// once the remaining distance drops below one unit.
    pub fn update(&mut self, now_ms: i64) {
        let target_y = self.lane_to_y(self.target_lane);
        let dy = target_y - self.y;
        if dy.abs() < 1.0 {
            let old_lane = self.lane;
            self.y = target_y;
            self.lane = self.target_lane;
            if self.lane != old_lane {
                self.last_lane_change_ms = now_ms;
            }
        } else {
            self.y += dy * SMOOTHING;
        }
    }

    pub fn rect(&self) -> Rect {
        Rect {
            x: self.player_x,
            y: self.y,
            w: self.width,
            h: self.height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldConfig;

    fn player() -> Player {
        Player::new(&FieldConfig::default())
    }

    #[test]
    fn starts_mid_field() {
        let p = player();
        assert_eq!(p.lane, 5);
        assert_eq!(p.target_lane(), 5);
    }

    #[test]
    fn moves_clamp_to_field() {
        let mut p = player();
        for _ in 0..20 {
            p.move_up();
        }
        assert_eq!(p.target_lane(), 0);
        for _ in 0..40 {
            p.move_down();
        }
        assert_eq!(p.target_lane(), 9);
    }

    #[test]
    fn lane_commits_only_after_easing_arrives() {
        let mut p = player();
        p.move_down();
        p.update(100);
        // Still in flight: lane unchanged, no timestamp.
        assert_eq!(p.lane, 5);
        assert_eq!(p.last_lane_change_ms, 0);

        // 0.6^n of a 60px gap drops below 1 unit within ~9 ticks.
        for t in 1..20 {
            p.update(100 + t * 16);
        }
        assert_eq!(p.lane, 6);
        assert!(p.last_lane_change_ms > 0);
    }

    #[test]
    fn settled_player_does_not_restamp() {
        let mut p = player();
        for t in 0..30 {
            p.update(t * 16);
        }
        assert_eq!(p.last_lane_change_ms, 0);
    }
}
