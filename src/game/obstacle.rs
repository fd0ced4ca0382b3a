use crate::config::FieldConfig;

/// Trailing edges scrolling past this margin get pruned.
const PRUNE_MARGIN: f32 = 50.0;

#[derive(Clone, Copy, Debug)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.w
            && other.x < self.x + self.w
            && self.y < other.y + other.h
            && other.y < self.y + self.h
    }
}

/// A lane-blocking wall. Occupies lanes `[lane_start, lane_start + lane_count)`
/// and scrolls left at the field's obstacle speed.
#[derive(Clone, Debug)]
pub struct Obstacle {
    pub lane_start: usize,
    pub lane_count: usize,
    pub x: f32,
    pub width: f32,
    /// Flips once, the first tick the trailing edge crosses the player.
    pub passed: bool,
}

impl Obstacle {
    pub fn rect(&self, lane_height: f32) -> Rect {
        Rect {
            x: self.x,
            y: self.lane_start as f32 * lane_height,
            w: self.width,
            h: self.lane_count as f32 * lane_height,
        }
    }
}

/// The moving set of obstacles. Owns every obstacle from spawn to prune;
/// spawn cooldown bookkeeping lives in the planner.
pub struct ObstacleField {
    obstacles: Vec<Obstacle>,
    lanes: usize,
    lane_height: f32,
    player_x: f32,
    spawn_x: f32,
    obstacle_width: f32,
    speed: f32,
}

impl ObstacleField {
    pub fn new(cfg: &FieldConfig) -> Self {
        Self {
            obstacles: Vec::new(),
            lanes: cfg.lanes,
            lane_height: cfg.lane_height(),
            player_x: cfg.player_x,
            spawn_x: cfg.spawn_x(),
            obstacle_width: cfg.obstacle_width,
            speed: cfg.obstacle_speed,
        }
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn obstacles_mut(&mut self) -> &mut [Obstacle] {
        &mut self.obstacles
    }

    pub fn lanes(&self) -> usize {
        self.lanes
    }

    pub fn player_x(&self) -> f32 {
        self.player_x
    }

    pub fn spawn_x(&self) -> f32 {
        self.spawn_x
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Seconds until an obstacle at `x` reaches the player column.
    pub fn arrival_secs(&self, x: f32) -> f32 {
        (x - self.player_x) / self.speed
    }

    pub fn spawn(&mut self, lane_start: usize, lane_count: usize) {
        self.obstacles.push(Obstacle {
            lane_start,
            lane_count,
            x: self.spawn_x,
            width: self.obstacle_width,
            passed: false,
        });
    }

    /// Advance every obstacle and prune the ones fully off-screen.
    pub fn advance(&mut self, dt: f32) {
        for o in &mut self.obstacles {
            o.x -= self.speed * dt;
        }
        self.obstacles.retain(|o| o.x + o.width > -PRUNE_MARGIN);
    }

    pub fn collides(&self, player: &Rect) -> bool {
        self.obstacles
            .iter()
            .any(|o| player.overlaps(&o.rect(self.lane_height)))
    }

    /// Mark obstacles whose trailing edge has crossed the player column,
    /// counting the ones dodged up close: within one lane of the nearest
    /// edge, or inside the lane span. Each obstacle counts at most once.
    pub fn consume_passed(&mut self, player_lane: usize) -> u32 {
        let mut count = 0;
        for o in &mut self.obstacles {
            if o.passed || o.x + o.width >= self.player_x {
                continue;
            }
            let top = o.lane_start;
            let bottom = o.lane_start + o.lane_count - 1;
            let dist = if player_lane < top {
                top - player_lane
            } else if player_lane > bottom {
                player_lane - bottom
            } else {
                0
            };
            if dist <= 1 {
                count += 1;
            }
            o.passed = true;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FieldConfig;

    fn field() -> ObstacleField {
        ObstacleField::new(&FieldConfig::default())
    }

    #[test]
    fn advance_moves_and_prunes() {
        let mut f = field();
        f.spawn(0, 2);
        let x0 = f.obstacles()[0].x;
        f.advance(1.0);
        assert_eq!(f.obstacles()[0].x, x0 - 300.0);

        // Scroll far enough that the trailing edge passes -50.
        f.advance(10.0);
        assert!(f.obstacles().is_empty());
    }

    #[test]
    fn collision_is_lane_overlap() {
        let mut f = field();
        f.spawn(4, 2);
        // Drop the obstacle onto the player column.
        f.obstacles_mut()[0].x = 90.0;

        let lane_h = 60.0;
        let on_lane = Rect { x: 100.0, y: 4.0 * lane_h + 6.0, w: 40.0, h: lane_h * 0.8 };
        let off_lane = Rect { x: 100.0, y: 7.0 * lane_h + 6.0, w: 40.0, h: lane_h * 0.8 };
        assert!(f.collides(&on_lane));
        assert!(!f.collides(&off_lane));
    }

    #[test]
    fn consume_passed_counts_near_lanes_once() {
        let mut f = field();
        f.spawn(4, 2);
        // Trailing edge just past the player column.
        f.obstacles_mut()[0].x = 50.0;

        // Lane 5 sits inside the span: distance 0.
        assert_eq!(f.consume_passed(5), 1);
        // Marked once, never again.
        assert_eq!(f.consume_passed(5), 0);
    }

    #[test]
    fn consume_passed_ignores_distant_lanes() {
        let mut f = field();
        f.spawn(4, 2);
        f.obstacles_mut()[0].x = 50.0;

        // Lane 8 is three lanes below the bottom edge (5): no credit,
        // but the obstacle is still consumed.
        assert_eq!(f.consume_passed(8), 0);
        assert_eq!(f.consume_passed(5), 0);
    }

    #[test]
    fn consume_passed_waits_for_trailing_edge() {
        let mut f = field();
        f.spawn(4, 2);
        f.obstacles_mut()[0].x = 70.0; // 70 + 40 >= 100: still in front

        assert_eq!(f.consume_passed(5), 0);
        f.obstacles_mut()[0].x = 50.0;
        assert_eq!(f.consume_passed(5), 1);
    }

    #[test]
    fn edge_adjacent_lane_still_counts() {
        let mut f = field();
        f.spawn(4, 2);
        f.obstacles_mut()[0].x = 50.0;

        // Lane 6 is one below the bottom edge (5): distance 1.
        assert_eq!(f.consume_passed(6), 1);
    }
}
