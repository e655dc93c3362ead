//! Obstacle set: static segments, lane traffic and the goal region

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::Arena;
use crate::consts::{DESPAWN_MARGIN, MIN_GAP};

/// A line segment (player-drawn line or basket wall)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub a: Vec2,
    pub b: Vec2,
}

impl Segment {
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b }
    }

    pub fn is_finite(&self) -> bool {
        self.a.is_finite() && self.b.is_finite()
    }
}

/// Which restitution a segment uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Surface {
    /// Player-drawn line
    Line,
    /// Basket or arena wall
    Wall,
}

/// Axis-aligned traffic box moving along a lane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaneBox {
    pub id: u32,
    pub lane: u32,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl LaneBox {
    /// Horizontal clearance to a span `[x, x + width]` (negative when overlapping)
    pub fn gap_to(&self, x: f32, width: f32) -> f32 {
        (self.x - (x + width)).max(x - (self.x + self.width))
    }
}

/// Anything the body can hit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Obstacle {
    Segment { segment: Segment, surface: Surface },
    Box(LaneBox),
}

impl Obstacle {
    /// Resolution pass: lines, then walls, then boxes
    pub fn resolve_order(&self) -> u8 {
        match self {
            Obstacle::Segment {
                surface: Surface::Line,
                ..
            } => 0,
            Obstacle::Segment {
                surface: Surface::Wall,
                ..
            } => 1,
            Obstacle::Box(_) => 2,
        }
    }
}

/// A horizontal traffic lane
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    pub index: u32,
    /// Top edge of the lane
    pub y: f32,
    pub height: f32,
    /// Signed horizontal speed (pixels/s, positive = rightward)
    pub speed: f32,
    /// Seconds between spawns
    pub spawn_interval: f32,
    pub spawn_timer: f32,
    pub box_width: f32,
    pub box_height: f32,
}

impl Lane {
    /// Vertical centre of the lane
    pub fn center_y(&self) -> f32 {
        self.y + self.height / 2.0
    }

    /// Top edge of a box riding this lane
    pub fn box_y(&self) -> f32 {
        self.center_y() - self.box_height / 2.0
    }

    /// x where new traffic enters, just off the upstream edge
    pub fn spawn_x(&self, arena_width: f32) -> f32 {
        if self.speed >= 0.0 {
            -self.box_width
        } else {
            arena_width
        }
    }
}

/// Goal region (axis-aligned rectangle)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetZone {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl TargetZone {
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Obstacles for the current round, kept in resolution order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObstacleSet {
    obstacles: Vec<Obstacle>,
    lanes: Vec<Lane>,
    next_box_id: u32,
}

impl ObstacleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert keeping resolution order; ties keep insertion order
    pub fn insert(&mut self, obstacle: Obstacle) {
        let order = obstacle.resolve_order();
        let at = self
            .obstacles
            .partition_point(|o| o.resolve_order() <= order);
        self.obstacles.insert(at, obstacle);
    }

    pub fn add_line(&mut self, segment: Segment) {
        self.insert(Obstacle::Segment {
            segment,
            surface: Surface::Line,
        });
    }

    pub fn add_wall(&mut self, segment: Segment) {
        self.insert(Obstacle::Segment {
            segment,
            surface: Surface::Wall,
        });
    }

    pub fn add_lane(&mut self, lane: Lane) {
        self.lanes.push(lane);
    }

    /// Place a box in a lane at `x`, returning its id
    pub fn spawn_box(&mut self, lane_index: usize, x: f32) -> Option<u32> {
        let lane = *self.lanes.get(lane_index)?;
        let id = self.next_box_id;
        self.next_box_id += 1;
        self.insert(Obstacle::Box(LaneBox {
            id,
            lane: lane.index,
            x,
            y: lane.box_y(),
            width: lane.box_width,
            height: lane.box_height,
        }));
        Some(id)
    }

    /// Obstacles in resolution order
    pub fn iter(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter()
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn boxes(&self) -> impl Iterator<Item = &LaneBox> {
        self.obstacles.iter().filter_map(|o| match o {
            Obstacle::Box(b) => Some(b),
            _ => None,
        })
    }

    /// The player-drawn line, if one was committed
    pub fn line(&self) -> Option<&Segment> {
        self.obstacles.iter().find_map(|o| match o {
            Obstacle::Segment {
                segment,
                surface: Surface::Line,
            } => Some(segment),
            _ => None,
        })
    }

    /// Whether a box of `width` at `x` keeps `MIN_GAP` to all traffic in the lane
    pub fn lane_clear(&self, lane: u32, x: f32, width: f32) -> bool {
        self.boxes()
            .filter(|b| b.lane == lane)
            .all(|b| b.gap_to(x, width) >= MIN_GAP)
    }

    /// Drop everything (round transition or reset)
    pub fn clear(&mut self) {
        self.obstacles.clear();
        self.lanes.clear();
    }

    /// Advect traffic, despawn what left the arena, spawn at lane edges
    pub fn advance(&mut self, dt: f32, arena: &Arena) {
        if self.lanes.is_empty() || dt <= 0.0 {
            return;
        }

        let lanes = &self.lanes;
        for obstacle in &mut self.obstacles {
            if let Obstacle::Box(b) = obstacle {
                if let Some(lane) = lanes.get(b.lane as usize) {
                    b.x += lane.speed * dt;
                }
            }
        }

        self.obstacles.retain(|o| match o {
            Obstacle::Box(b) => {
                b.x + b.width >= -DESPAWN_MARGIN && b.x <= arena.width + DESPAWN_MARGIN
            }
            _ => true,
        });

        for i in 0..self.lanes.len() {
            let lane = self.lanes[i];
            let timer = lane.spawn_timer + dt;
            if timer < lane.spawn_interval {
                self.lanes[i].spawn_timer = timer;
                continue;
            }

            let x = lane.spawn_x(arena.width);
            if self.lane_clear(lane.index, x, lane.box_width) {
                self.spawn_box(i, x);
                self.lanes[i].spawn_timer = (timer - lane.spawn_interval).min(lane.spawn_interval);
            } else {
                // Wait for the entry edge to clear
                self.lanes[i].spawn_timer = lane.spawn_interval;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lane(speed: f32) -> Lane {
        Lane {
            index: 0,
            y: 100.0,
            height: 56.0,
            speed,
            spawn_interval: 1.0,
            spawn_timer: 0.0,
            box_width: 60.0,
            box_height: 34.0,
        }
    }

    #[test]
    fn test_insert_keeps_resolution_order() {
        let mut set = ObstacleSet::new();
        set.add_wall(Segment::new(Vec2::ZERO, Vec2::X));
        set.add_lane(lane(50.0));
        set.spawn_box(0, 10.0);
        set.add_line(Segment::new(Vec2::Y, Vec2::ONE));
        set.add_wall(Segment::new(Vec2::ONE, Vec2::X));

        let orders: Vec<u8> = set.iter().map(|o| o.resolve_order()).collect();
        assert_eq!(orders, vec![0, 1, 1, 2]);
        assert!(set.line().is_some());
    }

    #[test]
    fn test_advance_moves_and_despawns() {
        let arena = Arena::default();
        let mut set = ObstacleSet::new();
        set.add_lane(lane(100.0));
        set.spawn_box(0, arena.width - 30.0);
        set.advance(0.5, &arena);
        // 50px further right: still within the despawn margin
        assert_eq!(set.boxes().count(), 1);
        set.advance(0.5, &arena);
        // Moved past width + margin; a fresh box spawned at the left edge
        let boxes: Vec<_> = set.boxes().collect();
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].x, -60.0);
    }

    #[test]
    fn test_spawn_waits_for_clear_edge() {
        let arena = Arena::default();
        let mut set = ObstacleSet::new();
        set.add_lane(lane(10.0));
        set.spawn_box(0, -30.0);
        set.advance(1.0, &arena);
        // The existing box still blocks the entry edge
        assert_eq!(set.boxes().count(), 1);
        assert_eq!(set.lanes()[0].spawn_timer, 1.0);
    }

    #[test]
    fn test_target_zone_contains_inclusive() {
        let zone = TargetZone {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        };
        assert!(zone.contains(Vec2::new(10.0, 10.0)));
        assert!(!zone.contains(Vec2::new(10.1, 5.0)));
    }
}
