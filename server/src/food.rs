//! Food lifecycle for one room: bulk init, weighted spawns, collection with
//! scheduled respawns, bonus-item cadence, and elimination trail drops.

use rand::Rng;
use shared::{
    FoodColor, FoodItem, Vec2, BONUS_FOOD_RADIUS, BONUS_FOOD_SPAWN_INTERVAL_MS,
    FOOD_RADIUS, FOOD_RESPAWN_MAX_MS, FOOD_RESPAWN_MIN_MS, MAP_HEIGHT, MAP_WIDTH, MAX_BONUS_FOOD,
    MAX_FOOD_PER_ROOM, MIN_FOOD_PER_ROOM,
};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Bonus items spawn away from the map edges.
const BONUS_SPAWN_MARGIN: f32 = 200.0;
/// Trail food is dropped at every Nth body point.
const TRAIL_DROP_STRIDE: usize = 3;
const TRAIL_JITTER: f32 = 10.0;

pub struct FoodField {
    items: HashMap<u32, FoodItem>,
    next_id: u32,
    /// Replacement spawns scheduled by `collect`, fired by `update`.
    respawns_due: Vec<Instant>,
    next_bonus_at: Instant,
    bonus_count: usize,
}

impl FoodField {
    pub fn new(now: Instant) -> Self {
        Self {
            items: HashMap::new(),
            next_id: 1,
            respawns_due: Vec::new(),
            next_bonus_at: now + Duration::from_millis(BONUS_FOOD_SPAWN_INTERVAL_MS),
            bonus_count: 0,
        }
    }

    /// Bulk-spawns a randomized count within the configured band.
    pub fn initialize(&mut self) {
        let count = rand::thread_rng().gen_range(MIN_FOOD_PER_ROOM..MAX_FOOD_PER_ROOM);
        for _ in 0..count {
            self.spawn_one();
        }
    }

    /// One ordinary item at a random position, color from the weighted roll.
    pub fn spawn_one(&mut self) -> u32 {
        let mut rng = rand::thread_rng();
        let color = roll_color(rng.gen_range(0.0..100.0));
        let position = Vec2 {
            x: rng.gen_range(0.0..MAP_WIDTH),
            y: rng.gen_range(0.0..MAP_HEIGHT),
        };
        self.insert(position, color, FOOD_RADIUS)
    }

    /// Deterministic spawn at a known position; used by tests and trail drops.
    pub fn spawn_at(&mut self, position: Vec2, color: FoodColor) -> u32 {
        let radius = if color.is_bonus() { BONUS_FOOD_RADIUS } else { FOOD_RADIUS };
        if color.is_bonus() {
            self.bonus_count += 1;
        }
        self.insert(position, color, radius)
    }

    fn insert(&mut self, position: Vec2, color: FoodColor, radius: f32) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.items.insert(
            id,
            FoodItem {
                id,
                position,
                color,
                value: color.value(),
                radius,
            },
        );
        id
    }

    /// Per-tick maintenance: fire due respawns (skipped at the cap) and the
    /// bonus-item timer.
    pub fn update(&mut self, now: Instant) {
        if self.respawns_due.iter().any(|due| *due <= now) {
            let due_count = self.respawns_due.iter().filter(|due| **due <= now).count();
            self.respawns_due.retain(|due| *due > now);
            for _ in 0..due_count {
                if self.items.len() < MAX_FOOD_PER_ROOM {
                    self.spawn_one();
                }
            }
        }

        // The timer only re-arms after an actual spawn, so a slot freed at
        // the cap refills on the next tick instead of waiting a full interval.
        if now >= self.next_bonus_at && self.bonus_count < MAX_BONUS_FOOD {
            self.spawn_bonus();
            self.next_bonus_at = now + Duration::from_millis(BONUS_FOOD_SPAWN_INTERVAL_MS);
        }
    }

    fn spawn_bonus(&mut self) {
        let mut rng = rand::thread_rng();
        let position = Vec2 {
            x: rng.gen_range(BONUS_SPAWN_MARGIN..MAP_WIDTH - BONUS_SPAWN_MARGIN),
            y: rng.gen_range(BONUS_SPAWN_MARGIN..MAP_HEIGHT - BONUS_SPAWN_MARGIN),
        };
        self.insert(position, FoodColor::Rainbow, BONUS_FOOD_RADIUS);
        self.bonus_count += 1;
    }

    /// Removes and returns the item, scheduling one replacement ordinary
    /// spawn after a randomized delay. The cap is re-checked when the
    /// respawn fires, so the room never exceeds its food ceiling.
    pub fn collect(&mut self, id: u32, now: Instant) -> Option<FoodItem> {
        let item = self.items.remove(&id)?;

        if item.color.is_bonus() {
            self.bonus_count = self.bonus_count.saturating_sub(1);
        }

        let delay = rand::thread_rng().gen_range(FOOD_RESPAWN_MIN_MS..=FOOD_RESPAWN_MAX_MS);
        self.respawns_due.push(now + Duration::from_millis(delay));

        Some(item)
    }

    /// Brute-force proximity scan; O(food count).
    pub fn ids_near(&self, point: Vec2, radius: f32) -> Vec<u32> {
        self.items
            .values()
            .filter(|item| item.position.distance_squared(point) <= radius * radius)
            .map(|item| item.id)
            .collect()
    }

    /// Converts an eliminated snake's body to collectible value: one green
    /// item at every third body point, with slight positional jitter.
    pub fn drop_trail(&mut self, segments: &[Vec2]) {
        let mut rng = rand::thread_rng();
        for segment in segments.iter().step_by(TRAIL_DROP_STRIDE) {
            let position = Vec2 {
                x: segment.x + rng.gen_range(-TRAIL_JITTER..TRAIL_JITTER),
                y: segment.y + rng.gen_range(-TRAIL_JITTER..TRAIL_JITTER),
            };
            self.insert(position, FoodColor::Green, FOOD_RADIUS);
        }
    }

    pub fn get(&self, id: u32) -> Option<&FoodItem> {
        self.items.get(&id)
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn bonus_count(&self) -> usize {
        self.bonus_count
    }

    pub fn all(&self) -> Vec<FoodItem> {
        self.items.values().copied().collect()
    }
}

fn roll_color(roll: f32) -> FoodColor {
    // Weights: white 60, green 20, blue 15, gold 5 (sums to 100).
    if roll < 60.0 {
        FoodColor::White
    } else if roll < 80.0 {
        FoodColor::Green
    } else if roll < 95.0 {
        FoodColor::Blue
    } else {
        FoodColor::Gold
    }
}
