//! AI-controlled snakes. Bots produce synthetic inputs through the same
//! directory queue as network players: reactive edge avoidance, periodic
//! wander, and an occasional boost behind a cooldown.

use crate::snake::SnakeDirectory;
use log::info;
use rand::Rng;
use shared::{PlayerInput, Vec2, MAP_HEIGHT, MAP_WIDTH};
use std::collections::{HashMap, HashSet};
use std::f32::consts::{PI, TAU};
use std::time::{Duration, Instant};

/// Distance from an edge that triggers avoidance.
const EDGE_MARGIN: f32 = 400.0;
const WANDER_HOLD_MIN_MS: u64 = 1000;
const WANDER_HOLD_MAX_MS: u64 = 3000;
/// Chance to boost on each eligible tick.
const BOOST_CHANCE: f64 = 0.02;
const BOOST_MIN_INTERVAL: Duration = Duration::from_secs(5);
const BOT_SPAWN_INTERVAL: Duration = Duration::from_secs(7);
const MAX_BOTS: usize = 4;
/// Headings converge on the target at this rate, never snapping.
const TURN_RATE: f32 = 0.1;

const BOT_NAMES: [&str; 12] = [
    "Slithery Sam",
    "Danger Noodle",
    "Snek Lord",
    "Hiss-tory",
    "Python Pete",
    "Cobra Commander",
    "Sidewinder Sue",
    "Viper Val",
    "Rattlesnake Rick",
    "Anaconda Andy",
    "Mamba Max",
    "Boa Bob",
];

const BOT_SKINS: [&str; 5] = [
    "classic-blue",
    "neon-green",
    "hot-pink",
    "royal-purple",
    "sunset-orange",
];

#[derive(Debug)]
struct BotState {
    name: String,
    target_direction: f32,
    next_wander_at: Instant,
    next_boost_at: Instant,
}

pub struct BotDriver {
    bots: HashMap<u32, BotState>,
    next_spawn_at: Instant,
    spawned: usize,
    used_names: HashSet<String>,
}

impl BotDriver {
    pub fn new(now: Instant) -> Self {
        Self {
            bots: HashMap::new(),
            next_spawn_at: now + BOT_SPAWN_INTERVAL,
            spawned: 0,
            used_names: HashSet::new(),
        }
    }

    /// Runs before everything else in the tick: retires eliminated bots,
    /// spawns the next one when due, and queues one input per living bot.
    pub fn update(&mut self, snakes: &mut SnakeDirectory, now: Instant, next_id: &mut u32) {
        // Eliminated bots free their slot and their name.
        let dead: Vec<u32> = self
            .bots
            .keys()
            .copied()
            .filter(|id| !snakes.contains(*id))
            .collect();
        for id in dead {
            if let Some(bot) = self.bots.remove(&id) {
                info!("Bot {} retired", bot.name);
                self.used_names.remove(&bot.name);
            }
        }

        if self.spawned < MAX_BOTS && now >= self.next_spawn_at {
            self.spawn_bot(snakes, now, next_id);
            self.spawned += 1;
            self.next_spawn_at = now + BOT_SPAWN_INTERVAL;
        }

        let ids: Vec<u32> = self.bots.keys().copied().collect();
        for id in ids {
            self.drive_bot(id, snakes, now);
        }
    }

    fn spawn_bot(&mut self, snakes: &mut SnakeDirectory, now: Instant, next_id: &mut u32) {
        let mut rng = rand::thread_rng();
        let id = *next_id;
        *next_id += 1;

        let name = self.unique_name(&mut rng);
        let skin = BOT_SKINS[rng.gen_range(0..BOT_SKINS.len())];
        snakes.spawn(id, &name, skin);

        info!("Spawned bot {} ({})", name, id);
        self.bots.insert(
            id,
            BotState {
                name,
                target_direction: rng.gen_range(0.0..TAU),
                next_wander_at: now + wander_hold(&mut rng),
                next_boost_at: now + BOOST_MIN_INTERVAL,
            },
        );
    }

    fn drive_bot(&mut self, id: u32, snakes: &mut SnakeDirectory, now: Instant) {
        let Some(snake) = snakes.get(id) else {
            return;
        };
        let head = snake.head();
        let current_direction = snake.direction;

        let mut rng = rand::thread_rng();
        let bot = self.bots.get_mut(&id).expect("driven bot is tracked");

        // Edge avoidance pre-empts wandering.
        if let Some(escape) = edge_avoidance(head) {
            bot.target_direction = escape;
            bot.next_wander_at = now + wander_hold(&mut rng);
        } else if now >= bot.next_wander_at {
            bot.target_direction = rng.gen_range(0.0..TAU);
            bot.next_wander_at = now + wander_hold(&mut rng);
        }

        let direction = smooth_turn(current_direction, bot.target_direction);

        // Boost decision is independent of the heading state.
        let mut boost = false;
        if now >= bot.next_boost_at && rng.gen_bool(BOOST_CHANCE) {
            boost = true;
            bot.next_boost_at = now + BOOST_MIN_INTERVAL;
        }

        snakes.queue_input(
            id,
            PlayerInput {
                direction,
                boost,
                timestamp: 0,
                sequence: 0, // bots have no reconciliation to track
            },
        );
    }

    fn unique_name(&mut self, rng: &mut impl Rng) -> String {
        let available: Vec<&str> = BOT_NAMES
            .iter()
            .copied()
            .filter(|name| !self.used_names.contains(*name))
            .collect();

        let name = if available.is_empty() {
            // Pool exhausted: numbered variant.
            let base = BOT_NAMES[rng.gen_range(0..BOT_NAMES.len())];
            format!("{} {}", base, rng.gen_range(0..1000))
        } else {
            available[rng.gen_range(0..available.len())].to_string()
        };
        self.used_names.insert(name.clone());
        name
    }

    pub fn bot_count(&self) -> usize {
        self.bots.len()
    }
}

/// Random hold time before the next wander heading change.
fn wander_hold(rng: &mut impl Rng) -> Duration {
    Duration::from_millis(rng.gen_range(WANDER_HOLD_MIN_MS..=WANDER_HOLD_MAX_MS))
}

/// Direction back toward the interior when the head is within the margin of
/// any boundary, None otherwise.
fn edge_avoidance(head: Vec2) -> Option<f32> {
    let mut avoid_x = 0.0;
    let mut avoid_y = 0.0;

    if head.x < EDGE_MARGIN {
        avoid_x = 1.0;
    } else if head.x > MAP_WIDTH - EDGE_MARGIN {
        avoid_x = -1.0;
    }
    if head.y < EDGE_MARGIN {
        avoid_y = 1.0;
    } else if head.y > MAP_HEIGHT - EDGE_MARGIN {
        avoid_y = -1.0;
    }

    if avoid_x != 0.0 || avoid_y != 0.0 {
        Some(f32::atan2(avoid_y, avoid_x).rem_euclid(TAU))
    } else {
        None
    }
}

/// Moves `current` toward `target` by at most the per-tick turn rate, taking
/// the shortest angular path. The result is normalized into [0, 2π).
fn smooth_turn(current: f32, target: f32) -> f32 {
    let mut diff = target - current;
    while diff > PI {
        diff -= TAU;
    }
    while diff < -PI {
        diff += TAU;
    }

    let next = if diff.abs() < TURN_RATE {
        target
    } else {
        current + TURN_RATE * diff.signum()
    };
    next.rem_euclid(TAU)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_smooth_turn_limited_by_rate() {
        let next = smooth_turn(0.0, 1.0);
        assert_approx_eq!(next, TURN_RATE, 1e-6);

        let next = smooth_turn(1.0, 0.0);
        assert_approx_eq!(next, 1.0 - TURN_RATE, 1e-6);
    }

    #[test]
    fn test_smooth_turn_snaps_within_rate() {
        assert_approx_eq!(smooth_turn(1.0, 1.05), 1.05, 1e-6);
    }

    #[test]
    fn test_smooth_turn_takes_shortest_path() {
        // 0.05 to 2π - 0.05 is 0.1 backwards, not nearly a full turn.
        let next = smooth_turn(0.05, TAU - 0.05);
        assert_approx_eq!(next, TAU - 0.05, 1e-5);

        // Crossing the wrap-around stays normalized.
        let next = smooth_turn(0.02, TAU - 0.5);
        assert!((0.0..TAU).contains(&next));
        assert!(next > TAU - 0.6 || next < 0.02);
    }

    #[test]
    fn test_edge_avoidance_points_inward() {
        // Near the left edge: escape right.
        let escape = edge_avoidance(Vec2::new(100.0, 2500.0)).unwrap();
        assert_approx_eq!(escape, 0.0, 1e-6);

        // Near the bottom-right corner: up-left quadrant.
        let escape = edge_avoidance(Vec2::new(MAP_WIDTH - 100.0, MAP_HEIGHT - 100.0)).unwrap();
        assert_approx_eq!(escape, (5.0 * PI / 4.0), 1e-5);

        assert!(edge_avoidance(Vec2::new(2500.0, 2500.0)).is_none());
    }

    #[test]
    fn test_bots_spawn_on_schedule_up_to_cap() {
        let start = Instant::now();
        let mut driver = BotDriver::new(start);
        let mut snakes = SnakeDirectory::new();
        let mut next_id = 1000;

        driver.update(&mut snakes, start, &mut next_id);
        assert_eq!(driver.bot_count(), 0);

        let mut now = start;
        for expected in 1..=MAX_BOTS {
            now += BOT_SPAWN_INTERVAL;
            driver.update(&mut snakes, now, &mut next_id);
            assert_eq!(driver.bot_count(), expected);
            assert_eq!(snakes.count(), expected);
        }

        // Cap holds.
        now += BOT_SPAWN_INTERVAL;
        driver.update(&mut snakes, now, &mut next_id);
        assert_eq!(driver.bot_count(), MAX_BOTS);
        assert_eq!(next_id, 1000 + MAX_BOTS as u32);
    }

    #[test]
    fn test_bot_names_unique() {
        let start = Instant::now();
        let mut driver = BotDriver::new(start);
        let mut snakes = SnakeDirectory::new();
        let mut next_id = 1;

        let mut now = start;
        for _ in 0..MAX_BOTS {
            now += BOT_SPAWN_INTERVAL;
            driver.update(&mut snakes, now, &mut next_id);
        }

        let names: HashSet<String> = snakes
            .states()
            .into_iter()
            .map(|state| state.name)
            .collect();
        assert_eq!(names.len(), MAX_BOTS);
    }

    #[test]
    fn test_eliminated_bot_retired_and_name_freed() {
        let start = Instant::now();
        let mut driver = BotDriver::new(start);
        let mut snakes = SnakeDirectory::new();
        let mut next_id = 1;

        let now = start + BOT_SPAWN_INTERVAL;
        driver.update(&mut snakes, now, &mut next_id);
        assert_eq!(driver.bot_count(), 1);

        let bot_id = snakes.ids()[0];
        snakes.remove(bot_id);

        driver.update(&mut snakes, now, &mut next_id);
        assert_eq!(driver.bot_count(), 0);
        assert!(driver.used_names.is_empty());
    }

    #[test]
    fn test_bot_inputs_queued_and_valid() {
        let start = Instant::now();
        let mut driver = BotDriver::new(start);
        let mut snakes = SnakeDirectory::new();
        let mut next_id = 1;

        let now = start + BOT_SPAWN_INTERVAL;
        driver.update(&mut snakes, now, &mut next_id);
        let bot_id = snakes.ids()[0];

        // The queued input steers the snake on the next step, with a
        // heading inside the valid range.
        snakes.step_all(1.0 / 60.0);
        let snake = snakes.get(bot_id).unwrap();
        assert!(shared::direction_valid(snake.direction));
    }
}
