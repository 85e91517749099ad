//! Per-snake motion state and the per-room directory that owns it.
//!
//! Each snake advances exactly one fixed step per tick from the newest
//! input in its bounded staging queue. The queue is the only structure
//! written from outside the tick loop, so it is deliberately last-write-wins:
//! a race with inbound delivery costs at most one tick of staleness.

use log::info;
use rand::Rng;
use shared::{
    advance_head, segment_target, PlayerInput, SnakeState, Vec2, BASE_SPEED, BOOST_MASS_COST,
    BOOST_SPEED, INITIAL_SNAKE_LENGTH, INPUT_QUEUE_CAPACITY, MAP_HEIGHT, MAP_WIDTH,
    MIN_BOOST_LENGTH, SNAKE_SEGMENT_SPACING,
};
use std::collections::{HashMap, VecDeque};
use std::f32::consts::TAU;
use std::time::Instant;

/// Spawn positions keep this distance from every map edge.
const SPAWN_MARGIN: f32 = 500.0;

#[derive(Debug)]
pub struct Snake {
    pub id: u32,
    pub name: String,
    /// Head first; count always equals `ceil(length)` after a step.
    pub segments: Vec<Vec2>,
    pub direction: f32,
    pub speed: f32,
    pub length: f32,
    pub skin: String,
    pub boosting: bool,
    pub score: u32,
    pub kills: u32,
    pub joined_at: Instant,
    pending_inputs: VecDeque<PlayerInput>,
}

impl Snake {
    fn new(id: u32, name: String, skin: String, spawn: Vec2, direction: f32) -> Self {
        // Trailing segments are laid out behind the head along the heading.
        let segments = (0..segment_target(INITIAL_SNAKE_LENGTH))
            .map(|index| Vec2 {
                x: spawn.x - direction.cos() * index as f32 * SNAKE_SEGMENT_SPACING,
                y: spawn.y - direction.sin() * index as f32 * SNAKE_SEGMENT_SPACING,
            })
            .collect();

        Self {
            id,
            name,
            segments,
            direction,
            speed: BASE_SPEED,
            length: INITIAL_SNAKE_LENGTH,
            skin,
            boosting: false,
            score: 0,
            kills: 0,
            joined_at: Instant::now(),
            pending_inputs: VecDeque::new(),
        }
    }

    pub fn head(&self) -> Vec2 {
        self.segments[0]
    }

    /// Buffers an input; the queue holds at most three, oldest dropped first.
    pub fn queue_input(&mut self, input: PlayerInput) {
        self.pending_inputs.push_back(input);
        while self.pending_inputs.len() > INPUT_QUEUE_CAPACITY {
            self.pending_inputs.pop_front();
        }
    }

    /// Advances the snake one fixed step. Only the newest queued input is
    /// applied; older entries within the tick window are discarded.
    fn step(&mut self, dt: f32) {
        if let Some(latest) = self.pending_inputs.pop_back() {
            self.direction = latest.direction;
            self.boosting = latest.boost && self.length > MIN_BOOST_LENGTH;
            self.pending_inputs.clear();
        }

        self.speed = if self.boosting { BOOST_SPEED } else { BASE_SPEED };

        if self.boosting {
            self.length = (self.length - BOOST_MASS_COST * dt).max(MIN_BOOST_LENGTH);
        }

        let new_head = advance_head(self.head(), self.direction, self.speed);
        self.segments.insert(0, new_head);
        self.segments.truncate(segment_target(self.length));
    }

    pub fn time_alive_secs(&self) -> u64 {
        self.joined_at.elapsed().as_secs()
    }

    pub fn state(&self) -> SnakeState {
        SnakeState {
            id: self.id,
            name: self.name.clone(),
            segments: self.segments.clone(),
            direction: self.direction,
            speed: self.speed,
            length: self.length,
            skin: self.skin.clone(),
            boosting: self.boosting,
            score: self.score,
            kills: self.kills,
        }
    }
}

/// All snakes in one room, human and AI alike.
#[derive(Debug, Default)]
pub struct SnakeDirectory {
    snakes: HashMap<u32, Snake>,
}

impl SnakeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawns a snake at a random interior point and returns its position.
    pub fn spawn(&mut self, id: u32, name: &str, skin: &str) -> Vec2 {
        let mut rng = rand::thread_rng();
        let spawn = Vec2 {
            x: rng.gen_range(SPAWN_MARGIN..MAP_WIDTH - SPAWN_MARGIN),
            y: rng.gen_range(SPAWN_MARGIN..MAP_HEIGHT - SPAWN_MARGIN),
        };
        let direction = rng.gen_range(0.0..TAU);
        self.spawn_at(id, name, skin, spawn, direction)
    }

    /// Deterministic spawn used by `spawn` and by tests.
    pub fn spawn_at(&mut self, id: u32, name: &str, skin: &str, spawn: Vec2, direction: f32) -> Vec2 {
        info!("Spawned snake {} ({:?}) at ({:.0}, {:.0})", id, name, spawn.x, spawn.y);
        self.snakes
            .insert(id, Snake::new(id, name.to_string(), skin.to_string(), spawn, direction));
        spawn
    }

    /// No-op when the snake is already gone (eliminated or disconnected).
    pub fn queue_input(&mut self, id: u32, input: PlayerInput) {
        if let Some(snake) = self.snakes.get_mut(&id) {
            snake.queue_input(input);
        }
    }

    pub fn step_all(&mut self, dt: f32) {
        for snake in self.snakes.values_mut() {
            snake.step(dt);
        }
    }

    /// Food collection: both length and score grow by the item value.
    pub fn grow(&mut self, id: u32, amount: u32) {
        if let Some(snake) = self.snakes.get_mut(&id) {
            snake.length += amount as f32;
            snake.score += amount;
        }
    }

    pub fn add_kill(&mut self, id: u32) {
        if let Some(snake) = self.snakes.get_mut(&id) {
            snake.kills += 1;
        }
    }

    pub fn get(&self, id: u32) -> Option<&Snake> {
        self.snakes.get(&id)
    }

    pub fn remove(&mut self, id: u32) -> Option<Snake> {
        self.snakes.remove(&id)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.snakes.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<u32> {
        self.snakes.keys().copied().collect()
    }

    pub fn count(&self) -> usize {
        self.snakes.len()
    }

    pub fn states(&self) -> Vec<SnakeState> {
        self.snakes.values().map(Snake::state).collect()
    }
}
