//! Types and constants shared between the authoritative server and the
//! predictive client: map/physics tunables, spatial primitives, wire
//! packets, and the single motion rule both sides must agree on.

use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

pub const MAP_WIDTH: f32 = 5000.0;
pub const MAP_HEIGHT: f32 = 5000.0;
pub const MAX_PLAYERS_PER_ROOM: usize = 50;

pub const SERVER_TICK_RATE: u32 = 60;
/// State snapshots go out at 20Hz: every 3rd simulation tick.
pub const BROADCAST_EVERY_N_TICKS: u64 = 3;

pub const BASE_SPEED: f32 = 2.5;
pub const BOOST_SPEED: f32 = 5.0;
/// Length drained per second of boosting, applied as `cost * dt` each tick.
pub const BOOST_MASS_COST: f32 = 1.0;
pub const INITIAL_SNAKE_LENGTH: f32 = 10.0;
pub const SNAKE_HEAD_RADIUS: f32 = 20.0;
pub const SNAKE_SEGMENT_SPACING: f32 = 12.0;
/// Boosting is refused (and drain floored) below this length.
pub const MIN_BOOST_LENGTH: f32 = 5.0;

pub const FOOD_RADIUS: f32 = 8.0;
pub const MIN_FOOD_PER_ROOM: usize = 500;
pub const MAX_FOOD_PER_ROOM: usize = 800;
pub const FOOD_RESPAWN_MIN_MS: u64 = 1000;
pub const FOOD_RESPAWN_MAX_MS: u64 = 3000;

pub const BONUS_FOOD_RADIUS: f32 = 16.0;
pub const BONUS_FOOD_SPAWN_INTERVAL_MS: u64 = 15_000;
pub const MAX_BONUS_FOOD: usize = 5;

pub const INPUT_QUEUE_CAPACITY: usize = 3;
/// Upstream ceiling on input events per second; faster arrivals are dropped.
pub const INPUT_RATE_LIMIT_HZ: u32 = 60;

pub const INTERPOLATION_LERP: f32 = 0.12;
pub const EXTRAPOLATION_THRESHOLD_MS: u64 = 100;

pub const LEADERBOARD_SIZE: usize = 10;
pub const LEADERBOARD_THROTTLE_MS: u64 = 1000;

/// A point in map space. Also used as a body segment.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_squared(&self, other: Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    pub fn distance(&self, other: Vec2) -> f32 {
        self.distance_squared(other).sqrt()
    }
}

/// One step of head motion: move along `direction` by `speed`, each axis
/// clamped so the head circle never crosses the map boundary. Server
/// simulation and client prediction both route through here.
pub fn advance_head(head: Vec2, direction: f32, speed: f32) -> Vec2 {
    Vec2 {
        x: (head.x + direction.cos() * speed)
            .clamp(SNAKE_HEAD_RADIUS, MAP_WIDTH - SNAKE_HEAD_RADIUS),
        y: (head.y + direction.sin() * speed)
            .clamp(SNAKE_HEAD_RADIUS, MAP_HEIGHT - SNAKE_HEAD_RADIUS),
    }
}

/// Body segment count tracks continuous length.
pub fn segment_target(length: f32) -> usize {
    length.ceil() as usize
}

/// Headings are accepted on the closed range [0, 2π]; anything else is
/// dropped at the input-validation boundary.
pub fn direction_valid(direction: f32) -> bool {
    direction.is_finite() && (0.0..=TAU).contains(&direction)
}

/// One buffered control sample from a player or bot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlayerInput {
    pub direction: f32,
    pub boost: bool,
    pub timestamp: u64,
    pub sequence: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FoodColor {
    White,
    Green,
    Blue,
    Gold,
    /// Rare bonus tier, spawned on its own cadence and capped per room.
    Rainbow,
}

impl FoodColor {
    pub fn value(&self) -> u32 {
        match self {
            FoodColor::White => 1,
            FoodColor::Green => 2,
            FoodColor::Blue => 3,
            FoodColor::Gold => 5,
            FoodColor::Rainbow => 25,
        }
    }

    pub fn is_bonus(&self) -> bool {
        matches!(self, FoodColor::Rainbow)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FoodItem {
    pub id: u32,
    pub position: Vec2,
    pub color: FoodColor,
    pub value: u32,
    pub radius: f32,
}

/// Wire view of one snake, as carried in snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnakeState {
    pub id: u32,
    pub name: String,
    /// Head first.
    pub segments: Vec<Vec2>,
    pub direction: f32,
    pub speed: f32,
    pub length: f32,
    pub skin: String,
    pub boosting: bool,
    pub score: u32,
    pub kills: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub id: u32,
    pub name: String,
    pub length: u32,
    pub kills: u32,
    pub rank: u32,
}

/// Summary delivered to the eliminated player's session only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeathStats {
    pub player_id: u32,
    pub rank: u32,
    pub kills: u32,
    pub max_length: u32,
    pub time_alive_secs: u64,
    pub score: u32,
    pub killed_by: Option<String>,
}

/// Full room state, broadcast every Nth tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub tick: u64,
    pub timestamp: u64,
    pub snakes: Vec<SnakeState>,
    pub food: Vec<FoodItem>,
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// Occupancy info for room discovery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomInfo {
    pub room_id: u32,
    pub player_count: usize,
    pub max_players: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Packet {
    // Client -> server
    Join {
        name: String,
        skin: String,
    },
    Input {
        sequence: u32,
        timestamp: u64,
        direction: f32,
        boost: bool,
    },
    Leave,

    // Server -> client
    Joined {
        player_id: u32,
        room_id: u32,
        spawn: Vec2,
    },
    Snapshot(GameSnapshot),
    Death(DeathStats),
    PlayerJoined {
        player_id: u32,
        name: String,
    },
    PlayerLeft {
        player_id: u32,
    },
    Rejected {
        reason: String,
    },
}
