//! Room simulation and the registry that owns every room.
//!
//! A room is a self-contained arena: its snakes, its food field, its bots,
//! and its leaderboard. The registry places joining players, hands out
//! entity ids from a single allocator shared by players and bots, and
//! destroys rooms once the last human leaves.

use crate::bots::BotDriver;
use crate::collision::resolve_collisions;
use crate::food::FoodField;
use crate::leaderboard::Leaderboard;
use crate::snake::SnakeDirectory;
use crate::utils::get_timestamp;
use log::info;
use shared::{
    DeathStats, GameSnapshot, PlayerInput, RoomInfo, Vec2, BROADCAST_EVERY_N_TICKS,
    MAX_PLAYERS_PER_ROOM, SERVER_TICK_RATE,
};
use std::collections::{HashMap, HashSet};
use std::time::Instant;

const TICK_DT: f32 = 1.0 / SERVER_TICK_RATE as f32;

/// Outcome of a tick that the transport layer must deliver.
#[derive(Debug)]
pub enum RoomEvent {
    /// Broadcast to every session in the room.
    Snapshot(GameSnapshot),
    /// Sent only to the eliminated player's session.
    Death(DeathStats),
}

pub struct Room {
    pub id: u32,
    snakes: SnakeDirectory,
    food: FoodField,
    bots: BotDriver,
    leaderboard: Leaderboard,
    tick_count: u64,
    /// Human sessions assigned to this room. Elimination does not clear a
    /// slot; only leaving does, so a dead player can keep spectating.
    occupants: HashSet<u32>,
}

impl Room {
    pub fn new(id: u32, now: Instant) -> Self {
        let mut food = FoodField::new(now);
        food.initialize();
        Self {
            id,
            snakes: SnakeDirectory::new(),
            food,
            bots: BotDriver::new(now),
            leaderboard: Leaderboard::new(now),
            tick_count: 0,
            occupants: HashSet::new(),
        }
    }

    pub fn add_player(&mut self, player_id: u32, name: &str, skin: &str) -> Vec2 {
        self.occupants.insert(player_id);
        self.snakes.spawn(player_id, name, skin)
    }

    /// Clears the player's slot and, if still alive, their snake.
    pub fn remove_player(&mut self, player_id: u32) {
        self.occupants.remove(&player_id);
        self.snakes.remove(player_id);
    }

    pub fn queue_input(&mut self, player_id: u32, input: PlayerInput) {
        self.snakes.queue_input(player_id, input);
    }

    pub fn player_count(&self) -> usize {
        self.occupants.len()
    }

    pub fn is_full(&self) -> bool {
        self.occupants.len() >= MAX_PLAYERS_PER_ROOM
    }

    pub fn is_empty(&self) -> bool {
        self.occupants.is_empty()
    }

    pub fn has_player(&self, player_id: u32) -> bool {
        self.occupants.contains(&player_id)
    }

    pub fn snake_alive(&self, player_id: u32) -> bool {
        self.snakes.contains(player_id)
    }

    /// Advances the simulation one step. Order matters: bot decisions and
    /// food respawns land before motion, collisions resolve after every
    /// snake has moved, and eliminations convert bodies to trail food
    /// before the snapshot is assembled.
    pub fn tick(&mut self, now: Instant, next_entity_id: &mut u32) -> Vec<RoomEvent> {
        self.tick_count += 1;
        let mut events = Vec::new();

        self.bots.update(&mut self.snakes, now, next_entity_id);
        self.food.update(now);
        self.snakes.step_all(TICK_DT);

        for death in resolve_collisions(&mut self.snakes, &mut self.food, now) {
            if let Some(snake) = self.snakes.remove(death.player_id) {
                self.food.drop_trail(&snake.segments);
                info!(
                    "Snake {} eliminated in room {} (rank {})",
                    death.player_id, self.id, death.rank
                );
            }
            if self.occupants.contains(&death.player_id) {
                events.push(RoomEvent::Death(death));
            }
        }

        self.leaderboard.update(&self.snakes, now);

        if self.tick_count % BROADCAST_EVERY_N_TICKS == 0 {
            events.push(RoomEvent::Snapshot(GameSnapshot {
                tick: self.tick_count,
                timestamp: get_timestamp(),
                snakes: self.snakes.states(),
                food: self.food.all(),
                leaderboard: self.leaderboard.entries().to_vec(),
            }));
        }

        events
    }
}

/// Owns every live room plus the id allocators behind players, bots,
/// and rooms themselves.
pub struct RoomRegistry {
    rooms: HashMap<u32, Room>,
    next_room_id: u32,
    next_entity_id: u32,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: HashMap::new(),
            next_room_id: 1,
            next_entity_id: 1,
        }
    }

    /// Places the player in the first room with a free slot, creating a
    /// room when none has one. Returns (player id, room id, spawn point).
    pub fn join(&mut self, name: &str, skin: &str, now: Instant) -> (u32, u32, Vec2) {
        let room_id = match self
            .rooms
            .values()
            .filter(|room| !room.is_full())
            .map(|room| room.id)
            .min()
        {
            Some(id) => id,
            None => self.create_room(now),
        };

        let player_id = self.next_entity_id;
        self.next_entity_id += 1;

        let room = self
            .rooms
            .get_mut(&room_id)
            .expect("joined room exists");
        let spawn = room.add_player(player_id, name, skin);
        info!(
            "Player {} ({}) joined room {} ({}/{})",
            player_id,
            name,
            room_id,
            room.player_count(),
            MAX_PLAYERS_PER_ROOM
        );
        (player_id, room_id, spawn)
    }

    fn create_room(&mut self, now: Instant) -> u32 {
        let room_id = self.next_room_id;
        self.next_room_id += 1;
        self.rooms.insert(room_id, Room::new(room_id, now));
        info!("Created room {}", room_id);
        room_id
    }

    /// Removes the player and destroys the room if no humans remain.
    /// Returns true when the room was destroyed.
    pub fn leave(&mut self, room_id: u32, player_id: u32) -> bool {
        let Some(room) = self.rooms.get_mut(&room_id) else {
            return false;
        };
        room.remove_player(player_id);
        if room.is_empty() {
            self.rooms.remove(&room_id);
            info!("Destroyed empty room {}", room_id);
            true
        } else {
            false
        }
    }

    pub fn queue_input(&mut self, room_id: u32, player_id: u32, input: PlayerInput) {
        if let Some(room) = self.rooms.get_mut(&room_id) {
            room.queue_input(player_id, input);
        }
    }

    pub fn tick_room(&mut self, room_id: u32, now: Instant) -> Vec<RoomEvent> {
        let next_entity_id = &mut self.next_entity_id;
        match self.rooms.get_mut(&room_id) {
            Some(room) => room.tick(now, next_entity_id),
            None => Vec::new(),
        }
    }

    pub fn get(&self, room_id: u32) -> Option<&Room> {
        self.rooms.get(&room_id)
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn room_list(&self) -> Vec<RoomInfo> {
        let mut list: Vec<RoomInfo> = self
            .rooms
            .values()
            .map(|room| RoomInfo {
                room_id: room.id,
                player_count: room.player_count(),
                max_players: MAX_PLAYERS_PER_ROOM,
            })
            .collect();
        list.sort_by_key(|info| info.room_id);
        list
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
