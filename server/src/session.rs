//! Session tracking for connected players.
//!
//! Sessions are keyed by socket address, the only identity a datagram
//! carries. Each session pins the player to a room, tracks activity for
//! timeout cleanup, and enforces the per-session input rate limit.

use log::info;
use shared::INPUT_RATE_LIMIT_HZ;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Sessions silent this long are dropped.
pub const SESSION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
pub struct Session {
    pub addr: SocketAddr,
    pub player_id: u32,
    pub room_id: u32,
    pub last_seen: Instant,
    /// Arrival times of inputs inside the current one-second window.
    input_times: VecDeque<Instant>,
}

impl Session {
    pub fn new(addr: SocketAddr, player_id: u32, room_id: u32, now: Instant) -> Self {
        Self {
            addr,
            player_id,
            room_id,
            last_seen: now,
            input_times: VecDeque::new(),
        }
    }

    /// Sliding-window rate check. Accepts and records the input when the
    /// session is under the per-second cap, rejects it otherwise.
    pub fn allow_input(&mut self, now: Instant) -> bool {
        let window = Duration::from_secs(1);
        while self
            .input_times
            .front()
            .is_some_and(|t| now.duration_since(*t) > window)
        {
            self.input_times.pop_front();
        }
        if self.input_times.len() >= INPUT_RATE_LIMIT_HZ as usize {
            return false;
        }
        self.input_times.push_back(now);
        true
    }

    pub fn is_timed_out(&self, now: Instant) -> bool {
        now.duration_since(self.last_seen) > SESSION_TIMEOUT
    }
}

/// All live sessions, indexed by socket address.
pub struct SessionTable {
    sessions: HashMap<SocketAddr, Session>,
}

impl SessionTable {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
        }
    }

    pub fn insert(&mut self, addr: SocketAddr, player_id: u32, room_id: u32, now: Instant) {
        info!("Session opened for player {} at {}", player_id, addr);
        self.sessions
            .insert(addr, Session::new(addr, player_id, room_id, now));
    }

    pub fn remove(&mut self, addr: &SocketAddr) -> Option<Session> {
        let session = self.sessions.remove(addr);
        if let Some(session) = &session {
            info!("Session closed for player {}", session.player_id);
        }
        session
    }

    pub fn get(&self, addr: &SocketAddr) -> Option<&Session> {
        self.sessions.get(addr)
    }

    pub fn get_mut(&mut self, addr: &SocketAddr) -> Option<&mut Session> {
        self.sessions.get_mut(addr)
    }

    pub fn touch(&mut self, addr: &SocketAddr, now: Instant) {
        if let Some(session) = self.sessions.get_mut(addr) {
            session.last_seen = now;
        }
    }

    /// Removes every timed-out session and returns them for room cleanup.
    pub fn check_timeouts(&mut self, now: Instant) -> Vec<Session> {
        let stale: Vec<SocketAddr> = self
            .sessions
            .values()
            .filter(|session| session.is_timed_out(now))
            .map(|session| session.addr)
            .collect();

        stale
            .iter()
            .filter_map(|addr| {
                info!("Session at {} timed out", addr);
                self.sessions.remove(addr)
            })
            .collect()
    }

    /// Delivery list for a room broadcast.
    pub fn addrs_in_room(&self, room_id: u32) -> Vec<SocketAddr> {
        self.sessions
            .values()
            .filter(|session| session.room_id == room_id)
            .map(|session| session.addr)
            .collect()
    }

    pub fn addr_of_player(&self, player_id: u32) -> Option<SocketAddr> {
        self.sessions
            .values()
            .find(|session| session.player_id == player_id)
            .map(|session| session.addr)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionTable {
    fn default() -> Self {
        Self::new()
    }
}
