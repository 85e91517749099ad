//! Top-ten ranking, recomputed at most once per second and cached between
//! refreshes so every snapshot in the interval carries the same entries.

use crate::snake::SnakeDirectory;
use shared::{LeaderboardEntry, LEADERBOARD_SIZE, LEADERBOARD_THROTTLE_MS};
use std::time::{Duration, Instant};

pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
    next_refresh_at: Instant,
}

impl Leaderboard {
    pub fn new(now: Instant) -> Self {
        Self {
            entries: Vec::new(),
            next_refresh_at: now,
        }
    }

    /// Refreshes the cached ranking if the throttle window has elapsed.
    pub fn update(&mut self, snakes: &SnakeDirectory, now: Instant) {
        if now < self.next_refresh_at {
            return;
        }
        self.next_refresh_at = now + Duration::from_millis(LEADERBOARD_THROTTLE_MS);

        let mut ranked = snakes.states();
        ranked.sort_by(|a, b| b.length.total_cmp(&a.length));
        ranked.truncate(LEADERBOARD_SIZE);

        self.entries = ranked
            .into_iter()
            .enumerate()
            .map(|(idx, state)| LeaderboardEntry {
                id: state.id,
                name: state.name,
                length: state.length.ceil() as u32,
                kills: state.kills,
                rank: idx as u32 + 1,
            })
            .collect();
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }
}
