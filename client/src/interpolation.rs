//! Smoothing for remote snakes between snapshots.
//!
//! Snapshots arrive at a third of the tick rate, so remote snakes are eased
//! toward their latest known state with a fixed blend per frame instead of
//! teleporting. When snapshots go stale the display switches to projecting
//! the head forward along its last heading so the snake does not freeze
//! mid-screen.

use shared::{
    SnakeState, Vec2, EXTRAPOLATION_THRESHOLD_MS, INTERPOLATION_LERP, SERVER_TICK_RATE,
};
use std::collections::HashMap;
use std::time::Instant;

struct RemoteSnake {
    /// Displayed segment positions, eased toward the target each frame.
    current: Vec<Vec2>,
    target: SnakeState,
    last_update: Instant,
}

/// Per-snake interpolation state, keyed by entity id.
pub struct Interpolator {
    snakes: HashMap<u32, RemoteSnake>,
}

impl Interpolator {
    pub fn new() -> Self {
        Self {
            snakes: HashMap::new(),
        }
    }

    /// Feeds a fresh authoritative state for one snake. A snake seen for the
    /// first time starts exactly at its target.
    pub fn update_target(&mut self, state: SnakeState, now: Instant) {
        match self.snakes.get_mut(&state.id) {
            Some(remote) => {
                remote.target = state;
                remote.last_update = now;
            }
            None => {
                self.snakes.insert(
                    state.id,
                    RemoteSnake {
                        current: state.segments.clone(),
                        target: state,
                        last_update: now,
                    },
                );
            }
        }
    }

    /// Advances one snake's displayed segments a single blend step toward
    /// its target and returns them, head first. Returns None for an unknown
    /// snake.
    pub fn sample(&mut self, id: u32, now: Instant) -> Option<Vec<Vec2>> {
        let remote = self.snakes.get_mut(&id)?;

        // Stale target: switch to extrapolation. The head is projected
        // forward along its last heading, the trailing segments hold their
        // last known positions, and the blend state is left untouched so a
        // fresh snapshot resumes from where the display actually was.
        let age_ms = now.duration_since(remote.last_update).as_millis() as u64;
        if age_ms > EXTRAPOLATION_THRESHOLD_MS {
            let mut projected = remote.target.segments.clone();
            if let Some(head) = projected.first_mut() {
                let elapsed = age_ms as f32 / 1000.0;
                let travel = remote.target.speed * SERVER_TICK_RATE as f32 * elapsed;
                head.x += remote.target.direction.cos() * travel;
                head.y += remote.target.direction.sin() * travel;
            }
            return Some(projected);
        }

        let goal = &remote.target.segments;

        // Grown or shrunk bodies snap their extra segments to the target.
        remote.current.resize(goal.len(), *goal.last()?);

        for (current, goal) in remote.current.iter_mut().zip(goal.iter()) {
            current.x += (goal.x - current.x) * INTERPOLATION_LERP;
            current.y += (goal.y - current.y) * INTERPOLATION_LERP;
        }

        Some(remote.current.clone())
    }

    pub fn remove(&mut self, id: u32) {
        self.snakes.remove(&id);
    }

    pub fn clear(&mut self) {
        self.snakes.clear();
    }

    pub fn tracked(&self) -> usize {
        self.snakes.len()
    }
}

impl Default for Interpolator {
    fn default() -> Self {
        Self::new()
    }
}
