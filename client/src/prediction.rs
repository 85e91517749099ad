//! Client-side prediction for the local snake.
//!
//! Every input sent to the server is also applied locally so the snake moves
//! immediately: a new head is pushed and the tail trimmed, exactly as the
//! authoritative step does. When a snapshot arrives, the predicted body is
//! rolled back onto the server's and the inputs the server has not yet
//! acknowledged are replayed on top. Replay does not record, so applying the
//! same snapshot twice settles on the same position.

use log::debug;
use shared::{
    advance_head, segment_target, PlayerInput, Vec2, BASE_SPEED, BOOST_SPEED, MIN_BOOST_LENGTH,
    SNAKE_SEGMENT_SPACING,
};

/// History is trimmed back to this many entries when it overflows.
const HISTORY_KEEP: usize = 60;
const HISTORY_CAP: usize = 120;

pub struct PredictionEngine {
    /// Head first; count always equals `ceil(length)` after a step.
    segments: Vec<Vec2>,
    direction: f32,
    length: f32,
    input_history: Vec<PlayerInput>,
}

impl PredictionEngine {
    pub fn new(spawn: Vec2, length: f32) -> Self {
        // Trailing segments start laid out behind the head, matching how
        // the server places a fresh spawn.
        let segments = (0..segment_target(length))
            .map(|index| Vec2 {
                x: spawn.x - index as f32 * SNAKE_SEGMENT_SPACING,
                y: spawn.y,
            })
            .collect();

        Self {
            segments,
            direction: 0.0,
            length,
            input_history: Vec::new(),
        }
    }

    /// Records the input and advances the predicted body one tick.
    pub fn apply_input(&mut self, input: PlayerInput) {
        self.input_history.push(input.clone());
        if self.input_history.len() > HISTORY_CAP {
            let excess = self.input_history.len() - HISTORY_KEEP;
            self.input_history.drain(0..excess);
            debug!("Trimmed prediction history to {} inputs", HISTORY_KEEP);
        }
        self.step(&input);
    }

    /// Rolls the prediction back onto the authoritative body and replays
    /// every input newer than the acknowledged sequence.
    pub fn reconcile(&mut self, server_segments: &[Vec2], server_length: f32, acked_sequence: u32) {
        self.input_history
            .retain(|input| input.sequence > acked_sequence);

        self.segments = server_segments.to_vec();
        self.length = server_length;

        let replay = self.input_history.clone();
        for input in &replay {
            self.step(input);
        }
    }

    fn step(&mut self, input: &PlayerInput) {
        self.direction = input.direction;
        let speed = if input.boost && self.length > MIN_BOOST_LENGTH {
            BOOST_SPEED
        } else {
            BASE_SPEED
        };
        let new_head = advance_head(self.head(), self.direction, speed);
        self.segments.insert(0, new_head);
        self.segments.truncate(segment_target(self.length));
    }

    pub fn head(&self) -> Vec2 {
        self.segments[0]
    }

    pub fn segments(&self) -> &[Vec2] {
        &self.segments
    }

    pub fn direction(&self) -> f32 {
        self.direction
    }

    pub fn pending_inputs(&self) -> usize {
        self.input_history.len()
    }

    pub fn clear(&mut self) {
        self.input_history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn input(sequence: u32, direction: f32, boost: bool) -> PlayerInput {
        PlayerInput {
            direction,
            boost,
            timestamp: sequence as u64 * 16,
            sequence,
        }
    }

    #[test]
    fn test_input_moves_head_at_base_speed() {
        let mut engine = PredictionEngine::new(Vec2::new(2500.0, 2500.0), 10.0);
        engine.apply_input(input(1, 0.0, false));

        assert_approx_eq!(engine.head().x, 2500.0 + BASE_SPEED, 1e-4);
        assert_approx_eq!(engine.head().y, 2500.0, 1e-4);
    }

    #[test]
    fn test_boost_speed_requires_spare_length() {
        let mut engine = PredictionEngine::new(Vec2::new(2500.0, 2500.0), 10.0);
        engine.apply_input(input(1, 0.0, true));
        assert_approx_eq!(engine.head().x, 2500.0 + BOOST_SPEED, 1e-4);

        // At minimum length boosting silently falls back to base speed.
        let mut short = PredictionEngine::new(Vec2::new(2500.0, 2500.0), MIN_BOOST_LENGTH);
        short.apply_input(input(1, 0.0, true));
        assert_approx_eq!(short.head().x, 2500.0 + BASE_SPEED, 1e-4);
    }

    #[test]
    fn test_predicted_body_holds_segment_target() {
        let mut engine = PredictionEngine::new(Vec2::new(2500.0, 2500.0), 10.0);
        assert_eq!(engine.segments().len(), segment_target(10.0));

        let before = engine.head();
        for seq in 1..=5 {
            engine.apply_input(input(seq, 0.0, false));
        }

        // Each step pushes a head and trims the tail back to the target.
        assert_eq!(engine.segments().len(), segment_target(10.0));
        assert_approx_eq!(engine.segments()[5].x, before.x, 1e-4);
    }

    #[test]
    fn test_reconcile_replays_unacknowledged_inputs() {
        let mut engine = PredictionEngine::new(Vec2::new(2500.0, 2500.0), 10.0);
        for seq in 1..=5 {
            engine.apply_input(input(seq, 0.0, false));
        }
        assert_eq!(engine.pending_inputs(), 5);

        // Server confirms through sequence 3 at its own position; inputs
        // 4 and 5 replay on top of it.
        engine.reconcile(&[Vec2::new(2510.0, 2500.0)], 10.0, 3);
        assert_eq!(engine.pending_inputs(), 2);
        assert_approx_eq!(engine.head().x, 2510.0 + 2.0 * BASE_SPEED, 1e-4);
    }

    #[test]
    fn test_reconcile_adopts_server_body() {
        let mut engine = PredictionEngine::new(Vec2::new(2500.0, 2500.0), 10.0);
        engine.apply_input(input(1, 0.0, false));

        let server_body = vec![
            Vec2::new(2510.0, 2500.0),
            Vec2::new(2498.0, 2500.0),
            Vec2::new(2486.0, 2500.0),
        ];
        engine.reconcile(&server_body, 10.0, 1);

        // Nothing left to replay, so the body is the server's verbatim.
        assert_eq!(engine.segments().len(), 3);
        assert_approx_eq!(engine.segments()[1].x, 2498.0, 1e-4);
        assert_approx_eq!(engine.segments()[2].x, 2486.0, 1e-4);
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let mut engine = PredictionEngine::new(Vec2::new(2500.0, 2500.0), 10.0);
        for seq in 1..=4 {
            engine.apply_input(input(seq, 1.0, false));
        }

        engine.reconcile(&[Vec2::new(2505.0, 2498.0)], 10.0, 2);
        let first = engine.head();
        engine.reconcile(&[Vec2::new(2505.0, 2498.0)], 10.0, 2);
        assert_approx_eq!(engine.head().x, first.x, 1e-5);
        assert_approx_eq!(engine.head().y, first.y, 1e-5);
    }

    #[test]
    fn test_everything_acked_snaps_to_server() {
        let mut engine = PredictionEngine::new(Vec2::new(2500.0, 2500.0), 10.0);
        for seq in 1..=3 {
            engine.apply_input(input(seq, 0.5, false));
        }

        engine.reconcile(&[Vec2::new(2400.0, 2400.0)], 12.0, 3);
        assert_eq!(engine.pending_inputs(), 0);
        assert_approx_eq!(engine.head().x, 2400.0, 1e-5);
        assert_approx_eq!(engine.head().y, 2400.0, 1e-5);
    }

    #[test]
    fn test_history_trimmed_after_overflow() {
        let mut engine = PredictionEngine::new(Vec2::new(2500.0, 2500.0), 10.0);
        for seq in 1..=(HISTORY_CAP as u32 + 1) {
            engine.apply_input(input(seq, 0.0, false));
        }

        assert_eq!(engine.pending_inputs(), HISTORY_KEEP);
        // The newest inputs survive the trim.
        assert!(engine
            .input_history
            .iter()
            .any(|i| i.sequence == HISTORY_CAP as u32 + 1));
    }

    #[test]
    fn test_prediction_clamped_to_map_bounds() {
        let mut engine =
            PredictionEngine::new(Vec2::new(shared::SNAKE_HEAD_RADIUS + 1.0, 2500.0), 10.0);
        for seq in 1..=10 {
            engine.apply_input(input(seq, std::f32::consts::PI, false));
        }
        assert!(engine.head().x >= shared::SNAKE_HEAD_RADIUS);
    }
}
