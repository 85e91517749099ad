//! # Arena Client Library
//!
//! Client-side state management for the snake arena: local prediction for
//! the player's own snake and snapshot smoothing for everyone else's. The
//! library holds no socket or render loop of its own; a frontend feeds it
//! inputs and server packets and reads back positions to draw.
//!
//! ## Architecture Overview
//!
//! ### Client-Side Prediction
//! The local snake's head moves the moment an input is produced, using the
//! same movement rules the server applies. Latency never delays steering
//! feedback.
//!
//! ### Server Reconciliation
//! Each authoritative snapshot carries the last input sequence the server
//! processed. The predicted head is rolled back onto the server's position
//! and unacknowledged inputs are replayed, so prediction errors are corrected
//! without visible snapping under normal conditions.
//!
//! ### Snapshot Interpolation
//! Remote snakes ease toward their latest snapshot with a fixed blend per
//! frame, and extrapolate briefly along their last heading when snapshots
//! go stale.
//!
//! ## Module Organization
//!
//! - [`prediction`]: input history, local head simulation, reconciliation
//! - [`interpolation`]: remote snake smoothing and extrapolation

pub mod interpolation;
pub mod prediction;
