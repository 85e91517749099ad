//! # Arena Server Library
//!
//! Authoritative server for the multiplayer snake arena. The server owns the
//! only real copy of every arena: it advances each room's simulation at a
//! fixed tick rate, applies player inputs, resolves collisions, and streams
//! state snapshots back to clients for reconciliation and interpolation.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! All movement, growth, collision, and elimination decisions are made here.
//! Clients predict locally but always conform to the snapshots the server
//! broadcasts.
//!
//! ### Room Management
//! Players are placed into rooms by the registry, each room an independent
//! arena with its own snakes, food field, bots, and leaderboard. Rooms are
//! created on demand and destroyed when the last human leaves.
//!
//! ### Session Handling
//! UDP gives the server no connections, so sessions are tracked by socket
//! address: join/leave lifecycle, inactivity timeouts, and per-session input
//! rate limiting all live in the session table.
//!
//! ## Architecture
//!
//! The server runs a single-threaded event loop fed by async tasks:
//! - **Network Receiver**: listens for incoming datagrams
//! - **Network Sender**: drains the outbound queue, including room broadcasts
//! - **Timeout Checker**: sweeps silent sessions once per second
//! - **Room Tickers**: one fixed-rate task per live room driving simulation
//!
//! All state mutation happens on the main loop, so the simulation stays
//! deterministic with respect to message arrival order.
//!
//! ## Module Organization
//!
//! - [`snake`]: snake motion, growth, boost drain, and the per-room directory
//! - [`food`]: food spawning, respawn scheduling, bonus items, trail drops
//! - [`collision`]: the per-tick collision and elimination pass
//! - [`bots`]: AI-driven snakes that fill out low-population rooms
//! - [`leaderboard`]: throttled top-ten ranking
//! - [`room`]: room simulation loop and the registry that owns all rooms
//! - [`session`]: address-keyed session table with rate limiting
//! - [`network`]: UDP transport, packet dispatch, and room tickers
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut server = Server::new(
//!         "127.0.0.1:9000",
//!         Duration::from_millis(16), // 60Hz tick
//!     ).await?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod bots;
pub mod collision;
pub mod food;
pub mod leaderboard;
pub mod network;
pub mod room;
pub mod session;
pub mod snake;
pub mod utils;
