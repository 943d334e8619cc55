//! # Pong Sync Server Library
//!
//! This library provides the authoritative server for a two-player
//! ball-and-paddle game. It owns the single copy of the game state, consumes
//! client key events asynchronously, and streams a full snapshot to every
//! connected client on each simulation frame.
//!
//! ## Core Responsibilities
//!
//! ### Authoritative Simulation
//! Paddle positions, the ordered set of balls, the score pair and the live
//! power-up all live in one [`world::World`] value owned by the simulation
//! task. Clients never send positions, only key events.
//!
//! ### Session Management
//! Every accepted TCP stream becomes a [`session::Session`] with:
//! - An ordinal assigned at connect time, starting at 1 and never reused
//! - A writer owned exclusively by the session
//! - A reader task decoding frames into a bounded inbox (capacity 50)
//!
//! A full inbox blocks only that session's reader. Sessions leave the live
//! set on end of stream, on a read error, or when a write to them fails.
//!
//! ### State Broadcasting
//! Each frame the [`tick::TickBroadcaster`] resolves a pending power-up spawn
//! and sends `GAME_DATA,<ballCount>,<p1Y>,<p2Y>[,<x>,<y>]*` to everyone.
//! Collision outcomes (`SCORES`, `HIT_WALL_*`, `BALL_HIT_BAT*`, `POWER_UP`)
//! are broadcast as they happen.
//!
//! ## Architecture Design
//!
//! ### Single Writer
//! Only the simulation task mutates game state. The accept task and the
//! reader tasks talk to it through channels; the power-up timer talks to it
//! through one atomic flag. No lock guards the game state.
//!
//! ### Text Protocol
//! Messages are comma-separated ASCII. Frames are newline-terminated by
//! default; the undelimited legacy framing is available for old clients.
//! See the `pong_shared` crate for the message catalogue and codec.
//!
//! ### Collision Table
//! Reactions to collisions are plain functions looked up by the pair of
//! entity types involved, see [`collision`].
//!
//! ## Module Organization
//!
//! - `config`: runtime settings with defaults
//! - `session`, `session_manager`: per-client streams and the live set
//! - `network`: accept task, broadcast primitive and the simulation loop
//! - `dispatcher`, `input`: client tokens into key bindings
//! - `game`, `physics`, `collision`: arena state, motion and reactions
//! - `powerup`: spawn timer, random selection and ball-count effects
//! - `tick`: snapshot building and per-frame broadcast
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use pong_server::config::ServerConfig;
//! use pong_server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Listen on 0.0.0.0:55555 at 60 frames per second
//!     let server = Server::bind(ServerConfig::default()).await?;
//!
//!     // Runs until the process is stopped
//!     server.run().await?;
//!
//!     Ok(())
//! }
//! ```

pub mod collision;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod game;
pub mod input;
pub mod network;
pub mod physics;
pub mod powerup;
pub mod session;
pub mod session_manager;
pub mod tick;
pub mod world;

pub use config::ServerConfig;
pub use error::ServerError;
pub use network::{Connections, Server};
