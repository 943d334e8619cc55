use crate::error::ServerError;
use crate::powerup::DEFAULT_RESPAWN_DELAY;
use pong_shared::{
    Framing, ARENA_HEIGHT, ARENA_WIDTH, DEFAULT_PORT, PADDLE_HEIGHT, POWER_UP_SIZE,
};
use std::time::Duration;

/// Capacity of each session's inbound queue.
pub const DEFAULT_INBOX_CAPACITY: usize = 50;
pub const DEFAULT_TICK_RATE: u32 = 60;

/// Runtime settings for [`crate::network::Server`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Simulation frames per second.
    pub tick_rate: u32,
    pub power_up_delay: Duration,
    pub inbox_capacity: usize,
    pub arena_width: u32,
    pub arena_height: u32,
    pub framing: Framing,
}

impl ServerConfig {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn tick_duration(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.tick_rate.max(1) as f64)
    }

    /// Rejects settings the simulation cannot run with: an arena smaller
    /// than a power-up or shorter than a paddle, or a tick too short to
    /// schedule.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.arena_width < POWER_UP_SIZE || self.arena_height < POWER_UP_SIZE {
            return Err(ServerError::InvalidConfig(format!(
                "arena {}x{} is smaller than a {}px power-up",
                self.arena_width, self.arena_height, POWER_UP_SIZE
            )));
        }
        if self.arena_height < PADDLE_HEIGHT {
            return Err(ServerError::InvalidConfig(format!(
                "arena height {} is below the paddle height {}",
                self.arena_height, PADDLE_HEIGHT
            )));
        }
        if self.tick_duration().is_zero() {
            return Err(ServerError::InvalidConfig(format!(
                "tick rate {} is too high to schedule",
                self.tick_rate
            )));
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            tick_rate: DEFAULT_TICK_RATE,
            power_up_delay: DEFAULT_RESPAWN_DELAY,
            inbox_capacity: DEFAULT_INBOX_CAPACITY,
            arena_width: ARENA_WIDTH,
            arena_height: ARENA_HEIGHT,
            framing: Framing::Newline,
        }
    }
}
