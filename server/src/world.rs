use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::game::GameState;
use crate::powerup::PowerUpLifecycle;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

/// Everything the simulation task owns: the match, the power-up lifecycle
/// and the random source both draw from.
///
/// Collision handlers receive `&mut World`, so all mutation stays on the
/// simulation task.
#[derive(Debug)]
pub struct World {
    pub state: GameState,
    pub power_ups: PowerUpLifecycle,
    pub rng: StdRng,
}

impl World {
    /// Creates a world with one ball already in play.
    pub fn new(config: &ServerConfig) -> Self {
        Self::with_rng(
            config.arena_width,
            config.arena_height,
            config.power_up_delay,
            StdRng::from_entropy(),
        )
    }

    pub fn with_rng(width: u32, height: u32, power_up_delay: Duration, mut rng: StdRng) -> Self {
        let mut state = GameState::new(width, height);
        state.spawn_ball(&mut rng);

        Self {
            state,
            power_ups: PowerUpLifecycle::new(power_up_delay),
            rng,
        }
    }

    /// Arms the first power-up timer. Must be called from within the runtime.
    pub fn start(&mut self) -> Result<(), ServerError> {
        self.power_ups.start_timer()
    }
}
