//! Power-up lifecycle: timed spawning, random selection and ball-count effects.
//!
//! ```text
//!   Idle ──start_timer──→ Armed ──timer fires + next tick──→ Spawned
//!    ↑                                                          │
//!    └──────────── ball collides (effect applied) ──────────────┘
//!                  and the timer is re-armed straight away
//! ```
//!
//! Only the simulation task touches [`PowerUpLifecycle`]. The timer task only
//! raises the shared `pending` flag; the next tick consumes it.

use crate::error::ServerError;
use crate::game::GameState;
use log::{debug, info, warn};
use pong_shared::{PowerUpDescriptor, PowerUpKind, MAX_BALLS, MIN_BALLS, POWER_UP_SIZE};
use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

pub const DEFAULT_RESPAWN_DELAY: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Idle,
    Armed,
    Spawned,
}

/// A power-up currently live in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerUp {
    pub kind: PowerUpKind,
    pub x: u32,
    pub y: u32,
}

impl PowerUp {
    pub fn descriptor(&self) -> PowerUpDescriptor {
        PowerUpDescriptor::new(self.x, self.y, self.kind)
    }

    pub fn get_bounds(&self) -> (f64, f64, f64, f64) {
        let size = POWER_UP_SIZE as f64;
        let (x, y) = (self.x as f64, self.y as f64);
        (x, y, x + size, y + size)
    }
}

/// Single-shot spawn timer.
///
/// Each call to [`start_timer`](Self::start_timer) spawns a task that sleeps
/// for the respawn delay and then raises the pending flag. Armed timers are
/// never cancelled.
#[derive(Debug, Clone)]
pub struct PowerUpSpawner {
    delay: Duration,
    pending: Arc<AtomicBool>,
}

impl PowerUpSpawner {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn start_timer(&self) -> Result<JoinHandle<()>, ServerError> {
        let handle = Handle::try_current()?;
        let pending = Arc::clone(&self.pending);
        let delay = self.delay;

        Ok(handle.spawn(async move {
            tokio::time::sleep(delay).await;
            pending.store(true, Ordering::Release);
        }))
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    /// Clears the flag, returning whether it was set.
    pub fn take_pending(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }
}

/// Ball count a power-up of `kind` leaves behind, given `current` balls.
pub fn target_ball_count(kind: PowerUpKind, current: usize) -> usize {
    match kind {
        PowerUpKind::PlusOne if current < MAX_BALLS => current + 1,
        PowerUpKind::MinusOne if current > MIN_BALLS => current - 1,
        PowerUpKind::PlusOne | PowerUpKind::MinusOne => current,
        PowerUpKind::Half => current.div_ceil(2).max(MIN_BALLS),
        PowerUpKind::Double => (current * 2).min(MAX_BALLS),
    }
}

/// Spawns or despawns balls one at a time until the target is reached.
/// Returns the new ball count.
pub fn apply_effect<R: Rng>(kind: PowerUpKind, state: &mut GameState, rng: &mut R) -> usize {
    let target = target_ball_count(kind, state.ball_count());

    while state.ball_count() > target {
        if state.despawn_ball().is_none() {
            break;
        }
    }
    while state.ball_count() < target {
        state.spawn_ball(rng);
    }

    state.ball_count()
}

#[derive(Debug)]
pub struct PowerUpLifecycle {
    spawner: PowerUpSpawner,
    state: LifecycleState,
    live: Option<PowerUp>,
}

impl PowerUpLifecycle {
    pub fn new(delay: Duration) -> Self {
        Self {
            spawner: PowerUpSpawner::new(delay),
            state: LifecycleState::Idle,
            live: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn live(&self) -> Option<&PowerUp> {
        self.live.as_ref()
    }

    pub fn spawner(&self) -> &PowerUpSpawner {
        &self.spawner
    }

    /// Current descriptor as sent on the wire; neutral when nothing is live.
    pub fn descriptor(&self) -> PowerUpDescriptor {
        self.live
            .map(|power_up| power_up.descriptor())
            .unwrap_or(PowerUpDescriptor::NONE)
    }

    /// Arms the spawn timer. Does nothing unless the lifecycle is idle.
    pub fn start_timer(&mut self) -> Result<(), ServerError> {
        if self.state != LifecycleState::Idle {
            debug!("Power-up timer already running ({:?})", self.state);
            return Ok(());
        }
        self.spawner.start_timer()?;
        self.state = LifecycleState::Armed;
        debug!("Power-up timer armed for {:?}", self.spawner.delay());
        Ok(())
    }

    /// Spawns a power-up if the timer has fired since the last call.
    ///
    /// The kind is uniform over the four kinds and the position uniform over
    /// `[0, width-45] x [0, height-45]`.
    pub fn resolve_pending<R: Rng>(
        &mut self,
        width: u32,
        height: u32,
        rng: &mut R,
    ) -> Option<PowerUpDescriptor> {
        if !self.spawner.take_pending() {
            return None;
        }
        if self.state != LifecycleState::Armed {
            warn!("Spawn timer fired while {:?}, ignoring", self.state);
            return None;
        }

        let kind = PowerUpKind::ALL[rng.gen_range(0..PowerUpKind::ALL.len())];
        let power_up = PowerUp {
            kind,
            x: rng.gen_range(0..=width.saturating_sub(POWER_UP_SIZE)),
            y: rng.gen_range(0..=height.saturating_sub(POWER_UP_SIZE)),
        };

        info!(
            "Spawned {:?} power-up at ({}, {})",
            kind, power_up.x, power_up.y
        );
        self.live = Some(power_up);
        self.state = LifecycleState::Spawned;
        Some(power_up.descriptor())
    }

    /// Applies the live power-up's effect after a ball touched it, removes
    /// it and re-arms the timer. Returns the neutral descriptor to broadcast,
    /// or `None` if no power-up of that kind was live.
    pub fn consume<R: Rng>(
        &mut self,
        kind: PowerUpKind,
        game: &mut GameState,
        rng: &mut R,
    ) -> Result<Option<PowerUpDescriptor>, ServerError> {
        match self.live {
            Some(power_up) if power_up.kind == kind => {}
            _ => {
                debug!("No live {:?} power-up to consume", kind);
                return Ok(None);
            }
        }

        let before = game.ball_count();
        let after = apply_effect(kind, game, rng);
        info!("{:?} power-up consumed: {} -> {} balls", kind, before, after);

        self.live = None;
        self.state = LifecycleState::Idle;
        self.start_timer()?;
        Ok(Some(PowerUpDescriptor::NONE))
    }

    #[cfg(test)]
    pub(crate) fn spawn_now(&mut self, power_up: PowerUp) {
        self.live = Some(power_up);
        self.state = LifecycleState::Spawned;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn state_with_balls(count: usize, rng: &mut StdRng) -> GameState {
        let mut state = GameState::default();
        for _ in 0..count {
            state.spawn_ball(rng);
        }
        state
    }

    #[test]
    fn test_double_targets() {
        for c in 1..=10 {
            assert_eq!(target_ball_count(PowerUpKind::Double, c), (c * 2).min(10));
        }
    }

    #[test]
    fn test_half_targets() {
        for c in 1..=10 {
            let expected = ((c + 1) / 2).max(1);
            assert_eq!(target_ball_count(PowerUpKind::Half, c), expected);
        }
        assert_eq!(target_ball_count(PowerUpKind::Half, 3), 2);
        assert_eq!(target_ball_count(PowerUpKind::Half, 1), 1);
    }

    #[test]
    fn test_plus_minus_clamps() {
        assert_eq!(target_ball_count(PowerUpKind::PlusOne, 10), 10);
        assert_eq!(target_ball_count(PowerUpKind::PlusOne, 4), 5);
        assert_eq!(target_ball_count(PowerUpKind::MinusOne, 1), 1);
        assert_eq!(target_ball_count(PowerUpKind::MinusOne, 4), 3);
    }

    #[test]
    fn test_apply_effect_all_counts() {
        let mut rng = StdRng::seed_from_u64(42);
        for kind in PowerUpKind::ALL {
            for c in 1..=10 {
                let mut state = state_with_balls(c, &mut rng);
                let result = apply_effect(kind, &mut state, &mut rng);
                assert_eq!(result, target_ball_count(kind, c), "{:?} from {}", kind, c);
                assert_eq!(state.ball_count(), state.balls().len());
            }
        }
    }

    #[test]
    fn test_half_keeps_oldest_balls() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut state = state_with_balls(5, &mut rng);
        let oldest: Vec<_> = state.balls()[..3].to_vec();

        apply_effect(PowerUpKind::Half, &mut state, &mut rng);

        assert_eq!(state.balls(), oldest.as_slice());
    }

    #[test]
    fn test_double_appends_after_existing() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut state = state_with_balls(2, &mut rng);
        let existing: Vec<_> = state.balls().to_vec();

        apply_effect(PowerUpKind::Double, &mut state, &mut rng);

        assert_eq!(state.ball_count(), 4);
        assert_eq!(&state.balls()[..2], existing.as_slice());
    }

    #[test]
    fn test_power_up_bounds() {
        let power_up = PowerUp {
            kind: PowerUpKind::Half,
            x: 10,
            y: 20,
        };
        assert_eq!(power_up.get_bounds(), (10.0, 20.0, 55.0, 65.0));
        assert_eq!(power_up.descriptor().code(), 2);
    }

    #[test]
    fn test_start_timer_requires_runtime() {
        let mut lifecycle = PowerUpLifecycle::new(Duration::from_millis(10));
        assert!(lifecycle.start_timer().is_err());
        assert_eq!(lifecycle.state(), LifecycleState::Idle);
    }

    #[tokio::test]
    async fn test_lifecycle_spawn_and_consume() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut game = state_with_balls(4, &mut rng);
        let mut lifecycle = PowerUpLifecycle::new(Duration::from_millis(10));

        assert_eq!(lifecycle.resolve_pending(800, 600, &mut rng), None);

        lifecycle.start_timer().unwrap();
        assert_eq!(lifecycle.state(), LifecycleState::Armed);
        assert_eq!(lifecycle.descriptor(), PowerUpDescriptor::NONE);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(lifecycle.spawner().is_pending());

        let descriptor = lifecycle.resolve_pending(800, 600, &mut rng).unwrap();
        assert_eq!(lifecycle.state(), LifecycleState::Spawned);
        assert!(descriptor.x <= 755);
        assert!(descriptor.y <= 555);
        assert_eq!(lifecycle.descriptor(), descriptor);

        // At most one spawn per timer fire.
        assert_eq!(lifecycle.resolve_pending(800, 600, &mut rng), None);

        let kind = descriptor.kind.unwrap();
        let result = lifecycle.consume(kind, &mut game, &mut rng).unwrap();
        assert_eq!(result, Some(PowerUpDescriptor::NONE));
        assert_eq!(game.ball_count(), target_ball_count(kind, 4));
        assert_eq!(lifecycle.state(), LifecycleState::Armed);
        assert!(lifecycle.live().is_none());
    }

    #[tokio::test]
    async fn test_consume_without_live_power_up() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut game = state_with_balls(3, &mut rng);
        let mut lifecycle = PowerUpLifecycle::new(Duration::from_secs(60));

        let result = lifecycle
            .consume(PowerUpKind::Double, &mut game, &mut rng)
            .unwrap();

        assert_eq!(result, None);
        assert_eq!(game.ball_count(), 3);
        assert_eq!(lifecycle.state(), LifecycleState::Idle);
    }

    #[tokio::test]
    async fn test_double_start_is_ignored() {
        let mut lifecycle = PowerUpLifecycle::new(Duration::from_secs(60));
        lifecycle.start_timer().unwrap();
        lifecycle.start_timer().unwrap();
        assert_eq!(lifecycle.state(), LifecycleState::Armed);
    }
}
