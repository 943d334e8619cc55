use log::debug;
use pong_shared::{ARENA_HEIGHT, ARENA_WIDTH, BALL_SIZE, PADDLE_HEIGHT, PADDLE_WIDTH};
use rand::Rng;

/// Vertical paddle speed in pixels per second.
pub const PADDLE_SPEED: f64 = 420.0;
/// Horizontal and vertical launch speed of a new ball.
pub const BALL_SPEED_X: f64 = 240.0;
pub const BALL_SPEED_Y: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ball {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
}

impl Ball {
    pub fn new(x: f64, y: f64, vel_x: f64, vel_y: f64) -> Self {
        Self { x, y, vel_x, vel_y }
    }

    pub fn get_bounds(&self) -> (f64, f64, f64, f64) {
        let size = BALL_SIZE as f64;
        (self.x, self.y, self.x + size, self.y + size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paddle {
    pub x: f64,
    pub y: f64,
    pub vel_y: f64,
}

impl Paddle {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y, vel_y: 0.0 }
    }

    pub fn up(&mut self) {
        self.vel_y = -PADDLE_SPEED;
    }

    pub fn down(&mut self) {
        self.vel_y = PADDLE_SPEED;
    }

    pub fn stop(&mut self) {
        self.vel_y = 0.0;
    }

    pub fn get_bounds(&self) -> (f64, f64, f64, f64) {
        (
            self.x,
            self.y,
            self.x + PADDLE_WIDTH as f64,
            self.y + PADDLE_HEIGHT as f64,
        )
    }
}

/// The single authoritative copy of the match.
///
/// Balls are kept in insertion order because clients index them by
/// position in the snapshot. Removal is always from the back.
#[derive(Debug, Clone)]
pub struct GameState {
    pub player1: Paddle,
    pub player2: Paddle,
    scores: (u32, u32),
    balls: Vec<Ball>,
    width: u32,
    height: u32,
}

impl GameState {
    pub fn new(width: u32, height: u32) -> Self {
        let paddle_y = height as f64 / 2.0 - PADDLE_HEIGHT as f64 / 2.0;
        Self {
            player1: Paddle::new(width as f64 / 4.0, paddle_y),
            player2: Paddle::new(3.0 * width as f64 / 4.0 - PADDLE_WIDTH as f64, paddle_y),
            scores: (0, 0),
            balls: Vec::new(),
            width,
            height,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn ball_count(&self) -> usize {
        self.balls.len()
    }

    pub fn balls(&self) -> &[Ball] {
        &self.balls
    }

    pub fn balls_mut(&mut self) -> &mut [Ball] {
        &mut self.balls
    }

    /// Positions of every ball in snapshot order.
    pub fn ball_positions(&self) -> Vec<(f64, f64)> {
        self.balls.iter().map(|b| (b.x, b.y)).collect()
    }

    pub fn scores(&self) -> (u32, u32) {
        self.scores
    }

    pub fn score_player1(&mut self) {
        self.scores.0 += 1;
    }

    pub fn score_player2(&mut self) {
        self.scores.1 += 1;
    }

    pub fn paddle_mut(&mut self, number: u8) -> Option<&mut Paddle> {
        match number {
            1 => Some(&mut self.player1),
            2 => Some(&mut self.player2),
            _ => None,
        }
    }

    /// Appends a ball at a random position with a random diagonal heading.
    pub fn spawn_ball<R: Rng>(&mut self, rng: &mut R) -> Ball {
        let x = rng.gen_range(0..=self.width.saturating_sub(BALL_SIZE)) as f64;
        let y = rng.gen_range(0..=self.height.saturating_sub(BALL_SIZE)) as f64;
        let vel_x = if rng.gen_bool(0.5) { BALL_SPEED_X } else { -BALL_SPEED_X };
        let vel_y = if rng.gen_bool(0.5) { BALL_SPEED_Y } else { -BALL_SPEED_Y };

        let ball = Ball::new(x, y, vel_x, vel_y);
        self.balls.push(ball);
        debug!("Spawned ball {} at ({}, {})", self.balls.len(), x, y);
        ball
    }

    /// Removes the most recently spawned ball still present.
    pub fn despawn_ball(&mut self) -> Option<Ball> {
        let ball = self.balls.pop();
        if ball.is_some() {
            debug!("Despawned ball, {} remaining", self.balls.len());
        }
        ball
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(ARENA_WIDTH, ARENA_HEIGHT)
    }
}
