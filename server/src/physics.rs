//! Minimal arena physics that moves paddles and balls and reports
//! collision-begin events. Reactions to those events live in
//! [`crate::collision`].

use crate::collision::{CollisionEvent, Participant};
use crate::world::World;
use pong_shared::{WallSide, BALL_SIZE, PADDLE_HEIGHT};
use std::collections::HashSet;

type Bounds = (f64, f64, f64, f64);

/// Axis-aligned overlap test on `(left, top, right, bottom)` bounds.
/// Touching edges do not count.
pub fn overlaps(a: Bounds, b: Bounds) -> bool {
    let (x1, y1, x2, y2) = a;
    let (x3, y3, x4, y4) = b;
    !(x2 <= x3 || x4 <= x1 || y2 <= y3 || y4 <= y1)
}

#[derive(Debug, Default)]
pub struct Physics {
    /// (ball index, paddle number) pairs currently touching.
    paddle_contacts: HashSet<(usize, u8)>,
}

impl Physics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the arena by `dt` seconds and returns the collisions that
    /// began during this step, in detection order.
    pub fn step(&mut self, world: &mut World, dt: f64) -> Vec<CollisionEvent> {
        let width = world.state.width() as f64;
        let height = world.state.height() as f64;
        let ball_size = BALL_SIZE as f64;
        let paddle_floor = (height - PADDLE_HEIGHT as f64).max(0.0);

        for paddle in [&mut world.state.player1, &mut world.state.player2] {
            paddle.y = (paddle.y + paddle.vel_y * dt).clamp(0.0, paddle_floor);
        }

        let paddles = [(1u8, world.state.player1), (2u8, world.state.player2)];
        let power_up = world.power_ups.live().copied();
        let mut events = Vec::new();

        for (index, ball) in world.state.balls_mut().iter_mut().enumerate() {
            ball.x += ball.vel_x * dt;
            ball.y += ball.vel_y * dt;

            let mut walls = Vec::new();
            if ball.x <= 0.0 {
                ball.x = 0.0;
                ball.vel_x = ball.vel_x.abs();
                walls.push(WallSide::Left);
            } else if ball.x + ball_size >= width {
                ball.x = width - ball_size;
                ball.vel_x = -ball.vel_x.abs();
                walls.push(WallSide::Right);
            }
            if ball.y <= 0.0 {
                ball.y = 0.0;
                ball.vel_y = ball.vel_y.abs();
                walls.push(WallSide::Top);
            } else if ball.y + ball_size >= height {
                ball.y = height - ball_size;
                ball.vel_y = -ball.vel_y.abs();
                walls.push(WallSide::Bottom);
            }
            for side in walls {
                events.push(CollisionEvent::new(
                    Participant::Ball(index),
                    Participant::Wall(side),
                ));
            }

            for (number, paddle) in &paddles {
                let key = (index, *number);
                if !overlaps(ball.get_bounds(), paddle.get_bounds()) {
                    self.paddle_contacts.remove(&key);
                    continue;
                }
                if !self.paddle_contacts.insert(key) {
                    continue;
                }

                let (left, _, right, _) = paddle.get_bounds();
                let paddle_center = (left + right) / 2.0;
                ball.vel_x = if ball.x + ball_size / 2.0 < paddle_center {
                    -ball.vel_x.abs()
                } else {
                    ball.vel_x.abs()
                };
                events.push(CollisionEvent::new(
                    Participant::Ball(index),
                    Participant::Paddle(*number),
                ));
            }

            if let Some(power_up) = power_up {
                if overlaps(ball.get_bounds(), power_up.get_bounds()) {
                    events.push(CollisionEvent::new(
                        Participant::Ball(index),
                        Participant::PowerUp(power_up.kind),
                    ));
                }
            }
        }

        let ball_count = world.state.ball_count();
        self.paddle_contacts.retain(|(index, _)| *index < ball_count);

        events
    }
}
