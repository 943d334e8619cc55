//! Reactions to collision-begin events, keyed by the pair of entity types.

use crate::error::ServerError;
use crate::world::World;
use pong_shared::{Message, PowerUpKind, WallSide};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityType {
    Ball,
    Wall,
    Paddle,
    PowerUp(PowerUpKind),
}

/// One side of a collision, carrying whatever identifies it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Participant {
    /// Index into the ball collection.
    Ball(usize),
    /// Named contact surface of the arena bounds.
    Wall(WallSide),
    /// Paddle number, 1 or 2.
    Paddle(u8),
    PowerUp(PowerUpKind),
}

impl Participant {
    pub fn entity_type(&self) -> EntityType {
        match self {
            Participant::Ball(_) => EntityType::Ball,
            Participant::Wall(_) => EntityType::Wall,
            Participant::Paddle(_) => EntityType::Paddle,
            Participant::PowerUp(kind) => EntityType::PowerUp(*kind),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollisionEvent {
    pub a: Participant,
    pub b: Participant,
}

impl CollisionEvent {
    pub fn new(a: Participant, b: Participant) -> Self {
        Self { a, b }
    }

    fn find<T>(&self, pick: impl Fn(Participant) -> Option<T>) -> Option<T> {
        pick(self.a).or_else(|| pick(self.b))
    }
}

/// Applies a collision to the world and returns the messages to broadcast,
/// in order.
pub type CollisionHandler = fn(&mut World, &CollisionEvent) -> Result<Vec<Message>, ServerError>;

static HANDLERS: [(EntityType, EntityType, CollisionHandler); 6] = [
    (EntityType::Ball, EntityType::Wall, ball_wall as CollisionHandler),
    (EntityType::Ball, EntityType::Paddle, ball_paddle as CollisionHandler),
    (
        EntityType::Ball,
        EntityType::PowerUp(PowerUpKind::MinusOne),
        ball_power_up as CollisionHandler,
    ),
    (
        EntityType::Ball,
        EntityType::PowerUp(PowerUpKind::PlusOne),
        ball_power_up as CollisionHandler,
    ),
    (
        EntityType::Ball,
        EntityType::PowerUp(PowerUpKind::Half),
        ball_power_up as CollisionHandler,
    ),
    (
        EntityType::Ball,
        EntityType::PowerUp(PowerUpKind::Double),
        ball_power_up as CollisionHandler,
    ),
];

/// Looks up the handler for an unordered pair of entity types.
pub fn handler_for(a: EntityType, b: EntityType) -> Option<CollisionHandler> {
    HANDLERS
        .iter()
        .find(|(x, y, _)| (*x == a && *y == b) || (*x == b && *y == a))
        .map(|(_, _, handler)| *handler)
}

/// Runs the matching handler; pairs without one produce nothing.
pub fn dispatch(world: &mut World, event: &CollisionEvent) -> Result<Vec<Message>, ServerError> {
    match handler_for(event.a.entity_type(), event.b.entity_type()) {
        Some(handler) => handler(world, event),
        None => Ok(Vec::new()),
    }
}

fn ball_wall(world: &mut World, event: &CollisionEvent) -> Result<Vec<Message>, ServerError> {
    let Some(side) = event.find(|p| match p {
        Participant::Wall(side) => Some(side),
        _ => None,
    }) else {
        return Ok(Vec::new());
    };

    let mut messages = Vec::with_capacity(2);
    match side {
        WallSide::Left => world.state.score_player2(),
        WallSide::Right => world.state.score_player1(),
        WallSide::Top | WallSide::Bottom => {}
    }
    if matches!(side, WallSide::Left | WallSide::Right) {
        let (player1, player2) = world.state.scores();
        messages.push(Message::Scores { player1, player2 });
    }
    messages.push(Message::HitWall(side));
    Ok(messages)
}

fn ball_paddle(_world: &mut World, event: &CollisionEvent) -> Result<Vec<Message>, ServerError> {
    Ok(event
        .find(|p| match p {
            Participant::Paddle(number) => Some(number),
            _ => None,
        })
        .map(|number| vec![Message::BallHitBat(number)])
        .unwrap_or_default())
}

fn ball_power_up(world: &mut World, event: &CollisionEvent) -> Result<Vec<Message>, ServerError> {
    let Some(kind) = event.find(|p| match p {
        Participant::PowerUp(kind) => Some(kind),
        _ => None,
    }) else {
        return Ok(Vec::new());
    };

    let consumed = world
        .power_ups
        .consume(kind, &mut world.state, &mut world.rng)?;
    Ok(consumed.map(Message::PowerUp).into_iter().collect())
}
