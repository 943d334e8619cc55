//! Server-to-client message catalogue.
//!
//! Every message is a type tag followed by comma-separated fields, e.g.
//! `SCORES,3,1` or `GAME_DATA,1,270,270,400,300`. Framing is handled
//! separately by [`crate::codec`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const TAG_PLAYER_NUM: &str = "PLAYERNUM";
pub const TAG_SCORES: &str = "SCORES";
pub const TAG_HIT_WALL_LEFT: &str = "HIT_WALL_LEFT";
pub const TAG_HIT_WALL_RIGHT: &str = "HIT_WALL_RIGHT";
pub const TAG_HIT_WALL_UP: &str = "HIT_WALL_UP";
pub const TAG_HIT_WALL_DOWN: &str = "HIT_WALL_DOWN";
pub const TAG_BALL_HIT_BAT1: &str = "BALL_HIT_BAT1";
pub const TAG_BALL_HIT_BAT2: &str = "BALL_HIT_BAT2";
pub const TAG_POWER_UP: &str = "POWER_UP";
pub const TAG_GAME_DATA: &str = "GAME_DATA";

/// Kind-code used on the wire when no power-up is live.
pub const NO_POWER_UP_CODE: u8 = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("empty message")]
    Empty,
    #[error("unknown message tag: {0}")]
    UnknownTag(String),
    #[error("{tag}: expected {expected} fields, found {found}")]
    FieldCount {
        tag: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("{tag}: invalid field {value:?}")]
    InvalidField { tag: &'static str, value: String },
}

/// Which arena edge a ball touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WallSide {
    Left,
    Right,
    Top,
    Bottom,
}

impl WallSide {
    /// Resolves the contact-surface name reported by the physics layer.
    pub fn from_surface(name: &str) -> Option<Self> {
        match name {
            "LEFT" => Some(WallSide::Left),
            "RIGHT" => Some(WallSide::Right),
            "TOP" => Some(WallSide::Top),
            "BOT" => Some(WallSide::Bottom),
            _ => None,
        }
    }

    pub fn surface(self) -> &'static str {
        match self {
            WallSide::Left => "LEFT",
            WallSide::Right => "RIGHT",
            WallSide::Top => "TOP",
            WallSide::Bottom => "BOT",
        }
    }

    fn tag(self) -> &'static str {
        match self {
            WallSide::Left => TAG_HIT_WALL_LEFT,
            WallSide::Right => TAG_HIT_WALL_RIGHT,
            WallSide::Top => TAG_HIT_WALL_UP,
            WallSide::Bottom => TAG_HIT_WALL_DOWN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    MinusOne,
    PlusOne,
    Half,
    Double,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::MinusOne,
        PowerUpKind::PlusOne,
        PowerUpKind::Half,
        PowerUpKind::Double,
    ];

    pub fn code(self) -> u8 {
        match self {
            PowerUpKind::MinusOne => 0,
            PowerUpKind::PlusOne => 1,
            PowerUpKind::Half => 2,
            PowerUpKind::Double => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }
}

/// Position and kind of the live power-up, or the neutral `(0,0,4)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerUpDescriptor {
    pub x: u32,
    pub y: u32,
    pub kind: Option<PowerUpKind>,
}

impl PowerUpDescriptor {
    pub const NONE: PowerUpDescriptor = PowerUpDescriptor {
        x: 0,
        y: 0,
        kind: None,
    };

    pub fn new(x: u32, y: u32, kind: PowerUpKind) -> Self {
        Self {
            x,
            y,
            kind: Some(kind),
        }
    }

    pub fn code(&self) -> u8 {
        self.kind.map_or(NO_POWER_UP_CODE, PowerUpKind::code)
    }
}

impl Default for PowerUpDescriptor {
    fn default() -> Self {
        Self::NONE
    }
}

/// A message sent from the server to every client (or to one requester).
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Ordinal of the most recently connected player.
    PlayerNum(u32),
    Scores { player1: u32, player2: u32 },
    HitWall(WallSide),
    /// Paddle number (1 or 2) that a ball struck.
    BallHitBat(u8),
    PowerUp(PowerUpDescriptor),
    /// Full per-tick snapshot. The ball count on the wire is `balls.len()`.
    GameData {
        player1_y: f64,
        player2_y: f64,
        balls: Vec<(f64, f64)>,
    },
}

impl Message {
    pub fn tag(&self) -> &'static str {
        match self {
            Message::PlayerNum(_) => TAG_PLAYER_NUM,
            Message::Scores { .. } => TAG_SCORES,
            Message::HitWall(side) => side.tag(),
            Message::BallHitBat(1) => TAG_BALL_HIT_BAT1,
            Message::BallHitBat(_) => TAG_BALL_HIT_BAT2,
            Message::PowerUp(_) => TAG_POWER_UP,
            Message::GameData { .. } => TAG_GAME_DATA,
        }
    }

    /// Text form of the message, without any frame terminator.
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::PlayerNum(n) => write!(f, "{},{}", TAG_PLAYER_NUM, n),
            Message::Scores { player1, player2 } => {
                write!(f, "{},{},{}", TAG_SCORES, player1, player2)
            }
            Message::HitWall(_) | Message::BallHitBat(_) => f.write_str(self.tag()),
            Message::PowerUp(descriptor) => write!(
                f,
                "{},{},{},{}",
                TAG_POWER_UP,
                descriptor.x,
                descriptor.y,
                descriptor.code()
            ),
            Message::GameData {
                player1_y,
                player2_y,
                balls,
            } => {
                write!(
                    f,
                    "{},{},{},{}",
                    TAG_GAME_DATA,
                    balls.len(),
                    player1_y,
                    player2_y
                )?;
                for (x, y) in balls {
                    write!(f, ",{},{}", x, y)?;
                }
                Ok(())
            }
        }
    }
}

fn expect_fields(
    tag: &'static str,
    fields: &[&str],
    expected: usize,
) -> Result<(), ProtocolError> {
    if fields.len() == expected {
        Ok(())
    } else {
        Err(ProtocolError::FieldCount {
            tag,
            expected,
            found: fields.len(),
        })
    }
}

fn parse_field<T: FromStr>(tag: &'static str, value: &str) -> Result<T, ProtocolError> {
    value.trim().parse().map_err(|_| ProtocolError::InvalidField {
        tag,
        value: value.to_string(),
    })
}

impl FromStr for Message {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ProtocolError::Empty);
        }

        let mut parts = s.split(',');
        let tag = parts.next().unwrap_or_default();
        let fields: Vec<&str> = parts.collect();

        match tag {
            TAG_PLAYER_NUM => {
                expect_fields(TAG_PLAYER_NUM, &fields, 1)?;
                Ok(Message::PlayerNum(parse_field(TAG_PLAYER_NUM, fields[0])?))
            }
            TAG_SCORES => {
                expect_fields(TAG_SCORES, &fields, 2)?;
                Ok(Message::Scores {
                    player1: parse_field(TAG_SCORES, fields[0])?,
                    player2: parse_field(TAG_SCORES, fields[1])?,
                })
            }
            TAG_HIT_WALL_LEFT => Ok(Message::HitWall(WallSide::Left)),
            TAG_HIT_WALL_RIGHT => Ok(Message::HitWall(WallSide::Right)),
            TAG_HIT_WALL_UP => Ok(Message::HitWall(WallSide::Top)),
            TAG_HIT_WALL_DOWN => Ok(Message::HitWall(WallSide::Bottom)),
            TAG_BALL_HIT_BAT1 => Ok(Message::BallHitBat(1)),
            TAG_BALL_HIT_BAT2 => Ok(Message::BallHitBat(2)),
            TAG_POWER_UP => {
                expect_fields(TAG_POWER_UP, &fields, 3)?;
                let code: u8 = parse_field(TAG_POWER_UP, fields[2])?;
                let kind = match code {
                    NO_POWER_UP_CODE => None,
                    _ => Some(PowerUpKind::from_code(code).ok_or_else(|| {
                        ProtocolError::InvalidField {
                            tag: TAG_POWER_UP,
                            value: fields[2].to_string(),
                        }
                    })?),
                };
                Ok(Message::PowerUp(PowerUpDescriptor {
                    x: parse_field(TAG_POWER_UP, fields[0])?,
                    y: parse_field(TAG_POWER_UP, fields[1])?,
                    kind,
                }))
            }
            TAG_GAME_DATA => {
                if fields.is_empty() {
                    return Err(ProtocolError::FieldCount {
                        tag: TAG_GAME_DATA,
                        expected: 3,
                        found: 0,
                    });
                }
                let count: usize = parse_field(TAG_GAME_DATA, fields[0])?;
                let expected = count
                    .checked_mul(2)
                    .and_then(|n| n.checked_add(3))
                    .ok_or_else(|| ProtocolError::InvalidField {
                        tag: TAG_GAME_DATA,
                        value: fields[0].to_string(),
                    })?;
                expect_fields(TAG_GAME_DATA, &fields, expected)?;

                let balls = fields[3..]
                    .chunks(2)
                    .map(|pair| {
                        Ok((
                            parse_field(TAG_GAME_DATA, pair[0])?,
                            parse_field(TAG_GAME_DATA, pair[1])?,
                        ))
                    })
                    .collect::<Result<Vec<_>, ProtocolError>>()?;

                Ok(Message::GameData {
                    player1_y: parse_field(TAG_GAME_DATA, fields[1])?,
                    player2_y: parse_field(TAG_GAME_DATA, fields[2])?,
                    balls,
                })
            }
            other => Err(ProtocolError::UnknownTag(other.to_string())),
        }
    }
}
