//! Wire-level types shared by the pong server and its clients.
//!
//! Everything that crosses the TCP connection lives here: the message
//! catalogue, the frame codec, and parsing of client key tokens.

pub mod codec;
pub mod input;
pub mod protocol;

pub use codec::{encode_frame, CodecError, FrameDecoder, Framing};
pub use input::{parse_client_input, InputEvent, KeyCode};
pub use protocol::{Message, PowerUpDescriptor, PowerUpKind, ProtocolError, WallSide};

pub const DEFAULT_PORT: u16 = 55555;
pub const ARENA_WIDTH: u32 = 800;
pub const ARENA_HEIGHT: u32 = 600;

/// Side length of the square power-up pickup.
pub const POWER_UP_SIZE: u32 = 45;
pub const BALL_SIZE: u32 = 5;
pub const PADDLE_WIDTH: u32 = 20;
pub const PADDLE_HEIGHT: u32 = 60;

pub const MIN_BALLS: usize = 1;
pub const MAX_BALLS: usize = 10;

/// Read granularity of undelimited (legacy) clients.
pub const LEGACY_READ_BUFFER: usize = 36;
/// Longest partial frame the newline decoder will buffer.
pub const MAX_FRAME_LEN: usize = 4096;
