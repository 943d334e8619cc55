//! Client-to-server key tokens.
//!
//! A client message is a comma-separated list whose first token only names
//! the message and is never interpreted. Every following token is a key
//! event such as `W_DOWN` / `W_UP`, or a power-up re-request ending in
//! `_POWERUP`. Anything else is ignored.

pub const CLIENT_INPUT_TAG: &str = "INPUT";

const SUFFIX_DOWN: &str = "_DOWN";
const SUFFIX_UP: &str = "_UP";
const SUFFIX_POWERUP: &str = "_POWERUP";

/// A key identified by its single character, stored upper-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCode(char);

impl KeyCode {
    pub fn new(key: char) -> Self {
        KeyCode(key.to_ascii_uppercase())
    }

    pub fn as_char(self) -> char {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    /// Client asks for the current power-up descriptor again.
    PowerUpRequest,
}

impl InputEvent {
    pub fn token(&self) -> String {
        match self {
            InputEvent::KeyDown(key) => format!("{}{}", key.as_char(), SUFFIX_DOWN),
            InputEvent::KeyUp(key) => format!("{}{}", key.as_char(), SUFFIX_UP),
            InputEvent::PowerUpRequest => format!("X{}", SUFFIX_POWERUP),
        }
    }
}

fn leading_key(token: &str) -> Option<KeyCode> {
    token
        .chars()
        .next()
        .filter(char::is_ascii_alphanumeric)
        .map(KeyCode::new)
}

/// Classifies a single token; `None` for anything unrecognised.
pub fn classify_token(token: &str) -> Option<InputEvent> {
    let token = token.trim();
    if token.ends_with(SUFFIX_DOWN) {
        leading_key(token).map(InputEvent::KeyDown)
    } else if token.ends_with(SUFFIX_UP) {
        leading_key(token).map(InputEvent::KeyUp)
    } else if token.ends_with(SUFFIX_POWERUP) {
        Some(InputEvent::PowerUpRequest)
    } else {
        None
    }
}

/// Parses a whole client message, skipping its first token.
pub fn parse_client_input(message: &str) -> Vec<InputEvent> {
    message.split(',').skip(1).filter_map(classify_token).collect()
}

/// Builds the message a client sends for a sequence of events.
pub fn encode_client_input(events: &[InputEvent]) -> String {
    let mut message = CLIENT_INPUT_TAG.to_string();
    for event in events {
        message.push(',');
        message.push_str(&event.token());
    }
    message
}
