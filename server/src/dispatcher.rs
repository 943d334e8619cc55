//! Routes decoded client messages into the local input system.

use crate::input::InputSink;
use crate::session::SessionId;
use log::debug;
use pong_shared::{parse_client_input, InputEvent, Message, PowerUpDescriptor};

/// Handles one inbound message from `session`.
///
/// Key tokens are injected into `input` in the order they appear. Each
/// power-up request yields the current descriptor as a reply addressed to
/// the requesting session only. Unrecognised tokens are dropped.
pub fn on_receive<S: InputSink>(
    session: SessionId,
    message: &str,
    input: &mut S,
    power_up: PowerUpDescriptor,
) -> Vec<Message> {
    let mut replies = Vec::new();

    for event in parse_client_input(message) {
        match event {
            InputEvent::KeyDown(key) => input.inject_key_down(key),
            InputEvent::KeyUp(key) => input.inject_key_up(key),
            InputEvent::PowerUpRequest => {
                debug!("Session {} re-requested the power-up", session);
                replies.push(Message::PowerUp(power_up));
            }
        }
    }

    replies
}

#[cfg(test)]
mod tests {
    use super::*;
    use pong_shared::{KeyCode, PowerUpKind};

    #[derive(Debug, PartialEq)]
    enum Injected {
        Down(char),
        Up(char),
    }

    #[derive(Default)]
    struct RecordingSink {
        events: Vec<Injected>,
    }

    impl InputSink for RecordingSink {
        fn inject_key_down(&mut self, key: KeyCode) {
            self.events.push(Injected::Down(key.as_char()));
        }

        fn inject_key_up(&mut self, key: KeyCode) {
            self.events.push(Injected::Up(key.as_char()));
        }
    }

    #[test]
    fn test_down_then_up_once_each() {
        let mut sink = RecordingSink::default();

        let replies = on_receive(1, "X,W_DOWN,W_UP", &mut sink, PowerUpDescriptor::NONE);

        assert!(replies.is_empty());
        assert_eq!(sink.events, vec![Injected::Down('W'), Injected::Up('W')]);
    }

    #[test]
    fn test_power_up_request_replies_with_current() {
        let mut sink = RecordingSink::default();
        let live = PowerUpDescriptor::new(300, 200, PowerUpKind::PlusOne);

        let replies = on_receive(2, "X,S_DOWN,X_POWERUP", &mut sink, live);

        assert_eq!(replies, vec![Message::PowerUp(live)]);
        assert_eq!(replies[0].encode(), "POWER_UP,300,200,1");
        assert_eq!(sink.events, vec![Injected::Down('S')]);
    }

    #[test]
    fn test_garbage_is_ignored() {
        let mut sink = RecordingSink::default();

        let replies = on_receive(1, "HELLO,WORLD,123", &mut sink, PowerUpDescriptor::NONE);

        assert!(replies.is_empty());
        assert!(sink.events.is_empty());
    }
}
