//! Per-frame state broadcast.

use crate::game::GameState;
use crate::network::Connections;
use crate::world::World;
use log::debug;
use pong_shared::Message;

/// Full snapshot of paddle and ball positions, balls in insertion order.
pub fn build_snapshot(state: &GameState) -> Message {
    Message::GameData {
        player1_y: state.player1.y,
        player2_y: state.player2.y,
        balls: state.ball_positions(),
    }
}

/// Runs once per simulation frame, after physics and collision handling.
#[derive(Debug, Default)]
pub struct TickBroadcaster {
    frame: u64,
}

impl TickBroadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames run so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Resolves a pending power-up spawn, then sends the snapshot if anyone
    /// is connected.
    pub async fn run(&mut self, world: &mut World, connections: &Connections) {
        self.frame += 1;

        let (width, height) = (world.state.width(), world.state.height());
        if let Some(descriptor) = world
            .power_ups
            .resolve_pending(width, height, &mut world.rng)
        {
            connections.broadcast(&Message::PowerUp(descriptor)).await;
        }

        if connections.is_empty().await {
            return;
        }

        let snapshot = build_snapshot(&world.state);
        let delivered = connections.broadcast(&snapshot).await;
        if delivered == 0 {
            debug!("Frame {} snapshot reached no session", self.frame);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::powerup::LifecycleState;
    use crate::session::Session;
    use pong_shared::{FrameDecoder, Framing};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::time::Duration;
    use tokio::io::{duplex, split, AsyncReadExt, DuplexStream};

    fn test_world(delay: Duration) -> World {
        World::with_rng(800, 600, delay, StdRng::seed_from_u64(99))
    }

    async fn attach(connections: &Connections) -> DuplexStream {
        let id = connections.next_id().await;
        let (server_side, client_side) = duplex(4096);
        let (read_half, write_half) = split(server_side);
        let (session, _reader, _inbox) =
            Session::open(id, None, read_half, write_half, Framing::Newline, 50);
        connections.register(session).await;
        client_side
    }

    async fn next_frame(stream: &mut DuplexStream, decoder: &mut FrameDecoder) -> String {
        loop {
            if let Some(frame) = decoder.next_frame().unwrap() {
                return frame;
            }
            let mut buf = [0u8; 512];
            let len = stream.read(&mut buf).await.unwrap();
            decoder.extend(&buf[..len]);
        }
    }

    #[test]
    fn test_snapshot_field_count() {
        let mut world = test_world(Duration::from_secs(60));
        for _ in 0..4 {
            world.state.spawn_ball(&mut world.rng);
        }

        let encoded = build_snapshot(&world.state).encode();
        let fields: Vec<&str> = encoded.split(',').skip(1).collect();

        assert!(encoded.starts_with("GAME_DATA,5,"));
        assert_eq!(fields.len(), 3 + 2 * world.state.ball_count());
    }

    #[test]
    fn test_snapshot_keeps_ball_order() {
        let mut world = test_world(Duration::from_secs(60));
        world.state.spawn_ball(&mut world.rng);

        match build_snapshot(&world.state) {
            Message::GameData { balls, .. } => {
                assert_eq!(balls, world.state.ball_positions());
            }
            other => panic!("Unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_connections_no_snapshot() {
        let mut world = test_world(Duration::from_secs(60));
        let connections = Connections::new();
        let mut ticker = TickBroadcaster::new();

        ticker.run(&mut world, &connections).await;

        assert_eq!(ticker.frame(), 1);
    }

    #[tokio::test]
    async fn test_snapshot_sent_each_frame() {
        let mut world = test_world(Duration::from_secs(60));
        let connections = Connections::new();
        let mut client = attach(&connections).await;
        let mut decoder = FrameDecoder::new(Framing::Newline);
        let mut ticker = TickBroadcaster::new();

        ticker.run(&mut world, &connections).await;
        ticker.run(&mut world, &connections).await;

        for _ in 0..2 {
            let frame = next_frame(&mut client, &mut decoder).await;
            assert!(frame.starts_with("GAME_DATA,1,"));
            assert_eq!(frame.split(',').count(), 1 + 3 + 2);
        }
    }

    #[tokio::test]
    async fn test_pending_spawn_broadcast_before_snapshot() {
        let mut world = test_world(Duration::from_millis(10));
        world.start().unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let connections = Connections::new();
        let mut client = attach(&connections).await;
        let mut decoder = FrameDecoder::new(Framing::Newline);
        let mut ticker = TickBroadcaster::new();

        ticker.run(&mut world, &connections).await;

        let first = next_frame(&mut client, &mut decoder).await;
        let expected = Message::PowerUp(world.power_ups.descriptor()).encode();
        assert_eq!(first, expected);
        assert!(next_frame(&mut client, &mut decoder).await.starts_with("GAME_DATA,"));
        assert_eq!(world.power_ups.state(), LifecycleState::Spawned);

        // The flag is consumed: a second frame spawns nothing new.
        ticker.run(&mut world, &connections).await;
        assert!(next_frame(&mut client, &mut decoder).await.starts_with("GAME_DATA,"));
    }
}
