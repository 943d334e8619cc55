//! Server network layer handling TCP sessions and game loop coordination

use crate::collision;
use crate::config::ServerConfig;
use crate::dispatcher;
use crate::error::ServerError;
use crate::input::KeyBindings;
use crate::physics::Physics;
use crate::session::{Session, SessionId};
use crate::session_manager::SessionManager;
use crate::tick::TickBroadcaster;
use crate::world::World;
use log::{debug, error, info, warn};
use pong_shared::{Framing, Message};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// Longest simulated step; longer stalls are clamped so balls do not tunnel.
const MAX_STEP: Duration = Duration::from_millis(50);

/// Shared handle to the live connection set and its broadcast primitive.
#[derive(Debug, Clone, Default)]
pub struct Connections {
    sessions: Arc<RwLock<SessionManager>>,
}

impl Connections {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn next_id(&self) -> SessionId {
        self.sessions.write().await.allocate_id()
    }

    pub async fn register(&self, session: Arc<Session>) {
        self.sessions.write().await.insert(session);
    }

    pub async fn remove(&self, id: SessionId) -> bool {
        self.sessions.write().await.remove(id)
    }

    pub async fn contains(&self, id: SessionId) -> bool {
        self.sessions.read().await.contains(id)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    /// Sends `message` to every live session and returns how many writes
    /// succeeded. A session whose write fails is dropped from the set; the
    /// others still receive the message.
    pub async fn broadcast(&self, message: &Message) -> usize {
        let sessions = self.sessions.read().await.sessions();

        let mut delivered = 0;
        let mut failed = Vec::new();
        for session in sessions {
            match session.send(message).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!("Failed to send {} to session {}: {}", message.tag(), session.id(), e);
                    failed.push(session.id());
                }
            }
        }

        if !failed.is_empty() {
            let mut guard = self.sessions.write().await;
            for id in failed {
                guard.remove(id);
            }
        }

        delivered
    }

    /// Sends `message` to one session, dropping it on write failure.
    pub async fn send_to(&self, id: SessionId, message: &Message) -> bool {
        let Some(session) = self.sessions.read().await.get(id) else {
            debug!("Session {} is gone, dropping {}", id, message.tag());
            return false;
        };

        match session.send(message).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to send {} to session {}: {}", message.tag(), id, e);
                self.remove(id).await;
                false
            }
        }
    }
}

/// Messages sent from network tasks to the simulation loop
#[derive(Debug)]
pub enum ServerMessage {
    /// A new session is registered; its inbound frames arrive on `inbox`.
    SessionOpened {
        id: SessionId,
        inbox: mpsc::Receiver<String>,
    },
}

/// Main server coordinating networking and game simulation
pub struct Server {
    listener: Arc<TcpListener>,
    config: ServerConfig,
    connections: Connections,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server {
    pub async fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        config.validate()?;
        let listener = Arc::new(TcpListener::bind(config.address()).await?);
        info!("Server listening on {}", listener.local_addr()?);

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener,
            config,
            connections: Connections::new(),
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    pub fn connections(&self) -> Connections {
        self.connections.clone()
    }

    /// Spawns the task that accepts connections for the lifetime of the server
    fn spawn_acceptor(&self) -> JoinHandle<()> {
        let listener = Arc::clone(&self.listener);
        let connections = self.connections.clone();
        let server_tx = self.server_tx.clone();
        let framing = self.config.framing;
        let inbox_capacity = self.config.inbox_capacity;

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        if let Err(e) = stream.set_nodelay(true) {
                            debug!("Could not disable Nagle for {}: {}", addr, e);
                        }
                        let accepted = Self::on_connect(
                            stream,
                            addr,
                            &connections,
                            &server_tx,
                            framing,
                            inbox_capacity,
                        )
                        .await;
                        if !accepted {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        })
    }

    /// Registers a freshly accepted stream, announces the new player count to
    /// everyone and starts its reader. Returns false once the simulation loop
    /// is gone.
    async fn on_connect(
        stream: TcpStream,
        addr: SocketAddr,
        connections: &Connections,
        server_tx: &mpsc::UnboundedSender<ServerMessage>,
        framing: Framing,
        inbox_capacity: usize,
    ) -> bool {
        let id = connections.next_id().await;
        let (read_half, write_half) = stream.into_split();
        let (session, reader, inbox) =
            Session::open(id, Some(addr), read_half, write_half, framing, inbox_capacity);

        if server_tx
            .send(ServerMessage::SessionOpened { id, inbox })
            .is_err()
        {
            error!("Simulation loop is gone, refusing session {}", id);
            return false;
        }

        connections.register(session).await;
        connections.broadcast(&Message::PlayerNum(id)).await;

        let connections = connections.clone();
        tokio::spawn(async move {
            match reader.run().await {
                Ok(()) => debug!("Reader for session {} finished", id),
                Err(e) => warn!("Session {} read failed: {}", id, e),
            }
            connections.remove(id).await;
        });

        true
    }

    fn drain_server_messages(&mut self, inboxes: &mut HashMap<SessionId, mpsc::Receiver<String>>) {
        while let Ok(message) = self.server_rx.try_recv() {
            match message {
                ServerMessage::SessionOpened { id, inbox } => {
                    inboxes.insert(id, inbox);
                }
            }
        }
    }

    /// Feeds every queued frame through the dispatcher and answers power-up
    /// re-requests. Inboxes whose reader has ended are dropped once empty.
    async fn dispatch_inputs(
        &self,
        inboxes: &mut HashMap<SessionId, mpsc::Receiver<String>>,
        bindings: &mut KeyBindings,
        world: &World,
    ) {
        let mut closed = Vec::new();

        for (&id, inbox) in inboxes.iter_mut() {
            loop {
                match inbox.try_recv() {
                    Ok(frame) => {
                        let current = world.power_ups.descriptor();
                        let replies = dispatcher::on_receive(id, &frame, bindings, current);
                        for reply in replies {
                            self.connections.send_to(id, &reply).await;
                        }
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        closed.push(id);
                        break;
                    }
                }
            }
        }

        for id in closed {
            inboxes.remove(&id);
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(mut self) -> Result<(), ServerError> {
        let acceptor = self.spawn_acceptor();

        let mut world = World::new(&self.config);
        world.start()?;
        let mut physics = Physics::new();
        let mut bindings = KeyBindings::new();
        let mut ticker = TickBroadcaster::new();
        let mut inboxes = HashMap::new();

        let mut tick_interval = interval(self.config.tick_duration());
        tick_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_tick = Instant::now();

        info!("Server started successfully");

        loop {
            tick_interval.tick().await;

            if acceptor.is_finished() {
                return Err(ServerError::LoopClosed("accept task exited"));
            }

            let now = Instant::now();
            let dt = now.duration_since(last_tick).min(MAX_STEP).as_secs_f64();
            last_tick = now;

            self.drain_server_messages(&mut inboxes);
            self.dispatch_inputs(&mut inboxes, &mut bindings, &world).await;
            bindings.apply(&mut world.state);

            for event in physics.step(&mut world, dt) {
                for message in collision::dispatch(&mut world, &event)? {
                    self.connections.broadcast(&message).await;
                }
            }

            ticker.run(&mut world, &self.connections).await;

            if ticker.frame() % 600 == 0 {
                debug!(
                    "Frame {}: {} sessions, {} balls, scores {:?}",
                    ticker.frame(),
                    self.connections.len().await,
                    world.state.ball_count(),
                    world.state.scores()
                );
            }
        }
    }
}
