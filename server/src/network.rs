//! Server network layer: UDP transport, session routing, and room tickers

use crate::room::{RoomEvent, RoomRegistry};
use crate::session::SessionTable;
use bincode::{deserialize, serialize};
use log::{debug, error, info, warn};
use shared::{direction_valid, Packet, PlayerInput};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::UdpSocket;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tokio::time::interval;

const MAX_NAME_LEN: usize = 24;

/// Messages sent from network tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    PacketReceived {
        packet: Packet,
        addr: SocketAddr,
    },
    SessionTimeout {
        player_id: u32,
        room_id: u32,
    },
    /// One simulation step is due for this room.
    RoomTick {
        room_id: u32,
    },
    #[allow(dead_code)]
    Shutdown,
}

/// Messages sent from the main loop to the outbound network task
#[derive(Debug)]
pub enum GameMessage {
    Send {
        packet: Packet,
        addr: SocketAddr,
    },
    /// Delivered to every session in the room, minus an optional address.
    Broadcast {
        packet: Packet,
        room_id: u32,
        exclude: Option<SocketAddr>,
    },
}

/// Main server coordinating transport, sessions, and room simulation
pub struct Server {
    socket: Arc<UdpSocket>,
    sessions: Arc<RwLock<SessionTable>>,
    registry: RoomRegistry,
    tick_duration: Duration,
    /// Ticker task per live room, aborted when the room is destroyed.
    room_tickers: HashMap<u32, JoinHandle<()>>,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
    game_tx: mpsc::UnboundedSender<GameMessage>,
    game_rx: mpsc::UnboundedReceiver<GameMessage>,
}

impl Server {
    pub async fn new(
        addr: &str,
        tick_duration: Duration,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        info!("Server listening on {}", addr);

        let (server_tx, server_rx) = mpsc::unbounded_channel();
        let (game_tx, game_rx) = mpsc::unbounded_channel();

        Ok(Server {
            socket,
            sessions: Arc::new(RwLock::new(SessionTable::new())),
            registry: RoomRegistry::new(),
            tick_duration,
            room_tickers: HashMap::new(),
            server_tx,
            server_rx,
            game_tx,
            game_rx,
        })
    }

    /// Spawns the task that continuously listens for incoming packets
    fn spawn_network_receiver(&self) {
        let socket = Arc::clone(&self.socket);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut buffer = [0u8; 8192];

            loop {
                match socket.recv_from(&mut buffer).await {
                    Ok((len, addr)) => {
                        if let Ok(packet) = deserialize::<Packet>(&buffer[0..len]) {
                            if let Err(e) =
                                server_tx.send(ServerMessage::PacketReceived { packet, addr })
                            {
                                error!("Failed to send packet to main loop: {}", e);
                                break;
                            }
                        } else {
                            warn!("Failed to deserialize packet from {}", addr);
                        }
                    }
                    Err(e) => {
                        error!("Error receiving packet: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Spawns the task that drains the outbound packet queue
    fn spawn_network_sender(&mut self) {
        let socket = Arc::clone(&self.socket);
        let sessions = Arc::clone(&self.sessions);
        let mut game_rx = std::mem::replace(&mut self.game_rx, mpsc::unbounded_channel().1);

        tokio::spawn(async move {
            while let Some(message) = game_rx.recv().await {
                match message {
                    GameMessage::Send { packet, addr } => {
                        if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                            error!("Failed to send packet to {}: {}", addr, e);
                        }
                    }
                    GameMessage::Broadcast {
                        packet,
                        room_id,
                        exclude,
                    } => {
                        let addrs = {
                            let sessions_guard = sessions.read().await;
                            sessions_guard.addrs_in_room(room_id)
                        };

                        for addr in addrs {
                            if Some(addr) == exclude {
                                continue;
                            }
                            if let Err(e) = Self::send_packet_impl(&socket, &packet, addr).await {
                                error!("Failed to send to {}: {}", addr, e);
                            }
                        }
                    }
                }
            }
        });
    }

    /// Spawns the task that monitors session timeouts
    fn spawn_timeout_checker(&self) {
        let sessions = Arc::clone(&self.sessions);
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(1));

            loop {
                interval.tick().await;

                let dropped = {
                    let mut sessions_guard = sessions.write().await;
                    sessions_guard.check_timeouts(Instant::now())
                };

                for session in dropped {
                    if let Err(e) = server_tx.send(ServerMessage::SessionTimeout {
                        player_id: session.player_id,
                        room_id: session.room_id,
                    }) {
                        error!("Failed to send timeout message: {}", e);
                        break;
                    }
                }
            }
        });
    }

    /// Starts a fixed-rate ticker for a room if one is not already running
    fn ensure_room_ticker(&mut self, room_id: u32) {
        if self.room_tickers.contains_key(&room_id) {
            return;
        }

        let server_tx = self.server_tx.clone();
        let tick_duration = self.tick_duration;
        let handle = tokio::spawn(async move {
            let mut interval = interval(tick_duration);
            loop {
                interval.tick().await;
                if server_tx.send(ServerMessage::RoomTick { room_id }).is_err() {
                    break;
                }
            }
        });
        self.room_tickers.insert(room_id, handle);
        debug!("Started ticker for room {}", room_id);
    }

    fn stop_room_ticker(&mut self, room_id: u32) {
        if let Some(handle) = self.room_tickers.remove(&room_id) {
            handle.abort();
            debug!("Stopped ticker for room {}", room_id);
        }
    }

    async fn send_packet_impl(
        socket: &UdpSocket,
        packet: &Packet,
        addr: SocketAddr,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let data = serialize(packet)?;
        socket.send_to(&data, addr).await?;
        Ok(())
    }

    fn send_packet(&self, packet: Packet, addr: SocketAddr) {
        if let Err(e) = self.game_tx.send(GameMessage::Send { packet, addr }) {
            error!("Failed to queue packet for sending: {}", e);
        }
    }

    fn broadcast_packet(&self, packet: Packet, room_id: u32, exclude: Option<SocketAddr>) {
        if let Err(e) = self.game_tx.send(GameMessage::Broadcast {
            packet,
            room_id,
            exclude,
        }) {
            error!("Failed to queue broadcast packet: {}", e);
        }
    }

    /// Processes one inbound packet against sessions and rooms
    async fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) {
        match packet {
            Packet::Join { name, skin } => {
                let name = name.trim().to_string();
                if name.is_empty() || name.len() > MAX_NAME_LEN {
                    self.send_packet(
                        Packet::Rejected {
                            reason: "Invalid name".to_string(),
                        },
                        addr,
                    );
                    return;
                }

                // A rejoin from the same address replaces the old session.
                let existing = {
                    let sessions = self.sessions.read().await;
                    sessions
                        .get(&addr)
                        .map(|session| (session.player_id, session.room_id))
                };
                if let Some((old_player, old_room)) = existing {
                    info!("Replacing session for player {} at {}", old_player, addr);
                    self.drop_player(old_player, old_room, Some(addr)).await;
                }

                let now = Instant::now();
                let (player_id, room_id, spawn) = self.registry.join(&name, &skin, now);
                {
                    let mut sessions = self.sessions.write().await;
                    sessions.insert(addr, player_id, room_id, now);
                }
                self.ensure_room_ticker(room_id);

                self.send_packet(
                    Packet::Joined {
                        player_id,
                        room_id,
                        spawn,
                    },
                    addr,
                );
                self.broadcast_packet(
                    Packet::PlayerJoined { player_id, name },
                    room_id,
                    Some(addr),
                );
            }

            Packet::Input {
                sequence,
                timestamp,
                direction,
                boost,
            } => {
                // Malformed headings and rate-limit overruns are dropped
                // without a reply; the sender keeps its own prediction.
                if !direction_valid(direction) {
                    debug!("Dropping input with invalid direction from {}", addr);
                    return;
                }

                let routed = {
                    let now = Instant::now();
                    let mut sessions = self.sessions.write().await;
                    match sessions.get_mut(&addr) {
                        Some(session) => {
                            session.last_seen = now;
                            if session.allow_input(now) {
                                Some((session.player_id, session.room_id))
                            } else {
                                None
                            }
                        }
                        None => None,
                    }
                };

                if let Some((player_id, room_id)) = routed {
                    self.registry.queue_input(
                        room_id,
                        player_id,
                        PlayerInput {
                            direction,
                            boost,
                            timestamp,
                            sequence,
                        },
                    );
                }
            }

            Packet::Leave => {
                let session = {
                    let mut sessions = self.sessions.write().await;
                    sessions.remove(&addr)
                };
                if let Some(session) = session {
                    self.drop_player(session.player_id, session.room_id, Some(addr))
                        .await;
                }
            }

            _ => {
                warn!("Unexpected packet type from client at {}", addr);
            }
        }
    }

    /// Removes a player from their room, notifies the survivors, and tears
    /// down the room ticker when the room empties out.
    async fn drop_player(&mut self, player_id: u32, room_id: u32, exclude: Option<SocketAddr>) {
        let destroyed = self.registry.leave(room_id, player_id);
        if destroyed {
            self.stop_room_ticker(room_id);
        } else {
            self.broadcast_packet(Packet::PlayerLeft { player_id }, room_id, exclude);
        }
    }

    /// Runs one simulation step for a room and fans out the results
    async fn handle_room_tick(&mut self, room_id: u32) {
        let events = self.registry.tick_room(room_id, Instant::now());
        for event in events {
            match event {
                RoomEvent::Snapshot(snapshot) => {
                    self.broadcast_packet(Packet::Snapshot(snapshot), room_id, None);
                }
                RoomEvent::Death(stats) => {
                    let addr = {
                        let sessions = self.sessions.read().await;
                        sessions.addr_of_player(stats.player_id)
                    };
                    if let Some(addr) = addr {
                        self.send_packet(Packet::Death(stats), addr);
                    }
                }
            }
        }
    }

    /// Main server loop coordinating all operations
    pub async fn run(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        self.spawn_network_receiver();
        self.spawn_network_sender();
        self.spawn_timeout_checker();

        info!("Server started successfully");

        loop {
            match self.server_rx.recv().await {
                Some(ServerMessage::PacketReceived { packet, addr }) => {
                    self.handle_packet(packet, addr).await;
                }
                Some(ServerMessage::SessionTimeout { player_id, room_id }) => {
                    info!("Player {} timed out", player_id);
                    self.drop_player(player_id, room_id, None).await;
                }
                Some(ServerMessage::RoomTick { room_id }) => {
                    self.handle_room_tick(room_id).await;
                }
                Some(ServerMessage::Shutdown) | None => {
                    info!("Server shutting down");
                    break;
                }
            }
        }

        for (_, handle) in self.room_tickers.drain() {
            handle.abort();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};

    fn test_addr() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)), 8080)
    }

    async fn test_server() -> Server {
        Server::new("127.0.0.1:0", Duration::from_millis(16))
            .await
            .unwrap()
    }

    fn join_packet(name: &str) -> Packet {
        Packet::Join {
            name: name.to_string(),
            skin: "classic-blue".to_string(),
        }
    }

    #[tokio::test]
    async fn test_join_assigns_player_and_room() {
        let mut server = test_server().await;
        server.handle_packet(join_packet("alice"), test_addr()).await;

        let sessions = server.sessions.read().await;
        let session = sessions.get(&test_addr()).unwrap();
        assert_eq!(session.room_id, 1);
        assert!(server
            .registry
            .get(1)
            .unwrap()
            .snake_alive(session.player_id));
        assert!(server.room_tickers.contains_key(&1));
    }

    #[tokio::test]
    async fn test_join_rejects_blank_name() {
        let mut server = test_server().await;
        server.handle_packet(join_packet("   "), test_addr()).await;

        assert!(server.sessions.read().await.is_empty());
        assert_eq!(server.registry.room_count(), 0);
    }

    #[tokio::test]
    async fn test_invalid_direction_dropped() {
        let mut server = test_server().await;
        server.handle_packet(join_packet("alice"), test_addr()).await;

        server
            .handle_packet(
                Packet::Input {
                    sequence: 1,
                    timestamp: 100,
                    direction: 7.0,
                    boost: false,
                },
                test_addr(),
            )
            .await;
        server
            .handle_packet(
                Packet::Input {
                    sequence: 2,
                    timestamp: 101,
                    direction: f32::NAN,
                    boost: false,
                },
                test_addr(),
            )
            .await;

        // Session stays healthy; the bad inputs simply vanish.
        assert_eq!(server.sessions.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_leave_destroys_empty_room_and_ticker() {
        let mut server = test_server().await;
        server.handle_packet(join_packet("alice"), test_addr()).await;
        assert_eq!(server.registry.room_count(), 1);

        server.handle_packet(Packet::Leave, test_addr()).await;
        assert_eq!(server.registry.room_count(), 0);
        assert!(server.room_tickers.is_empty());
        assert!(server.sessions.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_rejoin_replaces_session() {
        let mut server = test_server().await;
        server.handle_packet(join_packet("alice"), test_addr()).await;
        let first_id = server
            .sessions
            .read()
            .await
            .get(&test_addr())
            .unwrap()
            .player_id;

        server.handle_packet(join_packet("alice"), test_addr()).await;
        let (second_id, second_room) = {
            let sessions = server.sessions.read().await;
            let session = sessions.get(&test_addr()).unwrap();
            (session.player_id, session.room_id)
        };

        assert_ne!(first_id, second_id);
        assert_eq!(server.sessions.read().await.len(), 1);
        assert_eq!(server.registry.room_count(), 1);
        assert_eq!(server.registry.get(second_room).unwrap().player_count(), 1);
    }

    #[test]
    fn test_channel_communication() {
        let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

        assert!(tx.send(ServerMessage::RoomTick { room_id: 3 }).is_ok());
        match rx.try_recv().unwrap() {
            ServerMessage::RoomTick { room_id } => assert_eq!(room_id, 3),
            _ => panic!("Unexpected message type"),
        }
    }
}
