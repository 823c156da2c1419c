use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use glam::Vec3;

use cadence::{
    Clock, Endpoint, FramePacer, InputCommand, Packet, PacketType, Pipeline, StateUpdate,
    TimestepAccumulator, TimingReporter, World,
};

use crate::config::ServerConfig;

const SPAWN_HEIGHT: f32 = 2.0;
const SPAWN_SPACING: f32 = 1.5;

#[derive(Debug)]
struct RemoteClient {
    client_id: u32,
    addr: SocketAddr,
    entity_id: u32,
    last_input_sequence: u32,
    last_seen: f64,
}

/// Authoritative loop owner. Runs the fixed drain variant: the tick length
/// is the contract both peers agreed on, never adapted at runtime.
pub struct GameServer {
    endpoint: Endpoint,
    config: ServerConfig,
    pacer: FramePacer,
    accumulator: TimestepAccumulator,
    reporter: TimingReporter,
    world: World,
    clients: Vec<RemoteClient>,
    pending_inputs: VecDeque<(u32, InputCommand)>,
    next_client_id: u32,
    last_broadcast_tick: u32,
    running: Arc<AtomicBool>,
}

impl GameServer {
    pub fn new(bind_addr: &str, config: ServerConfig) -> io::Result<Self> {
        let endpoint = Endpoint::bind(bind_addr)?;
        let clock = Clock::new();

        Ok(Self {
            endpoint,
            pacer: FramePacer::new(clock, config.tick_rate),
            accumulator: TimestepAccumulator::from_tick_rate(config.tick_rate),
            reporter: TimingReporter::new(config.sample_capacity),
            world: World::new(),
            clients: Vec::new(),
            pending_inputs: VecDeque::new(),
            next_client_id: 0,
            last_broadcast_tick: 0,
            running: Arc::new(AtomicBool::new(true)),
            config,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.endpoint.local_addr()
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn run(&mut self) {
        let mut pipeline = Pipeline::new(self.pacer.clock());
        pipeline.push("collect-frame-info", Self::collect_frame_info);
        pipeline.push("poll-inputs", Self::poll_network);
        pipeline.push("run-accumulator", Self::run_accumulator);
        pipeline.push("sleep-till-end-of-frame", Self::sleep_till_end_of_frame);
        pipeline.run(self);

        self.shutdown_clients();
        log::info!("server stopped at tick {}", self.world.tick());
    }

    fn collect_frame_info(&mut self) -> bool {
        if let Some(sample) = self.pacer.begin_frame() {
            self.accumulator.feed(sample.elapsed);
            if let Some(report) = self.reporter.record(sample) {
                log::info!(
                    "{report} | {} clients, {} packets in",
                    self.clients.len(),
                    self.endpoint.stats().packets_received
                );
            }
        }
        true
    }

    fn poll_network(&mut self) -> bool {
        if !self.running.load(Ordering::SeqCst) {
            log::info!("shutdown requested");
            return false;
        }

        match self.endpoint.receive() {
            Ok(packets) => {
                for (packet, addr) in packets {
                    if let Err(e) = self.handle_packet(packet, addr) {
                        log::error!("failed to answer {addr}: {e}");
                    }
                }
            }
            Err(e) => log::error!("network receive error: {e}"),
        }

        self.drop_timed_out_clients();
        true
    }

    fn run_accumulator(&mut self) -> bool {
        let clock = self.pacer.clock();

        let update_start = clock.now();
        let world = &mut self.world;
        let pending = &mut self.pending_inputs;
        let steps = self.accumulator.drain_fixed(|dt| {
            while let Some((entity_id, command)) = pending.pop_front() {
                world.apply_impulse(entity_id, Vec3::from_array(command.thrust));
            }
            world.step(dt as f32);
        });
        let update_time = clock.now() - update_start;

        if steps > 0 && self.world.tick() >= self.last_broadcast_tick + self.config.state_send_rate
        {
            self.broadcast_state();
            self.last_broadcast_tick = self.world.tick();
        }

        let frame = self.pacer.frame_mut();
        frame.number_of_updates = steps;
        frame.time_update_actual = if steps > 0 { update_time } else { 0.0 };
        true
    }

    fn sleep_till_end_of_frame(&mut self) -> bool {
        self.pacer.sleep_to_frame_end();
        true
    }

    fn handle_packet(&mut self, packet: Packet, addr: SocketAddr) -> io::Result<()> {
        let now = self.pacer.clock().now();

        if let Some(client) = self.clients.iter_mut().find(|c| c.addr == addr) {
            client.last_seen = now;
        }

        match packet.payload {
            PacketType::Connect { client_salt } => self.handle_connect(addr, client_salt, now)?,
            PacketType::Input(command) => self.handle_input(addr, command),
            PacketType::Ping { timestamp } => {
                let pong = self.endpoint.create_packet(PacketType::Pong { timestamp });
                self.endpoint.send_to(&pong, addr)?;
            }
            PacketType::Disconnect => self.handle_disconnect(addr),
            _ => {}
        }

        Ok(())
    }

    fn handle_connect(&mut self, addr: SocketAddr, _client_salt: u64, now: f64) -> io::Result<()> {
        if let Some(client) = self.clients.iter().find(|c| c.addr == addr) {
            // Duplicate request; the first accept was probably lost.
            let reply = self.endpoint.create_packet(PacketType::ConnectAccepted {
                client_id: client.client_id,
                entity_id: client.entity_id,
            });
            self.endpoint.send_to(&reply, addr)?;
            return Ok(());
        }

        if self.clients.len() >= self.config.max_clients {
            let reply = self.endpoint.create_packet(PacketType::ConnectDenied {
                reason: "server full".to_string(),
            });
            self.endpoint.send_to(&reply, addr)?;
            log::warn!("denied {addr}: server full");
            return Ok(());
        }

        let client_id = self.next_client_id;
        self.next_client_id += 1;

        let spawn = Vec3::new(client_id as f32 * SPAWN_SPACING, SPAWN_HEIGHT, 0.0);
        let entity_id = self.world.spawn(spawn);

        self.clients.push(RemoteClient {
            client_id,
            addr,
            entity_id,
            last_input_sequence: 0,
            last_seen: now,
        });

        let reply = self.endpoint.create_packet(PacketType::ConnectAccepted {
            client_id,
            entity_id,
        });
        self.endpoint.send_to(&reply, addr)?;
        log::info!("client {client_id} connected from {addr} (entity {entity_id})");
        Ok(())
    }

    fn handle_input(&mut self, addr: SocketAddr, command: InputCommand) {
        let Some(client) = self.clients.iter_mut().find(|c| c.addr == addr) else {
            return;
        };
        if command.sequence <= client.last_input_sequence {
            return;
        }
        client.last_input_sequence = command.sequence;
        self.pending_inputs.push_back((client.entity_id, command));
    }

    fn handle_disconnect(&mut self, addr: SocketAddr) {
        if let Some(index) = self.clients.iter().position(|c| c.addr == addr) {
            let client = self.clients.remove(index);
            self.world.despawn(client.entity_id);
            log::info!("client {} disconnected", client.client_id);
        }
    }

    fn drop_timed_out_clients(&mut self) {
        let now = self.pacer.clock().now();
        let timeout = self.config.client_timeout_secs;

        let expired: Vec<usize> = self
            .clients
            .iter()
            .enumerate()
            .filter(|(_, c)| now - c.last_seen > timeout)
            .map(|(i, _)| i)
            .collect();

        for index in expired.into_iter().rev() {
            let client = self.clients.remove(index);
            self.world.despawn(client.entity_id);
            log::warn!("client {} timed out", client.client_id);
        }
    }

    fn broadcast_state(&mut self) {
        let update = StateUpdate {
            tick: self.world.tick(),
            entities: self.world.snapshot(),
        };

        for i in 0..self.clients.len() {
            let addr = self.clients[i].addr;
            let packet = self
                .endpoint
                .create_packet(PacketType::State(update.clone()));
            if let Err(e) = self.endpoint.send_to(&packet, addr) {
                log::error!("failed to send state to {addr}: {e}");
            }
        }
    }

    fn shutdown_clients(&mut self) {
        for i in 0..self.clients.len() {
            let addr = self.clients[i].addr;
            let packet = self.endpoint.create_packet(PacketType::Disconnect);
            let _ = self.endpoint.send_to(&packet, addr);
        }
        self.clients.clear();
    }
}
