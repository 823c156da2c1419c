use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cadence::{
    Clock, Endpoint, FramePacer, InputCommand, Packet, PacketType, Pipeline,
    TimestepAccumulator, TimingReporter, World,
};

use crate::config::ClientConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConnectionState {
    Connecting,
    Connected,
}

/// Networked loop owner. Same four-stage pipeline as the server, with the
/// poll stage driving the connection handshake and the accumulator stage
/// advancing a local mirror of the authoritative world between snapshots.
pub struct GameClient {
    endpoint: Endpoint,
    config: ClientConfig,
    pacer: FramePacer,
    accumulator: TimestepAccumulator,
    reporter: TimingReporter,
    world: World,
    state: ConnectionState,
    client_id: Option<u32>,
    entity_id: Option<u32>,
    client_salt: u64,
    input_sequence: u32,
    connect_started: f64,
    last_connect_attempt: f64,
    last_ping: f64,
    last_server_packet: f64,
    running: Arc<AtomicBool>,
    deadline: Option<f64>,
}

impl GameClient {
    pub fn new(server_addr: SocketAddr, config: ClientConfig) -> io::Result<Self> {
        let mut endpoint = Endpoint::bind("0.0.0.0:0")?;
        endpoint.set_remote(server_addr);

        let clock = Clock::new();
        let now = clock.now();

        Ok(Self {
            endpoint,
            pacer: FramePacer::new(clock, config.target_fps),
            accumulator: TimestepAccumulator::from_tick_rate(config.tick_rate),
            reporter: TimingReporter::default(),
            world: World::new(),
            state: ConnectionState::Connecting,
            client_id: None,
            entity_id: None,
            client_salt: generate_salt(),
            input_sequence: 0,
            connect_started: now,
            last_connect_attempt: now - config.connect_retry_secs,
            last_ping: now,
            last_server_packet: now,
            deadline: config.run_seconds.map(|s| now + s),
            running: Arc::new(AtomicBool::new(true)),
            config,
        })
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn run(&mut self) {
        log::info!(
            "connecting to {}",
            self.endpoint.remote_addr().expect("remote set at bind")
        );

        let mut pipeline = Pipeline::new(self.pacer.clock());
        pipeline.push("collect-frame-info", Self::collect_frame_info);
        pipeline.push("poll-inputs", Self::poll_network);
        pipeline.push("run-accumulator", Self::run_accumulator);
        pipeline.push("sleep-till-end-of-frame", Self::sleep_till_end_of_frame);
        pipeline.run(self);

        if self.state == ConnectionState::Connected {
            let packet = self.endpoint.create_packet(PacketType::Disconnect);
            let _ = self.endpoint.send(&packet);
        }
        match self.client_id {
            Some(id) => log::info!("client {id} stopped at tick {}", self.world.tick()),
            None => log::info!("client stopped before completing the handshake"),
        }
    }

    fn collect_frame_info(&mut self) -> bool {
        if let Some(sample) = self.pacer.begin_frame() {
            self.accumulator.feed(sample.elapsed);
            if let Some(report) = self.reporter.record(sample) {
                log::info!("{report} | rtt {:.1}ms", self.endpoint.stats().rtt_ms);
            }
        }
        true
    }

    fn poll_network(&mut self) -> bool {
        if !self.running.load(Ordering::SeqCst) {
            log::info!("shutdown requested");
            return false;
        }

        let now = self.pacer.clock().now();
        if let Some(deadline) = self.deadline {
            if now >= deadline {
                log::info!("run duration reached");
                return false;
            }
        }

        let packets = match self.endpoint.receive() {
            Ok(packets) => packets,
            Err(e) => {
                log::error!("network receive error: {e}");
                Vec::new()
            }
        };
        for (packet, _addr) in packets {
            if !self.handle_packet(packet, now) {
                return false;
            }
        }

        match self.state {
            ConnectionState::Connecting => self.drive_handshake(now),
            ConnectionState::Connected => self.keep_alive(now),
        }
    }

    fn run_accumulator(&mut self) -> bool {
        let clock = self.pacer.clock();

        let update_start = clock.now();
        let world = &mut self.world;
        let steps = self.accumulator.drain_fixed(|dt| world.step(dt as f32));
        let update_time = clock.now() - update_start;

        if steps > 0 && self.state == ConnectionState::Connected {
            if let Err(e) = self.send_input() {
                log::error!("failed to send input: {e}");
            }
        }

        let render_start = clock.now();
        self.render(self.accumulator.alpha() as f32);
        let render_time = clock.now() - render_start;

        let frame = self.pacer.frame_mut();
        frame.number_of_updates = steps;
        frame.time_update_actual = if steps > 0 { update_time } else { 0.0 };
        frame.time_render_actual = render_time;
        true
    }

    fn sleep_till_end_of_frame(&mut self) -> bool {
        self.pacer.sleep_to_frame_end();
        true
    }

    /// Returns false when the packet ends the session.
    fn handle_packet(&mut self, packet: Packet, now: f64) -> bool {
        self.last_server_packet = now;

        match packet.payload {
            PacketType::ConnectAccepted {
                client_id,
                entity_id,
            } => {
                if self.state == ConnectionState::Connecting {
                    self.state = ConnectionState::Connected;
                    self.client_id = Some(client_id);
                    self.entity_id = Some(entity_id);
                    log::info!("connected as client {client_id} (entity {entity_id})");
                }
            }
            PacketType::ConnectDenied { reason } => {
                log::error!("connection denied: {reason}");
                return false;
            }
            PacketType::State(update) => {
                self.world.apply_snapshot(update.tick, &update.entities);
            }
            PacketType::Pong { timestamp } => {
                let rtt_secs = now - timestamp as f64 / 1e6;
                self.endpoint.stats_mut().rtt_ms = (rtt_secs * 1000.0) as f32;
            }
            PacketType::Disconnect => {
                log::info!("server closed the connection");
                return false;
            }
            _ => {}
        }
        true
    }

    fn drive_handshake(&mut self, now: f64) -> bool {
        if now - self.connect_started > self.config.connect_timeout_secs {
            log::error!("connection attempt timed out");
            return false;
        }
        if now - self.last_connect_attempt >= self.config.connect_retry_secs {
            self.last_connect_attempt = now;
            let packet = self.endpoint.create_packet(PacketType::Connect {
                client_salt: self.client_salt,
            });
            if let Err(e) = self.endpoint.send(&packet) {
                log::error!("failed to send connect request: {e}");
            }
        }
        true
    }

    fn keep_alive(&mut self, now: f64) -> bool {
        if now - self.last_server_packet > self.config.server_timeout_secs {
            log::error!("server timed out");
            return false;
        }
        if now - self.last_ping >= self.config.ping_interval_secs {
            self.last_ping = now;
            let packet = self.endpoint.create_packet(PacketType::Ping {
                timestamp: (now * 1e6) as u64,
            });
            if let Err(e) = self.endpoint.send(&packet) {
                log::error!("failed to send ping: {e}");
            }
        }
        true
    }

    fn send_input(&mut self) -> io::Result<()> {
        self.input_sequence += 1;

        // Demo input: a gentle rotating thrust so the entity drifts visibly.
        let phase = self.world.tick() as f32 * 0.05;
        let command = InputCommand {
            sequence: self.input_sequence,
            tick: self.world.tick(),
            thrust: [phase.cos() * 0.2, 0.0, phase.sin() * 0.2],
        };

        let packet = self.endpoint.create_packet(PacketType::Input(command));
        self.endpoint.send(&packet)?;
        Ok(())
    }

    /// Headless render: trace our entity's interpolated position.
    fn render(&self, alpha: f32) {
        let Some(entity_id) = self.entity_id else {
            return;
        };
        let Some(body) = self.world.body(entity_id) else {
            return;
        };
        let step = self.accumulator.step() as f32;
        let projected = body.position + body.velocity * (alpha * step);
        log::trace!(
            "render tick {} alpha {alpha:.2} entity {entity_id} {projected:.2?}",
            self.world.tick()
        );
    }
}

fn generate_salt() -> u64 {
    use std::collections::hash_map::RandomState;
    use std::hash::{BuildHasher, Hasher};

    let state = RandomState::new();
    let mut hasher = state.build_hasher();
    hasher.write_u64(
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos() as u64,
    );
    hasher.finish()
}
