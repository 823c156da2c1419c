pub mod accumulator;
pub mod clock;
pub mod net;
pub mod pacer;
pub mod pipeline;
pub mod ring;
pub mod sim;
pub mod telemetry;
pub mod timing;

pub use accumulator::TimestepAccumulator;
pub use clock::Clock;
pub use net::{
    DEFAULT_PORT, DEFAULT_TICK_RATE, Endpoint, EntityState, InputCommand, MAX_PACKET_SIZE,
    NetStats, Packet, PacketError, PacketHeader, PacketType, StateUpdate,
};
pub use pacer::FramePacer;
pub use pipeline::{LoopStage, Pipeline};
pub use ring::FrameSampleRing;
pub use sim::{Body, World};
pub use telemetry::{TimingReport, TimingReporter};
pub use timing::FrameTiming;
