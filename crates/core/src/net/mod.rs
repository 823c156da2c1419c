mod endpoint;
mod protocol;

pub use endpoint::{Endpoint, NetStats};
pub use protocol::{
    DEFAULT_PORT, DEFAULT_TICK_RATE, EntityState, InputCommand, MAX_PACKET_SIZE, Packet,
    PacketError, PacketHeader, PacketType, StateUpdate,
};
