pub mod adapter;
pub mod codec;
pub mod compression;
pub mod connection;
pub mod error;
pub mod fallback;
pub mod hooks;
pub mod level;
pub mod packets;
pub mod session;
pub mod state;
pub mod sync;
pub mod text;

pub use adapter::*;
pub use codec::*;
pub use error::{ProtocolError, ProtocolResult, TransportError};
pub use fallback::{BlockConversion, FallbackTable, StandardBlocks};
pub use hooks::SessionHooks;
pub use level::LevelSnapshot;
pub use packets::*;
pub use session::Session;
pub use state::*;
pub use connection::{spawn_writer, ChannelSink, ConnectionReader, MemorySink, PacketSink};
