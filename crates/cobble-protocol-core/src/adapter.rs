use crate::error::ProtocolResult;
use crate::{InboundPacket, OutboundPacket};
use bytes::BytesMut;
use cobble_types::{BlockId, Dialect, RawBlock};

/// Outcome of decoding the front of a receive buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// Not enough bytes for a whole packet. Nothing was consumed.
    NeedMore,
    /// One packet of `len` bytes was parsed.
    Packet { len: usize, packet: InboundPacket },
}

/// Outcome of one session decode step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStatus {
    NeedMore,
    Consumed(usize),
}

/// Per-connection block resolution, available to encoders.
pub trait BlockResolver {
    fn convert_block(&self, block: BlockId) -> RawBlock;
}

/// Trait for version-specific protocol codecs.
/// Each supported legacy protocol implements this trait; the session picks one
/// when the connection is accepted and keeps it for the connection's lifetime.
pub trait ProtocolCodec: Send + Sync {
    /// Name of the client software this codec speaks to.
    fn client_name(&self) -> &'static str;

    /// The protocol version number this codec handles.
    fn protocol_version(&self) -> i32;

    /// Block vocabulary of the client, used to build the fallback table.
    fn dialect(&self) -> Dialect;

    /// Largest raw ID the block resolution chain may produce before the custom
    /// fallback step kicks in.
    fn max_raw_block(&self) -> BlockId;

    /// Whether the client can be sent a MOTD more than once.
    fn can_resend_motd(&self) -> bool {
        true
    }

    /// Decode one packet from the front of `buf`.
    ///
    /// `buf` holds exactly the bytes available; implementations must not assume
    /// anything past its end and must return [`Decoded::NeedMore`] rather than
    /// guess when a length field points beyond it.
    fn decode(&self, buf: &[u8]) -> ProtocolResult<Decoded>;

    /// Encode an outbound message into complete wire packets, in send order.
    fn encode(
        &self,
        packet: &OutboundPacket,
        blocks: &dyn BlockResolver,
    ) -> ProtocolResult<Vec<BytesMut>>;
}
