use crate::error::TransportError;
use bytes::{Bytes, BytesMut};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Outbound half of a connection as seen by the session layer.
///
/// Each call hands over complete packets that must reach the wire in order, with
/// no bytes from another call between them.
pub trait PacketSink: Send + Sync {
    fn send(&self, packets: Vec<Bytes>) -> Result<(), TransportError>;

    /// Stop accepting packets. Anything already queued is still flushed.
    fn close(&self);
}

/// Sink feeding a dedicated writer task. The channel serialises concurrent senders,
/// so whole batches are written back to back.
#[derive(Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<Vec<Bytes>>,
    closed: Arc<AtomicBool>,
}

impl PacketSink for ChannelSink {
    fn send(&self, packets: Vec<Bytes>) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        self.tx.send(packets).map_err(|_| TransportError::Closed)
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}

/// Spawn the writer task for `stream` and return the sink that feeds it.
/// The task ends when every sink clone is dropped or a write fails.
pub fn spawn_writer<W>(stream: W) -> (ChannelSink, JoinHandle<()>)
where
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<Vec<Bytes>>();
    let handle = tokio::spawn(async move {
        let mut writer = ConnectionWriter { stream };
        while let Some(batch) = rx.recv().await {
            if let Err(e) = writer.write_batch(&batch).await {
                debug!("Writer error: {}", e);
                break;
            }
        }
        let _ = writer.stream.shutdown().await;
    });
    let sink = ChannelSink {
        tx,
        closed: Default::default(),
    };
    (sink, handle)
}

struct ConnectionWriter<W> {
    stream: W,
}

impl<W: AsyncWrite + Unpin> ConnectionWriter<W> {
    async fn write_batch(&mut self, batch: &[Bytes]) -> std::io::Result<()> {
        for packet in batch {
            trace!(
                "Write packet opcode=0x{:02X} len={}",
                packet.first().copied().unwrap_or(0),
                packet.len()
            );
            self.stream.write_all(packet).await?;
        }
        self.stream.flush().await
    }
}

/// Inbound half of a connection: accumulates raw bytes for the decoder.
pub struct ConnectionReader<R> {
    stream: R,
    read_buf: BytesMut,
}

impl<R: AsyncRead + Unpin> ConnectionReader<R> {
    pub fn new(stream: R) -> Self {
        Self {
            stream,
            read_buf: BytesMut::with_capacity(4096),
        }
    }

    /// Read whatever the peer has sent next onto the end of the buffer.
    /// Returns an error once the peer has closed the connection.
    pub async fn fill(&mut self) -> std::io::Result<usize> {
        let mut tmp = [0u8; 4096];
        let n = self.stream.read(&mut tmp).await?;
        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "Connection closed",
            ));
        }
        self.read_buf.extend_from_slice(&tmp[..n]);
        Ok(n)
    }

    /// Bytes received but not yet consumed by the decoder.
    pub fn buffer(&mut self) -> &mut BytesMut {
        &mut self.read_buf
    }
}

/// Sink that records every packet in memory. Used for dry runs and tests.
#[derive(Default)]
pub struct MemorySink {
    packets: Mutex<Vec<Bytes>>,
    closed: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything sent so far, in wire order.
    pub fn packets(&self) -> Vec<Bytes> {
        self.packets.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn take(&self) -> Vec<Bytes> {
        self.packets
            .lock()
            .map(|mut p| std::mem::take(&mut *p))
            .unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl PacketSink for MemorySink {
    fn send(&self, packets: Vec<Bytes>) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::Closed);
        }
        let mut sent = self.packets.lock().map_err(|_| TransportError::Closed)?;
        sent.extend(packets);
        Ok(())
    }

    fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
