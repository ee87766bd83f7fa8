use crate::error::{ProtocolError, ProtocolResult};
use cobble_types::{BlockDefinitions, BlockId, Orientation, Position};
use std::sync::Arc;

/// Immutable copy of a level, as handed to codecs for a full level transfer.
/// Arrays are laid out `(y * length + z) * width + x`.
#[derive(Debug, Clone)]
pub struct LevelSnapshot {
    pub width: u16,
    pub height: u16,
    pub length: u16,
    pub blocks: Vec<BlockId>,
    pub metadata: Vec<u8>,
    pub spawn: Position,
    pub spawn_orientation: Orientation,
    pub definitions: Arc<BlockDefinitions>,
}

impl LevelSnapshot {
    pub fn new(
        width: u16,
        height: u16,
        length: u16,
        blocks: Vec<BlockId>,
        metadata: Vec<u8>,
    ) -> ProtocolResult<Self> {
        let volume = width as usize * height as usize * length as usize;
        if blocks.len() != volume || metadata.len() != volume {
            return Err(ProtocolError::MalformedField(format!(
                "level arrays ({} blocks, {} metadata) do not match {}x{}x{}",
                blocks.len(),
                metadata.len(),
                width,
                height,
                length
            )));
        }
        Ok(Self {
            width,
            height,
            length,
            blocks,
            metadata,
            spawn: Position::default(),
            spawn_orientation: Orientation::default(),
            definitions: Arc::new(BlockDefinitions::new()),
        })
    }

    pub fn volume(&self) -> usize {
        self.blocks.len()
    }
}

/// Recover `(x, y, z)` from a linear index into a level of the given width and length.
pub fn index_to_coords(index: usize, width: u16, length: u16) -> (usize, usize, usize) {
    let width = width.max(1) as usize;
    let length = length.max(1) as usize;
    let x = index % width;
    let y = (index / width) / length;
    let z = (index / width) % length;
    (x, y, z)
}
