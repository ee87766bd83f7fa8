use cobble_protocol_core::LevelSnapshot;
use cobble_types::block::AIR;
use cobble_types::{BlockAction, BlockDefinition, BlockDefinitions, BlockId, Orientation, Position};
use std::sync::Arc;
use tracing::debug;

/// A single rectangular level held in memory.
/// Block and metadata arrays are laid out `(y * length + z) * width + x`.
#[derive(Debug, Clone)]
pub struct Level {
    name: String,
    width: u16,
    height: u16,
    length: u16,
    blocks: Vec<BlockId>,
    metadata: Vec<u8>,
    spawn: Position,
    spawn_orientation: Orientation,
    definitions: Arc<BlockDefinitions>,
}

impl Level {
    /// An all-air level with the spawn in the middle of the floor.
    pub fn new(name: impl Into<String>, width: u16, height: u16, length: u16) -> Self {
        let volume = width as usize * height as usize * length as usize;
        Self {
            name: name.into(),
            width,
            height,
            length,
            blocks: vec![AIR; volume],
            metadata: vec![0; volume],
            spawn: Position::from_block(width as i32 / 2, 0, length as i32 / 2),
            spawn_orientation: Orientation::default(),
            definitions: Arc::new(BlockDefinitions::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn length(&self) -> u16 {
        self.length
    }

    pub fn volume(&self) -> usize {
        self.blocks.len()
    }

    pub fn in_bounds(&self, x: u16, y: u16, z: u16) -> bool {
        x < self.width && y < self.height && z < self.length
    }

    /// Linear index of a cell, or `None` outside the level.
    pub fn index(&self, x: u16, y: u16, z: u16) -> Option<usize> {
        if !self.in_bounds(x, y, z) {
            return None;
        }
        Some((y as usize * self.length as usize + z as usize) * self.width as usize + x as usize)
    }

    /// Block at a cell. Outside the level everything is air.
    pub fn get_block(&self, x: u16, y: u16, z: u16) -> BlockId {
        self.index(x, y, z).map_or(AIR, |i| self.blocks[i])
    }

    /// Set a block, returning the one it replaced. Out of bounds writes are ignored.
    pub fn set_block(&mut self, x: u16, y: u16, z: u16, block: BlockId) -> Option<BlockId> {
        let index = self.index(x, y, z)?;
        let old = std::mem::replace(&mut self.blocks[index], block);
        self.metadata[index] = 0;
        Some(old)
    }

    /// Apply a player's edit. Returns the block now in the cell when the edit
    /// changed something.
    pub fn apply_edit(
        &mut self,
        x: u16,
        y: u16,
        z: u16,
        action: BlockAction,
        block: BlockId,
    ) -> Option<BlockId> {
        let new = match action {
            BlockAction::Destroy => AIR,
            BlockAction::Place => block,
        };
        let old = self.set_block(x, y, z, new)?;
        if old == new {
            debug!("Edit at ({}, {}, {}) in {} changed nothing", x, y, z, self.name);
            return None;
        }
        Some(new)
    }

    /// Fill the horizontal layers `from..to` with one block.
    pub fn fill_layers(&mut self, from: u16, to: u16, block: BlockId) {
        let layer = self.width as usize * self.length as usize;
        let to = to.min(self.height) as usize;
        let from = (from as usize).min(to);
        self.blocks[from * layer..to * layer].fill(block);
    }

    pub fn spawn(&self) -> (Position, Orientation) {
        (self.spawn, self.spawn_orientation)
    }

    pub fn set_spawn(&mut self, position: Position, orientation: Orientation) {
        self.spawn = position;
        self.spawn_orientation = orientation;
    }

    pub fn definitions(&self) -> &Arc<BlockDefinitions> {
        &self.definitions
    }

    /// Add or replace a custom block definition.
    pub fn define_block(&mut self, block: BlockId, definition: BlockDefinition) {
        Arc::make_mut(&mut self.definitions).define(block, definition);
    }

    /// Immutable copy for a level transfer.
    pub fn snapshot(&self) -> LevelSnapshot {
        LevelSnapshot {
            width: self.width,
            height: self.height,
            length: self.length,
            blocks: self.blocks.clone(),
            metadata: self.metadata.clone(),
            spawn: self.spawn,
            spawn_orientation: self.spawn_orientation,
            definitions: self.definitions.clone(),
        }
    }
}
