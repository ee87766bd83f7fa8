//! Capability adaptation of block IDs: the per-connection fallback table and the
//! resolution chain that turns any canonical block into a raw ID a client can show.

use cobble_types::block::{self, CPE_COUNT, EXTENDED, ORANGE};
use cobble_types::{BlockDefinitions, BlockId, Dialect, RawBlock};

/// Block ID conversion tables. Owned outside the session layer and injected read-only.
pub trait BlockConversion: Send + Sync {
    /// Canonical custom block to raw wire ID.
    fn to_raw(&self, block: BlockId) -> BlockId;
    /// Physics block to the core block it renders as.
    fn convert(&self, block: BlockId) -> BlockId;
    /// Limited-range block to the closest block `dialect` can display.
    fn convert_limited(&self, block: BlockId, dialect: Dialect) -> RawBlock;
}

/// The server's built-in palette tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardBlocks;

impl BlockConversion for StandardBlocks {
    fn to_raw(&self, block: BlockId) -> BlockId {
        block::to_raw(block)
    }

    fn convert(&self, block: BlockId) -> BlockId {
        block::convert(block)
    }

    fn convert_limited(&self, block: BlockId, dialect: Dialect) -> RawBlock {
        block::convert_limited(block, dialect)
    }
}

/// Per-connection mapping from every single-byte block ID to a raw ID valid for
/// the connection's dialect. Built once at login and read-only afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct FallbackTable {
    table: [RawBlock; FallbackTable::SIZE],
}

impl FallbackTable {
    pub const SIZE: usize = 256;

    pub fn build(conversion: &dyn BlockConversion, dialect: Dialect) -> Self {
        let mut table = [0; Self::SIZE];
        for (b, slot) in table.iter_mut().enumerate() {
            *slot = conversion.convert_limited(b as BlockId, dialect);
        }
        Self { table }
    }

    pub fn get(&self, raw: RawBlock) -> RawBlock {
        self.table[raw as usize]
    }

    pub fn as_slice(&self) -> &[RawBlock] {
        &self.table
    }
}

impl std::fmt::Debug for FallbackTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackTable")
            .field("size", &Self::SIZE)
            .finish()
    }
}

/// Resolve a canonical block to the raw ID sent to one client.
///
/// Order: extended to raw (or physics to core, with unknown IDs shown as orange),
/// then the level's custom fallback when the result is beyond `max_raw`, then any
/// custom definition replacing a core block, then the connection's fallback table.
pub fn convert_block(
    block: BlockId,
    conversion: &dyn BlockConversion,
    definitions: &BlockDefinitions,
    table: &FallbackTable,
    max_raw: BlockId,
) -> RawBlock {
    let mut raw = if block >= EXTENDED {
        conversion.to_raw(block)
    } else {
        let core = conversion.convert(block);
        if core >= CPE_COUNT {
            ORANGE
        } else {
            core
        }
    };
    if raw > max_raw {
        raw = definitions.fallback(block) as BlockId;
    }

    // A custom block replacing a core block is better shown as its fallback
    if raw < CPE_COUNT {
        if let Some(def) = definitions.get(raw) {
            raw = def.fallback as BlockId;
        }
    }

    let raw = RawBlock::try_from(raw).unwrap_or(ORANGE as RawBlock);
    table.get(raw)
}
