//! The canonical block palette and the conversion tables between block ID domains.
//!
//! Canonical IDs below [`EXTENDED`] are core blocks (0..[`CPE_COUNT`]) or server-side
//! physics blocks that render as some core block. IDs at or above [`EXTENDED`] are
//! custom blocks, whose raw wire ID is `id - EXTENDED`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Canonical (extended) block identifier.
pub type BlockId = u16;
/// Single-byte block identifier as understood by a legacy client.
pub type RawBlock = u8;

pub const AIR: BlockId = 0;
pub const STONE: BlockId = 1;
pub const GRASS: BlockId = 2;
pub const DIRT: BlockId = 3;
pub const COBBLESTONE: BlockId = 4;
pub const WOOD: BlockId = 5;
pub const SAPLING: BlockId = 6;
pub const BEDROCK: BlockId = 7;
pub const WATER: BlockId = 8;
pub const STILL_WATER: BlockId = 9;
pub const LAVA: BlockId = 10;
pub const STILL_LAVA: BlockId = 11;
pub const SAND: BlockId = 12;
pub const GRAVEL: BlockId = 13;
pub const LOG: BlockId = 17;
pub const LEAVES: BlockId = 18;
pub const SPONGE: BlockId = 19;
pub const GLASS: BlockId = 20;
pub const RED: BlockId = 21;
pub const ORANGE: BlockId = 22;
pub const GREEN: BlockId = 25;
pub const CYAN: BlockId = 28;
pub const BLUE: BlockId = 29;
pub const PINK: BlockId = 33;
pub const WHITE: BlockId = 36;
pub const BROWN_MUSHROOM: BlockId = 39;
pub const GOLD: BlockId = 41;
pub const IRON: BlockId = 42;
pub const SLAB: BlockId = 44;
pub const BRICK: BlockId = 45;
pub const TNT: BlockId = 46;
pub const OBSIDIAN: BlockId = 49;

/// Highest block ID of the classic 0.30 palette.
pub const CLASSIC_MAX_BLOCK: BlockId = 49;
/// Highest block ID of the extended core palette (classic + custom blocks level 1).
pub const CPE_MAX_BLOCK: BlockId = 65;
/// Number of core blocks.
pub const CPE_COUNT: BlockId = CPE_MAX_BLOCK + 1;
/// First canonical ID of the custom block range.
pub const EXTENDED: BlockId = 256;

// Physics blocks. These only exist server side and always render as a core block.
pub const OP_GLASS: BlockId = 100;
pub const OP_OBSIDIAN: BlockId = 101;
pub const OP_BRICK: BlockId = 102;
pub const OP_STONE: BlockId = 103;
pub const OP_COBBLESTONE: BlockId = 104;
pub const OP_AIR: BlockId = 105;
pub const OP_WATER: BlockId = 106;
pub const OP_LAVA: BlockId = 107;
pub const LAVA_SPONGE: BlockId = 109;
pub const FLOAT_WOOD: BlockId = 110;
pub const DOOR_LOG: BlockId = 111;
pub const FAST_LAVA: BlockId = 112;
pub const DOOR_OBSIDIAN: BlockId = 113;
pub const DOOR_GLASS: BlockId = 114;
pub const DOOR_STONE: BlockId = 115;
pub const DOOR_LEAVES: BlockId = 116;
pub const DOOR_SAND: BlockId = 117;
pub const DOOR_WOOD: BlockId = 118;
pub const ACTIVE_WATER: BlockId = 119;
pub const ACTIVE_LAVA: BlockId = 120;
pub const SMALL_TNT: BlockId = 182;
pub const BIG_TNT: BlockId = 183;
pub const TNT_EXPLOSION: BlockId = 184;

/// Classic replacements for the custom-blocks-level-1 palette (50..=65).
const CPE_FALLBACK: [RawBlock; (CPE_MAX_BLOCK - CLASSIC_MAX_BLOCK) as usize] = [
    SLAB as u8,           // cobblestone slab
    BROWN_MUSHROOM as u8, // rope
    SAND as u8,           // sandstone
    AIR as u8,            // snow
    LAVA as u8,           // fire
    PINK as u8,           // light pink
    GREEN as u8,          // forest green
    DIRT as u8,           // brown
    BLUE as u8,           // deep blue
    CYAN as u8,           // turquoise
    GLASS as u8,          // ice
    IRON as u8,           // ceramic tile
    OBSIDIAN as u8,       // magma
    WHITE as u8,          // pillar
    WOOD as u8,           // crate
    STONE as u8,          // stone brick
];

/// Maps a canonical custom block ID to its raw wire ID.
pub fn to_raw(block: BlockId) -> BlockId {
    if block >= EXTENDED {
        block - EXTENDED
    } else {
        block
    }
}

/// Converts a physics block to the core block it renders as.
/// Blocks without a visual mapping are returned unchanged.
pub fn convert(block: BlockId) -> BlockId {
    match block {
        OP_GLASS | DOOR_GLASS => GLASS,
        OP_OBSIDIAN | DOOR_OBSIDIAN => OBSIDIAN,
        OP_BRICK => BRICK,
        OP_STONE | DOOR_STONE => STONE,
        OP_COBBLESTONE => COBBLESTONE,
        OP_AIR => AIR,
        OP_WATER | ACTIVE_WATER => WATER,
        OP_LAVA | FAST_LAVA | ACTIVE_LAVA => LAVA,
        LAVA_SPONGE => SPONGE,
        FLOAT_WOOD | DOOR_WOOD => WOOD,
        DOOR_LOG => LOG,
        DOOR_LEAVES => LEAVES,
        DOOR_SAND => SAND,
        SMALL_TNT | BIG_TNT => TNT,
        TNT_EXPLOSION => LAVA,
        _ => block,
    }
}

/// The block vocabulary a client dialect can display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    /// The classic 0.30 palette (IDs 0..=49).
    Classic,
    /// Classic plus the custom blocks level 1 palette (IDs 0..=65).
    CustomBlocks,
}

impl Dialect {
    pub fn max_raw_block(self) -> RawBlock {
        match self {
            Dialect::Classic => CLASSIC_MAX_BLOCK as RawBlock,
            Dialect::CustomBlocks => CPE_MAX_BLOCK as RawBlock,
        }
    }
}

/// Converts a block in the limited (single byte) range to the closest block the given
/// dialect can display. The result never exceeds `dialect.max_raw_block()`.
pub fn convert_limited(block: BlockId, dialect: Dialect) -> RawBlock {
    let mut core = convert(block);
    if core >= CPE_COUNT {
        core = ORANGE;
    }
    if core > dialect.max_raw_block() as BlockId {
        core = CPE_FALLBACK[(core - CLASSIC_MAX_BLOCK - 1) as usize] as BlockId;
    }
    core as RawBlock
}

/// A user-defined block. Clients that cannot display it show `fallback` instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDefinition {
    pub name: String,
    pub fallback: RawBlock,
}

impl BlockDefinition {
    pub fn new(name: impl Into<String>, fallback: RawBlock) -> Self {
        Self {
            name: name.into(),
            fallback,
        }
    }
}

/// Custom block definitions of a level, keyed by canonical block ID.
/// A definition keyed by a core ID replaces that core block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDefinitions {
    defs: HashMap<BlockId, BlockDefinition>,
}

impl BlockDefinitions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, block: BlockId, def: BlockDefinition) {
        self.defs.insert(block, def);
    }

    pub fn undefine(&mut self, block: BlockId) -> Option<BlockDefinition> {
        self.defs.remove(&block)
    }

    pub fn get(&self, block: BlockId) -> Option<&BlockDefinition> {
        self.defs.get(&block)
    }

    /// Raw block to show for `block` when a client cannot represent it.
    pub fn fallback(&self, block: BlockId) -> RawBlock {
        self.defs
            .get(&block)
            .map(|def| def.fallback)
            .unwrap_or(AIR as RawBlock)
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
