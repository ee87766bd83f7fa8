use serde::{Deserialize, Serialize};

/// Number of fixed-point position units per block.
pub const UNITS_PER_BLOCK: i32 = 32;

/// A position in the world, in 1/32 block fixed-point units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Position {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Position of the centre of a block column, standing on the given block Y.
    pub fn from_block(x: i32, y: i32, z: i32) -> Self {
        Self {
            x: x * UNITS_PER_BLOCK + UNITS_PER_BLOCK / 2,
            y: y * UNITS_PER_BLOCK,
            z: z * UNITS_PER_BLOCK + UNITS_PER_BLOCK / 2,
        }
    }

    pub fn block_x(&self) -> i32 {
        self.x >> 5
    }

    pub fn block_y(&self) -> i32 {
        self.y >> 5
    }

    pub fn block_z(&self) -> i32 {
        self.z >> 5
    }
}

/// Look direction. Each component is a fraction of a full turn in 256ths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Orientation {
    /// Yaw (rotation around the vertical axis).
    pub rot_y: u8,
    /// Pitch of the head.
    pub head_x: u8,
}

impl Orientation {
    pub fn new(rot_y: u8, head_x: u8) -> Self {
        Self { rot_y, head_x }
    }
}

/// Network entity ID. Every legacy protocol addresses entities with a single byte.
pub type EntityId = u8;

/// The entity ID a client uses to refer to itself.
pub const SELF_ID: EntityId = 0xFF;

/// What a block edit does to the target cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockAction {
    Destroy,
    Place,
}

/// Kind of text message. Older clients only understand `Normal`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    #[default]
    Normal,
    Status1,
    Status2,
    Status3,
    BottomRight1,
    BottomRight2,
    BottomRight3,
    Announcement,
}
