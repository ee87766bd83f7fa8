use crate::level::Level;
use cobble_types::block::{BEDROCK, DIRT, GRASS};
use cobble_types::{Orientation, Position};
use tracing::info;

/// Generates a flat level: bedrock floor, dirt up to half the height, one layer of grass.
/// Layer layout:
///   y = 0: bedrock
///   y = 1 .. height/2 - 1: dirt
///   y = height/2 - 1: grass
///   above: air
/// The spawn is in the middle, standing on the grass.
pub fn generate_flat(name: &str, width: u16, height: u16, length: u16) -> Level {
    let mut level = Level::new(name, width, height, length);
    let surface = height / 2;

    if surface > 0 {
        level.fill_layers(0, 1, BEDROCK);
        level.fill_layers(1, surface - 1, DIRT);
        level.fill_layers(surface - 1, surface, GRASS);
    }

    // Positions are at eye level, one block above the feet
    let spawn = Position::from_block(width as i32 / 2, surface as i32 + 1, length as i32 / 2);
    level.set_spawn(spawn, Orientation::default());

    info!("Generated flat level {} ({}x{}x{})", name, width, height, length);
    level
}

#[cfg(test)]
mod tests {
    use super::*;
    use cobble_types::block::AIR;

    #[test]
    fn test_flat_layers() {
        let level = generate_flat("main", 16, 8, 16);
        assert_eq!(level.get_block(0, 0, 0), BEDROCK);
        assert_eq!(level.get_block(5, 1, 5), DIRT);
        assert_eq!(level.get_block(5, 2, 5), DIRT);
        assert_eq!(level.get_block(15, 3, 15), GRASS);
        assert_eq!(level.get_block(15, 4, 15), AIR);
    }

    #[test]
    fn test_flat_spawn_above_surface() {
        let level = generate_flat("main", 16, 8, 16);
        let (spawn, _) = level.spawn();
        assert_eq!(spawn.block_x(), 8);
        assert_eq!(spawn.block_y(), 5);
        assert_eq!(spawn.block_z(), 8);
    }

    #[test]
    fn test_tiny_level() {
        let level = generate_flat("tiny", 1, 1, 1);
        assert_eq!(level.get_block(0, 0, 0), AIR);
    }
}
