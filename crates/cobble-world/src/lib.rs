pub mod generator;
pub mod level;

pub use generator::generate_flat;
pub use level::Level;
