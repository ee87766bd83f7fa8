pub mod block;
pub mod types;

pub use block::{BlockDefinition, BlockDefinitions, BlockId, Dialect, RawBlock};
pub use types::*;
