mod adapter;
mod decode;
mod encode;

pub use adapter::*;

#[cfg(test)]
mod tests;
