pub mod client;
pub mod indicators;
pub mod sample;

pub use client::*;
pub use indicators::*;
pub use sample::*;
