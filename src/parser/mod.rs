pub mod error;
pub mod fields;
pub mod record;

pub use error::*;
pub use record::*;
