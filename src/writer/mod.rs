pub mod loader;
pub mod schema_gen;
pub mod sqlite;

pub use loader::*;
pub use schema_gen::*;
pub use sqlite::*;
