//! Storage backends for keepsake: databases and blob stores.

mod blob;
mod db;

pub use blob::*;
pub use db::*;
