//! Shared data types and the traits every keepsake backend implements.

mod blob;
mod db;
mod util;

pub use blob::*;
pub use db::*;
pub use util::*;
