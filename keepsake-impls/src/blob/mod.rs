mod memory;
mod vercel;

pub use memory::*;
pub use vercel::*;
