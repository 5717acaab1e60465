pub mod keys;
pub mod tokens;

pub use keys::*;
pub use tokens::*;
