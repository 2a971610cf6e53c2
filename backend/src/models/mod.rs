pub mod macros;
pub mod league;

pub use league::*;
