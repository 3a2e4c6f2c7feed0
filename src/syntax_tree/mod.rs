mod parser;
mod structure;

pub use parser::*;
pub use structure::*;
