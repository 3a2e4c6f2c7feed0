mod cursor;
mod parser;
mod structure;

pub use cursor::*;
pub use parser::*;
pub use structure::*;
