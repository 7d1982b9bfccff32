mod expr;
mod parser;
mod result;

pub use parser::*;
pub use result::*;
