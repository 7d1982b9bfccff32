mod codegen;
mod quadruple;

pub use codegen::*;
pub use quadruple::*;
