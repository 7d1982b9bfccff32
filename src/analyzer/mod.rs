mod semantic;
mod symbol_table;
mod ty;

pub use semantic::*;
pub use symbol_table::*;
pub use ty::*;
