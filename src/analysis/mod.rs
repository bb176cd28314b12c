//! Analysis of configuration structs.

mod operations;
mod widths;

pub use operations::{analyze, OperationSpec};
pub use widths::{operand_type, resolve_width, Unresolved, WidthResolver};
