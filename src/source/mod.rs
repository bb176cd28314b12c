//! Readers for the generated accelerator sources.

pub mod annotations;
pub mod blocks;
pub mod types;

pub use annotations::{Annotations, Field, FieldKind};
pub use blocks::{ConfigBlock, ExtractMode, UnterminatedBlock};
pub use types::{CallSites, TypeDef, TypeTable};

/// Line comment marker of the generated sources.
pub const COMMENT: &str = "//";

/// Returns the part of `line` preceding its first comment marker.
///
/// # Examples
///
/// ```
/// # use hls_ram_tables::source::code;
/// #
/// assert_eq!(code("x = 1; // y = 2;"), "x = 1; ");
/// assert_eq!(code("// x = 1;"), "");
/// ```
pub fn code(line: &str) -> &str {
    line.find(COMMENT).map_or(line, |pos| &line[..pos])
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
