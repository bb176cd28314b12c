pub mod diagnostics;

pub use diagnostics::{Diagnostic, Reporter};
