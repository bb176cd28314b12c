//! Generates lookup tables and accessor functions that let an hls4ml
//! accelerator replace small-width additions and multiplications with memory
//! reads.

pub mod analysis;
pub mod backend;
mod error;
pub mod opts;
pub mod pipeline;
pub mod source;
pub mod tables;
pub mod utils;

pub use error::Error;
