use std::path::PathBuf;

use argh::FromArgs;
use log::LevelFilter;

use crate::pipeline::{Config, DEFAULT_MAX_TABLE_BITS, DEFAULT_TABLE_DIR};
use crate::source::ExtractMode;

/// Lookup table generator for hls4ml projects.
#[derive(FromArgs)]
pub struct Opts {
    /// parameter header holding the layer configurations
    #[argh(option, default = "PathBuf::from(\"../parameters.h\")")]
    pub parameters: PathBuf,

    /// project source holding the layer calls
    #[argh(option, default = "PathBuf::from(\"../myproject.cpp\")")]
    pub project: PathBuf,

    /// header holding the numeric typedefs
    #[argh(option, default = "PathBuf::from(\"../defines.h\")")]
    pub defines: PathBuf,

    /// output directory
    #[argh(option, short = 'o', default = "PathBuf::from(\".\")")]
    pub output: PathBuf,

    /// directory the accessors load value lists from
    #[argh(option, default = "DEFAULT_TABLE_DIR.to_string()")]
    pub table_dir: String,

    /// widest table index to generate, in bits
    #[argh(option, default = "DEFAULT_MAX_TABLE_BITS")]
    pub max_table_bits: u32,

    /// reject structs that are never closed
    #[argh(switch)]
    pub strict: bool,

    /// logging level
    #[argh(option, long = "log", default = "LevelFilter::Warn")]
    pub log_level: LevelFilter,
}

impl Opts {
    /// Parse options from `env::args`.
    pub fn parse() -> Opts {
        argh::from_env()
    }

    pub fn inputs(&self) -> [&PathBuf; 3] {
        [&self.parameters, &self.project, &self.defines]
    }

    pub fn config(&self) -> Config {
        Config {
            mode: if self.strict {
                ExtractMode::Strict
            } else {
                ExtractMode::Lenient
            },
            max_table_bits: self.max_table_bits,
            table_dir: self.table_dir.clone(),
        }
    }
}
