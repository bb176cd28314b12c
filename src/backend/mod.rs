//! Output artifacts: table headers, value lists and accessor files.

mod accessors;
mod manager;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub use accessors::{emit_add_accessors, emit_mul_accessors, AccessorSpec, Accessors};
pub use manager::TableManager;

use crate::analysis::OperationSpec;
use crate::tables::TableTooLarge;

pub const ADD_ACCESSORS: &str = "test_ram_add_tables.h";
pub const MUL_ACCESSORS: &str = "test_ram_mul_tables.h";

/// A generated file, named relative to the output directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub contents: String,
}

impl Artifact {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Artifact {
        Artifact {
            name: name.into(),
            contents: contents.into(),
        }
    }

    /// Writes the artifact into `dir`, replacing any existing file.
    pub fn write_to(&self, dir: &Path) -> io::Result<PathBuf> {
        let path = dir.join(&self.name);

        fs::write(&path, &self.contents)?;

        Ok(path)
    }
}

/// Builds every artifact for `specs`: a header and a value list per distinct
/// table in order of first use, followed by the add and multiply accessor
/// files. Accessor files are produced even when they specialize nothing.
pub fn build(
    specs: &[OperationSpec],
    max_table_bits: u32,
    table_dir: &str,
) -> Result<Vec<Artifact>, TableTooLarge> {
    let mut manager = TableManager::new(max_table_bits);
    let mut accessors: Vec<AccessorSpec> = Vec::new();

    for spec in specs {
        let accessor = AccessorSpec::new(manager.get(spec.key)?, spec);

        if accessors.contains(&accessor) {
            continue;
        }

        if accessors
            .iter()
            .any(|other| other.key == accessor.key && !other.same_directives(&accessor))
        {
            log::warn!(
                "`{}` is shared by layers with different memory directives; `{}` ({}) adds another specialization",
                accessor.key,
                spec.config,
                spec.label,
            );
        }

        accessors.push(accessor);
    }

    let mut artifacts = Vec::new();

    for table in manager.tables() {
        let key = table.key();

        artifacts.push(Artifact::new(key.header_file(), table.declaration().to_string()));
        artifacts.push(Artifact::new(key.values_file(), table.value_list().to_string()));
    }

    artifacts.push(Artifact::new(
        ADD_ACCESSORS,
        emit_add_accessors(&accessors, table_dir),
    ));
    artifacts.push(Artifact::new(
        MUL_ACCESSORS,
        emit_mul_accessors(&accessors, table_dir),
    ));

    Ok(artifacts)
}
