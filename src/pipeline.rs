//! Batch entry point.

use std::fs;
use std::ops::Index;
use std::path::{Path, PathBuf};

use strum::{EnumCount, VariantArray};
use strum_macros::{EnumCount, IntoStaticStr, VariantArray};

use crate::analysis::{self, WidthResolver};
use crate::backend::{self, Artifact};
use crate::source::{blocks, CallSites, ExtractMode, TypeTable};
use crate::tables::MAX_INDEX_BITS;
use crate::Error;

/// Source files read by the generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumCount, IntoStaticStr, VariantArray)]
pub enum Input {
    /// Parameter header holding the layer configuration structs.
    #[strum(serialize = "parameters.h")]
    Parameters,
    /// Top-level project source holding the layer calls.
    #[strum(serialize = "myproject.cpp")]
    Project,
    /// Header holding the numeric typedefs.
    #[strum(serialize = "defines.h")]
    Defines,
}

impl Input {
    pub const ALL: &[Input] = <Self as VariantArray>::VARIANTS;

    /// Position of the input in [`Sources`], also used as its file id when
    /// reporting diagnostics.
    #[inline]
    pub const fn id(self) -> usize {
        self as usize
    }

    /// Conventional file name of the input.
    pub fn file_name(self) -> &'static str {
        self.into()
    }
}

pub struct SourceFile {
    pub name: String,
    pub text: String,
}

/// The contents of every [`Input`].
pub struct Sources {
    files: [SourceFile; Input::COUNT],
}

impl Sources {
    /// Reads the parameter, project and defines files, in that order.
    pub fn read<P: AsRef<Path>>(paths: [P; Input::COUNT]) -> Result<Sources, Error> {
        let [parameters, project, defines] = paths;

        Ok(Sources {
            files: [
                read_file(parameters.as_ref())?,
                read_file(project.as_ref())?,
                read_file(defines.as_ref())?,
            ],
        })
    }

    /// Wraps in-memory texts, named after the conventional file names.
    pub fn from_texts(parameters: &str, project: &str, defines: &str) -> Sources {
        let file = |input: Input, text: &str| SourceFile {
            name: input.file_name().to_string(),
            text: text.to_string(),
        };

        Sources {
            files: [
                file(Input::Parameters, parameters),
                file(Input::Project, project),
                file(Input::Defines, defines),
            ],
        }
    }

    pub fn files(&self) -> &[SourceFile] {
        &self.files
    }
}

impl Index<Input> for Sources {
    type Output = str;

    #[inline]
    fn index(&self, input: Input) -> &Self::Output {
        &self.files[input.id()].text
    }
}

fn read_file(path: &Path) -> Result<SourceFile, Error> {
    let text = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;

    Ok(SourceFile {
        name: path.to_string_lossy().into_owned(),
        text,
    })
}

pub const DEFAULT_MAX_TABLE_BITS: u32 = 20;
pub const DEFAULT_TABLE_DIR: &str = "../ram_table_utils";

/// Settings of a generator run.
#[derive(Clone, Debug)]
pub struct Config {
    pub mode: ExtractMode,
    /// Widest table index to generate, at most [`MAX_INDEX_BITS`].
    pub max_table_bits: u32,
    /// Directory the accessors load value lists from.
    pub table_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            mode: ExtractMode::default(),
            max_table_bits: DEFAULT_MAX_TABLE_BITS,
            table_dir: DEFAULT_TABLE_DIR.to_string(),
        }
    }
}

/// Generates every artifact for `sources`. Nothing is written.
pub fn generate(sources: &Sources, config: &Config) -> Result<Vec<Artifact>, Error> {
    let blocks = blocks::extract(&sources[Input::Parameters], config.mode)?;
    let types = TypeTable::parse(&sources[Input::Defines]);
    let sites = CallSites::parse(&sources[Input::Project]);

    log::debug!(
        "Found {} labelled structs, {} typedefs and {} layer calls",
        blocks.len(),
        types.len(),
        sites.len(),
    );

    if config.max_table_bits > MAX_INDEX_BITS {
        log::warn!(
            "Ignoring table limit of {} bits, using {MAX_INDEX_BITS}",
            config.max_table_bits,
        );
    }

    let resolver = WidthResolver {
        types: &types,
        sites: &sites,
    };

    let specs = analysis::analyze(&blocks, &resolver);

    Ok(backend::build(&specs, config.max_table_bits, &config.table_dir)?)
}

/// Writes `artifacts` into `dir`, which must exist.
pub fn write_artifacts(artifacts: &[Artifact], dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut paths = Vec::with_capacity(artifacts.len());

    for artifact in artifacts {
        let path = artifact
            .write_to(dir)
            .map_err(|err| Error::io(dir.join(&artifact.name), err))?;

        log::info!("Wrote {}", path.display());

        paths.push(path);
    }

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMETERS: &str = "\
#ifndef PARAMETERS_H_
#define PARAMETERS_H_

// mul
struct mul_config : nnet::dense_config {
    static const unsigned ram_muls = 1;
    static const bool dual_port_muls = true;
    typedef w_t weight_t;
};

// fc2
struct config4 : nnet::dense_config {
    static const bool ram_add = true;
    static const bool lut_ram_add = true;
    typedef acc_t accum_t;
    // static const unsigned ram_muls = 1;
};

#endif
";

    const PROJECT: &str = "\
void myproject(in_t x[4], out_t y[4]) {
    nnet::dense<in_t, out_t, mul_config>(x, y, w2, b2);
    nnet::dense<out_t, res_t, config4>(y, z, w4, b4);
}
";

    const DEFINES: &str = "\
typedef ap_fixed<4,2> in_t;
typedef ap_fixed<6,3> w_t;
typedef ap_uint<3> acc_t;
";

    fn artifact<'a>(artifacts: &'a [Artifact], name: &str) -> &'a str {
        &artifacts
            .iter()
            .find(|artifact| artifact.name == name)
            .unwrap()
            .contents
    }

    #[test]
    fn input_ids() {
        for (id, input) in Input::ALL.iter().enumerate() {
            assert_eq!(input.id(), id);
        }

        assert_eq!(Input::Defines.file_name(), "defines.h");
    }

    #[test]
    fn end_to_end() {
        let sources = Sources::from_texts(PARAMETERS, PROJECT, DEFINES);

        let artifacts = generate(&sources, &Config::default()).unwrap();

        let names: Vec<_> = artifacts.iter().map(|a| a.name.as_str()).collect();

        assert_eq!(
            names,
            vec![
                "mul_table_4_6.h",
                "mul_table_4_6.txt",
                "add_table_3.h",
                "add_table_3.txt",
                backend::ADD_ACCESSORS,
                backend::MUL_ACCESSORS,
            ]
        );

        let values: Vec<u64> = artifact(&artifacts, "mul_table_4_6.txt")
            .split(',')
            .map(|value| value.parse().unwrap())
            .collect();

        assert_eq!(values.len(), 1024);
        assert_eq!(values[(3 << 6) | 5], 15);
        assert_eq!(values[1023], 15 * 63);

        let mul = artifact(&artifacts, backend::MUL_ACCESSORS);

        assert_eq!(mul.matches("template <>").count(), 1);
        assert!(mul.contains("ap_uint<10>* ram_mul_tables<4,6,true,false,1>() {"));
        assert!(mul.contains("ap_uint<width1 + width2>* ram_mul_tables() {"));
        assert!(mul.contains("\"../ram_table_utils/mul_table_4_6.txt\""));

        let add = artifact(&artifacts, backend::ADD_ACCESSORS);

        assert!(add.contains("ap_uint<3>* ram_add_tables<3,false,true,1>() {"));
        assert!(add.contains("core=ROM_1P_LUTRAM"));
    }

    #[test]
    fn unresolved_widths_are_skipped() {
        let sources = Sources::from_texts(PARAMETERS, "", DEFINES);

        let artifacts = generate(&sources, &Config::default()).unwrap();

        let names: Vec<_> = artifacts.iter().map(|a| a.name.as_str()).collect();

        assert_eq!(
            names,
            vec![
                "add_table_3.h",
                "add_table_3.txt",
                backend::ADD_ACCESSORS,
                backend::MUL_ACCESSORS,
            ]
        );
        assert!(!artifact(&artifacts, backend::MUL_ACCESSORS).contains("template <>"));
    }

    #[test]
    fn empty_sources() {
        let sources = Sources::from_texts("", "", "");

        let artifacts = generate(&sources, &Config::default()).unwrap();

        assert_eq!(artifacts.len(), 2);
    }

    #[test]
    fn strict_mode() {
        let parameters = "// fc1\nstruct config2 {\n    static const bool ram_add = true;\n";
        let sources = Sources::from_texts(parameters, PROJECT, DEFINES);

        let config = Config {
            mode: ExtractMode::Strict,
            ..Config::default()
        };

        assert!(matches!(
            generate(&sources, &config),
            Err(Error::UnterminatedBlock(_))
        ));
        assert!(generate(&sources, &Config::default()).is_ok());
    }

    #[test]
    fn table_limit() {
        let sources = Sources::from_texts(PARAMETERS, PROJECT, DEFINES);

        let config = Config {
            max_table_bits: 8,
            ..Config::default()
        };

        match generate(&sources, &config) {
            Err(Error::TableTooLarge(err)) => {
                assert_eq!(err.bits, 10);
                assert_eq!(err.limit, 8);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn huge_typedef_width_is_refused() {
        let parameters = "\
// fc1
struct config2 : nnet::dense_config {
    static const bool ram_add = true;
    typedef acc_t accum_t;
};
";
        let defines = "typedef ap_uint<2147483648> acc_t;\n";
        let sources = Sources::from_texts(parameters, PROJECT, defines);

        match generate(&sources, &Config::default()) {
            Err(Error::TableTooLarge(err)) => {
                assert_eq!(err.key, crate::tables::TableKey::Add { width: 1 << 31 });
                assert_eq!(err.bits, 1 << 32);
                assert_eq!(err.limit, DEFAULT_MAX_TABLE_BITS);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn missing_input() {
        let dir = std::env::temp_dir();
        let missing = dir.join("hls-ram-tables-missing-parameters.h");

        let err = Sources::read([&missing, &missing, &missing]).err().unwrap();

        assert!(matches!(err, Error::Io { ref path, .. } if *path == missing));
    }
}
