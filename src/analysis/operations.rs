//! Selection of operations to implement as table lookups.

use strum::VariantArray;

use super::widths::WidthResolver;
use crate::source::{Annotations, ConfigBlock};
use crate::tables::{OperationKind, TableKey};

/// How a struct requests table lookups for an operation.
#[derive(Clone, Copy, Debug)]
enum Gate {
    /// `name = true;`
    Flag(&'static str),
    /// `name = n;` with `n > 0`
    Count(&'static str),
}

/// Configuration field names for one kind of operation.
struct Fields {
    gate: Gate,
    dual_port: &'static str,
    lut_ram: &'static str,
    partition_factor: &'static str,
}

const ADD_FIELDS: Fields = Fields {
    gate: Gate::Flag("ram_add"),
    dual_port: "dual_port_add",
    lut_ram: "lut_ram_add",
    partition_factor: "ram_partition_factor_add",
};

const MUL_FIELDS: Fields = Fields {
    gate: Gate::Count("ram_muls"),
    dual_port: "dual_port_muls",
    lut_ram: "lut_ram_muls",
    partition_factor: "ram_partition_factor_muls",
};

fn fields(kind: OperationKind) -> &'static Fields {
    match kind {
        OperationKind::Add => &ADD_FIELDS,
        OperationKind::Multiply => &MUL_FIELDS,
    }
}

const DEFAULT_PARTITION_FACTOR: u32 = 1;

/// A table-backed operation requested by one configuration struct.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperationSpec<'src> {
    /// Name of the configuration struct.
    pub config: &'src str,
    /// Layer the struct configures.
    pub label: &'src str,
    pub key: TableKey,
    pub dual_port: bool,
    /// Use distributed (LUT) memory rather than block RAM.
    pub lut_ram: bool,
    /// Cyclic partitioning factor, for block RAM.
    pub partition_factor: u32,
}

impl OperationSpec<'_> {
    pub fn kind(&self) -> OperationKind {
        self.key.kind()
    }
}

/// Collects the table-backed operations of every labelled block, in block
/// order. Operations whose widths cannot be resolved are skipped.
pub fn analyze<'src>(
    blocks: &[ConfigBlock<'src>],
    resolver: &WidthResolver,
) -> Vec<OperationSpec<'src>> {
    let mut specs = Vec::new();

    for block in blocks {
        let Some(label) = block.label else {
            continue;
        };

        let annotations = block.annotations();

        for &kind in OperationKind::VARIANTS {
            if !is_enabled(&annotations, fields(kind).gate) {
                continue;
            }

            match resolver.resolve(kind, block, &annotations) {
                Ok(key) => {
                    let spec = configure(block.name, label, key, &annotations);

                    log::debug!("Found {kind} table operation: {spec:?}");

                    specs.push(spec);
                }
                Err(reason) => {
                    log::warn!(
                        "Skipping {kind} table for `{}` ({label}): {reason}",
                        block.name,
                    );
                }
            }
        }
    }

    specs
}

fn is_enabled(annotations: &Annotations, gate: Gate) -> bool {
    match gate {
        Gate::Flag(name) => annotations.has_flag(name),
        Gate::Count(name) => annotations.has_count(name),
    }
}

fn configure<'src>(
    config: &'src str,
    label: &'src str,
    key: TableKey,
    annotations: &Annotations,
) -> OperationSpec<'src> {
    let fields = fields(key.kind());

    let factor = annotations
        .int_value(fields.partition_factor, DEFAULT_PARTITION_FACTOR.into());

    let partition_factor = match u32::try_from(factor) {
        Ok(factor) if factor > 0 => factor,
        _ => {
            log::warn!(
                "Ignoring invalid `{}` of {factor} in `{config}`",
                fields.partition_factor,
            );

            DEFAULT_PARTITION_FACTOR
        }
    };

    OperationSpec {
        config,
        label,
        key,
        dual_port: annotations.has_flag(fields.dual_port),
        lut_ram: annotations.has_flag(fields.lut_ram),
        partition_factor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{blocks, CallSites, ExtractMode, TypeTable};

    const PARAMETERS: &str = "\
// fc1
struct config2 : nnet::dense_config {
    static const unsigned ram_muls = 16;
    static const bool dual_port_muls = true;
    static const bool lut_ram_muls = false;
    static const unsigned ram_partition_factor_muls = 4;
    static const bool ram_add = true;
    static const bool dual_port_add = false;
    static const bool lut_ram_add = true;
    typedef accum2_t accum_t;
    typedef weight2_t weight_t;
};

struct config3 : nnet::dense_config {
    static const unsigned ram_muls = 1;
    typedef weight2_t weight_t;
};

// fc2
struct config4 : nnet::dense_config {
    static const unsigned ram_muls = 0;
    // static const bool ram_add = true;
    static const unsigned ram_partition_factor_add = 0;
    typedef accum2_t accum_t;
    typedef weight2_t weight_t;
};

// fc3
struct config5 : nnet::dense_config {
    static const unsigned ram_muls = 2;
    static const bool ram_add = true;
    static const unsigned ram_partition_factor_add = 0;
    typedef unknown_t accum_t;
    typedef weight2_t weight_t;
};
";

    const DEFINES: &str = "\
typedef ap_fixed<4,2> input_t;
typedef ap_fixed<6,2> weight2_t;
typedef ap_uint<5> accum2_t;
";

    const PROJECT: &str = "\
nnet::dense<input_t, layer2_t, config2>(input_1, layer2_out, w2, b2);
nnet::dense<input_t, layer3_t, config3>(layer2_out, layer3_out, w3, b3);
nnet::dense<input_t, layer4_t, config4>(layer3_out, layer4_out, w4, b4);
nnet::dense<input_t, layer5_t, config5>(layer4_out, layer5_out, w5, b5);
";

    fn specs(parameters: &str) -> Vec<OperationSpec<'_>> {
        let types = TypeTable::parse(DEFINES);
        let sites = CallSites::parse(PROJECT);
        let resolver = WidthResolver {
            types: &types,
            sites: &sites,
        };

        let blocks = blocks::extract(parameters, ExtractMode::Strict).unwrap();

        analyze(&blocks, &resolver)
    }

    #[test]
    fn operations() {
        assert_eq!(
            specs(PARAMETERS),
            vec![
                OperationSpec {
                    config: "config2",
                    label: "fc1",
                    key: TableKey::Add { width: 5 },
                    dual_port: false,
                    lut_ram: true,
                    partition_factor: 1,
                },
                OperationSpec {
                    config: "config2",
                    label: "fc1",
                    key: TableKey::Mul {
                        input: 4,
                        weight: 6
                    },
                    dual_port: true,
                    lut_ram: false,
                    partition_factor: 4,
                },
                OperationSpec {
                    config: "config5",
                    label: "fc3",
                    key: TableKey::Mul {
                        input: 4,
                        weight: 6
                    },
                    dual_port: false,
                    lut_ram: false,
                    partition_factor: 1,
                },
            ]
        );
    }

    #[test]
    fn add_fields_are_read_for_add_tables() {
        let specs = specs(concat!(
            "// fc1\n",
            "struct config2 {\n",
            "    static const bool ram_add = true;\n",
            "    static const bool dual_port_muls = true;\n",
            "    static const bool lut_ram_muls = true;\n",
            "    static const unsigned ram_partition_factor_muls = 8;\n",
            "    static const unsigned ram_partition_factor_add = 2;\n",
            "    typedef accum2_t accum_t;\n",
            "};\n",
        ));

        assert_eq!(specs.len(), 1);
        assert!(!specs[0].dual_port);
        assert!(!specs[0].lut_ram);
        assert_eq!(specs[0].partition_factor, 2);
    }
}
