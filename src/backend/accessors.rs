//! Accessor functions for the generated tables.
//!
//! An accessor file declares a primary template, which handles width
//! combinations that have no table, and one full specialization per
//! configured table. When simulating, a specialization fills its table from
//! the value list the first time it is called. Its resource directives place
//! the table in LUT RAM, completely partitioned, or in block RAM, cyclically
//! partitioned.

use std::fmt;

use itertools::Itertools;

use crate::analysis::OperationSpec;
use crate::tables::{OperationKind, Table, TableKey};

/// One specialization of an accessor template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AccessorSpec {
    pub key: TableKey,
    pub entries: usize,
    pub dual_port: bool,
    pub lut_ram: bool,
    pub partition_factor: u32,
}

impl AccessorSpec {
    pub fn new(table: &Table, op: &OperationSpec) -> AccessorSpec {
        AccessorSpec {
            key: table.key(),
            entries: table.len(),
            dual_port: op.dual_port,
            lut_ram: op.lut_ram,
            partition_factor: op.partition_factor,
        }
    }

    /// Checks whether both accessors place their table the same way.
    pub fn same_directives(&self, other: &AccessorSpec) -> bool {
        (self.dual_port, self.lut_ram, self.partition_factor)
            == (other.dual_port, other.lut_ram, other.partition_factor)
    }

    fn template_args(&self) -> String {
        format!(
            "{},{},{},{}",
            self.key.widths().iter().join(","),
            self.dual_port,
            self.lut_ram,
            self.partition_factor,
        )
    }

    fn core(&self) -> &'static str {
        match (self.dual_port, self.lut_ram) {
            (false, false) => "ROM_1P_BRAM",
            (true, false) => "ROM_2P_BRAM",
            (false, true) => "ROM_1P_LUTRAM",
            (true, true) => "ROM_2P_LUTRAM",
        }
    }
}

struct Template {
    name: &'static str,
    params: &'static str,
    ret: &'static str,
}

const ADD_TEMPLATE: Template = Template {
    name: "ram_add_tables",
    params: "int width",
    ret: "ap_uint<width>",
};

const MUL_TEMPLATE: Template = Template {
    name: "ram_mul_tables",
    params: "int width1, int width2",
    ret: "ap_uint<width1 + width2>",
};

/// The accessor file for one kind of table.
pub struct Accessors<'a> {
    kind: OperationKind,
    specs: Vec<&'a AccessorSpec>,
    table_dir: &'a str,
}

impl<'a> Accessors<'a> {
    /// Selects the accessors of `kind` from `specs`. Value lists are loaded
    /// from `table_dir` at simulation time.
    pub fn new(
        kind: OperationKind,
        specs: &'a [AccessorSpec],
        table_dir: &'a str,
    ) -> Accessors<'a> {
        let specs = specs
            .iter()
            .filter(|spec| spec.key.kind() == kind)
            .unique()
            .collect();

        Accessors {
            kind,
            specs,
            table_dir,
        }
    }

    fn template(&self) -> &'static Template {
        match self.kind {
            OperationKind::Add => &ADD_TEMPLATE,
            OperationKind::Multiply => &MUL_TEMPLATE,
        }
    }

    fn load_path(&self, key: &TableKey) -> String {
        let dir = self.table_dir.trim_end_matches('/');

        if dir.is_empty() {
            key.values_file()
        } else {
            format!("{dir}/{}", key.values_file())
        }
    }

    fn fmt_fallback(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let template = self.template();

        writeln!(
            f,
            "template <{}, bool dual_port, bool lut_ram, int partition_factor>",
            template.params,
        )?;
        writeln!(f, "{}* {}() {{", template.ret, template.name)?;
        writeln!(f, "    // fallback: no table for these widths")?;
        writeln!(f, "#ifndef __SYNTHESIS__")?;
        writeln!(f, "    printf(\"Undefined bram {} call\\n\");", self.kind)?;
        writeln!(f, "#endif")?;
        writeln!(f, "    return nullptr;")?;
        writeln!(f, "}}")
    }

    fn fmt_specialization(
        &self,
        f: &mut fmt::Formatter,
        spec: &AccessorSpec,
    ) -> fmt::Result {
        let key = &spec.key;
        let symbol = key.symbol();
        let ty = format!("ap_uint<{}>", key.value_bits());

        writeln!(f, "template <>")?;
        writeln!(
            f,
            "{ty}* {}<{}>() {{",
            self.template().name,
            spec.template_args(),
        )?;
        writeln!(f, "#ifndef __SYNTHESIS__")?;
        writeln!(f, "    static bool loaded_weights = false;")?;
        writeln!(f, "    if (!loaded_weights) {{")?;
        writeln!(f, "        loaded_weights = true;")?;
        writeln!(
            f,
            "        printf(\"Loading {} table {}\\n\");",
            self.kind,
            key.widths().iter().join(" "),
        )?;
        writeln!(
            f,
            "        nnet::load_weights_from_txt<{ty},{}>({symbol}, \"{}\");",
            spec.entries,
            self.load_path(key),
        )?;
        writeln!(f, "    }}")?;
        writeln!(f, "#endif")?;
        writeln!(
            f,
            "#pragma HLS RESOURCE variable={symbol} core={}",
            spec.core(),
        )?;

        if spec.lut_ram {
            writeln!(f, "#pragma HLS ARRAY_PARTITION variable={symbol} complete")?;
        } else {
            writeln!(
                f,
                "#pragma HLS ARRAY_PARTITION variable={symbol} cyclic factor={}",
                spec.partition_factor,
            )?;
        }

        writeln!(f, "    return {symbol};")?;
        writeln!(f, "}}")
    }
}

impl fmt::Display for Accessors<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for key in self.specs.iter().map(|spec| spec.key).unique() {
            writeln!(f, "#include \"{}\"", key.header_file())?;
        }

        writeln!(f)?;
        self.fmt_fallback(f)?;

        for spec in &self.specs {
            writeln!(f)?;
            self.fmt_specialization(f, spec)?;
        }

        Ok(())
    }
}

/// Emits the accessor file for the add tables among `specs`.
pub fn emit_add_accessors(specs: &[AccessorSpec], table_dir: &str) -> String {
    Accessors::new(OperationKind::Add, specs, table_dir).to_string()
}

/// Emits the accessor file for the multiply tables among `specs`.
pub fn emit_mul_accessors(specs: &[AccessorSpec], table_dir: &str) -> String {
    Accessors::new(OperationKind::Multiply, specs, table_dir).to_string()
}
