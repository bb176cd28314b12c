//! Operand width resolution.
//!
//! Widths come from three places: the call site of a layer names its input
//! type, the layer's configuration struct aliases its weight and accumulator
//! types, and the defines header gives each type its encoded width.

use std::fmt;

use crate::source::{Annotations, CallSites, ConfigBlock, TypeTable};
use crate::tables::{OperationKind, TableKey};

const WEIGHT_TYPE: &str = "weight_t";
const ACCUM_TYPE: &str = "accum_t";

/// Looks up the width of a type defined in the defines header.
///
/// # Examples
///
/// ```
/// # use hls_ram_tables::analysis::resolve_width;
/// # use hls_ram_tables::source::TypeTable;
/// #
/// let types = TypeTable::parse("typedef ap_fixed<16,6> input_t;");
///
/// assert_eq!(resolve_width("input_t", &types), Some(16));
/// assert_eq!(resolve_width("result_t", &types), None);
/// ```
pub fn resolve_width(type_name: &str, types: &TypeTable) -> Option<u32> {
    types
        .get(type_name)
        .map(|def| def.width)
        .filter(|&width| width > 0)
}

/// Returns the input type of the first layer invocation configured by
/// `config`.
pub fn operand_type<'a>(sites: &'a CallSites, config: &str) -> Option<&'a str> {
    sites.get(config).map(|site| site.input_type.as_str())
}

/// Why a block's operand widths could not be determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unresolved {
    /// No layer invocation names the configuration struct.
    NoCallSite,
    /// The struct lacks a `typedef ... field;` line.
    NoTypedef(&'static str),
    /// The type has no width typedef in the defines header.
    UnknownType(String),
}

impl fmt::Display for Unresolved {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Unresolved::NoCallSite => write!(f, "no layer invocation uses it"),
            Unresolved::NoTypedef(field) => {
                write!(f, "it does not define `{field}`")
            }
            Unresolved::UnknownType(name) => {
                write!(f, "the width of `{name}` is unknown")
            }
        }
    }
}

/// Cross-references the three sources to find the table key of a `kind`
/// operation configured by `block`.
pub struct WidthResolver<'a> {
    pub types: &'a TypeTable,
    pub sites: &'a CallSites,
}

impl WidthResolver<'_> {
    pub fn resolve(
        &self,
        kind: OperationKind,
        block: &ConfigBlock,
        annotations: &Annotations,
    ) -> Result<TableKey, Unresolved> {
        match kind {
            OperationKind::Add => {
                let width = self.aliased_width(annotations, ACCUM_TYPE)?;

                Ok(TableKey::Add { width })
            }
            OperationKind::Multiply => {
                let input_type = operand_type(self.sites, block.name)
                    .ok_or(Unresolved::NoCallSite)?;

                let input = self.width(input_type)?;
                let weight = self.aliased_width(annotations, WEIGHT_TYPE)?;

                Ok(TableKey::Mul { input, weight })
            }
        }
    }

    fn width(&self, type_name: &str) -> Result<u32, Unresolved> {
        resolve_width(type_name, self.types)
            .ok_or_else(|| Unresolved::UnknownType(type_name.to_string()))
    }

    fn aliased_width(
        &self,
        annotations: &Annotations,
        field: &'static str,
    ) -> Result<u32, Unresolved> {
        let target = annotations
            .typedef_target(field)
            .ok_or(Unresolved::NoTypedef(field))?;

        self.width(target)
    }
}
