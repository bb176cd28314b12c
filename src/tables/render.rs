//! Text forms of a table.

use std::fmt;

use itertools::Itertools;

use super::Table;

/// The table as a single line of comma-separated decimal values.
pub struct ValueList<'a>(&'a Table);

impl fmt::Display for ValueList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0.values.iter().format(","))
    }
}

/// A header declaring the table array. Outside synthesis the array is left
/// uninitialized, to be filled from the value list at run time; under
/// `__SYNTHESIS__` it is initialized with the literal values.
pub struct Declaration<'a>(&'a Table);

impl fmt::Display for Declaration<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let key = self.0.key;
        let symbol = key.symbol();
        let len = self.0.len();
        let ty = format!("ap_uint<{}>", key.value_bits());
        let guard = format!(
            "{}_{}_H_",
            key.kind().to_string().to_uppercase(),
            key.widths().iter().join("_"),
        );

        writeln!(f, "#ifndef {guard}")?;
        writeln!(f, "#define {guard}")?;
        writeln!(f)?;
        writeln!(f, "#ifndef __SYNTHESIS__")?;
        writeln!(f, "{ty} {symbol}[{len}];")?;
        writeln!(f, "#else")?;
        writeln!(f, "{ty} {symbol}[{len}] = {{ {} }};", self.0.value_list())?;
        writeln!(f, "#endif")?;
        writeln!(f)?;
        writeln!(f, "#endif")
    }
}

impl Table {
    pub fn value_list(&self) -> ValueList<'_> {
        ValueList(self)
    }

    pub fn declaration(&self) -> Declaration<'_> {
        Declaration(self)
    }
}
