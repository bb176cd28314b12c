//! Lookup table contents.
//!
//! Tables are indexed by the concatenation of their operand bit patterns, the
//! first operand occupying the most-significant bits.

mod render;

use std::{cmp, fmt};

use itertools::{iproduct, Itertools};
use smallvec::{smallvec, SmallVec};
use strum_macros::{Display, VariantArray};

pub use render::{Declaration, ValueList};

/// Widest index accepted regardless of the configured limit.
pub const MAX_INDEX_BITS: u32 = 32;

/// Arithmetic operations that can be replaced by a table lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, VariantArray)]
pub enum OperationKind {
    #[strum(serialize = "add")]
    Add,
    #[strum(serialize = "mul")]
    Multiply,
}

/// Identifies a table by its operation and operand widths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TableKey {
    /// Saturating addition of two `width`-bit operands.
    Add { width: u32 },
    /// Exact product of an `input`-bit and a `weight`-bit operand.
    Mul { input: u32, weight: u32 },
}

impl TableKey {
    pub fn kind(&self) -> OperationKind {
        match self {
            TableKey::Add { .. } => OperationKind::Add,
            TableKey::Mul { .. } => OperationKind::Multiply,
        }
    }

    /// Operand widths, in index order.
    pub fn widths(&self) -> SmallVec<[u32; 2]> {
        match *self {
            TableKey::Add { width } => smallvec![width],
            TableKey::Mul { input, weight } => smallvec![input, weight],
        }
    }

    /// Width of the table index. Computed in `u64` so that no operand
    /// widths can overflow it.
    pub fn index_bits(&self) -> u64 {
        match *self {
            TableKey::Add { width } => 2 * u64::from(width),
            TableKey::Mul { input, weight } => {
                u64::from(input) + u64::from(weight)
            }
        }
    }

    /// Width of a table entry.
    pub fn value_bits(&self) -> u64 {
        match *self {
            TableKey::Add { width } => width.into(),
            TableKey::Mul { input, weight } => {
                u64::from(input) + u64::from(weight)
            }
        }
    }

    /// Name of the array holding the table.
    ///
    /// # Examples
    ///
    /// ```
    /// # use hls_ram_tables::tables::TableKey;
    /// #
    /// assert_eq!(TableKey::Add { width: 8 }.symbol(), "add_table_8");
    /// assert_eq!(TableKey::Mul { input: 4, weight: 6 }.symbol(), "mul_table_4_6");
    /// ```
    pub fn symbol(&self) -> String {
        format!("{}_table_{}", self.kind(), self.widths().iter().join("_"))
    }

    pub fn header_file(&self) -> String {
        format!("{}.h", self.symbol())
    }

    pub fn values_file(&self) -> String {
        format!("{}.txt", self.symbol())
    }
}

impl fmt::Display for TableKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.symbol())
    }
}

/// A table whose index would exceed the configured width limit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableTooLarge {
    pub key: TableKey,
    pub bits: u64,
    pub limit: u32,
}

impl fmt::Display for TableTooLarge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "table `{}` needs 2^{} entries, exceeding the limit of 2^{}",
            self.key, self.bits, self.limit
        )
    }
}

/// A fully enumerated lookup table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Table {
    key: TableKey,
    values: Vec<u64>,
}

impl Table {
    /// Enumerates the table for `key`. Tables indexed by more than `max_bits`
    /// bits are refused before any allocation takes place.
    pub fn generate(key: TableKey, max_bits: u32) -> Result<Table, TableTooLarge> {
        let limit = cmp::min(max_bits, MAX_INDEX_BITS);
        let bits = key.index_bits();

        if bits > u64::from(limit) {
            return Err(TableTooLarge { key, bits, limit });
        }

        let values = match key {
            TableKey::Add { width } => add_values(width),
            TableKey::Mul { input, weight } => mul_values(input, weight),
        };

        Ok(Table { key, values })
    }

    pub fn key(&self) -> TableKey {
        self.key
    }

    pub fn values(&self) -> &[u64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Generates the saturating addition table for `width`-bit operands.
pub fn add_table(width: u32, max_bits: u32) -> Result<Table, TableTooLarge> {
    Table::generate(TableKey::Add { width }, max_bits)
}

/// Generates the multiplication table for `input`- and `weight`-bit operands.
pub fn mul_table(
    input: u32,
    weight: u32,
    max_bits: u32,
) -> Result<Table, TableTooLarge> {
    Table::generate(TableKey::Mul { input, weight }, max_bits)
}

// Both enumerations visit `(i, j)` in row-major order, which is exactly the
// order of the index `(i << width_of_j) | j`.

fn add_values(width: u32) -> Vec<u64> {
    let size = 1u64 << width;
    let max = size - 1;

    iproduct!(0..size, 0..size)
        .map(|(i, j)| cmp::min(i + j, max))
        .collect()
}

fn mul_values(input: u32, weight: u32) -> Vec<u64> {
    iproduct!(0..1u64 << input, 0..1u64 << weight)
        .map(|(i, j)| i * j)
        .collect()
}
