use std::collections::HashMap;

use crate::tables::{Table, TableKey, TableTooLarge};

/// Generates each distinct table once, in order of first request.
pub struct TableManager {
    tables: Vec<Table>,
    generated: HashMap<TableKey, usize>,
    max_bits: u32,
}

impl TableManager {
    pub fn new(max_bits: u32) -> TableManager {
        TableManager {
            tables: Vec::new(),
            generated: HashMap::new(),
            max_bits,
        }
    }

    pub fn get(&mut self, key: TableKey) -> Result<&Table, TableTooLarge> {
        let index = match self.generated.get(&key) {
            Some(&index) => index,
            None => {
                let table = Table::generate(key, self.max_bits)?;

                log::debug!("Generated `{key}` with {} entries", table.len());

                self.tables.push(table);
                self.generated.insert(key, self.tables.len() - 1);

                self.tables.len() - 1
            }
        };

        Ok(&self.tables[index])
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }
}
