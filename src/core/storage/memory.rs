use std::collections::HashMap;
use crate::core::error::DbError;
use crate::core::types::Table;
use super::{file::TableWriter, Storage};

#[derive(Default)]
pub struct MemoryStorage {
    tables: HashMap<String, Table>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        MemoryStorage {
            tables: HashMap::new(),
        }
    }
}

impl Storage for MemoryStorage {
    fn get_table(&self, table_name: &str) -> Result<Option<&Table>, DbError> {
        Ok(self.tables.get(table_name))
    }

    fn install_table(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    fn writer(&self) -> Option<TableWriter> {
        None // 内存存储无需持久化
    }

    fn load(&mut self) -> Result<(), DbError> {
        Ok(()) // 内存存储无需加载
    }
}
