use std::fs;
use std::path::{Path, PathBuf};
use std::collections::HashMap;
use tracing::debug;
use crate::core::error::DbError;
use crate::core::types::Table;
use super::Storage;

/// 每张表保存为 `<base_dir>/tables/<name>.json`
pub struct FileStorage {
    base_dir: PathBuf,
    tables: HashMap<String, Table>,
}

/// 只持有目录路径，可以移进阻塞线程里写文件，不需要借用存储本身
#[derive(Debug, Clone)]
pub struct TableWriter {
    tables_dir: PathBuf,
}

impl TableWriter {
    pub fn new(tables_dir: PathBuf) -> Self {
        TableWriter { tables_dir }
    }

    // 获取表文件路径
    fn table_path(&self, table_name: &str) -> PathBuf {
        self.tables_dir.join(format!("{}.json", table_name))
    }

    /// 先写临时文件再重命名，读者不会看到写了一半的文件
    pub fn write(&self, table: &Table) -> Result<(), DbError> {
        let json = serde_json::to_string_pretty(table)?;
        fs::create_dir_all(&self.tables_dir)?;
        let table_path = self.table_path(&table.name);
        let tmp_path = table_path.with_extension("json.tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, &table_path)?;
        debug!(table = %table.name, path = %table_path.display(), "wrote table file");
        Ok(())
    }
}

impl FileStorage {
    pub fn new(base_dir: PathBuf) -> Self {
        FileStorage {
            base_dir,
            tables: HashMap::new(),
        }
    }

    fn tables_dir(&self) -> PathBuf {
        self.base_dir.join("tables")
    }

    // 加载单个表
    fn load_table(&mut self, path: &Path) -> Result<(), DbError> {
        let content = fs::read_to_string(path)?;
        let table: Table = serde_json::from_str(&content)?;
        debug!(table = %table.name, rows = table.rows.len(), "loaded table file");
        self.tables.insert(table.name.clone(), table);
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get_table(&self, table_name: &str) -> Result<Option<&Table>, DbError> {
        Ok(self.tables.get(table_name))
    }

    fn install_table(&mut self, table: Table) {
        self.tables.insert(table.name.clone(), table);
    }

    fn writer(&self) -> Option<TableWriter> {
        Some(TableWriter::new(self.tables_dir()))
    }

    fn load(&mut self) -> Result<(), DbError> {
        self.tables.clear();

        let tables_dir = self.tables_dir();
        if !tables_dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(&tables_dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().map_or(false, |ext| ext == "json") {
                self.load_table(&path)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{Column, ColumnType, DataType};
    use tempfile::tempdir;

    fn people() -> Table {
        let mut table = Table::new(
            "people".to_string(),
            vec![
                Column { name: "name".into(), data_type: ColumnType::Text },
                Column { name: "age".into(), data_type: ColumnType::Integer },
            ],
        );
        table.insert_row(vec![DataType::Text("Alice".into()), DataType::Int(30)]).unwrap();
        table.insert_row(vec![DataType::Text("Bob".into()), DataType::Null]).unwrap();
        table
    }

    #[test]
    fn tables_survive_a_reload() {
        let dir = tempdir().unwrap();
        {
            let mut storage = FileStorage::new(dir.path().to_path_buf());
            storage.writer().unwrap().write(&people()).unwrap();
            storage.install_table(people());
        }

        let mut storage = FileStorage::new(dir.path().to_path_buf());
        storage.load().unwrap();
        let table = storage.get_table("people").unwrap().unwrap();
        assert_eq!(table.column_names(), vec!["name".to_string(), "age".to_string()]);
        assert_eq!(table.rows[1], vec![DataType::Text("Bob".into()), DataType::Null]);
        assert!(!dir.path().join("tables").join("people.json.tmp").exists());
    }

    #[test]
    fn write_fails_when_tables_is_not_a_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("tables"), "not a directory").unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf());
        assert!(matches!(storage.writer().unwrap().write(&people()), Err(DbError::IoError(_))));
    }

    #[test]
    fn writer_can_run_detached_from_the_store() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().to_path_buf());
        let writer = storage.writer().unwrap();
        std::thread::spawn(move || writer.write(&people()).unwrap())
            .join()
            .unwrap();
        assert!(dir.path().join("tables").join("people.json").exists());
        // 写盘不改变内存状态
        assert!(storage.get_table("people").unwrap().is_none());
    }

    #[test]
    fn load_without_directory_is_empty() {
        let dir = tempdir().unwrap();
        let mut storage = FileStorage::new(dir.path().join("missing"));
        storage.load().unwrap();
        assert!(storage.get_table("people").unwrap().is_none());
    }
}
