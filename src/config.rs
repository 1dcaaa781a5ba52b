//! 运行配置。命令行参数优先，其次读取 `SHEET_QUERY_*` 环境变量，最后使用默认值。

use std::path::PathBuf;
use clap::{Args, ValueEnum};
use crate::core::db::{Database, StorageType};
use crate::core::error::DbError;
use crate::core::matcher::DEFAULT_TABLE;

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// 进程内存，退出即丢失
    Memory,
    /// `<data-dir>/tables/<table>.json`
    File,
}

/// 表存储相关配置
#[derive(Args, Debug, Clone)]
pub struct StoreConfig {
    /// 存储后端
    #[arg(long, value_enum, default_value = "file", env = "SHEET_QUERY_STORAGE")]
    pub storage: Backend,

    /// 文件存储的根目录
    #[arg(long, default_value = "data", env = "SHEET_QUERY_DATA_DIR")]
    pub data_dir: PathBuf,

    /// 上传数据写入的表名
    #[arg(long, default_value = DEFAULT_TABLE, env = "SHEET_QUERY_TABLE")]
    pub table: String,
}

impl StoreConfig {
    pub fn storage_type(&self) -> StorageType {
        match self.storage {
            Backend::Memory => StorageType::Memory,
            Backend::File => StorageType::File(self.data_dir.clone()),
        }
    }

    /// 打开数据库并加载已持久化的表
    pub fn open(&self) -> Result<Database, DbError> {
        validate_table_name(&self.table)?;
        let mut db = Database::with_table(self.storage_type(), &self.table);
        db.load()?;
        Ok(db)
    }
}

// 表名会成为 `tables/` 下的文件名，不能带路径成分
fn validate_table_name(name: &str) -> Result<(), DbError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(|c: char| c == '/' || c == '\\' || c == '\0');
    if invalid {
        return Err(DbError::TableError(format!("无效的表名: '{}'", name)));
    }
    Ok(())
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            storage: Backend::Memory,
            data_dir: PathBuf::from("data"),
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

/// HTTP 服务配置
#[derive(Args, Debug, Clone)]
pub struct ServerConfig {
    #[arg(long, default_value = "127.0.0.1", env = "SHEET_QUERY_HOST")]
    pub host: String,

    #[arg(long, default_value_t = 5000, env = "SHEET_QUERY_PORT")]
    pub port: u16,

    /// 上传文件的保存目录
    #[arg(long, default_value = "uploads", env = "SHEET_QUERY_UPLOAD_DIR")]
    pub upload_dir: PathBuf,

    /// 上传文件大小上限(MB)
    #[arg(long, default_value_t = 16, env = "SHEET_QUERY_MAX_UPLOAD_MB")]
    pub max_upload_mb: usize,
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb * 1024 * 1024
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 5000,
            upload_dir: PathBuf::from("uploads"),
            max_upload_mb: 16,
        }
    }
}
