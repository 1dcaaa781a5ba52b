use crate::core::types::TypeError;
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("IO错误: {0}")]
    IoError(#[from] io::Error),

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("表错误: {0}")]
    TableError(String),

    #[error("{0}")]
    TypeError(#[from] TypeError),

    #[error("SQL错误: {0}")]
    SqlError(String),

    #[error("导入错误: {0}")]
    IngestError(String),
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

impl From<csv::Error> for DbError {
    fn from(err: csv::Error) -> Self {
        DbError::IngestError(err.to_string())
    }
}

impl From<calamine::Error> for DbError {
    fn from(err: calamine::Error) -> Self {
        DbError::IngestError(err.to_string())
    }
}

impl DbError {
    /// 是否属于导入阶段的错误(文件缺失或无法解析)
    pub fn is_ingest(&self) -> bool {
        matches!(self, DbError::IngestError(_))
    }

    // 获取详细的错误信息
    pub fn detailed_message(&self) -> String {
        match self {
            DbError::IoError(err) => format!("IO错误: {}", err),
            DbError::Serialization(msg) => format!("序列化错误: {}", msg),
            DbError::TableError(msg) => format!("表错误: {}", msg),
            DbError::TypeError(err) => format!("{}", err),
            DbError::SqlError(msg) => format!("SQL错误: {}", msg),
            DbError::IngestError(msg) => format!("导入错误: {}", msg),
        }
    }

    // 获取简略的错误信息
    pub fn brief_message(&self) -> String {
        match self {
            DbError::IoError(_) => "Error: IO error".to_string(),
            DbError::Serialization(_) => "Error: Serialization error".to_string(),
            DbError::TableError(_) => "Error: Table error".to_string(),
            DbError::TypeError(err) => format!("{}", err),
            DbError::SqlError(_) => "Error: Syntax error".to_string(),
            DbError::IngestError(_) => "Error: Ingest error".to_string(),
        }
    }
}
