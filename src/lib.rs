pub mod core;
pub mod cli;
pub mod config;
pub mod server;

pub use crate::core::db::{Answer, Database, IngestSummary, StorageType};
pub use crate::core::error::DbError;
pub use crate::core::matcher::{translate, PhraseMatcher, RuleKind, DEFAULT_TABLE};
pub use crate::core::sql::QueryResult;

/// 对内存中的表执行一次问答，便于嵌入调用
///
/// # 参数
/// * `file` - 要导入的表格文件
/// * `question` - 英文问题
pub fn ask_file(file: &std::path::Path, question: &str) -> Result<Answer, DbError> {
    let mut db = Database::new(StorageType::Memory);
    db.ingest_file(file)?;
    db.ask(question)
}
