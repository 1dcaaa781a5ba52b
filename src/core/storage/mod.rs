pub mod file;
pub mod memory;

use crate::core::error::DbError;
use crate::core::types::Table;
use file::TableWriter;

/// 表存储。导入时整表替换，不做逐行修改
///
/// 替换分两步: 先用 [`TableWriter`] 落盘(可在锁外进行)，成功后再 `install_table` 换入内存。
/// 落盘失败时内存中的旧表保持不变。
pub trait Storage: Send + Sync {
    fn get_table(&self, table_name: &str) -> Result<Option<&Table>, DbError>;

    /// 把已持久化的表换入内存，同名旧表被整体替换
    fn install_table(&mut self, table: Table);

    /// 持久化用的写入器；纯内存存储返回 None
    fn writer(&self) -> Option<TableWriter>;

    fn load(&mut self) -> Result<(), DbError>;
}
