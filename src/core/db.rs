use std::path::{Path, PathBuf};
use serde::Serialize;
use tracing::{debug, info};
use crate::core::error::DbError;
use crate::core::ingest;
use crate::core::matcher::{PhraseMatcher, RuleKind, DEFAULT_TABLE};
use crate::core::storage::{Storage, file::{FileStorage, TableWriter}, memory::MemoryStorage};
use crate::core::types::Table;
use crate::core::sql::{QueryResult, SqlExecutor, SqlParser};

#[derive(Debug, Clone, PartialEq)]
pub enum StorageType {
    File(PathBuf),
    Memory,
}

// 错误显示模式
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorDisplayMode {
    Brief,    // 简略错误信息
    Detailed, // 详细错误信息
}

/// 导入完成后的摘要
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestSummary {
    pub table: String,
    pub rows: usize,
    pub columns: Vec<String>,
}

impl IngestSummary {
    pub fn message(&self) -> String {
        format!("Table '{}' created with {} rows.", self.table, self.rows)
    }
}

/// 一次问答的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub sql: String,
    #[serde(skip)]
    pub rule: RuleKind,
    pub result: QueryResult,
}

pub struct Database {
    storage: Box<dyn Storage>,
    matcher: PhraseMatcher,
    error_mode: ErrorDisplayMode,
}

impl Database {
    pub fn new(storage_type: StorageType) -> Self {
        Self::with_table(storage_type, DEFAULT_TABLE)
    }

    pub fn with_table(storage_type: StorageType, table_name: &str) -> Self {
        let storage: Box<dyn Storage> = match storage_type {
            StorageType::File(path) => Box::new(FileStorage::new(path)),
            StorageType::Memory => Box::new(MemoryStorage::new()),
        };

        Database {
            storage,
            matcher: PhraseMatcher::new(table_name),
            error_mode: ErrorDisplayMode::Brief, // 默认使用简略模式
        }
    }

    /// 上传数据所在的表名
    pub fn table_name(&self) -> &str {
        self.matcher.table()
    }

    // 切换错误显示模式
    pub fn toggle_error_mode(&mut self) -> ErrorDisplayMode {
        self.error_mode = match self.error_mode {
            ErrorDisplayMode::Brief => ErrorDisplayMode::Detailed,
            ErrorDisplayMode::Detailed => ErrorDisplayMode::Brief,
        };
        self.error_mode
    }

    // 根据当前模式格式化错误信息
    pub fn format_error(&self, error: &DbError) -> String {
        match self.error_mode {
            ErrorDisplayMode::Brief => error.brief_message(),
            ErrorDisplayMode::Detailed => error.detailed_message(),
        }
    }

    /// 按表结构顺序返回列名，每次都读取当前的表
    pub fn columns(&self, table_name: &str) -> Result<Vec<String>, DbError> {
        let table = self.storage.get_table(table_name)?
            .ok_or_else(|| DbError::TableError(format!("表 {} 不存在", table_name)))?;
        Ok(table.column_names())
    }

    // SQL操作
    pub fn execute_sql(&self, sql: &str) -> Result<QueryResult, DbError> {
        let statement = SqlParser::new().parse(sql)?;
        SqlExecutor::new(&*self.storage).execute(&statement)
    }

    /// 把英文问句翻译成 SQL 并执行
    pub fn ask(&self, question: &str) -> Result<Answer, DbError> {
        let columns = self.columns(self.table_name())?;
        let translation = self.matcher.translate_with_rule(question, &columns);
        debug!(question, rule = ?translation.rule, sql = %translation.sql, "translated question");

        let result = self.execute_sql(&translation.sql)?;
        Ok(Answer {
            sql: translation.sql,
            rule: translation.rule,
            result,
        })
    }

    /// 前 `limit` 行
    pub fn preview(&self, limit: usize) -> Result<QueryResult, DbError> {
        let table = self.storage.get_table(self.table_name())?
            .ok_or_else(|| DbError::TableError(format!("表 {} 不存在", self.table_name())))?;
        Ok(QueryResult {
            columns: table.column_names(),
            rows: table.rows.iter().take(limit).cloned().collect(),
        })
    }

    /// 读取文件并整表替换
    pub fn ingest_file(&mut self, path: &Path) -> Result<IngestSummary, DbError> {
        let table = ingest::read_table(path, self.table_name())?;
        self.replace_table(table)
    }

    /// 用已构建好的表整体替换旧表。先落盘，成功后才换入内存
    pub fn replace_table(&mut self, mut table: Table) -> Result<IngestSummary, DbError> {
        table.name = self.table_name().to_string();
        if let Some(writer) = self.storage.writer() {
            writer.write(&table)?;
        }
        Ok(self.install_table(table))
    }

    /// 持久化写入器，供调用方在锁外落盘
    pub fn table_writer(&self) -> Option<TableWriter> {
        self.storage.writer()
    }

    /// 把已落盘(或无需落盘)的表换入内存
    pub fn install_table(&mut self, mut table: Table) -> IngestSummary {
        table.name = self.table_name().to_string();
        let summary = IngestSummary {
            table: table.name.clone(),
            rows: table.rows.len(),
            columns: table.column_names(),
        };
        self.storage.install_table(table);
        info!(table = %summary.table, rows = summary.rows, columns = summary.columns.len(), "table replaced");
        summary
    }

    pub fn load(&mut self) -> Result<(), DbError> {
        self.storage.load()
    }
}
