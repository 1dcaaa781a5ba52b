//! 表格文件导入: CSV/TSV 由 `csv` 读取，Excel/ODS 工作簿由 `calamine` 读取首个工作表。
//! 第一行为表头，其余行推断列类型后组装成一张完整的 [`Table`]。

use std::collections::HashSet;
use std::path::Path;
use calamine::{open_workbook_auto, Data, Reader};
use tracing::debug;
use crate::core::error::DbError;
use crate::core::types::{Column, ColumnType, DataType, Table};

/// 支持的文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Tsv,
    Workbook,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Result<Self, DbError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "csv" => Ok(SourceFormat::Csv),
            "tsv" | "tab" => Ok(SourceFormat::Tsv),
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(SourceFormat::Workbook),
            other => Err(DbError::IngestError(format!("不支持的文件类型: '{}'", other))),
        }
    }
}

/// 未推断类型的原始数据
struct RawSheet {
    headers: Vec<String>,
    rows: Vec<Vec<DataType>>,
}

/// 读取文件并构建名为 `table_name` 的表
pub fn read_table(path: &Path, table_name: &str) -> Result<Table, DbError> {
    if !path.is_file() {
        return Err(DbError::IngestError(format!("文件不存在: {}", path.display())));
    }

    let format = SourceFormat::from_path(path)?;
    let raw = match format {
        SourceFormat::Csv => read_delimited(path, b',')?,
        SourceFormat::Tsv => read_delimited(path, b'\t')?,
        SourceFormat::Workbook => read_workbook(path)?,
    };
    debug!(path = %path.display(), ?format, rows = raw.rows.len(), "read source file");

    build_table(table_name, raw)
}

fn read_delimited(path: &Path, delimiter: u8) -> Result<RawSheet, DbError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(DataType::infer).collect());
    }

    Ok(RawSheet { headers, rows })
}

fn read_workbook(path: &Path) -> Result<RawSheet, DbError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| DbError::IngestError("工作簿中没有工作表".to_string()))??;

    let mut sheet_rows = range.rows();
    let headers = match sheet_rows.next() {
        Some(row) => row.iter().map(header_text).collect(),
        None => Vec::new(),
    };
    let rows = sheet_rows.map(|row| row.iter().map(cell_value).collect()).collect();

    Ok(RawSheet { headers, rows })
}

fn header_text(cell: &Data) -> String {
    match cell_value(cell) {
        DataType::Null => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

// 整数值的浮点单元格按整数处理
fn cell_value(cell: &Data) -> DataType {
    match cell {
        Data::Empty | Data::Error(_) => DataType::Null,
        Data::Int(n) => DataType::Int(*n),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 9.0e15 => DataType::Int(*f as i64),
        Data::Float(f) => DataType::Real(*f),
        Data::Bool(b) => DataType::Int(i64::from(*b)),
        Data::String(s) if s.trim().is_empty() => DataType::Null,
        Data::String(s) => DataType::Text(s.clone()),
        other => DataType::Text(other.to_string()),
    }
}

/// 规范化表头: 空表头记为 `Unnamed: i`，重复表头追加 `.1`、`.2` 后缀
pub fn normalize_headers(headers: &[String]) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut names = Vec::with_capacity(headers.len());

    for (i, header) in headers.iter().enumerate() {
        let base = if header.trim().is_empty() {
            format!("Unnamed: {}", i)
        } else {
            header.trim().to_string()
        };

        let mut name = base.clone();
        let mut suffix = 1;
        while seen.contains(&name) {
            name = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        seen.insert(name.clone());
        names.push(name);
    }

    names
}

/// 推断列类型: 有文本则为 TEXT，否则有小数则为 REAL，全为整数则为 INTEGER
fn infer_column_type<'a>(values: impl Iterator<Item = &'a DataType>) -> ColumnType {
    let mut seen_int = false;
    let mut seen_real = false;
    for value in values {
        match value {
            DataType::Text(_) => return ColumnType::Text,
            DataType::Real(_) => seen_real = true,
            DataType::Int(_) => seen_int = true,
            DataType::Null => {}
        }
    }
    match (seen_int, seen_real) {
        (_, true) => ColumnType::Real,
        (true, false) => ColumnType::Integer,
        (false, false) => ColumnType::Text,
    }
}

fn coerce(value: DataType, column_type: ColumnType) -> DataType {
    match (value, column_type) {
        (DataType::Null, _) => DataType::Null,
        (DataType::Int(n), ColumnType::Real) => DataType::Real(n as f64),
        (DataType::Int(n), ColumnType::Text) => DataType::Text(n.to_string()),
        (DataType::Real(f), ColumnType::Text) => DataType::Text(f.to_string()),
        (value, _) => value,
    }
}

fn build_table(table_name: &str, raw: RawSheet) -> Result<Table, DbError> {
    if raw.headers.is_empty() {
        return Err(DbError::IngestError("文件中没有表头".to_string()));
    }

    let names = normalize_headers(&raw.headers);
    let width = names.len();

    // 对齐列数，丢弃完全为空的行
    let rows: Vec<Vec<DataType>> = raw
        .rows
        .into_iter()
        .map(|mut row| {
            row.resize(width, DataType::Null);
            row
        })
        .filter(|row| row.iter().any(|v| !v.is_null()))
        .collect();

    let columns: Vec<Column> = names
        .into_iter()
        .enumerate()
        .map(|(i, name)| Column {
            name,
            data_type: infer_column_type(rows.iter().map(|row| &row[i])),
        })
        .collect();

    let mut table = Table::new(table_name.to_string(), columns);
    for row in rows {
        let coerced = row
            .into_iter()
            .zip(&table.columns)
            .map(|(value, column)| coerce(value, column.data_type))
            .collect();
        table.insert_row(coerced)?;
    }

    Ok(table)
}
