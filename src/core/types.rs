use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;
use serde::{Serialize, Deserialize};

/// 单元格的值。JSON 中直接表示为标量(null/数字/字符串)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DataType {
    Null,
    Int(i64),
    Real(f64),
    Text(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Integer,
    Real,
    Text,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub data_type: ColumnType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<DataType>>,
}

#[derive(Error, Debug)]
pub enum TypeError {
    #[error("类型不匹配: 期望 {expected:?}, 实际 {actual:?}")]
    TypeMismatch {
        expected: ColumnType,
        actual: DataType,
    },

    #[error("列数不匹配: 期望 {expected}, 实际 {actual}")]
    ArityMismatch {
        expected: usize,
        actual: usize,
    },

    #[error("无法比较 {left} 与 {right}")]
    Incomparable {
        left: String,
        right: String,
    },
}

impl DataType {
    /// 从原始文本推断值: 空串为 NULL，依次尝试整数、浮点数，否则为文本
    pub fn infer(raw: &str) -> DataType {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return DataType::Null;
        }
        if let Ok(n) = trimmed.parse::<i64>() {
            return DataType::Int(n);
        }
        if let Ok(f) = trimmed.parse::<f64>() {
            if f.is_finite() {
                return DataType::Real(f);
            }
        }
        DataType::Text(raw.to_string())
    }

    pub fn matches_column_type(&self, column_type: &ColumnType) -> bool {
        match (self, column_type) {
            (DataType::Int(_), ColumnType::Integer) => true,
            (DataType::Int(_), ColumnType::Real) => true,
            (DataType::Real(_), ColumnType::Real) => true,
            (DataType::Text(_), ColumnType::Text) => true,
            (DataType::Null, _) => true,
            _ => false,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DataType::Null)
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataType::Int(n) => Some(*n as f64),
            DataType::Real(f) => Some(*f),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            DataType::Null => "NULL",
            DataType::Int(_) => "INTEGER",
            DataType::Real(_) => "REAL",
            DataType::Text(_) => "TEXT",
        }
    }

    /// WHERE 比较。任一侧为 NULL 时返回 None(条件不成立)
    pub fn compare(&self, other: &DataType) -> Result<Option<Ordering>, TypeError> {
        match (self, other) {
            (DataType::Null, _) | (_, DataType::Null) => Ok(None),
            (DataType::Int(a), DataType::Int(b)) => Ok(Some(a.cmp(b))),
            (DataType::Text(a), DataType::Text(b)) => Ok(Some(a.cmp(b))),
            (a, b) => match (a.as_f64(), b.as_f64()) {
                (Some(x), Some(y)) => Ok(x.partial_cmp(&y)),
                _ => Err(TypeError::Incomparable {
                    left: a.type_name().to_string(),
                    right: b.type_name().to_string(),
                }),
            },
        }
    }

    /// ORDER BY 使用的全序: NULL < 数字 < 文本
    pub fn sort_cmp(&self, other: &DataType) -> Ordering {
        fn rank(v: &DataType) -> u8 {
            match v {
                DataType::Null => 0,
                DataType::Int(_) | DataType::Real(_) => 1,
                DataType::Text(_) => 2,
            }
        }
        match (self, other) {
            (DataType::Int(a), DataType::Int(b)) => a.cmp(b),
            (DataType::Text(a), DataType::Text(b)) => a.cmp(b),
            (a, b) if rank(a) == 1 && rank(b) == 1 => {
                let x = a.as_f64().unwrap_or_default();
                let y = b.as_f64().unwrap_or_default();
                x.total_cmp(&y)
            }
            (a, b) => rank(a).cmp(&rank(b)),
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Int(n) => write!(f, "{}", n),
            DataType::Real(x) => write!(f, "{}", x),
            DataType::Text(s) => write!(f, "{}", s),
            DataType::Null => write!(f, "NULL"),
        }
    }
}

impl Table {
    pub fn new(name: String, columns: Vec<Column>) -> Self {
        Table {
            name,
            columns,
            rows: Vec::new(),
        }
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    /// 按名称查找列下标: 优先精确匹配，其次忽略大小写
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .or_else(|| {
                self.columns
                    .iter()
                    .position(|c| c.name.eq_ignore_ascii_case(name))
            })
    }

    pub fn validate_row(&self, row: &[DataType]) -> Result<(), TypeError> {
        if row.len() != self.columns.len() {
            return Err(TypeError::ArityMismatch {
                expected: self.columns.len(),
                actual: row.len(),
            });
        }

        for (value, column) in row.iter().zip(&self.columns) {
            if !value.matches_column_type(&column.data_type) {
                return Err(TypeError::TypeMismatch {
                    expected: column.data_type,
                    actual: value.clone(),
                });
            }
        }

        Ok(())
    }

    pub fn insert_row(&mut self, row: Vec<DataType>) -> Result<(), TypeError> {
        self.validate_row(&row)?;
        self.rows.push(row);
        Ok(())
    }
}
