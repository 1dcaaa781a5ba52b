use std::cmp::Ordering;
use serde::Serialize;
use crate::core::error::DbError;
use crate::core::types::{DataType, Table};
use crate::core::storage::Storage;
use super::{
    AggregateArgument, AggregateFunction, Operator, Projection, SelectItem, SelectStatement,
    SortDirection, WhereClause,
};

/// 查询结果: 列名与行
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<DataType>>,
}

pub struct SqlExecutor<'a> {
    storage: &'a dyn Storage,
}

impl<'a> SqlExecutor<'a> {
    pub fn new(storage: &'a dyn Storage) -> Self {
        SqlExecutor { storage }
    }

    pub fn execute(&self, statement: &SelectStatement) -> Result<QueryResult, DbError> {
        let table = self.storage.get_table(&statement.table)?
            .ok_or_else(|| DbError::TableError(format!("表 {} 不存在", statement.table)))?;

        // 先解析所有列引用，即使结果为空也能报告未知列
        if let Some(where_clause) = &statement.where_clause {
            check_where_columns(where_clause, table)?;
        }
        let order_index = match &statement.order_by {
            Some(order_by) => Some(resolve_column(table, &order_by.column)?),
            None => None,
        };

        let mut rows: Vec<&Vec<DataType>> = Vec::new();
        for row in &table.rows {
            let keep = match &statement.where_clause {
                Some(clause) => evaluate_where_clause(row, clause, table)? == Some(true),
                None => true,
            };
            if keep {
                rows.push(row);
            }
        }

        let aggregates = statement
            .items
            .iter()
            .filter(|item| matches!(item.projection, Projection::Aggregate { .. }))
            .count();

        if aggregates > 0 {
            if aggregates != statement.items.len() {
                return Err(DbError::SqlError("聚合函数不能与普通列混用".to_string()));
            }
            let mut columns = Vec::with_capacity(statement.items.len());
            let mut values = Vec::with_capacity(statement.items.len());
            for item in &statement.items {
                columns.push(item.output_name());
                values.push(aggregate(item, &rows, table)?);
            }
            let mut result_rows = vec![values];
            if let Some(limit) = statement.limit {
                result_rows.truncate(limit);
            }
            return Ok(QueryResult { columns, rows: result_rows });
        }

        if let (Some(index), Some(order_by)) = (order_index, &statement.order_by) {
            // sort_by 是稳定排序，相同值保持原始行序
            rows.sort_by(|a, b| {
                let ordering = a[index].sort_cmp(&b[index]);
                match order_by.direction {
                    SortDirection::Asc => ordering,
                    SortDirection::Desc => ordering.reverse(),
                }
            });
        }

        if let Some(limit) = statement.limit {
            rows.truncate(limit);
        }

        let (columns, indices) = project(&statement.items, table)?;
        let result_rows = rows
            .into_iter()
            .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
            .collect();

        Ok(QueryResult { columns, rows: result_rows })
    }
}

fn resolve_column(table: &Table, name: &str) -> Result<usize, DbError> {
    table
        .column_index(name)
        .ok_or_else(|| DbError::SqlError(format!("列 {} 不存在", name)))
}

// 展开 * 并把投影列解析为下标
fn project(items: &[SelectItem], table: &Table) -> Result<(Vec<String>, Vec<usize>), DbError> {
    let mut columns = Vec::new();
    let mut indices = Vec::new();
    for item in items {
        match &item.projection {
            Projection::Wildcard => {
                for (i, column) in table.columns.iter().enumerate() {
                    columns.push(column.name.clone());
                    indices.push(i);
                }
            }
            Projection::Column(name) => {
                let index = resolve_column(table, name)?;
                columns.push(match &item.alias {
                    Some(alias) => alias.clone(),
                    None => table.columns[index].name.clone(),
                });
                indices.push(index);
            }
            Projection::Aggregate { .. } => {
                return Err(DbError::SqlError("聚合函数不能与普通列混用".to_string()));
            }
        }
    }
    Ok((columns, indices))
}

fn aggregate(item: &SelectItem, rows: &[&Vec<DataType>], table: &Table) -> Result<DataType, DbError> {
    let (function, argument) = match &item.projection {
        Projection::Aggregate { function, argument } => (*function, argument),
        _ => return Err(DbError::SqlError("期望聚合函数".to_string())),
    };

    let index = match argument {
        AggregateArgument::Star => return Ok(DataType::Int(rows.len() as i64)),
        AggregateArgument::Column(name) => resolve_column(table, name)?,
    };
    let values: Vec<&DataType> = rows.iter().map(|row| &row[index]).filter(|v| !v.is_null()).collect();

    match function {
        AggregateFunction::Count => Ok(DataType::Int(values.len() as i64)),
        AggregateFunction::Min => Ok(values
            .into_iter()
            .min_by(|a, b| a.sort_cmp(b))
            .cloned()
            .unwrap_or(DataType::Null)),
        AggregateFunction::Max => Ok(values
            .into_iter()
            .max_by(|a, b| a.sort_cmp(b))
            .cloned()
            .unwrap_or(DataType::Null)),
        AggregateFunction::Sum | AggregateFunction::Avg => {
            if values.is_empty() {
                return Ok(DataType::Null);
            }
            let mut int_sum: Option<i64> = Some(0);
            let mut real_sum = 0.0;
            for value in &values {
                match value {
                    DataType::Int(n) => {
                        int_sum = int_sum.and_then(|s| s.checked_add(*n));
                        real_sum += *n as f64;
                    }
                    DataType::Real(f) => {
                        int_sum = None;
                        real_sum += f;
                    }
                    other => {
                        return Err(DbError::SqlError(format!(
                            "{} 只能作用于数值列, 实际值 {}",
                            function.name(),
                            other
                        )))
                    }
                }
            }
            if function == AggregateFunction::Avg {
                return Ok(DataType::Real(real_sum / values.len() as f64));
            }
            Ok(match int_sum {
                Some(sum) => DataType::Int(sum),
                None => DataType::Real(real_sum),
            })
        }
    }
}

fn check_where_columns(clause: &WhereClause, table: &Table) -> Result<(), DbError> {
    match clause {
        WhereClause::Simple { column, .. } | WhereClause::IsNull { column, .. } => {
            resolve_column(table, column).map(|_| ())
        }
        WhereClause::Not(inner) => check_where_columns(inner, table),
        WhereClause::And { left, right } | WhereClause::Or { left, right } => {
            check_where_columns(left, table)?;
            check_where_columns(right, table)
        }
    }
}

// 三值逻辑: None 表示 UNKNOWN(涉及 NULL 的比较)，只有 Some(true) 的行被保留
fn evaluate_where_clause(row: &[DataType], clause: &WhereClause, table: &Table) -> Result<Option<bool>, DbError> {
    match clause {
        WhereClause::Simple { column, operator, value } => {
            let index = resolve_column(table, column)?;
            let ordering = match row[index].compare(value)? {
                Some(ordering) => ordering,
                None => return Ok(None),
            };
            Ok(Some(match operator {
                Operator::Eq => ordering == Ordering::Equal,
                Operator::Ne => ordering != Ordering::Equal,
                Operator::Gt => ordering == Ordering::Greater,
                Operator::Lt => ordering == Ordering::Less,
                Operator::Ge => ordering != Ordering::Less,
                Operator::Le => ordering != Ordering::Greater,
            }))
        }
        WhereClause::IsNull { column, negated } => {
            let index = resolve_column(table, column)?;
            Ok(Some(row[index].is_null() != *negated))
        }
        WhereClause::Not(inner) => Ok(evaluate_where_clause(row, inner, table)?.map(|b| !b)),
        WhereClause::And { left, right } => {
            let left = evaluate_where_clause(row, left, table)?;
            if left == Some(false) {
                return Ok(Some(false));
            }
            Ok(match (left, evaluate_where_clause(row, right, table)?) {
                (_, Some(false)) => Some(false),
                (Some(true), Some(true)) => Some(true),
                _ => None,
            })
        }
        WhereClause::Or { left, right } => {
            let left = evaluate_where_clause(row, left, table)?;
            if left == Some(true) {
                return Ok(Some(true));
            }
            Ok(match (left, evaluate_where_clause(row, right, table)?) {
                (_, Some(true)) => Some(true),
                (Some(false), Some(false)) => Some(false),
                _ => None,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::sql::SqlParser;
    use crate::core::storage::memory::MemoryStorage;
    use crate::core::types::{Column, ColumnType};

    fn storage() -> MemoryStorage {
        let mut table = Table::new(
            "uploaded_table".to_string(),
            vec![
                Column { name: "Name".into(), data_type: ColumnType::Text },
                Column { name: "age".into(), data_type: ColumnType::Integer },
                Column { name: "score".into(), data_type: ColumnType::Real },
            ],
        );
        let rows = vec![
            ("Alice", DataType::Int(30), DataType::Real(88.5)),
            ("Bob", DataType::Int(25), DataType::Real(92.0)),
            ("Cara", DataType::Null, DataType::Int(70)),
            ("Dan", DataType::Int(41), DataType::Null),
        ];
        for (name, age, score) in rows {
            table.insert_row(vec![DataType::Text(name.into()), age, score]).unwrap();
        }
        let mut storage = MemoryStorage::new();
        storage.install_table(table);
        storage
    }

    fn run(sql: &str) -> Result<QueryResult, DbError> {
        let storage = storage();
        let statement = SqlParser::new().parse(sql)?;
        SqlExecutor::new(&storage).execute(&statement)
    }

    fn names(result: &QueryResult) -> Vec<String> {
        result.rows.iter().map(|row| row[0].to_string()).collect()
    }

    #[test]
    fn select_star_keeps_schema_order() {
        let result = run("SELECT * FROM uploaded_table").unwrap();
        assert_eq!(result.columns, vec!["Name", "age", "score"]);
        assert_eq!(result.rows.len(), 4);
    }

    #[test]
    fn column_names_resolve_case_insensitively() {
        let result = run("SELECT name, AGE FROM uploaded_table WHERE age >= 30").unwrap();
        assert_eq!(result.columns, vec!["Name", "age"]);
        assert_eq!(names(&result), vec!["Alice", "Dan"]);
    }

    #[test]
    fn order_by_desc_limit_one_picks_the_maximum() {
        let result = run("SELECT * FROM uploaded_table ORDER BY score DESC LIMIT 1").unwrap();
        assert_eq!(names(&result), vec!["Bob"]);
        let result = run("SELECT * FROM uploaded_table ORDER BY age ASC LIMIT 1").unwrap();
        // NULL 排在最前
        assert_eq!(names(&result), vec!["Cara"]);
    }

    #[test]
    fn aggregates_skip_nulls() {
        let result = run("SELECT COUNT(*) AS total_rows, SUM(age), AVG(age) AS average_age FROM uploaded_table").unwrap();
        assert_eq!(result.columns, vec!["total_rows", "SUM(age)", "average_age"]);
        assert_eq!(result.rows, vec![vec![DataType::Int(4), DataType::Int(96), DataType::Real(32.0)]]);

        let result = run("SELECT SUM(score), MIN(score), MAX(Name), COUNT(age) FROM uploaded_table").unwrap();
        assert_eq!(
            result.rows[0],
            vec![DataType::Real(250.5), DataType::Int(70), DataType::Text("Dan".into()), DataType::Int(3)]
        );
    }

    #[test]
    fn aggregate_over_no_rows_is_null() {
        let result = run("SELECT AVG(age) FROM uploaded_table WHERE age > 100").unwrap();
        assert_eq!(result.rows, vec![vec![DataType::Null]]);
    }

    #[test]
    fn where_supports_strings_null_checks_and_boolean_logic() {
        let result = run("SELECT Name FROM uploaded_table WHERE name = 'Bob' OR age IS NULL").unwrap();
        assert_eq!(names(&result), vec!["Bob", "Cara"]);
        let result = run("SELECT Name FROM uploaded_table WHERE NOT (age < 30) AND score IS NOT NULL").unwrap();
        // Cara 的 age 为 NULL, NOT UNKNOWN 仍是 UNKNOWN
        assert_eq!(names(&result), vec!["Alice"]);
    }

    #[test]
    fn errors_are_reported() {
        assert!(matches!(run("SELECT * FROM other"), Err(DbError::TableError(_))));
        assert!(matches!(run("SELECT missing FROM uploaded_table"), Err(DbError::SqlError(_))));
        assert!(matches!(run("SELECT * FROM uploaded_table WHERE missing = 1"), Err(DbError::SqlError(_))));
        assert!(matches!(run("SELECT AVG(Name) FROM uploaded_table"), Err(DbError::SqlError(_))));
        assert!(matches!(run("SELECT Name, COUNT(*) FROM uploaded_table"), Err(DbError::SqlError(_))));
        assert!(run("SELECT * FROM uploaded_table WHERE Name > 3").is_err());
    }
}
