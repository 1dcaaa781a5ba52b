mod lexer;
mod parser;
mod executor;
mod formatter;

pub use lexer::{is_keyword, Lexer, Token};
pub use parser::Parser;
pub use executor::{QueryResult, SqlExecutor};
pub use formatter::TableFormatter;

use crate::core::error::DbError;
use crate::core::types::DataType;

/// 只读方言中唯一的语句: SELECT
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    pub items: Vec<SelectItem>,
    pub table: String,
    pub where_clause: Option<WhereClause>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub projection: Projection,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Wildcard,
    Column(String),
    Aggregate {
        function: AggregateFunction,
        argument: AggregateArgument,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggregateFunction {
    Count,
    Avg,
    Sum,
    Min,
    Max,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AggregateArgument {
    Star,
    Column(String),
}

// WHERE子句
#[derive(Debug, Clone, PartialEq)]
pub enum WhereClause {
    Simple {
        column: String,
        operator: Operator,
        value: DataType,
    },
    IsNull {
        column: String,
        negated: bool,
    },
    Not(Box<WhereClause>),
    And {
        left: Box<WhereClause>,
        right: Box<WhereClause>,
    },
    Or {
        left: Box<WhereClause>,
        right: Box<WhereClause>,
    },
}

// 操作符
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub direction: SortDirection,
}

impl AggregateFunction {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_uppercase().as_str() {
            "COUNT" => Some(AggregateFunction::Count),
            "AVG" => Some(AggregateFunction::Avg),
            "SUM" => Some(AggregateFunction::Sum),
            "MIN" => Some(AggregateFunction::Min),
            "MAX" => Some(AggregateFunction::Max),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }
}

impl SelectItem {
    /// 结果集中的列名: 别名优先，否则为表达式文本
    pub fn output_name(&self) -> String {
        if let Some(alias) = &self.alias {
            return alias.clone();
        }
        match &self.projection {
            Projection::Wildcard => "*".to_string(),
            Projection::Column(name) => name.clone(),
            Projection::Aggregate { function, argument } => match argument {
                AggregateArgument::Star => format!("{}(*)", function.name()),
                AggregateArgument::Column(column) => format!("{}({})", function.name(), column),
            },
        }
    }
}

// SQL解析器
pub struct SqlParser {
    lexer: lexer::Lexer,
    parser: parser::Parser,
}

impl SqlParser {
    pub fn new() -> Self {
        SqlParser {
            lexer: lexer::Lexer::new(),
            parser: parser::Parser::new(),
        }
    }

    pub fn parse(&mut self, sql: &str) -> Result<SelectStatement, DbError> {
        let tokens = self.lexer.tokenize(sql)?;
        self.parser.parse(tokens)
    }
}

impl Default for SqlParser {
    fn default() -> Self {
        Self::new()
    }
}
