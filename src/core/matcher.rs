//! 英文问句到 SQL 的关键词匹配器。
//!
//! 规则按固定顺序逐条尝试，第一条命中的规则决定输出；同一规则内按表结构中的列顺序取第一个命中的列。
//! 列名是否"被提到"只看小写后的子串包含关系，不检查单词边界。

use std::sync::OnceLock;
use regex::Regex;
use crate::core::sql::is_keyword;

/// 默认的表名
pub const DEFAULT_TABLE: &str = "uploaded_table";

/// 命中的规则，按优先级排列
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    SingleColumn,
    MultiColumn,
    RowCount,
    Maximum,
    Minimum,
    Average,
    Sum,
    WherePassthrough,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub sql: String,
    pub rule: RuleKind,
}

/// 单次翻译的输入
struct Question<'a> {
    /// 去掉首尾空白并小写后的问句，所有规则都只看这个
    text: String,
    columns: &'a [String],
    table: &'a str,
}

type Rule = fn(&Question<'_>) -> Option<String>;

/// 规则表。顺序即优先级
const RULES: &[(RuleKind, Rule)] = &[
    (RuleKind::SingleColumn, single_column),
    (RuleKind::MultiColumn, multi_column),
    (RuleKind::RowCount, row_count),
    (RuleKind::Maximum, maximum),
    (RuleKind::Minimum, minimum),
    (RuleKind::Average, average),
    (RuleKind::Sum, sum),
    (RuleKind::WherePassthrough, where_passthrough),
];

#[derive(Debug, Clone)]
pub struct PhraseMatcher {
    table: String,
}

impl PhraseMatcher {
    pub fn new(table: impl Into<String>) -> Self {
        PhraseMatcher { table: table.into() }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn translate(&self, text: &str, columns: &[String]) -> String {
        self.translate_with_rule(text, columns).sql
    }

    pub fn translate_with_rule(&self, text: &str, columns: &[String]) -> Translation {
        let question = Question {
            text: text.trim().to_lowercase(),
            columns,
            table: &self.table,
        };

        for (rule, apply) in RULES {
            if let Some(sql) = apply(&question) {
                return Translation { sql, rule: *rule };
            }
        }

        Translation {
            sql: format!("SELECT * FROM {}", quote_ident(&self.table)),
            rule: RuleKind::Fallback,
        }
    }
}

impl Default for PhraseMatcher {
    fn default() -> Self {
        PhraseMatcher::new(DEFAULT_TABLE)
    }
}

/// 针对默认表名的翻译
pub fn translate(text: &str, columns: &[String]) -> String {
    PhraseMatcher::default().translate(text, columns)
}

/// 普通标识符原样输出，其余(含空格、符号或与关键字重名)加双引号
pub fn quote_ident(name: &str) -> String {
    let mut chars = name.chars();
    let plain = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if plain && !is_keyword(name) {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

impl Question<'_> {
    fn contains_any(&self, words: &[&str]) -> bool {
        words.iter().any(|w| self.text.contains(w))
    }

    fn mentions(&self, column: &str) -> bool {
        self.text.contains(&column.to_lowercase())
    }

    fn first_mentioned(&self) -> Option<&String> {
        self.columns.iter().find(|c| self.mentions(c))
    }

    fn table(&self) -> String {
        quote_ident(self.table)
    }
}

fn single_column(q: &Question<'_>) -> Option<String> {
    let column = q.columns.iter().find(|column| {
        let lower = column.to_lowercase();
        q.text == lower
            || q.text == format!("only {}", lower)
            || q.text.contains(&format!("show {}", lower))
    })?;
    Some(format!("SELECT {} FROM {}", quote_ident(column), q.table()))
}

fn multi_column(q: &Question<'_>) -> Option<String> {
    if !q.text.contains(" and ") {
        return None;
    }
    let requested: Vec<String> = q
        .columns
        .iter()
        .filter(|c| q.mentions(c))
        .map(|c| quote_ident(c))
        .collect();
    if requested.is_empty() {
        return None;
    }
    Some(format!("SELECT {} FROM {}", requested.join(", "), q.table()))
}

fn row_count(q: &Question<'_>) -> Option<String> {
    if !q.text.contains("count") {
        return None;
    }
    Some(format!("SELECT COUNT(*) AS total_rows FROM {}", q.table()))
}

fn maximum(q: &Question<'_>) -> Option<String> {
    if !q.contains_any(&["highest", "max", "top"]) {
        return None;
    }
    let column = q.first_mentioned()?;
    Some(format!("SELECT * FROM {} ORDER BY {} DESC LIMIT 1", q.table(), quote_ident(column)))
}

fn minimum(q: &Question<'_>) -> Option<String> {
    if !q.contains_any(&["lowest", "min"]) {
        return None;
    }
    let column = q.first_mentioned()?;
    Some(format!("SELECT * FROM {} ORDER BY {} ASC LIMIT 1", q.table(), quote_ident(column)))
}

fn average(q: &Question<'_>) -> Option<String> {
    if !q.contains_any(&["average", "mean"]) {
        return None;
    }
    let column = q.first_mentioned()?;
    Some(format!(
        "SELECT AVG({}) AS {} FROM {}",
        quote_ident(column),
        quote_ident(&format!("average_{}", column)),
        q.table()
    ))
}

fn sum(q: &Question<'_>) -> Option<String> {
    if !q.contains_any(&["sum", "total"]) {
        return None;
    }
    let column = q.first_mentioned()?;
    Some(format!(
        "SELECT SUM({}) AS {} FROM {}",
        quote_ident(column),
        quote_ident(&format!("sum_{}", column)),
        q.table()
    ))
}

fn where_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"where (.+)").expect("valid WHERE pattern"))
}

// 条件(已小写)原样拼接；执行器只接受单条 SELECT 和布尔条件，非法内容在执行时报错
fn where_passthrough(q: &Question<'_>) -> Option<String> {
    let condition = where_pattern().captures(&q.text)?.get(1)?.as_str();
    Some(format!("SELECT * FROM {} WHERE {}", q.table(), condition))
}
