use crate::core::types::DataType;
use super::QueryResult;

pub struct TableFormatter;

impl TableFormatter {
    /// 把查询结果格式化为文本表格
    /// 每列宽度取列名与最长单元格的较大值，至少3个字符，内容左对齐，左右各留1个空格
    /// NULL 显示为空白
    pub fn format_result(result: &QueryResult) -> String {
        let cells: Vec<Vec<String>> = result
            .rows
            .iter()
            .map(|row| row.iter().map(Self::display_cell).collect())
            .collect();
        Self::format_table(&result.columns, &cells)
    }

    pub fn format_table(headers: &[String], rows: &[Vec<String>]) -> String {
        let mut max_widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();

        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if i < max_widths.len() {
                    max_widths[i] = max_widths[i].max(cell.chars().count());
                }
            }
        }

        for width in &mut max_widths {
            *width = (*width).max(3);
        }

        let mut result = String::new();
        result.push_str(&Self::format_row(headers, &max_widths));
        result.push('\n');

        // 分隔线
        let mut separator = String::from("|");
        for width in &max_widths {
            separator.push(' ');
            separator.push_str(&"-".repeat(*width));
            separator.push_str(" |");
        }
        result.push_str(&separator);
        result.push('\n');

        for row in rows {
            result.push_str(&Self::format_row(row, &max_widths));
            result.push('\n');
        }

        result
    }

    fn display_cell(value: &DataType) -> String {
        match value {
            DataType::Null => String::new(),
            other => other.to_string(),
        }
    }

    fn format_row(cells: &[String], widths: &[usize]) -> String {
        let mut row_line = String::from("|");

        for (cell, width) in cells.iter().zip(widths) {
            let padding = width - cell.chars().count();
            row_line.push(' ');
            row_line.push_str(cell);
            row_line.push_str(&" ".repeat(padding + 1));
            row_line.push('|');
        }

        row_line
    }
}
