use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use clap::{Parser, Subcommand};
use crate::config::{ServerConfig, StoreConfig};
use crate::core::db::Database;
use crate::core::error::DbError;
use crate::core::sql::TableFormatter;
use crate::server;

#[derive(Parser, Debug)]
#[command(author, version, about = "Ask plain-English questions about an uploaded spreadsheet", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub store: StoreConfig,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// 启动 HTTP 服务
    Serve(ServerConfig),
    /// 导入表格文件，替换当前表
    Ingest { file: PathBuf },
    /// 用英文提问
    Ask { question: String },
    /// 直接执行 SELECT 语句
    Sql { statement: String },
    /// 交互模式(默认)
    Shell,
}

impl Cli {
    pub fn run(self) -> anyhow::Result<()> {
        let mut db = self.store.open()?;

        match self.command.unwrap_or(Command::Shell) {
            Command::Serve(config) => {
                let runtime = tokio::runtime::Runtime::new()?;
                runtime.block_on(server::serve(db, &config))
            }
            Command::Ingest { file } => {
                ingest(&mut db, &file)?;
                Ok(())
            }
            Command::Ask { question } => {
                let answer = db.ask(&question)?;
                println!("SQL: {}", answer.sql);
                print!("{}", TableFormatter::format_result(&answer.result));
                Ok(())
            }
            Command::Sql { statement } => {
                let result = db.execute_sql(&statement)?;
                print!("{}", TableFormatter::format_result(&result));
                Ok(())
            }
            Command::Shell => {
                let stdin = std::io::stdin();
                let stdout = std::io::stdout();
                shell(&mut db, stdin.lock(), stdout.lock())?;
                Ok(())
            }
        }
    }
}

fn ingest(db: &mut Database, file: &Path) -> Result<(), DbError> {
    let summary = db.ingest_file(file)?;
    println!("{}", summary.message());
    print!("{}", TableFormatter::format_result(&db.preview(5)?));
    Ok(())
}

const HELP: &str = "\
可用命令:
  help          - 显示帮助信息
  exit          - 退出程序
  columns       - 列出当前表的列
  load <file>   - 导入 CSV/TSV/Excel 文件，替换当前表
  sql <stmt>    - 直接执行 SELECT 语句
  mode          - 切换简略/详细错误信息
其他输入都按英文问题处理，例如:
  show name
  name and age
  count
  highest score / lowest score
  average age / total sales
  where age > 30
";

/// 交互循环。每行一个命令或问题
pub fn shell<R: BufRead, W: Write>(db: &mut Database, input: R, mut out: W) -> std::io::Result<()> {
    writeln!(out, "sheet_query - 用英文查询上传的表格")?;
    writeln!(out, "输入 'help' 获取帮助信息, 'exit' 退出程序")?;

    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let line = match lines.next() {
            Some(line) => line?,
            None => break,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };

        match command {
            "exit" | "quit" => break,
            "help" => write!(out, "{}", HELP)?,
            "columns" => match db.columns(db.table_name()) {
                Ok(columns) => writeln!(out, "{}", columns.join(", "))?,
                Err(e) => writeln!(out, "{}", db.format_error(&e))?,
            },
            "mode" => {
                let mode = db.toggle_error_mode();
                writeln!(out, "错误显示模式: {:?}", mode)?;
            }
            "load" if !rest.is_empty() => match db.ingest_file(Path::new(rest)) {
                Ok(summary) => {
                    writeln!(out, "{}", summary.message())?;
                    writeln!(out, "列: {}", summary.columns.join(", "))?;
                }
                Err(e) => writeln!(out, "{}", db.format_error(&e))?,
            },
            "sql" if !rest.is_empty() => match db.execute_sql(rest) {
                Ok(result) => write!(out, "{}", TableFormatter::format_result(&result))?,
                Err(e) => writeln!(out, "{}", db.format_error(&e))?,
            },
            _ => match db.ask(line) {
                Ok(answer) => {
                    writeln!(out, "SQL: {}", answer.sql)?;
                    if answer.result.rows.is_empty() {
                        writeln!(out, "查询结果为空")?;
                    } else {
                        write!(out, "{}", TableFormatter::format_result(&answer.result))?;
                    }
                }
                Err(e) => writeln!(out, "{}", db.format_error(&e))?,
            },
        }
    }

    Ok(())
}
