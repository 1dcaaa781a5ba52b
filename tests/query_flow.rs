use std::fs;
use std::path::{Path, PathBuf};
use sheet_query::core::types::DataType;
use sheet_query::{ask_file, Database, DbError, RuleKind, StorageType};
use tempfile::{tempdir, TempDir};

const STUDY_LOG: &str = "\
topic,completed,hours,score
Rust,1,12,88.5
SQL,0,4,71
Go,1,7,93
Excel,0,,60
";

fn write_csv(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

fn loaded(dir: &TempDir) -> Database {
    let mut db = Database::new(StorageType::File(dir.path().join("data")));
    db.ingest_file(&write_csv(dir, "log.csv", STUDY_LOG)).unwrap();
    db
}

fn first_cell(db: &Database, question: &str) -> DataType {
    db.ask(question).unwrap().result.rows[0][0].clone()
}

#[test]
fn every_rule_produces_executable_sql() {
    let dir = tempdir().unwrap();
    let db = loaded(&dir);

    let cases = [
        ("show topic", RuleKind::SingleColumn, "SELECT topic FROM uploaded_table"),
        ("topic and hours please", RuleKind::MultiColumn, "SELECT topic, hours FROM uploaded_table"),
        ("count", RuleKind::RowCount, "SELECT COUNT(*) AS total_rows FROM uploaded_table"),
        ("highest score", RuleKind::Maximum, "SELECT * FROM uploaded_table ORDER BY score DESC LIMIT 1"),
        ("lowest score", RuleKind::Minimum, "SELECT * FROM uploaded_table ORDER BY score ASC LIMIT 1"),
        ("average hours", RuleKind::Average, "SELECT AVG(hours) AS average_hours FROM uploaded_table"),
        ("total hours", RuleKind::Sum, "SELECT SUM(hours) AS sum_hours FROM uploaded_table"),
        ("rows where completed = 1", RuleKind::WherePassthrough, "SELECT * FROM uploaded_table WHERE completed = 1"),
        ("gibberish nonsense", RuleKind::Fallback, "SELECT * FROM uploaded_table"),
    ];

    for (question, rule, sql) in cases {
        let answer = db.ask(question).unwrap_or_else(|e| panic!("{}: {}", question, e));
        assert_eq!(answer.rule, rule, "{}", question);
        assert_eq!(answer.sql, sql, "{}", question);
    }
}

#[test]
fn answers_match_the_data() {
    let dir = tempdir().unwrap();
    let db = loaded(&dir);

    assert_eq!(first_cell(&db, "count"), DataType::Int(4));
    assert_eq!(first_cell(&db, "highest score"), DataType::Text("Go".into()));
    // hours 为空的行在升序中排最前
    assert_eq!(first_cell(&db, "min hours"), DataType::Text("Excel".into()));
    assert_eq!(first_cell(&db, "total hours"), DataType::Int(23));
    assert_eq!(first_cell(&db, "mean score"), DataType::Real(78.125));

    let answer = db.ask("where hours >= 7").unwrap();
    assert_eq!(answer.result.columns, vec!["topic", "completed", "hours", "score"]);
    let topics: Vec<String> = answer.result.rows.iter().map(|r| r[0].to_string()).collect();
    assert_eq!(topics, vec!["Rust", "Go"]);

    // "topic" 里含有 "top"，最大值规则先于 WHERE 规则命中
    let answer = db.ask("where topic = 'SQL'").unwrap();
    assert_eq!(answer.rule, RuleKind::Maximum);
    assert_eq!(answer.sql, "SELECT * FROM uploaded_table ORDER BY topic DESC LIMIT 1");
}

#[test]
fn where_passthrough_cannot_run_other_statements() {
    let dir = tempdir().unwrap();
    let db = loaded(&dir);

    let err = db.ask("where hours > 1; drop table uploaded_table").unwrap_err();
    assert!(matches!(err, DbError::SqlError(_)));
    let err = db.ask("where 1 = 1 union select * from secrets").unwrap_err();
    assert!(matches!(err, DbError::SqlError(_)));

    assert_eq!(first_cell(&db, "count"), DataType::Int(4));
}

#[test]
fn malformed_or_stale_sql_is_an_execution_error() {
    let dir = tempdir().unwrap();
    let mut db = loaded(&dir);

    assert!(db.ask("where hours >").is_err());
    assert!(db.ask("where nothing = 3").is_err());

    // 重新上传后旧列不存在
    db.ingest_file(&write_csv(&dir, "other.csv", "city,population\nOslo,700000\n")).unwrap();
    assert!(db.execute_sql("SELECT hours FROM uploaded_table").is_err());
}

#[test]
fn reingest_replaces_the_schema() {
    let dir = tempdir().unwrap();
    let mut db = loaded(&dir);

    let summary = db
        .ingest_file(&write_csv(&dir, "cities.csv", "city,population\nOslo,700000\nLima,9750000\n"))
        .unwrap();
    assert_eq!(summary.rows, 2);
    assert_eq!(summary.columns, vec!["city", "population"]);
    assert_eq!(db.columns("uploaded_table").unwrap(), vec!["city", "population"]);
    let files: Vec<_> = fs::read_dir(dir.path().join("data").join("tables")).unwrap().collect();
    assert_eq!(files.len(), 1);
    assert_eq!(first_cell(&db, "highest population"), DataType::Text("Lima".into()));
}

#[test]
fn failed_ingest_keeps_the_previous_table() {
    let dir = tempdir().unwrap();
    let mut db = loaded(&dir);

    let err = db.ingest_file(Path::new("/definitely/not/here.csv")).unwrap_err();
    assert!(err.is_ingest());
    assert_eq!(db.columns("uploaded_table").unwrap().len(), 4);
}

#[test]
fn file_backend_persists_between_sessions() {
    let dir = tempdir().unwrap();
    drop(loaded(&dir));

    let mut db = Database::new(StorageType::File(dir.path().join("data")));
    db.load().unwrap();
    assert_eq!(first_cell(&db, "count"), DataType::Int(4));
}

#[test]
fn ask_file_runs_against_an_in_memory_table() {
    let dir = tempdir().unwrap();
    let path = write_csv(&dir, "log.csv", STUDY_LOG);
    let answer = ask_file(&path, "show score").unwrap();
    assert_eq!(answer.result.columns, vec!["score"]);
    assert_eq!(answer.result.rows.len(), 4);
}
