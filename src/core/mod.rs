pub mod db;
pub mod error;
pub mod ingest;
pub mod matcher;
pub mod sql;
pub mod storage;
pub mod types;
