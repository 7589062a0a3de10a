#![allow(dead_code)]
//! Shared helpers for `loglens` integration tests.

use loglens::LogRecord;
use std::io::Write;
use tempfile::NamedTempFile;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Writes JSON-lines to a temporary file that lives as long as the handle.
pub fn records_file(lines: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    for line in lines {
        writeln!(file, "{line}").expect("write record");
    }
    file.flush().expect("flush records");
    file
}

pub fn messages<'r>(records: impl IntoIterator<Item = &'r LogRecord>) -> Vec<&'r str> {
    records
        .into_iter()
        .filter_map(|record| record.message.as_deref())
        .collect()
}
