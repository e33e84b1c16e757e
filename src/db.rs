use std::path::Path;

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement, TransactionTrait};
use tracing::{info, warn};

use crate::{error::AppResult, models::SchemaReport};

pub async fn connect(database_url: &str) -> AppResult<DatabaseConnection> {
    let db = Database::connect(database_url).await?;

    for pragma in
        ["PRAGMA journal_mode=WAL", "PRAGMA synchronous=NORMAL", "PRAGMA cache_size=-64000"]
    {
        db.execute(Statement::from_string(db.get_database_backend(), pragma.to_string())).await?;
    }

    Ok(db)
}

/// Runs every statement of the DDL file at `path` in one transaction.
///
/// A statement that fails is logged and skipped; the remaining statements still
/// run. A missing file is not an error: the step is skipped with a warning.
pub async fn init_schema(db: &DatabaseConnection, path: &Path) -> AppResult<SchemaReport> {
    let sql = match tokio::fs::read_to_string(path).await {
        Ok(sql) => sql,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "schema file not found, skipping schema initialization");
            return Ok(SchemaReport::default());
        },
        Err(err) => return Err(err.into()),
    };

    info!(path = %path.display(), "loading schema");

    let mut report = SchemaReport::default();
    let txn = db.begin().await?;
    for stmt in split_statements(&sql) {
        let backend = txn.get_database_backend();
        match txn.execute(Statement::from_string(backend, stmt.to_string())).await {
            Ok(_) => report.executed += 1,
            Err(err) => {
                warn!(statement = %stmt, error = %err, "schema statement failed");
                report.failed += 1;
            },
        }
    }
    txn.commit().await?;

    info!(executed = report.executed, failed = report.failed, "schema initialized");
    Ok(report)
}

/// Splits a SQL script into statements on top-level semicolons.
///
/// Semicolons inside quoted text, comments and `CREATE TRIGGER` bodies do not
/// end a statement. Fragments holding only whitespace or comments are dropped.
pub fn split_statements(sql: &str) -> Vec<&str> {
    let bytes = sql.as_bytes();
    let mut out = Vec::new();

    let mut start = 0;
    let mut i = 0;
    let mut has_code = false;
    let mut word_index = 0;
    let mut in_trigger = false;
    let mut depth = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"' | b'`') => {
                has_code = true;
                i += 1;
                while i < bytes.len() {
                    if bytes[i] == quote {
                        // doubled quote is an escaped quote
                        if bytes.get(i + 1) == Some(&quote) {
                            i += 2;
                            continue;
                        }
                        break;
                    }
                    i += 1;
                }
                i += 1;
            },
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            },
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    i += 1;
                }
                i += 2;
            },
            b';' if depth == 0 => {
                if has_code {
                    out.push(sql[start..i].trim());
                }
                i += 1;
                start = i;
                has_code = false;
                word_index = 0;
                in_trigger = false;
            },
            b if b.is_ascii_alphabetic() || b == b'_' => {
                has_code = true;
                let word_start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                let word = &sql[word_start..i];
                word_index += 1;
                if word_index <= 3 && word.eq_ignore_ascii_case("trigger") {
                    in_trigger = true;
                } else if in_trigger {
                    if word.eq_ignore_ascii_case("begin") || word.eq_ignore_ascii_case("case") {
                        depth += 1;
                    } else if word.eq_ignore_ascii_case("end") {
                        depth = depth.saturating_sub(1);
                    }
                }
            },
            b => {
                if !b.is_ascii_whitespace() {
                    has_code = true;
                }
                i += 1;
            },
        }
    }

    if has_code && start < sql.len() {
        out.push(sql[start..].trim());
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn splits_plain_ddl() {
        let sql = "CREATE TABLE a (x INT);\n\nCREATE TABLE b (y INT);\n";
        assert_eq!(split_statements(sql), vec!["CREATE TABLE a (x INT)", "CREATE TABLE b (y INT)"]);
    }

    #[test]
    fn keeps_last_statement_without_semicolon() {
        assert_eq!(split_statements("SELECT 1; SELECT 2"), vec!["SELECT 1", "SELECT 2"]);
    }

    #[test]
    fn ignores_semicolons_in_quotes_and_comments() {
        let sql = "INSERT INTO t VALUES ('a;b', \"c;d\", 'it''s; fine'); -- trailing; comment\n\
                   /* block; comment */ SELECT 1;";
        let stmts = split_statements(sql);
        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0], "INSERT INTO t VALUES ('a;b', \"c;d\", 'it''s; fine')");
        assert!(stmts[1].ends_with("SELECT 1"));
    }

    #[test]
    fn drops_comment_only_fragments() {
        let sql = "CREATE TABLE a (x INT);\n-- nothing else here\n";
        assert_eq!(split_statements(sql), vec!["CREATE TABLE a (x INT)"]);
    }

    #[test]
    fn keeps_trigger_body_together() {
        let sql = "CREATE TRIGGER touch AFTER UPDATE ON movies BEGIN \
                   UPDATE movies SET plot = CASE WHEN plot IS NULL THEN 'x' ELSE plot END; \
                   SELECT 1; END;\nCREATE TABLE z (id INT);";
        let stmts = split_statements(sql);
        assert_eq!(stmts.len(), 2);
        assert!(stmts[0].starts_with("CREATE TRIGGER touch"));
        assert!(stmts[0].ends_with("END"));
        assert_eq!(stmts[1], "CREATE TABLE z (id INT)");
    }

    #[test]
    fn begin_outside_trigger_does_not_nest() {
        assert_eq!(split_statements("BEGIN; SELECT 1; END;"), vec!["BEGIN", "SELECT 1", "END"]);
    }

    #[tokio::test]
    async fn init_schema_is_idempotent() {
        let (_dir, db) = test_support::empty_db().await;
        let path = test_support::schema_path();

        let first = init_schema(&db, &path).await.unwrap();
        assert!(first.executed >= 4);
        assert_eq!(first.failed, 0);

        let second = init_schema(&db, &path).await.unwrap();
        assert_eq!(second.executed, first.executed);
        assert_eq!(second.failed, 0);
    }

    #[tokio::test]
    async fn missing_schema_file_is_skipped() {
        let (dir, db) = test_support::empty_db().await;
        let report = init_schema(&db, &dir.path().join("nope.sql")).await.unwrap();
        assert_eq!(report, SchemaReport::default());
    }

    #[tokio::test]
    async fn failing_statement_does_not_abort_the_rest() {
        let (dir, db) = test_support::empty_db().await;
        let path = dir.path().join("schema.sql");
        std::fs::write(
            &path,
            "CREATE TABLE first (id INTEGER);\n\
             CREATE TABLEX broken;\n\
             CREATE TABLE second (id INTEGER);\n",
        )
        .unwrap();

        let report = init_schema(&db, &path).await.unwrap();
        assert_eq!(report.executed, 2);
        assert_eq!(report.failed, 1);

        let tables = db
            .query_all(Statement::from_string(
                db.get_database_backend(),
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name IN ('first', 'second')"
                    .to_string(),
            ))
            .await
            .unwrap();
        assert_eq!(tables.len(), 2);
    }
}
