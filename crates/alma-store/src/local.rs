// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

//! Gateway implementation over an embedded SQLite file, used for demo and
//! offline deployments. It speaks the exact row shape the hosted backend
//! does, so no call site can tell the difference.

use anyhow::{Context, Result, anyhow, bail};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::APP_NAME;
use crate::gateway::{Gateway, GatewayError, ListFilter, Row, TABLES, is_known_table};

pub struct LocalGateway {
    conn: Mutex<Connection>,
}

impl LocalGateway {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates the schema on first run; on an existing file, verifies every
    /// entity table is present rather than guessing at migrations.
    pub fn bootstrap(&self) -> Result<()> {
        let conn = self.lock_for_setup()?;
        if has_user_tables(&conn)? {
            validate_schema(&conn)?;
        } else {
            conn.execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
        }
        Ok(())
    }

    fn lock_for_setup(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database connection poisoned"))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, GatewayError> {
        self.conn
            .lock()
            .map_err(|_| GatewayError::Connection("database connection poisoned".to_owned()))
    }
}

impl Gateway for LocalGateway {
    fn list(&self, table: &str, filter: &ListFilter) -> Result<Vec<Row>, GatewayError> {
        ensure_table(table)?;
        let conn = self.lock()?;

        let mut sql = format!("SELECT id, body FROM {table}");
        let mut binds: Vec<rusqlite::types::Value> = Vec::new();
        for (index, (field, value)) in filter.equals().iter().enumerate() {
            if !is_safe_identifier(field) {
                return Err(GatewayError::Rejected(format!(
                    "invalid filter field {field:?}"
                )));
            }
            sql.push_str(if index == 0 { " WHERE " } else { " AND " });
            sql.push_str(&format!("json_extract(body, '$.{field}') = ?"));
            binds.push(bind_value(value)?);
        }
        sql.push_str(" ORDER BY id ASC");

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|error| GatewayError::Rejected(format!("prepare list {table}: {error}")))?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(binds), |row| {
                let id: i64 = row.get(0)?;
                let body: String = row.get(1)?;
                Ok((id, body))
            })
            .map_err(|error| GatewayError::Rejected(format!("query {table}: {error}")))?;

        let mut out = Vec::new();
        for row in rows {
            let (id, body) =
                row.map_err(|error| GatewayError::Rejected(format!("read {table}: {error}")))?;
            out.push(body_to_row(table, id, &body)?);
        }
        Ok(out)
    }

    fn insert(&self, table: &str, mut row: Row) -> Result<Row, GatewayError> {
        ensure_table(table)?;
        row.remove("id");
        if !row.contains_key("created_at") {
            row.insert("created_at".to_owned(), Value::String(now_rfc3339()?));
        }
        let body = Value::Object(row).to_string();

        let conn = self.lock()?;
        conn.execute(
            &format!("INSERT INTO {table} (body) VALUES (?)"),
            params![body],
        )
        .map_err(|error| GatewayError::Rejected(format!("insert into {table}: {error}")))?;
        let id = conn.last_insert_rowid();
        body_to_row(table, id, &body)
    }

    fn update(&self, table: &str, id: i64, patch: Row) -> Result<Row, GatewayError> {
        ensure_table(table)?;
        let conn = self.lock()?;

        let body: Option<String> = conn
            .query_row(
                &format!("SELECT body FROM {table} WHERE id = ?"),
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|error| GatewayError::Rejected(format!("load {table} row: {error}")))?;
        let Some(body) = body else {
            return Err(GatewayError::NotFound {
                table: table.to_owned(),
                id,
            });
        };

        let mut merged = parse_body(table, &body)?;
        for (field, value) in patch {
            if field != "id" {
                merged.insert(field, value);
            }
        }
        let next_body = Value::Object(merged).to_string();

        let rows_affected = conn
            .execute(
                &format!("UPDATE {table} SET body = ? WHERE id = ?"),
                params![next_body, id],
            )
            .map_err(|error| GatewayError::Rejected(format!("update {table} row: {error}")))?;
        if rows_affected == 0 {
            return Err(GatewayError::NotFound {
                table: table.to_owned(),
                id,
            });
        }
        body_to_row(table, id, &next_body)
    }

    fn delete(&self, table: &str, id: i64) -> Result<(), GatewayError> {
        ensure_table(table)?;
        let conn = self.lock()?;
        let rows_affected = conn
            .execute(&format!("DELETE FROM {table} WHERE id = ?"), params![id])
            .map_err(|error| GatewayError::Rejected(format!("delete from {table}: {error}")))?;
        if rows_affected == 0 {
            return Err(GatewayError::NotFound {
                table: table.to_owned(),
                id,
            });
        }
        Ok(())
    }
}

fn ensure_table(table: &str) -> Result<(), GatewayError> {
    if is_known_table(table) {
        Ok(())
    } else {
        Err(GatewayError::Rejected(format!("unknown table {table:?}")))
    }
}

fn parse_body(table: &str, body: &str) -> Result<Row, GatewayError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|error| GatewayError::Decode(format!("{table} body: {error}")))?;
    match value {
        Value::Object(object) => Ok(object),
        _ => Err(GatewayError::Decode(format!(
            "{table} body is not an object"
        ))),
    }
}

fn body_to_row(table: &str, id: i64, body: &str) -> Result<Row, GatewayError> {
    let mut row = parse_body(table, body)?;
    row.insert("id".to_owned(), Value::from(id));
    Ok(row)
}

fn bind_value(value: &Value) -> Result<rusqlite::types::Value, GatewayError> {
    match value {
        Value::String(text) => Ok(rusqlite::types::Value::Text(text.clone())),
        Value::Bool(flag) => Ok(rusqlite::types::Value::Integer(i64::from(*flag))),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                Ok(rusqlite::types::Value::Integer(int))
            } else if let Some(float) = number.as_f64() {
                Ok(rusqlite::types::Value::Real(float))
            } else {
                Err(GatewayError::Rejected(format!(
                    "unsupported filter number {number}"
                )))
            }
        }
        other => Err(GatewayError::Rejected(format!(
            "unsupported filter value {other}"
        ))),
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os("ALMA_DB_PATH") {
        return Ok(PathBuf::from(path));
    }
    let data_root = dirs::data_dir()
        .ok_or_else(|| anyhow!("cannot resolve data directory; set ALMA_DB_PATH"))?;
    let app_dir = data_root.join(APP_NAME);
    std::fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("alma.db"))
}

pub fn validate_db_path(path: &str) -> Result<()> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        bail!("database path is empty");
    }
    if trimmed.contains("://") || trimmed.starts_with("file:") {
        bail!("database path {trimmed:?} looks like a URI; use a filesystem path");
    }
    if trimmed.contains('?') {
        bail!("database path {trimmed:?} must not carry query parameters");
    }
    Ok(())
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")
        .context("enable WAL journal mode")?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .context("enable foreign keys")?;
    conn.busy_timeout(std::time::Duration::from_secs(5))
        .context("set busy timeout")?;
    Ok(())
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for table in TABLES {
        let exists: Option<String> = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
                params![table],
                |row| row.get(0),
            )
            .optional()
            .with_context(|| format!("check table {table}"))?;
        if exists.is_none() {
            bail!(
                "existing database is missing table `{table}` -- point [storage].db_path at a portal database or remove the file"
            );
        }
    }
    Ok(())
}

fn is_safe_identifier(identifier: &str) -> bool {
    !identifier.is_empty()
        && identifier
            .bytes()
            .all(|byte| byte.is_ascii_alphanumeric() || byte == b'_')
}

fn now_rfc3339() -> Result<String, GatewayError> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .map_err(|error| GatewayError::Rejected(format!("format timestamp: {error}")))
}

#[cfg(test)]
mod tests {
    use super::{LocalGateway, is_safe_identifier, validate_db_path};
    use crate::gateway::{Gateway, GatewayError, ListFilter};
    use serde_json::json;

    fn object(value: serde_json::Value) -> crate::gateway::Row {
        value.as_object().expect("object").clone()
    }

    #[test]
    fn validate_db_path_rejects_uri_forms() {
        assert!(validate_db_path("file:test.db").is_err());
        assert!(validate_db_path("https://example.com/db.sqlite").is_err());
        assert!(validate_db_path("db.sqlite?mode=ro").is_err());
        assert!(validate_db_path("/tmp/alma.db").is_ok());
    }

    #[test]
    fn safe_identifiers_are_word_characters_only() {
        assert!(is_safe_identifier("student_id"));
        assert!(!is_safe_identifier("student_id = 1; DROP TABLE fees"));
        assert!(!is_safe_identifier(""));
    }

    #[test]
    fn bootstrap_is_idempotent() {
        let gateway = LocalGateway::open_memory().expect("open");
        gateway.bootstrap().expect("first bootstrap");
        gateway.bootstrap().expect("second bootstrap validates");
    }

    #[test]
    fn insert_stamps_id_and_created_at() {
        let gateway = LocalGateway::open_memory().expect("open");
        gateway.bootstrap().expect("bootstrap");

        let row = gateway
            .insert("companies", object(json!({"name": "Trellis Systems"})))
            .expect("insert");
        assert_eq!(row.get("id"), Some(&json!(1)));
        assert!(row.contains_key("created_at"));

        let listed = gateway
            .list("companies", &ListFilter::new())
            .expect("list");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].get("name"), Some(&json!("Trellis Systems")));
    }

    #[test]
    fn list_filter_uses_json_fields() {
        let gateway = LocalGateway::open_memory().expect("open");
        gateway.bootstrap().expect("bootstrap");

        for (student, amount) in [(7, 50_000), (7, 20_000), (9, 10_000)] {
            gateway
                .insert(
                    "fees",
                    object(json!({"student_id": student, "amount_cents": amount})),
                )
                .expect("insert fee");
        }

        let mine = gateway
            .list("fees", &ListFilter::new().eq("student_id", 7))
            .expect("filtered list");
        assert_eq!(mine.len(), 2);
    }

    #[test]
    fn update_merges_patch_and_reports_missing_rows() {
        let gateway = LocalGateway::open_memory().expect("open");
        gateway.bootstrap().expect("bootstrap");

        let row = gateway
            .insert(
                "fees",
                object(json!({"student_id": 7, "amount_cents": 50_000, "paid_cents": 0})),
            )
            .expect("insert fee");
        let id = row.get("id").and_then(|v| v.as_i64()).expect("id");

        let updated = gateway
            .update("fees", id, object(json!({"paid_cents": 25_000})))
            .expect("update");
        assert_eq!(updated.get("paid_cents"), Some(&json!(25_000)));
        assert_eq!(updated.get("amount_cents"), Some(&json!(50_000)));

        let missing = gateway
            .update("fees", 999, object(json!({"paid_cents": 1})))
            .expect_err("missing row");
        assert!(matches!(missing, GatewayError::NotFound { .. }));
    }

    #[test]
    fn delete_removes_and_reports_missing_rows() {
        let gateway = LocalGateway::open_memory().expect("open");
        gateway.bootstrap().expect("bootstrap");

        let row = gateway
            .insert("rooms", object(json!({"block": "A", "number": "101", "capacity": 2})))
            .expect("insert room");
        let id = row.get("id").and_then(|v| v.as_i64()).expect("id");

        gateway.delete("rooms", id).expect("delete");
        assert!(matches!(
            gateway.delete("rooms", id),
            Err(GatewayError::NotFound { .. })
        ));
        assert!(gateway.list("rooms", &ListFilter::new()).expect("list").is_empty());
    }

    #[test]
    fn unknown_tables_are_refused() {
        let gateway = LocalGateway::open_memory().expect("open");
        gateway.bootstrap().expect("bootstrap");
        let error = gateway
            .list("grades", &ListFilter::new())
            .expect_err("unknown table");
        assert!(matches!(error, GatewayError::Rejected(_)));
    }

    #[test]
    fn client_supplied_id_is_ignored_on_insert() {
        let gateway = LocalGateway::open_memory().expect("open");
        gateway.bootstrap().expect("bootstrap");
        let row = gateway
            .insert("books", object(json!({"id": 400, "title": "Algorithms", "author": "CLRS", "isbn": "1"})))
            .expect("insert");
        assert_eq!(row.get("id"), Some(&json!(1)), "gateway assigns the id");
    }
}
