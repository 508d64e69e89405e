//! SQLite-backed document store.
//!
//! # Responsibility
//! - Persist JSON documents in the `documents` table.
//! - Translate `DocQuery` into `json_extract` filters and ordering.
//!
//! # Invariants
//! - Bodies are always JSON objects.
//! - Field names in queries are plain identifiers; JSON paths are bound as
//!   parameters, never spliced into SQL.

use super::{
    CollectionPath, DocPath, DocQuery, DocumentStore, SortDirection, StoreError, StoreResult,
    StoredDocument, WriteMode,
};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde_json::Value;

static FIELD_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid field name regex"));

const NOW_MS_SQL: &str = "(CAST(strftime('%s', 'now') AS INTEGER) * 1000)";

/// Document store over a migrated SQLite connection.
#[derive(Clone, Copy)]
pub struct SqliteDocumentStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentStore<'conn> {
    /// Wraps a connection returned by `open_db`/`open_db_in_memory`.
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl DocumentStore for SqliteDocumentStore<'_> {
    fn set(&self, path: &DocPath, body: &Value, mode: WriteMode) -> StoreResult<()> {
        if !body.is_object() {
            return Err(StoreError::InvalidInput(format!(
                "document `{path}` body must be a JSON object"
            )));
        }

        let merged_body = match mode {
            WriteMode::Merge => "json_patch(documents.body, excluded.body)",
            WriteMode::Replace => "excluded.body",
        };
        let sql = format!(
            "INSERT INTO documents (collection, doc_id, body)
             VALUES (?1, ?2, json(?3))
             ON CONFLICT (collection, doc_id) DO UPDATE SET
                body = {merged_body},
                updated_at = {NOW_MS_SQL};"
        );

        self.conn.execute(
            &sql,
            params![
                path.collection.as_str(),
                path.id.as_str(),
                serde_json::to_string(body)?
            ],
        )?;
        Ok(())
    }

    fn get(&self, path: &DocPath) -> StoreResult<Option<Value>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND doc_id = ?2;",
                params![path.collection.as_str(), path.id.as_str()],
                |row| row.get(0),
            )
            .optional()?;

        body.map(|text| serde_json::from_str(&text).map_err(StoreError::from))
            .transpose()
    }

    fn delete(&self, path: &DocPath) -> StoreResult<()> {
        self.conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND doc_id = ?2;",
            params![path.collection.as_str(), path.id.as_str()],
        )?;
        Ok(())
    }

    fn query(&self, collection: &CollectionPath, query: &DocQuery) -> StoreResult<Vec<StoredDocument>> {
        let mut sql = String::from("SELECT doc_id, body FROM documents WHERE collection = ?");
        let mut bind_values: Vec<SqlValue> = vec![SqlValue::Text(collection.as_str().to_string())];

        if let Some((field, value)) = &query.filter {
            let json_path = field_json_path(field)?;
            match to_sql_scalar(value)? {
                Some(scalar) => {
                    sql.push_str(" AND json_extract(body, ?) = ?");
                    bind_values.push(SqlValue::Text(json_path));
                    bind_values.push(scalar);
                }
                None => {
                    sql.push_str(" AND json_extract(body, ?) IS NULL");
                    bind_values.push(SqlValue::Text(json_path));
                }
            }
        }

        match &query.order_by {
            Some((field, direction)) => {
                let keyword = match direction {
                    SortDirection::Ascending => "ASC",
                    SortDirection::Descending => "DESC",
                };
                sql.push_str(&format!(" ORDER BY json_extract(body, ?) {keyword}, doc_id ASC"));
                bind_values.push(SqlValue::Text(field_json_path(field)?));
            }
            None => sql.push_str(" ORDER BY doc_id ASC"),
        }

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(SqlValue::Integer(i64::from(limit)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut documents = Vec::new();

        while let Some(row) = rows.next()? {
            let id: String = row.get(0)?;
            let body_text: String = row.get(1)?;
            documents.push(StoredDocument {
                id,
                body: serde_json::from_str(&body_text)?,
            });
        }

        Ok(documents)
    }
}

fn field_json_path(field: &str) -> StoreResult<String> {
    if !FIELD_NAME_RE.is_match(field) {
        return Err(StoreError::InvalidInput(format!(
            "unsupported query field `{field}`"
        )));
    }
    Ok(format!("$.{field}"))
}

/// Maps a JSON scalar to the SQL value `json_extract` yields for it.
///
/// Returns `Ok(None)` for JSON `null`.
fn to_sql_scalar(value: &Value) -> StoreResult<Option<SqlValue>> {
    match value {
        Value::Null => Ok(None),
        Value::Bool(flag) => Ok(Some(SqlValue::Integer(i64::from(*flag)))),
        Value::Number(number) => match (number.as_i64(), number.as_f64()) {
            (Some(integer), _) => Ok(Some(SqlValue::Integer(integer))),
            (None, Some(real)) => Ok(Some(SqlValue::Real(real))),
            (None, None) => Err(StoreError::InvalidInput(format!(
                "unsupported numeric filter value `{number}`"
            ))),
        },
        Value::String(text) => Ok(Some(SqlValue::Text(text.clone()))),
        Value::Array(_) | Value::Object(_) => Err(StoreError::InvalidInput(
            "filter value must be a JSON scalar".to_string(),
        )),
    }
}
