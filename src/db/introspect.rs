//! Read-only view of the database catalog: tables, columns, foreign keys,
//! indexes and row counts. Never reads row contents.

use duckdb::{AccessMode, Config, Connection};
use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use std::error::Error;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;
use tracing::{debug, info};

static FOREIGN_KEY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)FOREIGN\s+KEY\s*\(([^)]*)\)\s*REFERENCES\s+((?:"[^"]+"|\w+)(?:\s*\.\s*(?:"[^"]+"|\w+))*)\s*(?:\(([^)]*)\))?"#,
    )
    .expect("foreign key pattern is valid")
});

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub data_type: String,
    pub not_null: bool,
    pub default: Option<String>,
    pub primary_key: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ForeignKeyDescriptor {
    pub column: String,
    pub target_table: String,
    pub target_column: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TableDescriptor {
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
    /// Fetched with the rest of the catalog; displays do not render it.
    pub indexes: Vec<String>,
    pub row_count: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RelationshipEdge {
    pub from_table: String,
    pub from_column: String,
    pub to_table: String,
    pub to_column: String,
}

#[derive(Debug)]
pub enum IntrospectionError {
    Open(duckdb::Error),
    Query(duckdb::Error),
}

impl fmt::Display for IntrospectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntrospectionError::Open(e) => write!(f, "Could not open database: {}", e),
            IntrospectionError::Query(e) => write!(f, "Catalog query failed: {}", e),
        }
    }
}

impl Error for IntrospectionError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            IntrospectionError::Open(e) | IntrospectionError::Query(e) => Some(e),
        }
    }
}

impl From<duckdb::Error> for IntrospectionError {
    fn from(e: duckdb::Error) -> Self {
        IntrospectionError::Query(e)
    }
}

/// Every user table with its columns, foreign keys, indexes and row count,
/// keyed by table name in enumeration order.
///
/// `Ok` with an empty map means the database has no tables; any failure to
/// open or query the catalog is an `Err`.
pub fn describe_schema(
    database_path: impl AsRef<Path>,
) -> Result<IndexMap<String, TableDescriptor>, IntrospectionError> {
    let conn = open_read_only(database_path.as_ref())?;

    let mut schema = IndexMap::new();
    for table in list_tables(&conn)? {
        let descriptor = TableDescriptor {
            columns: table_columns(&conn, &table)?,
            foreign_keys: table_foreign_keys(&conn, &table)?,
            indexes: table_indexes(&conn, &table)?,
            row_count: row_count(&conn, &table)?,
            name: table.clone(),
        };
        debug!(
            "Table {}: {} columns, {} foreign keys, {} rows",
            table,
            descriptor.columns.len(),
            descriptor.foreign_keys.len(),
            descriptor.row_count
        );
        schema.insert(table, descriptor);
    }

    info!("Described {} tables", schema.len());
    Ok(schema)
}

/// One edge per foreign key, in table enumeration order and then in
/// declaration order within each table.
pub fn list_relationships(
    database_path: impl AsRef<Path>,
) -> Result<Vec<RelationshipEdge>, IntrospectionError> {
    let conn = open_read_only(database_path.as_ref())?;

    let mut edges = Vec::new();
    for table in list_tables(&conn)? {
        for fk in table_foreign_keys(&conn, &table)? {
            edges.push(RelationshipEdge {
                from_table: table.clone(),
                from_column: fk.column,
                to_table: fk.target_table,
                to_column: fk.target_column,
            });
        }
    }

    Ok(edges)
}

fn open_read_only(path: &Path) -> Result<Connection, IntrospectionError> {
    let config = Config::default()
        .access_mode(AccessMode::ReadOnly)
        .map_err(IntrospectionError::Open)?;
    Connection::open_with_flags(path, config).map_err(IntrospectionError::Open)
}

fn list_tables(conn: &Connection) -> duckdb::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT table_name FROM duckdb_tables() \
         WHERE database_name = current_database() AND schema_name = 'main' \
         AND NOT internal AND NOT temporary \
         ORDER BY table_name",
    )?;
    let tables = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<duckdb::Result<Vec<_>>>()?;
    Ok(tables)
}

fn table_columns(conn: &Connection, table: &str) -> duckdb::Result<Vec<ColumnDescriptor>> {
    let qualified = format!("main.\"{}\"", table.replace('"', "\"\""));
    let mut stmt = conn.prepare(&format!("PRAGMA table_info('{}')", qualified.replace('\'', "''")))?;
    let columns = stmt
        .query_map([], |row| {
            Ok(ColumnDescriptor {
                name: row.get(1)?,
                data_type: row.get(2)?,
                not_null: row.get(3)?,
                default: row.get(4)?,
                primary_key: row.get(5)?,
            })
        })?
        .collect::<duckdb::Result<Vec<_>>>()?;
    Ok(columns)
}

fn table_foreign_keys(conn: &Connection, table: &str) -> duckdb::Result<Vec<ForeignKeyDescriptor>> {
    let mut stmt = conn.prepare(
        "SELECT constraint_text FROM duckdb_constraints() \
         WHERE database_name = current_database() AND schema_name = 'main' \
         AND table_name = ? AND constraint_type = 'FOREIGN KEY' \
         ORDER BY constraint_index",
    )?;
    let texts = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<duckdb::Result<Vec<_>>>()?;

    Ok(texts.iter().flat_map(|text| parse_foreign_key(text)).collect())
}

fn table_indexes(conn: &Connection, table: &str) -> duckdb::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT index_name FROM duckdb_indexes() \
         WHERE database_name = current_database() AND schema_name = 'main' AND table_name = ? \
         ORDER BY index_name",
    )?;
    let indexes = stmt
        .query_map([table], |row| row.get::<_, String>(0))?
        .collect::<duckdb::Result<Vec<_>>>()?;
    Ok(indexes)
}

fn row_count(conn: &Connection, table: &str) -> duckdb::Result<u64> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM main.\"{}\"", table.replace('"', "\"\"")),
        [],
        |row| row.get(0),
    )?;
    Ok(count.max(0) as u64)
}

/// Parses `FOREIGN KEY (a, b) REFERENCES [schema.]T(x, y)` into one
/// descriptor per column pair. A reference without a column list points at
/// same-named columns.
pub(crate) fn parse_foreign_key(text: &str) -> Vec<ForeignKeyDescriptor> {
    let Some(caps) = FOREIGN_KEY_PATTERN.captures(text) else {
        debug!("Unrecognised foreign key text: {}", text);
        return Vec::new();
    };

    let source = split_identifiers(&caps[1]);
    let target_table = caps[2]
        .rsplit('.')
        .next()
        .map(unquote)
        .unwrap_or_default();
    let target = caps
        .get(3)
        .map(|m| split_identifiers(m.as_str()))
        .unwrap_or_else(|| source.clone());

    source
        .into_iter()
        .zip(target)
        .map(|(column, target_column)| ForeignKeyDescriptor {
            column,
            target_table: target_table.clone(),
            target_column,
        })
        .collect()
}

fn split_identifiers(list: &str) -> Vec<String> {
    list.split(',')
        .map(unquote)
        .filter(|s| !s.is_empty())
        .collect()
}

fn unquote(identifier: &str) -> String {
    identifier.trim().trim_matches('"').replace("\"\"", "\"")
}
