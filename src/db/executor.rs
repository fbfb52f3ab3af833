use chrono::{DateTime, NaiveDate, NaiveTime};
use duckdb::types::{TimeUnit, Value};
use duckdb::Connection;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, error, info};

/// One cell of a result row.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl CellValue {
    fn from_duckdb(value: Value) -> Self {
        match value {
            Value::Null => CellValue::Null,
            Value::Boolean(b) => CellValue::Bool(b),
            Value::TinyInt(v) => CellValue::Integer(v.into()),
            Value::SmallInt(v) => CellValue::Integer(v.into()),
            Value::Int(v) => CellValue::Integer(v.into()),
            Value::BigInt(v) => CellValue::Integer(v),
            Value::UTinyInt(v) => CellValue::Integer(v.into()),
            Value::USmallInt(v) => CellValue::Integer(v.into()),
            Value::UInt(v) => CellValue::Integer(v.into()),
            Value::UBigInt(v) => i64::try_from(v)
                .map(CellValue::Integer)
                .unwrap_or_else(|_| CellValue::Text(v.to_string())),
            Value::HugeInt(v) => i64::try_from(v)
                .map(CellValue::Integer)
                .unwrap_or_else(|_| CellValue::Text(v.to_string())),
            Value::Float(v) => CellValue::Real(v.into()),
            Value::Double(v) => CellValue::Real(v),
            Value::Decimal(d) => {
                let text = d.to_string();
                text.parse::<f64>()
                    .map(CellValue::Real)
                    .unwrap_or(CellValue::Text(text))
            }
            Value::Text(s) => CellValue::Text(s),
            Value::Blob(b) => CellValue::Blob(b),
            Value::Date32(days) => CellValue::Text(format_date(days)),
            Value::Timestamp(unit, v) => CellValue::Text(format_timestamp(unit, v)),
            Value::Time64(unit, v) => CellValue::Text(format_time(to_micros(unit, v))),
            Value::Interval { months, days, nanos } => {
                CellValue::Text(format_interval(months, days, nanos))
            }
            Value::Enum(s) => CellValue::Text(s),
            Value::Union(inner) => CellValue::from_duckdb(*inner),
            Value::List(items) | Value::Array(items) => {
                let items: Vec<String> = items
                    .into_iter()
                    .map(|item| CellValue::from_duckdb(item).to_string())
                    .collect();
                CellValue::Text(format!("[{}]", items.join(", ")))
            }
            other => CellValue::Text(format!("{:?}", other)),
        }
    }
}

// Days between 0001-01-01 and the Unix epoch.
const EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn format_date(days: i32) -> String {
    match days {
        i32::MAX => "infinity".to_string(),
        d if d == -i32::MAX => "-infinity".to_string(),
        _ => days
            .checked_add(EPOCH_DAYS_FROM_CE)
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .map(|date| date.to_string())
            .unwrap_or_else(|| days.to_string()),
    }
}

fn to_micros(unit: TimeUnit, value: i64) -> Option<i64> {
    match unit {
        TimeUnit::Second => value.checked_mul(1_000_000),
        TimeUnit::Millisecond => value.checked_mul(1_000),
        TimeUnit::Microsecond => Some(value),
        TimeUnit::Nanosecond => Some(value / 1_000),
    }
}

fn format_timestamp(unit: TimeUnit, value: i64) -> String {
    match value {
        i64::MAX => "infinity".to_string(),
        v if v == -i64::MAX => "-infinity".to_string(),
        _ => to_micros(unit, value)
            .and_then(DateTime::from_timestamp_micros)
            .map(|ts| ts.naive_utc().to_string())
            .unwrap_or_else(|| value.to_string()),
    }
}

fn format_time(micros: Option<i64>) -> String {
    let Some(micros) = micros else {
        return "invalid time".to_string();
    };
    let secs = micros.div_euclid(1_000_000);
    let nanos = micros.rem_euclid(1_000_000) * 1_000;
    u32::try_from(secs)
        .ok()
        .zip(u32::try_from(nanos).ok())
        .and_then(|(secs, nanos)| NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos))
        .map(|time| time.to_string())
        .unwrap_or_else(|| clock(micros))
}

/// Renders an interval the way DuckDB prints it, e.g. `1 year 2 months 3 days 04:05:06`.
fn format_interval(months: i32, days: i32, nanos: i64) -> String {
    let mut parts = Vec::new();
    for (amount, unit) in [(months / 12, "year"), (months % 12, "month"), (days, "day")] {
        if amount != 0 {
            let plural = if amount.abs() == 1 { "" } else { "s" };
            parts.push(format!("{} {}{}", amount, unit, plural));
        }
    }
    if nanos != 0 || parts.is_empty() {
        parts.push(clock(nanos / 1_000));
    }
    parts.join(" ")
}

// HH:MM:SS[.ffffff], hours unbounded.
fn clock(micros: i64) -> String {
    let sign = if micros < 0 { "-" } else { "" };
    let micros = micros.unsigned_abs();
    let (hours, rest) = (micros / 3_600_000_000, micros % 3_600_000_000);
    let (minutes, rest) = (rest / 60_000_000, rest % 60_000_000);
    let (seconds, fraction) = (rest / 1_000_000, rest % 1_000_000);
    if fraction == 0 {
        format!("{}{:02}:{:02}:{:02}", sign, hours, minutes, seconds)
    } else {
        format!("{}{:02}:{:02}:{:02}.{:06}", sign, hours, minutes, seconds, fraction)
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Null => write!(f, "NULL"),
            CellValue::Bool(b) => write!(f, "{}", b),
            CellValue::Integer(v) => write!(f, "{}", v),
            CellValue::Real(v) => write!(f, "{}", v),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Default)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

/// Result of running one statement. Execution never raises; failures are a
/// variant of their own.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExecutionResult {
    Rows(ResultSet),
    Failed { message: String },
}

impl ExecutionResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, ExecutionResult::Failed { .. })
    }

    /// Row view for plain displays: a failure becomes the single row
    /// `("Error", message)`.
    pub fn rows(&self) -> Vec<Vec<CellValue>> {
        match self {
            ExecutionResult::Rows(set) => set.rows.clone(),
            ExecutionResult::Failed { message } => vec![vec![
                CellValue::Text("Error".to_string()),
                CellValue::Text(message.clone()),
            ]],
        }
    }
}

/// Runs `sql` verbatim against the database at `database_path`.
///
/// The connection lives only for this call. DuckDB commits each statement on
/// success, so writes (including destructive ones) persist.
pub fn execute(sql: &str, database_path: impl AsRef<Path>) -> ExecutionResult {
    let path = database_path.as_ref();
    let start_time = Instant::now();
    info!("Executing SQL against {}: {}", path.display(), sql);

    match run(sql, path) {
        Ok(set) => {
            info!(
                "Query executed successfully. Row count: {}, Execution time: {}ms",
                set.rows.len(),
                start_time.elapsed().as_millis()
            );
            ExecutionResult::Rows(set)
        }
        Err(e) => {
            error!("Query failed: {}", e);
            ExecutionResult::Failed {
                message: e.to_string(),
            }
        }
    }
}

fn run(sql: &str, path: &Path) -> duckdb::Result<ResultSet> {
    let conn = Connection::open(path)?;
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([])?;

    let (columns, column_count) = match rows.as_ref() {
        Some(stmt) => (stmt.column_names(), stmt.column_count()),
        None => (Vec::new(), 0),
    };
    debug!("Result columns: {:?}", columns);

    let mut set = ResultSet {
        columns,
        rows: Vec::new(),
    };
    while let Some(row) = rows.next()? {
        let mut values = Vec::with_capacity(column_count);
        for i in 0..column_count {
            values.push(CellValue::from_duckdb(row.get::<_, Value>(i)?));
        }
        set.rows.push(values);
    }

    Ok(set)
}
