//! PostgreSQL row to JSON conversion.
//!
//! Type conversion uses a two-phase approach:
//! 1. the column's type is classified into a [`ColumnKind`]
//! 2. a decoder per category extracts the value
//!
//! Statements without parameters run over the simple protocol and come back in
//! text format; parameterized ones come back in binary. Decoders handle both.
//! A text value that no decoder accepts is returned as its text. A binary value
//! that no decoder accepts becomes an [`undecodable_marker`], never `null`.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde_json::{Value as JsonValue, json};
use sqlx::postgres::types::{Oid, PgInterval, PgMoney};
use sqlx::postgres::{PgRow, PgTypeInfo, PgTypeKind, PgValueFormat, PgValueRef};
use sqlx::types::Decimal;
use sqlx::types::ipnetwork::IpNetwork;
use sqlx::{Column, Decode, Postgres, Row, TypeInfo, ValueRef};
use tracing::warn;

/// Fractional digits assumed for `money` (the `lc_monetary` default).
const MONEY_FRACTION_DIGITS: u32 = 2;

// =============================================================================
// Type Classification
// =============================================================================

/// Logical category for column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeCategory {
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Numeric,
    Money,
    Boolean,
    Binary,
    Json,
    Uuid,
    Timestamp,
    TimestampTz,
    Date,
    Time,
    Interval,
    Inet,
    Cidr,
    Oid,
    Text,
    /// Enum values; the wire form is the label itself.
    Label,
    Other,
}

/// Scalar or one-dimensional array of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Scalar(TypeCategory),
    Array(TypeCategory),
}

/// Classify a PostgreSQL type name (as reported by the driver) into a category.
pub fn categorize_type(type_name: &str) -> TypeCategory {
    match type_name.to_ascii_lowercase().as_str() {
        "int2" | "smallint" | "smallserial" => TypeCategory::SmallInt,
        "int4" | "int" | "integer" | "serial" => TypeCategory::Integer,
        "int8" | "bigint" | "bigserial" => TypeCategory::BigInt,
        "float4" | "real" => TypeCategory::Real,
        "float8" | "double precision" => TypeCategory::Double,
        "numeric" | "decimal" => TypeCategory::Numeric,
        "money" => TypeCategory::Money,
        "bool" | "boolean" => TypeCategory::Boolean,
        "bytea" => TypeCategory::Binary,
        "json" | "jsonb" => TypeCategory::Json,
        "uuid" => TypeCategory::Uuid,
        "timestamp" => TypeCategory::Timestamp,
        "timestamptz" => TypeCategory::TimestampTz,
        "date" => TypeCategory::Date,
        "time" => TypeCategory::Time,
        "interval" => TypeCategory::Interval,
        "inet" => TypeCategory::Inet,
        "cidr" => TypeCategory::Cidr,
        "oid" => TypeCategory::Oid,
        "text" | "varchar" | "character varying" | "bpchar" | "character" | "char" | "name"
        | "citext" | "xml" | "unknown" => TypeCategory::Text,
        _ => TypeCategory::Other,
    }
}

/// Classify by name alone. Used for text-format values, whose custom types
/// the driver leaves unresolved.
pub fn classify_by_name(type_name: &str) -> ColumnKind {
    match type_name.strip_suffix("[]") {
        Some(element) => ColumnKind::Array(categorize_type(element)),
        None => ColumnKind::Scalar(categorize_type(type_name)),
    }
}

/// Classify a resolved type, looking through arrays, domains and enums.
fn classify_resolved(type_info: &PgTypeInfo) -> ColumnKind {
    match type_info.kind() {
        PgTypeKind::Array(element) => ColumnKind::Array(resolved_category(element)),
        _ => ColumnKind::Scalar(resolved_category(type_info)),
    }
}

fn resolved_category(type_info: &PgTypeInfo) -> TypeCategory {
    match type_info.kind() {
        PgTypeKind::Enum(_) => TypeCategory::Label,
        PgTypeKind::Domain(base) => resolved_category(base),
        _ => categorize_type(type_info.name()),
    }
}

// =============================================================================
// Value Rendering
// =============================================================================

/// Encode bytea values as base64 strings.
pub fn encode_binary_value(bytes: &[u8]) -> JsonValue {
    JsonValue::String(STANDARD.encode(bytes))
}

/// Stand-in for a non-null value no decoder accepts.
pub fn undecodable_marker(type_name: &str, bytes: &[u8]) -> JsonValue {
    json!({
        "$undecodable": type_name,
        "base64": STANDARD.encode(bytes),
    })
}

/// Render an interval the way PostgreSQL's default `IntervalStyle` does:
/// `1 year 2 mons -3 days +04:05:06.5`.
pub fn format_interval(interval: &PgInterval) -> String {
    let mut parts = Vec::new();
    let mut after_negative = false;

    let years = interval.months / 12;
    let months = interval.months % 12;
    for (value, unit) in [(years, "year"), (months, "mon"), (interval.days, "day")] {
        if value == 0 {
            continue;
        }
        let sign = if after_negative && value > 0 { "+" } else { "" };
        let suffix = if value == 1 { "" } else { "s" };
        parts.push(format!("{sign}{value} {unit}{suffix}"));
        after_negative |= value < 0;
    }

    let micros = interval.microseconds;
    if micros != 0 || parts.is_empty() {
        let sign = if micros < 0 {
            "-"
        } else if after_negative {
            "+"
        } else {
            ""
        };
        let total = micros.unsigned_abs();
        let secs = total / 1_000_000;
        let mut time = format!(
            "{sign}{:02}:{:02}:{:02}",
            secs / 3600,
            (secs / 60) % 60,
            secs % 60
        );
        let fraction = total % 1_000_000;
        if fraction != 0 {
            let digits = format!("{fraction:06}");
            time.push('.');
            time.push_str(digits.trim_end_matches('0'));
        }
        parts.push(time);
    }

    parts.join(" ")
}

/// `inet` drops the prefix of a single host, as PostgreSQL prints it.
pub fn format_inet(network: &IpNetwork) -> String {
    let host_prefix = if network.is_ipv4() { 32 } else { 128 };
    if network.prefix() == host_prefix {
        network.ip().to_string()
    } else {
        network.to_string()
    }
}

fn float_value(v: f64) -> JsonValue {
    serde_json::Number::from_f64(v)
        .map(JsonValue::Number)
        .unwrap_or_else(|| JsonValue::String(v.to_string()))
}

fn decimal_json(v: Decimal) -> JsonValue {
    JsonValue::String(v.to_string())
}

fn money_json(v: PgMoney) -> JsonValue {
    decimal_json(v.to_decimal(MONEY_FRACTION_DIGITS))
}

fn timestamp_json(v: chrono::NaiveDateTime) -> JsonValue {
    JsonValue::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
}

fn timestamptz_json(v: chrono::DateTime<chrono::Utc>) -> JsonValue {
    JsonValue::String(v.to_rfc3339())
}

fn display_json(v: impl std::fmt::Display) -> JsonValue {
    JsonValue::String(v.to_string())
}

// =============================================================================
// Row to JSON
// =============================================================================

/// Trait for converting database rows to JSON maps.
pub trait RowToJson {
    fn to_json_map(&self) -> serde_json::Map<String, JsonValue>;
    fn column_names(&self) -> Vec<String>;
}

impl RowToJson for PgRow {
    fn to_json_map(&self) -> serde_json::Map<String, JsonValue> {
        self.columns()
            .iter()
            .enumerate()
            .map(|(idx, col)| {
                (
                    col.name().to_string(),
                    decode_column(self, idx, col.type_info()),
                )
            })
            .collect()
    }

    fn column_names(&self) -> Vec<String> {
        self.columns()
            .iter()
            .map(|col| col.name().to_string())
            .collect()
    }
}

fn decode_column(row: &PgRow, idx: usize, type_info: &PgTypeInfo) -> JsonValue {
    let raw = match row.try_get_raw(idx) {
        Ok(raw) if raw.is_null() => return JsonValue::Null,
        Ok(raw) => raw,
        Err(e) => {
            warn!(column = idx, error = %e, "Failed to read column");
            return undecodable_marker(type_info.name(), &[]);
        }
    };

    let kind = match raw.format() {
        PgValueFormat::Text => classify_by_name(type_info.name()),
        PgValueFormat::Binary => classify_resolved(type_info),
    };
    let decoded = match kind {
        ColumnKind::Scalar(category) => decode_scalar(row, idx, category),
        ColumnKind::Array(category) => decode_array(row, idx, category),
    };
    decoded.unwrap_or_else(|| fallback(&raw, type_info))
}

fn fallback(raw: &PgValueRef<'_>, type_info: &PgTypeInfo) -> JsonValue {
    if raw.format() == PgValueFormat::Text
        && let Ok(text) = raw.as_str()
    {
        return JsonValue::String(text.to_string());
    }
    warn!(type_name = type_info.name(), "No decoder for column value");
    undecodable_marker(type_info.name(), raw.as_bytes().unwrap_or_default())
}

/// Decode without the driver's type check; the category already matched the
/// column type.
fn get<'r, T>(row: &'r PgRow, idx: usize) -> Option<T>
where
    T: Decode<'r, Postgres>,
{
    row.try_get_unchecked::<T, _>(idx).ok()
}

fn array<'r, T>(row: &'r PgRow, idx: usize, to_json: impl Fn(T) -> JsonValue) -> Option<JsonValue>
where
    Vec<Option<T>>: Decode<'r, Postgres>,
{
    get::<Vec<Option<T>>>(row, idx).map(|items| {
        JsonValue::Array(
            items
                .into_iter()
                .map(|item| item.map_or(JsonValue::Null, &to_json))
                .collect(),
        )
    })
}

fn decode_scalar(row: &PgRow, idx: usize, category: TypeCategory) -> Option<JsonValue> {
    match category {
        TypeCategory::SmallInt => get::<i16>(row, idx).map(JsonValue::from),
        TypeCategory::Integer => get::<i32>(row, idx).map(JsonValue::from),
        TypeCategory::BigInt => get::<i64>(row, idx).map(JsonValue::from),
        TypeCategory::Real => get::<f32>(row, idx).map(|v| float_value(f64::from(v))),
        TypeCategory::Double => get::<f64>(row, idx).map(float_value),
        TypeCategory::Numeric => get::<Decimal>(row, idx).map(decimal_json),
        TypeCategory::Money => get::<PgMoney>(row, idx).map(money_json),
        TypeCategory::Boolean => get::<bool>(row, idx).map(JsonValue::Bool),
        TypeCategory::Binary => get::<Vec<u8>>(row, idx).map(|v| encode_binary_value(&v)),
        TypeCategory::Json => get::<JsonValue>(row, idx),
        TypeCategory::Uuid => get::<uuid::Uuid>(row, idx).map(display_json),
        TypeCategory::Timestamp => get::<chrono::NaiveDateTime>(row, idx).map(timestamp_json),
        TypeCategory::TimestampTz => {
            get::<chrono::DateTime<chrono::Utc>>(row, idx).map(timestamptz_json)
        }
        TypeCategory::Date => get::<chrono::NaiveDate>(row, idx).map(display_json),
        TypeCategory::Time => get::<chrono::NaiveTime>(row, idx).map(display_json),
        TypeCategory::Interval => {
            get::<PgInterval>(row, idx).map(|v| JsonValue::String(format_interval(&v)))
        }
        TypeCategory::Inet => get::<IpNetwork>(row, idx).map(|v| JsonValue::String(format_inet(&v))),
        TypeCategory::Cidr => get::<IpNetwork>(row, idx).map(display_json),
        TypeCategory::Oid => get::<Oid>(row, idx).map(|v| JsonValue::from(v.0)),
        TypeCategory::Text | TypeCategory::Label => get::<String>(row, idx).map(JsonValue::String),
        TypeCategory::Other => None,
    }
}

fn decode_array(row: &PgRow, idx: usize, element: TypeCategory) -> Option<JsonValue> {
    match element {
        TypeCategory::SmallInt => array::<i16>(row, idx, JsonValue::from),
        TypeCategory::Integer => array::<i32>(row, idx, JsonValue::from),
        TypeCategory::BigInt => array::<i64>(row, idx, JsonValue::from),
        TypeCategory::Real => array::<f32>(row, idx, |v| float_value(f64::from(v))),
        TypeCategory::Double => array::<f64>(row, idx, float_value),
        TypeCategory::Numeric => array::<Decimal>(row, idx, decimal_json),
        TypeCategory::Money => array::<PgMoney>(row, idx, money_json),
        TypeCategory::Boolean => array::<bool>(row, idx, JsonValue::Bool),
        TypeCategory::Binary => array::<Vec<u8>>(row, idx, |v| encode_binary_value(&v)),
        TypeCategory::Json => array::<JsonValue>(row, idx, |v| v),
        TypeCategory::Uuid => array::<uuid::Uuid>(row, idx, display_json),
        TypeCategory::Timestamp => array::<chrono::NaiveDateTime>(row, idx, timestamp_json),
        TypeCategory::TimestampTz => {
            array::<chrono::DateTime<chrono::Utc>>(row, idx, timestamptz_json)
        }
        TypeCategory::Date => array::<chrono::NaiveDate>(row, idx, display_json),
        TypeCategory::Time => array::<chrono::NaiveTime>(row, idx, display_json),
        TypeCategory::Interval => {
            array::<PgInterval>(row, idx, |v| JsonValue::String(format_interval(&v)))
        }
        TypeCategory::Inet => array::<IpNetwork>(row, idx, |v| JsonValue::String(format_inet(&v))),
        TypeCategory::Cidr => array::<IpNetwork>(row, idx, display_json),
        TypeCategory::Oid => array::<Oid>(row, idx, |v| JsonValue::from(v.0)),
        TypeCategory::Text | TypeCategory::Label => array::<String>(row, idx, JsonValue::String),
        TypeCategory::Other => None,
    }
}
