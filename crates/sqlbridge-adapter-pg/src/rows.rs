//! Row normalization.
//!
//! Converts `PgRow` values into plain JSON objects keyed by column name.
//! Decoding is driven by the column's Postgres type name. Columns with no
//! mapping are emitted as strings only when the server sent them in text
//! form (or they are enums, whose binary form is the label); anything else
//! becomes `null`. Wire bytes never reach the output.

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{Value, json};
use sqlbridge_core::database::Row as JsonRow;
use sqlx::postgres::types::{PgInterval, PgMoney, PgTimeTz};
use sqlx::postgres::{PgRow, PgTypeKind, PgValueFormat, Postgres};
use sqlx::types::ipnetwork::IpNetwork;
use sqlx::{Column, Decode, Row, Type, TypeInfo, ValueRef};

/// Fractional digits assumed for MONEY values (`lc_monetary` of C/en_US).
const MONEY_FRAC_DIGITS: i64 = 2;

/// How a column is rendered into JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Bool,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Numeric,
    Money,
    Json,
    Uuid,
    Timestamptz,
    Timestamp,
    Date,
    Time,
    TimeTz,
    Interval,
    Inet,
    Cidr,
    Bytes,
    Text,
    TextArray,
    BoolArray,
    Int2Array,
    Int4Array,
    Int8Array,
    Float4Array,
    Float8Array,
    NumericArray,
    UuidArray,
    Other,
}

impl ColumnKind {
    /// Map a Postgres type name (as reported by `TypeInfo::name`).
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "BOOL" => Self::Bool,
            "INT2" => Self::Int2,
            "INT4" | "OID" => Self::Int4,
            "INT8" => Self::Int8,
            "FLOAT4" => Self::Float4,
            "FLOAT8" => Self::Float8,
            "NUMERIC" => Self::Numeric,
            "MONEY" => Self::Money,
            "JSON" | "JSONB" => Self::Json,
            "UUID" => Self::Uuid,
            "TIMESTAMPTZ" => Self::Timestamptz,
            "TIMESTAMP" => Self::Timestamp,
            "DATE" => Self::Date,
            "TIME" => Self::Time,
            "TIMETZ" => Self::TimeTz,
            "INTERVAL" => Self::Interval,
            "INET" => Self::Inet,
            "CIDR" => Self::Cidr,
            "BYTEA" => Self::Bytes,
            "TEXT" | "VARCHAR" | "BPCHAR" | "CHAR" | "NAME" | "CITEXT" => Self::Text,
            "TEXT[]" | "VARCHAR[]" | "BPCHAR[]" | "NAME[]" => Self::TextArray,
            "BOOL[]" => Self::BoolArray,
            "INT2[]" => Self::Int2Array,
            "INT4[]" => Self::Int4Array,
            "INT8[]" => Self::Int8Array,
            "FLOAT4[]" => Self::Float4Array,
            "FLOAT8[]" => Self::Float8Array,
            "NUMERIC[]" => Self::NumericArray,
            "UUID[]" => Self::UuidArray,
            _ => Self::Other,
        }
    }
}

/// Convert a row into a plain JSON object.
pub fn row_to_json(row: &PgRow) -> JsonRow {
    let mut obj = JsonRow::new();

    for col in row.columns() {
        let idx = col.ordinal();
        let kind = ColumnKind::from_type_name(col.type_info().name());
        obj.insert(col.name().to_string(), decode_column(row, idx, kind));
    }

    obj
}

fn decode_column(row: &PgRow, idx: usize, kind: ColumnKind) -> Value {
    match kind {
        ColumnKind::Bool => to_json(get::<bool>(row, idx)),
        ColumnKind::Int2 => to_json(get::<i16>(row, idx)),
        ColumnKind::Int4 => to_json(get::<i32>(row, idx)),
        ColumnKind::Int8 => to_json(get::<i64>(row, idx)),
        ColumnKind::Float4 => to_json(get::<f32>(row, idx)),
        ColumnKind::Float8 => to_json(get::<f64>(row, idx)),
        ColumnKind::Numeric => get::<BigDecimal>(row, idx)
            .map(|d| numeric_to_json(&d))
            .unwrap_or(Value::Null),
        ColumnKind::Money => get::<PgMoney>(row, idx)
            .map(|m| numeric_to_json(&m.to_bigdecimal(MONEY_FRAC_DIGITS)))
            .unwrap_or(Value::Null),
        ColumnKind::Json => get::<Value>(row, idx).unwrap_or(Value::Null),
        ColumnKind::Uuid => to_json(get::<uuid::Uuid>(row, idx).map(|u| u.to_string())),
        ColumnKind::Timestamptz => {
            to_json(get::<DateTime<Utc>>(row, idx).map(|t| t.to_rfc3339()))
        }
        ColumnKind::Timestamp => to_json(get::<NaiveDateTime>(row, idx).map(|t| t.to_string())),
        ColumnKind::Date => to_json(get::<NaiveDate>(row, idx).map(|d| d.to_string())),
        ColumnKind::Time => to_json(get::<NaiveTime>(row, idx).map(|t| t.to_string())),
        ColumnKind::TimeTz => to_json(
            get::<PgTimeTz<NaiveTime, FixedOffset>>(row, idx).map(|t| timetz_to_string(&t)),
        ),
        ColumnKind::Interval => to_json(get::<PgInterval>(row, idx).map(|i| interval_to_iso(&i))),
        ColumnKind::Inet => to_json(get::<IpNetwork>(row, idx).map(|n| inet_to_string(&n))),
        ColumnKind::Cidr => to_json(get::<IpNetwork>(row, idx).map(|n| n.to_string())),
        ColumnKind::Bytes => to_json(get::<Vec<u8>>(row, idx).map(|b| bytes_to_hex(&b))),
        ColumnKind::Text => to_json(get::<String>(row, idx)),
        ColumnKind::TextArray => to_json(get::<Vec<String>>(row, idx)),
        ColumnKind::BoolArray => to_json(get::<Vec<bool>>(row, idx)),
        ColumnKind::Int2Array => to_json(get::<Vec<i16>>(row, idx)),
        ColumnKind::Int4Array => to_json(get::<Vec<i32>>(row, idx)),
        ColumnKind::Int8Array => to_json(get::<Vec<i64>>(row, idx)),
        ColumnKind::Float4Array => to_json(get::<Vec<f32>>(row, idx)),
        ColumnKind::Float8Array => to_json(get::<Vec<f64>>(row, idx)),
        ColumnKind::NumericArray => get::<Vec<BigDecimal>>(row, idx)
            .map(|items| Value::Array(items.iter().map(numeric_to_json).collect()))
            .unwrap_or(Value::Null),
        ColumnKind::UuidArray => to_json(
            get::<Vec<uuid::Uuid>>(row, idx)
                .map(|items| items.iter().map(ToString::to_string).collect::<Vec<_>>()),
        ),
        ColumnKind::Other => decode_unmapped(row, idx),
    }
}

/// Text-format values and enum labels pass through as strings; binary
/// values of unmapped types become `null`.
fn decode_unmapped(row: &PgRow, idx: usize) -> Value {
    let Ok(raw) = row.try_get_raw(idx) else {
        return Value::Null;
    };
    if raw.is_null() {
        return Value::Null;
    }

    let type_info = raw.type_info().into_owned();
    let textual = raw.format() == PgValueFormat::Text
        || matches!(type_info.kind(), PgTypeKind::Enum(_));
    if !textual {
        tracing::debug!(pg_type = %type_info.name(), "No JSON mapping for column type");
        return Value::Null;
    }

    raw.as_str()
        .map(|s| Value::String(s.to_string()))
        .unwrap_or(Value::Null)
}

fn get<'r, T>(row: &'r PgRow, idx: usize) -> Option<T>
where
    T: Decode<'r, Postgres> + Type<Postgres>,
{
    row.try_get::<Option<T>, _>(idx).ok().flatten()
}

fn to_json<T: Into<Value>>(value: Option<T>) -> Value {
    value.map(Into::into).unwrap_or(Value::Null)
}

/// Render a NUMERIC as a JSON number when it fits an f64, else as a string.
pub fn numeric_to_json(value: &BigDecimal) -> Value {
    let text = value.to_string();
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => json!(f),
        _ => Value::String(text),
    }
}

/// Render bytes in Postgres' `\x` hex output format.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for b in bytes {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

/// Render an interval as an ISO 8601 duration, the way Postgres does with
/// `intervalstyle = iso_8601` (`P1Y2M3DT4H5M6.5S`, `PT-1H-30M`, `PT0S`).
pub fn interval_to_iso(interval: &PgInterval) -> String {
    let mut out = String::from("P");

    let years = interval.months / 12;
    let months = interval.months % 12;
    if years != 0 {
        out.push_str(&format!("{years}Y"));
    }
    if months != 0 {
        out.push_str(&format!("{months}M"));
    }
    if interval.days != 0 {
        out.push_str(&format!("{}D", interval.days));
    }

    let micros = interval.microseconds;
    if micros != 0 {
        out.push('T');
        let sign = if micros < 0 { "-" } else { "" };
        let abs = micros.unsigned_abs();
        let hours = abs / 3_600_000_000;
        let minutes = (abs / 60_000_000) % 60;
        let seconds = (abs / 1_000_000) % 60;
        let fraction = abs % 1_000_000;

        if hours != 0 {
            out.push_str(&format!("{sign}{hours}H"));
        }
        if minutes != 0 {
            out.push_str(&format!("{sign}{minutes}M"));
        }
        if fraction != 0 {
            let digits = format!("{fraction:06}");
            out.push_str(&format!(
                "{sign}{seconds}.{}S",
                digits.trim_end_matches('0')
            ));
        } else if seconds != 0 {
            out.push_str(&format!("{sign}{seconds}S"));
        }
    }

    if out == "P" {
        out.push_str("T0S");
    }
    out
}

/// `12:00:00+02:00`
pub fn timetz_to_string(value: &PgTimeTz<NaiveTime, FixedOffset>) -> String {
    format!("{}{}", value.time, value.offset)
}

/// INET values print without a prefix when they name a single host, as
/// Postgres does.
pub fn inet_to_string(network: &IpNetwork) -> String {
    let host_prefix = if network.is_ipv4() { 32 } else { 128 };
    if network.prefix() == host_prefix {
        network.ip().to_string()
    } else {
        network.to_string()
    }
}
