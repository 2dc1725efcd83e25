mod column;

pub use column::ColumnDesc;

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value as JsonValue};

/// Days between 0001-01-01 (CE day 1) and the Unix epoch.
pub(crate) const EPOCH_DAYS_FROM_CE: i32 = 719_163;
pub(crate) const MICROS_PER_SECOND: i64 = 1_000_000;

/// Column type tags understood by the host engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    Boolean,
    SmallInt,
    Int,
    BigInt,
    Float4,
    Float8,
    Numeric,
    Date,
    Time,
    Timestamp,
    Interval,
    VarChar,
    BpChar,
    VarBinary,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::Boolean => "Boolean",
            TypeTag::SmallInt => "SmallInt",
            TypeTag::Int => "Int",
            TypeTag::BigInt => "BigInt",
            TypeTag::Float4 => "Float4",
            TypeTag::Float8 => "Float8",
            TypeTag::Numeric => "Numeric",
            TypeTag::Date => "Date",
            TypeTag::Time => "Time",
            TypeTag::Timestamp => "Timestamp",
            TypeTag::Interval => "Interval",
            TypeTag::VarChar => "VarChar",
            TypeTag::BpChar => "BpChar",
            TypeTag::VarBinary => "VarBinary",
        }
    }

    pub fn is_character(&self) -> bool {
        matches!(self, TypeTag::VarChar | TypeTag::BpChar)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, TypeTag::SmallInt | TypeTag::Int | TypeTag::BigInt)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeTag {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "boolean" | "bool" => Ok(TypeTag::Boolean),
            "smallint" => Ok(TypeTag::SmallInt),
            "int" | "integer" => Ok(TypeTag::Int),
            "bigint" => Ok(TypeTag::BigInt),
            "float4" | "real" => Ok(TypeTag::Float4),
            "float8" | "float" | "double" => Ok(TypeTag::Float8),
            "numeric" | "decimal" => Ok(TypeTag::Numeric),
            "date" => Ok(TypeTag::Date),
            "time" => Ok(TypeTag::Time),
            "timestamp" => Ok(TypeTag::Timestamp),
            "interval" => Ok(TypeTag::Interval),
            "varchar" | "string" => Ok(TypeTag::VarChar),
            "bpchar" | "char" => Ok(TypeTag::BpChar),
            "varbinary" | "binary" => Ok(TypeTag::VarBinary),
            _ => Err(()),
        }
    }
}

/// A single typed cell as seen by the extension.
///
/// Temporal values carry the host's tick counts: `Date` is days since
/// 1970-01-01, `Timestamp` is microseconds since the epoch (UTC), `Time` and
/// `Interval` are microseconds. `Numeric` is an unscaled 128-bit integer plus
/// its scale.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Boolean(bool),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Float4(f32),
    Float8(f64),
    Numeric { unscaled: i128, scale: u8 },
    Date(i32),
    Time(i64),
    Timestamp(i64),
    Interval(i64),
    VarChar(String),
    BpChar(String),
    VarBinary(Vec<u8>),
}

impl ScalarValue {
    /// Type tag of the carried value, `None` for `Null`.
    pub fn type_tag(&self) -> Option<TypeTag> {
        match self {
            ScalarValue::Null => None,
            ScalarValue::Boolean(_) => Some(TypeTag::Boolean),
            ScalarValue::SmallInt(_) => Some(TypeTag::SmallInt),
            ScalarValue::Int(_) => Some(TypeTag::Int),
            ScalarValue::BigInt(_) => Some(TypeTag::BigInt),
            ScalarValue::Float4(_) => Some(TypeTag::Float4),
            ScalarValue::Float8(_) => Some(TypeTag::Float8),
            ScalarValue::Numeric { .. } => Some(TypeTag::Numeric),
            ScalarValue::Date(_) => Some(TypeTag::Date),
            ScalarValue::Time(_) => Some(TypeTag::Time),
            ScalarValue::Timestamp(_) => Some(TypeTag::Timestamp),
            ScalarValue::Interval(_) => Some(TypeTag::Interval),
            ScalarValue::VarChar(_) => Some(TypeTag::VarChar),
            ScalarValue::BpChar(_) => Some(TypeTag::BpChar),
            ScalarValue::VarBinary(_) => Some(TypeTag::VarBinary),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::VarChar(s) | ScalarValue::BpChar(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn varchar(s: impl Into<String>) -> Self {
        ScalarValue::VarChar(s.into())
    }

    /// Convert a JSON value into a scalar of the given column's type.
    /// Returns `None` when the value cannot represent that type.
    pub fn from_json(value: &JsonValue, column: &ColumnDesc) -> Option<Self> {
        if value.is_null() {
            return Some(ScalarValue::Null);
        }
        let parsed = match column.type_tag {
            TypeTag::Boolean => ScalarValue::Boolean(value.as_bool()?),
            TypeTag::SmallInt => ScalarValue::SmallInt(i16::try_from(value.as_i64()?).ok()?),
            TypeTag::Int => ScalarValue::Int(i32::try_from(value.as_i64()?).ok()?),
            TypeTag::BigInt => ScalarValue::BigInt(value.as_i64()?),
            TypeTag::Float4 => ScalarValue::Float4(value.as_f64()? as f32),
            TypeTag::Float8 => ScalarValue::Float8(value.as_f64()?),
            TypeTag::Numeric => {
                let scale = u8::try_from(column.scale).ok()?;
                let text = match value {
                    JsonValue::String(s) => s.clone(),
                    JsonValue::Number(n) => n.to_string(),
                    _ => return None,
                };
                ScalarValue::Numeric {
                    unscaled: parse_numeric(&text, scale)?,
                    scale,
                }
            }
            TypeTag::Date => match value {
                JsonValue::String(s) => {
                    let date = NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()?;
                    ScalarValue::Date(date.num_days_from_ce() - EPOCH_DAYS_FROM_CE)
                }
                other => ScalarValue::Date(i32::try_from(other.as_i64()?).ok()?),
            },
            TypeTag::Timestamp => match value {
                JsonValue::String(s) => ScalarValue::Timestamp(parse_timestamp_micros(s)?),
                other => ScalarValue::Timestamp(other.as_i64()?),
            },
            TypeTag::Time => ScalarValue::Time(value.as_i64()?),
            TypeTag::Interval => ScalarValue::Interval(value.as_i64()?),
            TypeTag::VarChar => ScalarValue::VarChar(value.as_str()?.to_string()),
            TypeTag::BpChar => ScalarValue::BpChar(value.as_str()?.to_string()),
            TypeTag::VarBinary => ScalarValue::VarBinary(value.as_str()?.as_bytes().to_vec()),
        };
        Some(parsed)
    }

    pub fn to_json(&self) -> JsonValue {
        match self {
            ScalarValue::Null => JsonValue::Null,
            ScalarValue::Boolean(b) => JsonValue::Bool(*b),
            ScalarValue::SmallInt(i) => JsonValue::Number(Number::from(*i)),
            ScalarValue::Int(i) => JsonValue::Number(Number::from(*i)),
            ScalarValue::BigInt(i) => JsonValue::Number(Number::from(*i)),
            ScalarValue::Float4(f) => Number::from_f64(f64::from(*f))
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            ScalarValue::Float8(f) => Number::from_f64(*f)
                .map(JsonValue::Number)
                .unwrap_or(JsonValue::Null),
            // Rendered as text to keep full precision.
            ScalarValue::Numeric { unscaled, scale } => {
                JsonValue::String(format_numeric(*unscaled, *scale))
            }
            ScalarValue::Date(days) => NaiveDate::from_num_days_from_ce_opt(
                days.saturating_add(EPOCH_DAYS_FROM_CE),
            )
            .map(|d| JsonValue::String(d.format("%Y-%m-%d").to_string()))
            .unwrap_or_else(|| JsonValue::Number(Number::from(*days))),
            ScalarValue::Timestamp(micros) => timestamp_from_micros(*micros)
                .map(|dt| JsonValue::String(dt.format("%Y-%m-%d %H:%M:%S%.6f").to_string()))
                .unwrap_or_else(|| JsonValue::Number(Number::from(*micros))),
            ScalarValue::Time(micros) | ScalarValue::Interval(micros) => {
                JsonValue::Number(Number::from(*micros))
            }
            ScalarValue::VarChar(s) | ScalarValue::BpChar(s) => JsonValue::String(s.clone()),
            ScalarValue::VarBinary(bytes) => {
                JsonValue::String(String::from_utf8_lossy(bytes).into_owned())
            }
        }
    }
}

pub(crate) fn timestamp_from_micros(micros: i64) -> Option<NaiveDateTime> {
    let secs = micros.div_euclid(MICROS_PER_SECOND);
    let nanos = (micros.rem_euclid(MICROS_PER_SECOND) * 1_000) as u32;
    DateTime::from_timestamp(secs, nanos).map(|dt| dt.naive_utc())
}

fn parse_timestamp_micros(input: &str) -> Option<i64> {
    let s = input.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.timestamp_micros());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc().timestamp_micros());
        }
    }
    None
}

/// Parse decimal text into an unscaled integer at `scale` digits. Extra
/// fractional digits are rejected rather than rounded.
pub(crate) fn parse_numeric(text: &str, scale: u8) -> Option<i128> {
    let s = text.trim();
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, f),
        None => (digits, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if frac_part.len() > scale as usize {
        return None;
    }
    let mut unscaled: i128 = 0;
    let padding = scale as usize - frac_part.len();
    for ch in int_part
        .chars()
        .chain(frac_part.chars())
        .chain(std::iter::repeat_n('0', padding))
    {
        let digit = ch.to_digit(10)? as i128;
        unscaled = unscaled.checked_mul(10)?.checked_add(digit)?;
    }
    Some(if negative { -unscaled } else { unscaled })
}

/// Render an unscaled integer with `scale` fractional digits.
pub(crate) fn format_numeric(unscaled: i128, scale: u8) -> String {
    let mut buf = itoa::Buffer::new();
    let digits = buf.format(unscaled.unsigned_abs());
    let scale = scale as usize;
    let mut out = String::with_capacity(digits.len() + scale + 2);
    if unscaled < 0 {
        out.push('-');
    }
    if scale == 0 {
        out.push_str(digits);
        return out;
    }
    if digits.len() <= scale {
        out.push_str("0.");
        out.extend(std::iter::repeat_n('0', scale - digits.len()));
        out.push_str(digits);
    } else {
        let (int_part, frac_part) = digits.split_at(digits.len() - scale);
        out.push_str(int_part);
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

#[cfg(test)]
mod types_test;
