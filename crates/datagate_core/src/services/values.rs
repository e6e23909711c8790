//! Conversion of PostgreSQL rows into JSON objects.

use std::error::Error;
use std::fmt::Write as _;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{Number, Value as JsonValue};
use tokio_postgres::types::{FromSql, Type};
use uuid::Uuid;

use crate::models::QueryResultRow;
use crate::services::sanitize::sanitize_identifier;

/// How a column's binary value is turned into JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decoder {
    Bool,
    Int2,
    Int4,
    Int8,
    Oid,
    Float4,
    Float8,
    Numeric,
    Uuid,
    Json,
    TimestampTz,
    Timestamp,
    Date,
    Time,
    Bytea,
    Int4Array,
    TextArray,
    Text,
}

/// The decoder for columns of type `ty`, or `None` when the binary format
/// of `ty` can't be read here and the column must be fetched as text.
pub fn decoder_for(ty: &Type) -> Option<Decoder> {
    let decoder = match *ty {
        Type::BOOL => Decoder::Bool,
        Type::INT2 => Decoder::Int2,
        Type::INT4 => Decoder::Int4,
        Type::INT8 => Decoder::Int8,
        Type::OID => Decoder::Oid,
        Type::FLOAT4 => Decoder::Float4,
        Type::FLOAT8 => Decoder::Float8,
        Type::NUMERIC => Decoder::Numeric,
        Type::UUID => Decoder::Uuid,
        Type::JSON | Type::JSONB => Decoder::Json,
        Type::TIMESTAMPTZ => Decoder::TimestampTz,
        Type::TIMESTAMP => Decoder::Timestamp,
        Type::DATE => Decoder::Date,
        Type::TIME => Decoder::Time,
        Type::BYTEA => Decoder::Bytea,
        Type::INT4_ARRAY => Decoder::Int4Array,
        // text, varchar, bpchar, name, citext and arrays of those
        _ if <String as FromSql>::accepts(ty) => Decoder::Text,
        _ if <Vec<Option<String>> as FromSql>::accepts(ty) => Decoder::TextArray,
        _ => return None,
    };
    Some(decoder)
}

/// Rewrite `sql` so every column without a [`Decoder`] comes back as its
/// PostgreSQL text form. `None` when all columns decode as they are.
///
/// The original statement becomes a subquery whose columns are renamed by
/// position, so duplicate names in the select list stay addressable. Output
/// names pass through [`sanitize_identifier`].
pub fn text_cast_select(sql: &str, columns: &[(&str, &Type)]) -> Option<String> {
    if columns.iter().all(|(_, ty)| decoder_for(ty).is_some()) {
        return None;
    }

    let mut select = Vec::with_capacity(columns.len());
    let mut aliases = Vec::with_capacity(columns.len());
    for (i, (name, ty)) in columns.iter().enumerate() {
        let cast = if decoder_for(ty).is_some() { "" } else { "::text" };
        select.push(format!("q.c{i}{cast} AS {}", sanitize_identifier(name)));
        aliases.push(format!("c{i}"));
    }

    Some(format!(
        "SELECT {} FROM ({sql}) AS q({})",
        select.join(", "),
        aliases.join(", ")
    ))
}

/// Convert a PostgreSQL row to a JSON object keyed by column name.
///
/// Values are passed through as their closest JSON form; no coercion between
/// types. Columns are expected to have a [`Decoder`]; statements are run
/// through [`text_cast_select`] first.
pub fn row_to_json(row: &tokio_postgres::Row) -> QueryResultRow {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| (col.name().to_string(), cell_to_json(row, i, col.type_())))
        .collect()
}

fn get<'a, T: FromSql<'a>>(row: &'a tokio_postgres::Row, idx: usize) -> Option<T> {
    row.try_get::<_, Option<T>>(idx).ok().flatten()
}

fn cell_to_json(row: &tokio_postgres::Row, i: usize, ty: &Type) -> JsonValue {
    let Some(decoder) = decoder_for(ty) else {
        tracing::warn!(column = row.columns()[i].name(), ty = %ty, "No decoder for column type");
        return JsonValue::Null;
    };

    let value = match decoder {
        Decoder::Bool => get::<bool>(row, i).map(JsonValue::Bool),

        Decoder::Int2 => get::<i16>(row, i).map(|v| JsonValue::Number(v.into())),
        Decoder::Int4 => get::<i32>(row, i).map(|v| JsonValue::Number(v.into())),
        Decoder::Int8 => get::<i64>(row, i).map(|v| JsonValue::Number(v.into())),
        Decoder::Oid => get::<u32>(row, i).map(|v| JsonValue::Number(v.into())),

        Decoder::Float4 => get::<f32>(row, i)
            .and_then(|v| Number::from_f64(f64::from(v)))
            .map(JsonValue::Number),
        Decoder::Float8 => get::<f64>(row, i).and_then(Number::from_f64).map(JsonValue::Number),

        // Decimal text keeps full precision
        Decoder::Numeric => get::<PgNumeric>(row, i).map(|v| JsonValue::String(v.0)),

        Decoder::Uuid => get::<Uuid>(row, i).map(|v| JsonValue::String(v.to_string())),

        Decoder::Json => get::<JsonValue>(row, i),

        Decoder::TimestampTz => {
            get::<DateTime<Utc>>(row, i).map(|v| JsonValue::String(v.to_rfc3339()))
        }
        Decoder::Timestamp => {
            get::<NaiveDateTime>(row, i).map(|v| JsonValue::String(v.to_string()))
        }
        Decoder::Date => get::<NaiveDate>(row, i).map(|v| JsonValue::String(v.to_string())),
        Decoder::Time => get::<NaiveTime>(row, i).map(|v| JsonValue::String(v.to_string())),

        Decoder::Bytea => get::<Vec<u8>>(row, i).map(|v| JsonValue::String(bytea_hex(&v))),

        Decoder::Int4Array => get::<Vec<Option<i32>>>(row, i).map(|v| {
            JsonValue::Array(
                v.into_iter()
                    .map(|x| x.map_or(JsonValue::Null, |n| JsonValue::Number(n.into())))
                    .collect(),
            )
        }),
        Decoder::TextArray => get::<Vec<Option<String>>>(row, i).map(|v| {
            JsonValue::Array(v.into_iter().map(|x| x.map_or(JsonValue::Null, JsonValue::String)).collect())
        }),

        Decoder::Text => get::<String>(row, i).map(JsonValue::String),
    };

    value.unwrap_or(JsonValue::Null)
}

/// PostgreSQL's text form of a bytea value.
fn bytea_hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(2 + bytes.len() * 2);
    out.push_str("\\x");
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

const NUMERIC_NEG: u16 = 0x4000;
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

/// A `numeric` value decoded to its decimal string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgNumeric(pub String);

impl<'a> FromSql<'a> for PgNumeric {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        decode_numeric(raw).map(PgNumeric)
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

fn read_u16(raw: &[u8], at: usize) -> Result<u16, Box<dyn Error + Sync + Send>> {
    raw.get(at..at + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| "numeric value truncated".into())
}

/// Decode the binary `numeric` wire format: ndigits, weight, sign, dscale,
/// then `ndigits` base-10000 digits.
fn decode_numeric(raw: &[u8]) -> Result<String, Box<dyn Error + Sync + Send>> {
    let ndigits = read_u16(raw, 0)? as usize;
    let weight = read_u16(raw, 2)? as i16 as i32;
    let sign = read_u16(raw, 4)?;
    let dscale = read_u16(raw, 6)? as usize;

    match sign {
        NUMERIC_NAN => return Ok("NaN".to_string()),
        NUMERIC_PINF => return Ok("Infinity".to_string()),
        NUMERIC_NINF => return Ok("-Infinity".to_string()),
        _ => {}
    }

    let digits = (0..ndigits)
        .map(|k| read_u16(raw, 8 + k * 2))
        .collect::<Result<Vec<_>, _>>()?;
    let digit_at = |k: i32| -> u16 {
        if k >= 0 {
            digits.get(k as usize).copied().unwrap_or(0)
        } else {
            0
        }
    };

    let mut out = String::new();
    if sign == NUMERIC_NEG {
        out.push('-');
    }

    if weight < 0 {
        out.push('0');
    } else {
        for k in 0..=weight {
            if k == 0 {
                let _ = write!(out, "{}", digit_at(k));
            } else {
                let _ = write!(out, "{:04}", digit_at(k));
            }
        }
    }

    if dscale > 0 {
        let mut frac = String::with_capacity(dscale + 4);
        let mut k = weight + 1;
        while frac.len() < dscale {
            let _ = write!(frac, "{:04}", digit_at(k));
            k += 1;
        }
        frac.truncate(dscale);
        out.push('.');
        out.push_str(&frac);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_postgres::types::Kind;

    fn numeric(ndigits: u16, weight: i16, sign: u16, dscale: u16, digits: &[u16]) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&ndigits.to_be_bytes());
        raw.extend_from_slice(&weight.to_be_bytes());
        raw.extend_from_slice(&sign.to_be_bytes());
        raw.extend_from_slice(&dscale.to_be_bytes());
        for d in digits {
            raw.extend_from_slice(&d.to_be_bytes());
        }
        raw
    }

    #[test]
    fn test_decode_numeric_integer_and_fraction() {
        // 12345.678
        let raw = numeric(3, 1, 0, 3, &[1, 2345, 6780]);
        assert_eq!(decode_numeric(&raw).unwrap(), "12345.678");
    }

    #[test]
    fn test_decode_numeric_small_fraction() {
        // 0.00001
        let raw = numeric(1, -2, 0, 5, &[1000]);
        assert_eq!(decode_numeric(&raw).unwrap(), "0.00001");
    }

    #[test]
    fn test_decode_numeric_negative_and_trailing_zero_groups() {
        // -20000 (digits stored without the trailing zero group)
        let raw = numeric(1, 1, NUMERIC_NEG, 0, &[2]);
        assert_eq!(decode_numeric(&raw).unwrap(), "-20000");
    }

    #[test]
    fn test_decode_numeric_zero_with_scale() {
        let raw = numeric(0, 0, 0, 2, &[]);
        assert_eq!(decode_numeric(&raw).unwrap(), "0.00");
    }

    #[test]
    fn test_decode_numeric_special_values() {
        assert_eq!(decode_numeric(&numeric(0, 0, NUMERIC_NAN, 0, &[])).unwrap(), "NaN");
        assert_eq!(decode_numeric(&numeric(0, 0, NUMERIC_PINF, 0, &[])).unwrap(), "Infinity");
    }

    #[test]
    fn test_decode_numeric_truncated_input() {
        assert!(decode_numeric(&[0, 2, 0, 0]).is_err());
        assert!(decode_numeric(&numeric(2, 0, 0, 0, &[1])).is_err());
    }

    #[test]
    fn test_bytea_hex() {
        assert_eq!(bytea_hex(&[0xde, 0xad, 0x01]), "\\xdead01");
        assert_eq!(bytea_hex(&[]), "\\x");
    }

    #[test]
    fn test_decoder_for_types_read_natively() {
        let cases = [
            (Type::BOOL, Decoder::Bool),
            (Type::INT4, Decoder::Int4),
            (Type::INT8, Decoder::Int8),
            (Type::NUMERIC, Decoder::Numeric),
            (Type::JSONB, Decoder::Json),
            (Type::UUID, Decoder::Uuid),
            (Type::TIMESTAMPTZ, Decoder::TimestampTz),
            (Type::DATE, Decoder::Date),
            (Type::BYTEA, Decoder::Bytea),
            (Type::INT4_ARRAY, Decoder::Int4Array),
            (Type::TEXT, Decoder::Text),
            (Type::VARCHAR, Decoder::Text),
            (Type::BPCHAR, Decoder::Text),
            (Type::NAME, Decoder::Text),
            (Type::TEXT_ARRAY, Decoder::TextArray),
            (Type::VARCHAR_ARRAY, Decoder::TextArray),
        ];
        for (ty, expected) in cases {
            assert_eq!(decoder_for(&ty), Some(expected), "{ty}");
        }
    }

    #[test]
    fn test_decoder_for_types_fetched_as_text() {
        let geometry =
            Type::new("geometry".to_string(), 16_000, Kind::Simple, "public".to_string());
        let types = [
            Type::INTERVAL,
            Type::INET,
            Type::TIMETZ,
            Type::MONEY,
            Type::XML,
            Type::POINT,
            Type::BIT,
            Type::INT8_ARRAY,
            Type::FLOAT8_ARRAY,
            Type::NUMERIC_ARRAY,
            geometry,
        ];
        for ty in &types {
            assert_eq!(decoder_for(ty), None, "{ty}");
        }
    }

    #[test]
    fn test_text_cast_select_leaves_decodable_statements_alone() {
        let sql = r#"SELECT "id", "name" FROM "t" LIMIT 1000"#;
        let columns = [("id", &Type::INT4), ("name", &Type::TEXT)];
        assert_eq!(text_cast_select(sql, &columns), None);
    }

    #[test]
    fn test_text_cast_select_casts_only_undecodable_columns() {
        let sql = r#"SELECT "id", "span", "ip", "big", "amt" FROM "t" LIMIT 1000"#;
        let columns = [
            ("id", &Type::INT4),
            ("span", &Type::INTERVAL),
            ("ip", &Type::INET),
            ("big", &Type::INT8_ARRAY),
            ("amt", &Type::MONEY),
        ];
        assert_eq!(
            text_cast_select(sql, &columns).unwrap(),
            "SELECT q.c0 AS \"id\", q.c1::text AS \"span\", q.c2::text AS \"ip\", \
             q.c3::text AS \"big\", q.c4::text AS \"amt\" \
             FROM (SELECT \"id\", \"span\", \"ip\", \"big\", \"amt\" FROM \"t\" LIMIT 1000) \
             AS q(c0, c1, c2, c3, c4)"
        );
    }

    #[test]
    fn test_text_cast_select_keeps_duplicate_columns_apart() {
        let sql = r#"SELECT "geom", "geom" FROM "lotes" LIMIT 1000"#;
        let geometry =
            Type::new("geometry".to_string(), 16_000, Kind::Simple, "public".to_string());
        let columns = [("geom", &geometry), ("geom", &geometry)];
        let rewritten = text_cast_select(sql, &columns).unwrap();
        assert!(rewritten.starts_with(r#"SELECT q.c0::text AS "geom", q.c1::text AS "geom" FROM ("#));
        assert!(rewritten.ends_with(") AS q(c0, c1)"));
    }
}
