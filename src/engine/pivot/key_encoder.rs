use crate::engine::errors::PivotError;
use crate::engine::types::{ScalarValue, TypeTag, format_numeric};

/// Whether values of `tag` can serve as pivot keys.
pub fn is_supported(tag: TypeTag) -> bool {
    matches!(
        tag,
        TypeTag::SmallInt
            | TypeTag::Int
            | TypeTag::BigInt
            | TypeTag::Timestamp
            | TypeTag::Date
            | TypeTag::Numeric
            | TypeTag::Float4
            | TypeTag::Float8
            | TypeTag::VarChar
            | TypeTag::BpChar
    )
}

pub fn ensure_supported(tag: TypeTag) -> Result<(), PivotError> {
    if is_supported(tag) {
        Ok(())
    } else {
        Err(PivotError::UnsupportedKeyType(tag))
    }
}

/// Integer widths share one family, as do the two character types.
pub fn is_compatible(declared: TypeTag, actual: TypeTag) -> bool {
    declared == actual
        || (declared.is_integer() && actual.is_integer())
        || (declared.is_character() && actual.is_character())
}

/// Canonical key string for `value` read as `type_tag`.
///
/// The same logical value yields the same string whether it came from a
/// catalog row or from an input row.
pub fn encode_key(value: &ScalarValue, type_tag: TypeTag) -> Result<String, PivotError> {
    ensure_supported(type_tag)?;
    let actual = value
        .type_tag()
        .ok_or_else(|| PivotError::schema("cannot encode a NULL pivot key"))?;
    if !is_compatible(type_tag, actual) {
        return Err(PivotError::schema(format!(
            "pivot value of type {} does not match key type {}",
            actual, type_tag
        )));
    }

    let mut ints = itoa::Buffer::new();
    let key = match value {
        ScalarValue::SmallInt(v) => ints.format(*v).to_owned(),
        ScalarValue::Int(v) => ints.format(*v).to_owned(),
        ScalarValue::BigInt(v) => ints.format(*v).to_owned(),
        ScalarValue::Timestamp(ticks) => ints.format(*ticks).to_owned(),
        ScalarValue::Date(days) => ints.format(*days).to_owned(),
        ScalarValue::Numeric { unscaled, scale } => encode_numeric(*unscaled, *scale),
        ScalarValue::Float4(v) => encode_f32(*v),
        ScalarValue::Float8(v) => encode_f64(*v),
        ScalarValue::VarChar(s) | ScalarValue::BpChar(s) => s.clone(),
        _ => return Err(PivotError::UnsupportedKeyType(actual)),
    };
    Ok(key)
}

/// Trailing fractional zeros are dropped so 1.50 and 1.5 share a key.
fn encode_numeric(mut unscaled: i128, mut scale: u8) -> String {
    while scale > 0 && unscaled % 10 == 0 {
        unscaled /= 10;
        scale -= 1;
    }
    format_numeric(unscaled, scale)
}

fn encode_f64(v: f64) -> String {
    // -0.0 and 0.0 compare equal and must share a key.
    let v = if v == 0.0 { 0.0 } else { v };
    ryu::Buffer::new().format(v).to_owned()
}

fn encode_f32(v: f32) -> String {
    let v = if v == 0.0 { 0.0 } else { v };
    ryu::Buffer::new().format(v).to_owned()
}
