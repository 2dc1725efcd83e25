use serde_json::json;

use super::{ColumnDesc, ScalarValue, TypeTag, format_numeric, parse_numeric};

#[test]
fn type_tag_parses_host_names_case_insensitively() {
    assert_eq!("VARCHAR".parse::<TypeTag>(), Ok(TypeTag::VarChar));
    assert_eq!("bigint".parse::<TypeTag>(), Ok(TypeTag::BigInt));
    assert_eq!("Float8".parse::<TypeTag>(), Ok(TypeTag::Float8));
    assert!("geometry".parse::<TypeTag>().is_err());
}

#[test]
fn numeric_text_round_trips_through_unscaled_form() {
    assert_eq!(parse_numeric("12.34", 2), Some(1234));
    assert_eq!(parse_numeric("-0.5", 3), Some(-500));
    assert_eq!(parse_numeric("7", 2), Some(700));
    assert_eq!(parse_numeric("1.234", 2), None);
    assert_eq!(parse_numeric("abc", 0), None);

    assert_eq!(format_numeric(1234, 2), "12.34");
    assert_eq!(format_numeric(-500, 3), "-0.500");
    assert_eq!(format_numeric(5, 3), "0.005");
    assert_eq!(format_numeric(42, 0), "42");
}

#[test]
fn numeric_formats_full_128_bit_magnitude() {
    assert_eq!(
        format_numeric(i128::MAX, 0),
        "170141183460469231731687303715884105727"
    );
    assert_eq!(
        format_numeric(i128::MIN, 0),
        "-170141183460469231731687303715884105728"
    );
}

#[test]
fn from_json_respects_column_type() {
    let date_col = ColumnDesc::new("d", TypeTag::Date);
    assert_eq!(
        ScalarValue::from_json(&json!("1970-01-02"), &date_col),
        Some(ScalarValue::Date(1))
    );

    let ts_col = ColumnDesc::new("ts", TypeTag::Timestamp);
    assert_eq!(
        ScalarValue::from_json(&json!("1970-01-01T00:00:01Z"), &ts_col),
        Some(ScalarValue::Timestamp(1_000_000))
    );

    let num_col = ColumnDesc::new("n", TypeTag::Numeric).with_precision_scale(10, 2);
    assert_eq!(
        ScalarValue::from_json(&json!("3.5"), &num_col),
        Some(ScalarValue::Numeric {
            unscaled: 350,
            scale: 2
        })
    );

    let small_col = ColumnDesc::new("s", TypeTag::SmallInt);
    assert_eq!(ScalarValue::from_json(&json!(70000), &small_col), None);
    assert_eq!(
        ScalarValue::from_json(&json!(null), &small_col),
        Some(ScalarValue::Null)
    );
}

#[test]
fn to_json_renders_temporal_values_as_text() {
    assert_eq!(ScalarValue::Date(0).to_json(), json!("1970-01-01"));
    assert_eq!(
        ScalarValue::Timestamp(1_500_000).to_json(),
        json!("1970-01-01 00:00:01.500000")
    );
    assert_eq!(
        ScalarValue::Numeric {
            unscaled: -1234,
            scale: 2
        }
        .to_json(),
        json!("-12.34")
    );
}

#[test]
fn renamed_column_keeps_type_metadata() {
    let col = ColumnDesc::new("amount", TypeTag::Numeric)
        .with_precision_scale(12, 2)
        .not_null();
    let renamed = col.renamed("open_amt");
    assert_eq!(renamed.name, "open_amt");
    assert_eq!(renamed.type_tag, TypeTag::Numeric);
    assert_eq!(renamed.precision, 12);
    assert_eq!(renamed.scale, 2);
    assert!(!renamed.nullable);
}
