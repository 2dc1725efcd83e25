use crate::engine::host::ParameterValue;
use crate::test_helpers::factories::PivotParamsFactory;

#[test]
fn pivot_params_factory_defaults_and_overrides() {
    let params = PivotParamsFactory::new()
        .with("value_columns", ParameterValue::ColumnRefList(vec![2, 3]))
        .without("pivot_column")
        .create();
    assert_eq!(params.len(), 3);
    assert!(params.get("pivot_column").is_none());
    assert_eq!(
        params.get("VALUE_COLUMNS"),
        Some(&ParameterValue::ColumnRefList(vec![2, 3]))
    );
}
