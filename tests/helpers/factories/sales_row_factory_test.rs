use crate::engine::host::RowAccessor;
use crate::engine::types::ScalarValue;
use crate::test_helpers::factories::SalesRowFactory;

#[test]
fn sales_row_factory_orders_columns_by_schema() {
    let row = SalesRowFactory::new()
        .with("amount", ScalarValue::BigInt(5))
        .create();
    assert_eq!(row.column_count(), SalesRowFactory::schema().len());
    assert_eq!(row.get_string(0).unwrap(), "east");
    assert_eq!(row.get_bigint(2).unwrap(), 5);

    let rows = SalesRowFactory::rows(&[("west", None, 1)]);
    assert!(rows[0].is_null(1).unwrap());
}
