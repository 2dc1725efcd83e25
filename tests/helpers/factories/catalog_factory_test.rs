use crate::engine::host::{CatalogClient, RowAccessor};
use crate::engine::types::ScalarValue;
use crate::test_helpers::factories::{CatalogFactory, STATUS_QUERY};

#[test]
fn catalog_factory_registers_default_status_labels() {
    let catalog = CatalogFactory::new().create();
    let mut cursor = catalog.open(STATUS_QUERY).unwrap();
    let first = cursor.fetch().unwrap().unwrap();
    assert_eq!(first.get_string(1).unwrap(), "open_amt");
}

#[test]
fn catalog_factory_appends_rows_under_custom_query() {
    let catalog = CatalogFactory::new()
        .with_query("select k, l from t")
        .with_row(vec![
            ScalarValue::varchar("PENDING"),
            ScalarValue::varchar("pending_amt"),
        ])
        .create();
    let mut cursor = catalog.open("select k, l from t").unwrap();
    let mut count = 0;
    while cursor.fetch().unwrap().is_some() {
        count += 1;
    }
    assert_eq!(count, 3);
}
