use crate::engine::errors::PivotError;
use crate::engine::host::{MemorySessionStore, SessionStore};
use crate::engine::pivot::key_map::{ColumnTypeMeta, PivotKeyMap};
use crate::engine::pivot::resolver::CatalogSnapshot;
use crate::engine::types::{ColumnDesc, ScalarValue, TypeTag};
use crate::shared::storage_header::BinaryHeader;
use crate::test_helpers::factories::{CatalogFactory, STATUS_QUERY};
use bytes::Bytes;

fn amount_meta() -> Vec<ColumnTypeMeta> {
    vec![ColumnTypeMeta {
        type_tag: TypeTag::BigInt,
        length: 8,
    }]
}

#[test]
fn from_catalog_assigns_ordinals_in_row_order() {
    let catalog = CatalogFactory::new()
        .with_row(vec![
            ScalarValue::varchar("PENDING"),
            ScalarValue::varchar("pending_amt"),
        ])
        .create();
    let map = PivotKeyMap::from_catalog(&catalog, STATUS_QUERY, amount_meta(), false).unwrap();

    assert_eq!(map.len(), 3);
    assert_eq!(map.block_count(), 3);
    assert_eq!(map.offset_of("OPEN"), Some(0));
    assert_eq!(map.offset_of("CLOSED"), Some(1));
    assert_eq!(map.offset_of("PENDING"), Some(2));
    assert_eq!(map.offset_of("open"), None);
    assert_eq!(map.pivot_column().type_tag, TypeTag::VarChar);
    assert_eq!(map.pivot_column().length, 16);
}

#[test]
fn duplicate_key_later_row_wins_unless_rejected() {
    let rows = vec![
        vec![ScalarValue::varchar("A"), ScalarValue::varchar("a1")],
        vec![ScalarValue::varchar("B"), ScalarValue::varchar("b")],
        vec![ScalarValue::varchar("A"), ScalarValue::varchar("a2")],
    ];
    let catalog = CatalogFactory::new().with_rows(rows.clone()).create();
    let map = PivotKeyMap::from_catalog(&catalog, STATUS_QUERY, amount_meta(), false).unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map.block_count(), 3);
    assert_eq!(map.offset_of("A"), Some(2));

    let catalog = CatalogFactory::new().with_rows(rows).create();
    let err = PivotKeyMap::from_catalog(&catalog, STATUS_QUERY, amount_meta(), true).unwrap_err();
    assert!(matches!(err, PivotError::Schema(_)));
}

#[test]
fn empty_or_null_catalog_is_schema_error() {
    let catalog = CatalogFactory::new().with_rows(vec![]).create();
    assert!(matches!(
        PivotKeyMap::from_catalog(&catalog, STATUS_QUERY, amount_meta(), false),
        Err(PivotError::Schema(_))
    ));

    let catalog = CatalogFactory::new()
        .with_rows(vec![vec![ScalarValue::Null, ScalarValue::varchar("x")]])
        .create();
    assert!(matches!(
        PivotKeyMap::from_catalog(&catalog, STATUS_QUERY, amount_meta(), false),
        Err(PivotError::Schema(_))
    ));
}

#[test]
fn unsupported_catalog_key_type_is_rejected() {
    let catalog = CatalogFactory::new()
        .with_schema(vec![
            ColumnDesc::new("flag", TypeTag::Boolean),
            ColumnDesc::new("label", TypeTag::VarChar),
        ])
        .with_rows(vec![vec![
            ScalarValue::Boolean(true),
            ScalarValue::varchar("yes"),
        ]])
        .create();
    assert!(matches!(
        PivotKeyMap::from_catalog(&catalog, STATUS_QUERY, amount_meta(), false),
        Err(PivotError::UnsupportedKeyType(TypeTag::Boolean))
    ));
}

#[test]
fn snapshot_and_requery_build_identical_maps() {
    let catalog = CatalogFactory::new().create();
    let requeried =
        PivotKeyMap::from_catalog(&catalog, STATUS_QUERY, amount_meta(), false).unwrap();
    let snapshot = CatalogSnapshot {
        key_column: ColumnDesc::new("status", TypeTag::VarChar).with_length(16),
        keys: vec!["OPEN".into(), "CLOSED".into()],
    };
    let from_snapshot = PivotKeyMap::from_snapshot(&snapshot, amount_meta(), false).unwrap();
    assert_eq!(requeried, from_snapshot);
}

#[test]
fn session_blob_restores_entries_and_metadata() {
    let catalog = CatalogFactory::new().create();
    let map = PivotKeyMap::from_catalog(&catalog, STATUS_QUERY, amount_meta(), false).unwrap();
    let store = MemorySessionStore::new();
    map.publish(&store).unwrap();

    let restored = PivotKeyMap::restore(&store).unwrap();
    assert_eq!(*restored, map);
    assert_eq!(restored.value_columns(), amount_meta().as_slice());
    let entries: Vec<_> = restored.entries().collect();
    assert_eq!(entries, vec![("OPEN", 0), ("CLOSED", 1)]);
}

#[test]
fn restore_rejects_missing_or_corrupt_blob() {
    let store = MemorySessionStore::new();
    assert!(matches!(
        PivotKeyMap::restore(&store),
        Err(PivotError::SessionState(_))
    ));

    let catalog = CatalogFactory::new().create();
    let map = PivotKeyMap::from_catalog(&catalog, STATUS_QUERY, amount_meta(), false).unwrap();
    let mut blob = map.to_bytes().unwrap();
    blob[0] ^= 0xFF;
    store.put(Bytes::from(blob));
    assert!(matches!(
        PivotKeyMap::restore(&store),
        Err(PivotError::SessionState(_))
    ));

    let blob = map.to_bytes().unwrap();
    let truncated = &blob[..BinaryHeader::TOTAL_LEN + 2];
    assert!(PivotKeyMap::from_bytes(truncated).is_err());
}

#[test]
fn from_bytes_rejects_offsets_outside_block_count() {
    use crate::shared::storage_header::MagicFile;

    let meta = ColumnTypeMeta {
        type_tag: TypeTag::VarChar,
        length: 0,
    };
    let wire = (meta, amount_meta(), 1u64, vec![("OPEN".to_string(), 4u64)]);
    let blob = PivotKeyMap::frame(&bincode::serialize(&wire).unwrap()).unwrap();
    match PivotKeyMap::from_bytes(&blob) {
        Err(PivotError::SessionState(msg)) => assert!(msg.contains("outside 1 blocks")),
        other => panic!("expected session state error, got {:?}", other),
    }
}
