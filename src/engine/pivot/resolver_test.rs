use crate::engine::errors::PivotError;
use crate::engine::host::{ParameterValue, PlanDeclaration};
use crate::engine::pivot::resolver::describe;
use crate::engine::types::{ColumnDesc, ScalarValue, TypeTag};
use crate::shared::config::PivotConfig;
use crate::test_helpers::factories::{CatalogFactory, PivotParamsFactory, SalesRowFactory};

#[test]
fn declares_group_columns_then_one_block_per_catalog_row() {
    let schema = SalesRowFactory::schema();
    let catalog = CatalogFactory::new().create();
    let mut plan = PlanDeclaration::new(schema.clone());
    let outcome = describe(
        &PivotParamsFactory::new().create(),
        &schema,
        &catalog,
        &mut plan,
        &PivotConfig::default(),
    )
    .unwrap();

    assert_eq!(plan.output_names(), vec!["region", "open_amt", "closed_amt"]);
    assert_eq!(plan.partition_by, vec![0]);
    assert_eq!(plan.order_by, vec![0]);
    assert!(plan.global_partitioning);
    assert!(plan.session_commands);
    assert_eq!(plan.output_columns[1].type_tag, TypeTag::BigInt);
    assert_eq!(outcome.snapshot.keys, vec!["OPEN", "CLOSED"]);
    assert_eq!(catalog.executions(), 1);
}

#[test]
fn multiple_value_columns_take_labels_in_order() {
    let schema = vec![
        ColumnDesc::new("region", TypeTag::VarChar),
        ColumnDesc::new("status", TypeTag::VarChar),
        ColumnDesc::new("amount", TypeTag::Numeric).with_precision_scale(12, 2),
        ColumnDesc::new("qty", TypeTag::Int).not_null(),
    ];
    let catalog = CatalogFactory::new()
        .with_schema(vec![
            ColumnDesc::new("status", TypeTag::VarChar),
            ColumnDesc::new("amount_label", TypeTag::VarChar),
            ColumnDesc::new("qty_label", TypeTag::BpChar),
        ])
        .with_rows(vec![vec![
            ScalarValue::varchar("OPEN"),
            ScalarValue::varchar("open_amt"),
            ScalarValue::BpChar("open_qty".into()),
        ]])
        .create();
    let params = PivotParamsFactory::new()
        .with("value_columns", ParameterValue::ColumnRefList(vec![2, 3]))
        .create();
    let mut plan = PlanDeclaration::new(schema.clone());
    describe(&params, &schema, &catalog, &mut plan, &PivotConfig::default()).unwrap();

    assert_eq!(plan.output_names(), vec!["region", "open_amt", "open_qty"]);
    assert_eq!(plan.output_columns[1].precision, 12);
    assert_eq!(plan.output_columns[1].scale, 2);
    assert!(!plan.output_columns[2].nullable);
}

#[test]
fn catalog_shape_is_validated() {
    let schema = SalesRowFactory::schema();

    let too_narrow = CatalogFactory::new()
        .with_schema(vec![ColumnDesc::new("status", TypeTag::VarChar)])
        .with_rows(vec![vec![ScalarValue::varchar("OPEN")]])
        .create();
    let mut plan = PlanDeclaration::new(schema.clone());
    let err = describe(
        &PivotParamsFactory::new().create(),
        &schema,
        &too_narrow,
        &mut plan,
        &PivotConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, PivotError::Schema(msg) if msg.contains("at least 2 columns")));

    let numeric_label = CatalogFactory::new()
        .with_schema(vec![
            ColumnDesc::new("status", TypeTag::VarChar),
            ColumnDesc::new("label", TypeTag::Int),
        ])
        .with_rows(vec![])
        .create();
    let mut plan = PlanDeclaration::new(schema.clone());
    let err = describe(
        &PivotParamsFactory::new().create(),
        &schema,
        &numeric_label,
        &mut plan,
        &PivotConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, PivotError::Schema(msg) if msg.contains("must be a string")));

    let null_label = CatalogFactory::new()
        .with_rows(vec![vec![ScalarValue::varchar("OPEN"), ScalarValue::Null]])
        .create();
    let mut plan = PlanDeclaration::new(schema.clone());
    assert!(matches!(
        describe(
            &PivotParamsFactory::new().create(),
            &schema,
            &null_label,
            &mut plan,
            &PivotConfig::default(),
        ),
        Err(PivotError::Schema(_))
    ));
}

#[test]
fn output_width_is_bounded_by_config() {
    let schema = SalesRowFactory::schema();
    let catalog = CatalogFactory::new().create();
    let config = PivotConfig {
        max_output_columns: 2,
        ..PivotConfig::default()
    };
    let mut plan = PlanDeclaration::new(schema.clone());
    let err = describe(
        &PivotParamsFactory::new().create(),
        &schema,
        &catalog,
        &mut plan,
        &config,
    )
    .unwrap_err();
    assert!(matches!(err, PivotError::Schema(msg) if msg.contains("more than 2")));
}

#[test]
fn group_columns_alone_count_toward_output_bound() {
    let schema = SalesRowFactory::schema();
    let catalog = CatalogFactory::new().with_rows(vec![]).create();
    let config = PivotConfig {
        max_output_columns: 0,
        ..PivotConfig::default()
    };
    let mut plan = PlanDeclaration::new(schema.clone());
    let err = describe(
        &PivotParamsFactory::new().create(),
        &schema,
        &catalog,
        &mut plan,
        &config,
    )
    .unwrap_err();
    assert!(matches!(err, PivotError::Schema(msg) if msg.contains("more than 0")));
    assert_eq!(catalog.executions(), 0);
}

#[test]
fn parameter_errors_surface_before_catalog_runs() {
    let schema = SalesRowFactory::schema();
    let catalog = CatalogFactory::new().create();
    let mut plan = PlanDeclaration::new(schema.clone());
    let err = describe(
        &PivotParamsFactory::new().without("column_catalog_query").create(),
        &schema,
        &catalog,
        &mut plan,
        &PivotConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(err, PivotError::Parameter(_)));
    assert_eq!(catalog.executions(), 0);
    assert!(plan.output_columns.is_empty());
}
