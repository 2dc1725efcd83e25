use crate::command::run::{RunError, run_session};
use crate::command::session_file::SessionFile;
use crate::engine::errors::PivotError;
use crate::engine::types::ScalarValue;
use crate::shared::config::PivotConfig;

const DEMO: &str = include_str!("../../demos/sales_by_status.json");

fn values(file: &SessionFile) -> Vec<Vec<ScalarValue>> {
    crate::logging::init_for_tests();
    run_session(file, PivotConfig::default())
        .unwrap()
        .rows
        .into_iter()
        .map(|r| r.into_values())
        .collect()
}

#[test]
fn multi_partition_run_declares_and_emits() {
    crate::logging::init_for_tests();
    let file = SessionFile::from_json(DEMO).unwrap();
    let output = run_session(&file, PivotConfig::default()).unwrap();

    let names: Vec<&str> = output.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["region", "open_amt", "closed_amt"]);
    assert_eq!(output.rows.len(), 3);
    assert_eq!(
        output.rows[2].values(),
        &[
            ScalarValue::varchar("west"),
            ScalarValue::BigInt(7),
            ScalarValue::Null,
        ]
    );
}

#[test]
fn single_partition_runs_on_session_processor() {
    let mut file = SessionFile::from_json(DEMO).unwrap();
    let merged: Vec<_> = file.partitions.concat();
    file.partitions = vec![merged];

    assert_eq!(
        values(&file),
        vec![
            vec![
                ScalarValue::varchar("east"),
                ScalarValue::BigInt(10),
                ScalarValue::BigInt(5),
            ],
            vec![
                ScalarValue::varchar("north"),
                ScalarValue::Null,
                ScalarValue::BigInt(2),
            ],
            vec![
                ScalarValue::varchar("west"),
                ScalarValue::BigInt(7),
                ScalarValue::Null,
            ],
        ]
    );
}

#[test]
fn unknown_key_fails_the_run() {
    let text = DEMO.replace(r#"["west", "OPEN", 7]"#, r#"["west", "PENDING", 7]"#);
    let file = SessionFile::from_json(&text).unwrap();
    assert!(matches!(
        run_session(&file, PivotConfig::default()),
        Err(RunError::Pivot(PivotError::PivotKeyNotFound { .. }))
    ));
}

#[test]
fn missing_catalog_query_fails_at_describe() {
    let mut file = SessionFile::from_json(DEMO).unwrap();
    file.catalog.clear();
    assert!(matches!(
        run_session(&file, PivotConfig::default()),
        Err(RunError::Pivot(PivotError::Host(_)))
    ));
}
