use tracing::{debug, info};

use crate::engine::errors::PivotError;
use crate::engine::host::{CatalogClient, NamedParameters, SchemaDeclarer};
use crate::engine::pivot::key_encoder::{encode_key, ensure_supported};
use crate::engine::pivot::parameters::PivotParameters;
use crate::engine::types::ColumnDesc;
use crate::shared::config::PivotConfig;

/// Pivot keys observed while the output schema was declared, in catalog-row
/// order.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogSnapshot {
    pub key_column: ColumnDesc,
    pub keys: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DescribeOutcome {
    pub parameters: PivotParameters,
    pub snapshot: CatalogSnapshot,
}

/// Plan-time schema discovery. Declares partitioning and ordering on the
/// group columns, then one output column per (catalog row, value column)
/// named by the row's label.
pub fn describe(
    params: &NamedParameters,
    input_schema: &[ColumnDesc],
    catalog: &dyn CatalogClient,
    declarer: &mut dyn SchemaDeclarer,
    config: &PivotConfig,
) -> Result<DescribeOutcome, PivotError> {
    let parameters = PivotParameters::from_named(params)?;
    parameters.validate_against(input_schema)?;

    let mut declared = 0usize;
    for &idx in &parameters.group_columns {
        declarer.add_partition_by_column(idx);
        declarer.add_order_by_column(idx);
        declarer.copy_column_schema(idx)?;
        declared += 1;
    }
    declarer.set_global_partitioning(true);
    check_output_width(declared, config)?;

    let value_descs = parameters.value_column_descs(input_schema);
    let value_count = value_descs.len();

    let mut cursor = catalog.open(&parameters.catalog_query)?;
    let catalog_schema = cursor.schema().to_vec();
    if catalog_schema.len() < value_count + 1 {
        return Err(PivotError::schema(format!(
            "invalid column description query, must have at least {} columns",
            value_count + 1
        )));
    }
    for (pos, column) in catalog_schema.iter().enumerate().skip(1).take(value_count) {
        if !column.type_tag.is_character() {
            return Err(PivotError::schema(format!(
                "invalid column description query, column {} must be a string",
                pos
            )));
        }
    }
    let key_column = catalog_schema[0].clone();
    ensure_supported(key_column.type_tag)?;

    let mut keys = Vec::new();
    while let Some(row) = cursor.fetch()? {
        let values = row.values();
        let Some(key_value) = values.first().filter(|v| !v.is_null()) else {
            return Err(PivotError::schema(format!(
                "catalog row {} has a NULL pivot key",
                keys.len()
            )));
        };
        let key = encode_key(key_value, key_column.type_tag)?;

        check_output_width(declared + value_count, config)?;
        for (pos, desc) in value_descs.iter().enumerate() {
            let label = values
                .get(pos + 1)
                .and_then(|v| v.as_str())
                .ok_or_else(|| {
                    PivotError::schema(format!(
                        "catalog row {} has a NULL label in column {}",
                        keys.len(),
                        pos + 1
                    ))
                })?;
            declarer.add_output_column(desc.renamed(label));
            declared += 1;
        }
        debug!(target: "pivot::resolver", key = %key, "Declared pivot block");
        keys.push(key);
    }
    cursor.close();

    declarer.enable_session_commands();
    info!(
        target: "pivot::resolver",
        group_columns = parameters.group_columns.len(),
        blocks = keys.len(),
        output_columns = declared,
        "Resolved pivot output schema"
    );

    Ok(DescribeOutcome {
        parameters,
        snapshot: CatalogSnapshot { key_column, keys },
    })
}

fn check_output_width(columns: usize, config: &PivotConfig) -> Result<(), PivotError> {
    if columns > config.max_output_columns {
        return Err(PivotError::schema(format!(
            "pivot would declare more than {} output columns",
            config.max_output_columns
        )));
    }
    Ok(())
}
