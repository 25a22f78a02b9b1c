use overlay::Assignment;
use tracing::debug;

use crate::{
    engine::{assign_with_fallback, report::{AggregateReport, ColumnBalance}, unassigned_ids, Fallback},
    error::{EngineError, Result},
    layer::GeometrySet,
};

/// Sum `columns` of `source` into the units of `target` they are assigned to.
///
/// Target units with no assigned source units get exactly 0. Unassigned
/// source units contribute nothing and are listed in the report.
pub fn aggregate(
    source: &GeometrySet,
    target: &mut GeometrySet,
    assignment: &Assignment,
    columns: &[String],
) -> Result<AggregateReport> {
    if assignment.len() != source.len() {
        return Err(EngineError::LengthMismatch {
            what: format!("assignment of {}", source.name()),
            expected: source.len(),
            found: assignment.len(),
        });
    }

    let values = columns.iter()
        .map(|column| source.column_f64(column))
        .collect::<Result<Vec<_>>>()?;

    let groups = assignment.groups(target.len());
    let mut report = AggregateReport {
        unassigned: unassigned_ids(source, assignment),
        empty_targets: groups.iter().enumerate()
            .filter(|(_, children)| children.is_empty())
            .map(|(j, _)| target.geo_ids()[j].clone())
            .collect(),
        ..Default::default()
    };

    for (column, source_values) in columns.iter().zip(values) {
        let sums = groups.iter()
            .map(|children| children.iter().map(|&i| source_values[i]).sum::<f64>())
            .collect::<Vec<_>>();

        report.balances.push(ColumnBalance {
            column: column.clone(),
            source_sum: source_values.iter().sum(),
            target_sum: sums.iter().sum(),
        });
        target.set_column_f64(column, sums)?;
    }

    debug!(
        "[engine::aggregate] {} -> {}: {} columns, {} empty targets",
        source.name(), target.name(), columns.len(), report.empty_targets.len(),
    );
    Ok(report)
}

/// [`aggregate`] with a spatial assignment computed on the spot.
pub fn aggregate_spatial(
    source: &GeometrySet,
    target: &mut GeometrySet,
    columns: &[String],
    fallback: Fallback,
) -> Result<AggregateReport> {
    let (assignment, nearest_filled) = assign_with_fallback(source, target, fallback)?;
    let report = aggregate(source, target, &assignment, columns)?;
    Ok(AggregateReport { nearest_filled, ..report })
}
