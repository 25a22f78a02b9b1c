use std::collections::BTreeMap;

use overlay::{union_groups, Assignment};
use polars::prelude::DataType;
use tracing::debug;

use crate::{
    engine::{aggregate, report::AggregateReport},
    error::{EngineError, Result},
    layer::GeometrySet,
    types::GeoType,
};

/// Merge all units of `source` sharing a value of `join_column` into one unit
/// whose geometry is the union of the group. The join values become the GEOIDs
/// of the new set. Units with a null join value are left out.
///
/// If `columns` is non-empty they are summed into the dissolved units, each
/// original unit going to the unit of its own join value.
pub fn dissolve(
    source: &GeometrySet,
    join_column: &str,
    columns: &[String],
    name: &str,
) -> Result<(GeometrySet, Option<AggregateReport>)> {
    let keys = source.data().column(join_column)
        .map_err(|_| EngineError::MissingColumn { set: source.name().to_string(), column: join_column.to_string() })?
        .cast(&DataType::String)?;
    let keys = keys.str()?.into_iter()
        .map(|key| key.map(|key| key.trim().to_string()))
        .collect::<Vec<_>>();

    let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, key) in keys.iter().enumerate() {
        if let Some(key) = key {
            groups.entry(key.as_str()).or_default().push(i);
        }
    }

    let (ids, members): (Vec<String>, Vec<Vec<usize>>) = groups.into_iter()
        .map(|(key, members)| (key.to_string(), members))
        .unzip();
    let shapes = union_groups(source.shapes(), &members);

    let mut target = GeometrySet::new(name, GeoType::Custom, ids, shapes, source.epsg())?;
    debug!("[engine::dissolve] {} -> {} units by {join_column}", source.name(), target.len());

    if columns.is_empty() {
        return Ok((target, None));
    }

    let assignment = Assignment::from_parents(
        keys.iter()
            .map(|key| key.as_deref()
                .and_then(|key| target.position_of(key))
                .map(|j| j as u32))
            .collect()
    );
    let report = aggregate(source, &mut target, &assignment, columns)?;
    Ok((target, Some(report)))
}
