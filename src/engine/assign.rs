use clap::ValueEnum;
use overlay::Assignment;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{error::{EngineError, Result}, layer::GeometrySet, types::GeoId};

/// What to do with fine units that overlap no coarse unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Fallback {
    /// Leave them unassigned; they are reported and contribute nothing.
    #[default]
    Drop,
    /// Assign them to the coarse unit with the nearest centroid.
    Nearest,
}

/// Assign each unit of `fine` to the unit of `coarse` it overlaps the most.
///
/// Ties go to the lowest coarse GEOID. Units without overlap stay unassigned.
pub fn assign(fine: &GeometrySet, coarse: &GeometrySet) -> Result<Assignment> {
    let assignment = overlay::assign(fine.geometries(), coarse.geometries())?;
    debug!(
        "[engine::assign] {} -> {}: {} of {} assigned",
        fine.name(), coarse.name(),
        assignment.len() - assignment.unassigned().len(), assignment.len(),
    );
    Ok(assignment)
}

/// [`assign`], then apply `fallback` to the units left unassigned.
/// Returns the assignment and the GEOIDs the fallback filled.
pub fn assign_with_fallback(fine: &GeometrySet, coarse: &GeometrySet, fallback: Fallback) -> Result<(Assignment, Vec<GeoId>)> {
    let mut assignment = assign(fine, coarse)?;
    let filled = match fallback {
        Fallback::Drop => Vec::new(),
        Fallback::Nearest => assignment
            .fill_nearest(fine.geometries(), coarse.geometries())
            .into_iter()
            .map(|i| fine.geo_ids()[i].clone())
            .collect(),
    };
    Ok((assignment, filled))
}

/// Assign nested census units by GEOID prefix (e.g. blocks to block groups).
/// Units whose prefix is absent from `coarse` stay unassigned.
pub fn assign_by_geo_id(fine: &GeometrySet, coarse: &GeometrySet) -> Result<Assignment> {
    if !fine.ty().nests_in(coarse.ty()) {
        return Err(EngineError::NotNested { fine: fine.ty(), coarse: coarse.ty() });
    }

    Ok(Assignment::from_parents(
        fine.geo_ids().iter()
            .map(|geo_id| geo_id.to_parent(coarse.ty())
                .and_then(|parent| coarse.position(&parent))
                .map(|j| j as u32))
            .collect()
    ))
}

/// GEOIDs of the unassigned units of `fine`.
pub fn unassigned_ids(fine: &GeometrySet, assignment: &Assignment) -> Vec<GeoId> {
    assignment.unassigned().into_iter()
        .map(|i| fine.geo_ids()[i].clone())
        .collect()
}
