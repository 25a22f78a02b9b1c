use std::fmt;

use geo::{Area, BooleanOps, Centroid};
use rstar::{primitives::GeomWithData, RTree};

use crate::Geometries;

/// Errors that can occur when assigning one layer onto another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssignError {
    /// The two layers declare different coordinate reference systems.
    CrsMismatch { fine: u32, coarse: u32 },
}

impl fmt::Display for AssignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignError::CrsMismatch { fine, coarse } =>
                write!(f, "coordinate reference systems differ: EPSG:{fine} vs EPSG:{coarse}"),
        }
    }
}

impl std::error::Error for AssignError {}

/// A map from each fine unit (by index) to at most one coarse unit.
///
/// `None` marks a unit with no spatial counterpart. It stays `None` until the
/// caller explicitly chooses a fallback (see [`Assignment::fill_nearest`]).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Assignment {
    parents: Vec<Option<u32>>,
}

impl Assignment {
    /// Build an assignment from explicit parent indices.
    pub fn from_parents(parents: Vec<Option<u32>>) -> Self {
        Self { parents }
    }

    #[inline] pub fn len(&self) -> usize { self.parents.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.parents.is_empty() }

    /// Parent of fine unit `i`, if assigned.
    #[inline] pub fn get(&self, i: usize) -> Option<u32> { self.parents.get(i).copied().flatten() }

    #[inline] pub fn parents(&self) -> &[Option<u32>] { &self.parents }

    /// Indices of fine units with no parent.
    pub fn unassigned(&self) -> Vec<usize> {
        self.parents.iter().enumerate()
            .filter_map(|(i, parent)| parent.is_none().then_some(i))
            .collect()
    }

    /// Group fine-unit indices by parent; `groups[j]` lists the children of coarse unit `j`.
    /// Children appear in ascending order.
    pub fn groups(&self, coarse_len: usize) -> Vec<Vec<usize>> {
        let mut groups = vec![Vec::new(); coarse_len];
        for (i, parent) in self.parents.iter().enumerate() {
            if let Some(j) = parent {
                groups[*j as usize].push(i);
            }
        }
        groups
    }

    /// Assign every unassigned fine unit to the coarse unit with the nearest centroid.
    /// Returns the indices of the units that were filled. Units without a
    /// centroid (empty geometry) stay unassigned.
    pub fn fill_nearest(&mut self, fine: &Geometries, coarse: &Geometries) -> Vec<usize> {
        let unassigned = self.unassigned();
        if unassigned.is_empty() { return unassigned }

        let tree: RTree<GeomWithData<[f64; 2], u32>> = RTree::bulk_load(
            coarse.centroids().into_iter().enumerate()
                .filter_map(|(j, c)| c.map(|c| GeomWithData::new([c.x(), c.y()], j as u32)))
                .collect()
        );

        let mut filled = Vec::with_capacity(unassigned.len());
        for i in unassigned {
            let Some(centroid) = fine.shapes()[i].centroid() else { continue };
            if let Some(nearest) = tree.nearest_neighbor(&[centroid.x(), centroid.y()]) {
                self.parents[i] = Some(nearest.data);
                filled.push(i);
            }
        }
        filled
    }
}

/// Check that two layers can be overlaid. Unknown CRS on either side is accepted.
pub fn check_crs(fine: &Geometries, coarse: &Geometries) -> Result<(), AssignError> {
    match (fine.epsg(), coarse.epsg()) {
        (Some(a), Some(b)) if a != b => Err(AssignError::CrsMismatch { fine: a, coarse: b }),
        _ => Ok(()),
    }
}

/// Relative difference below which two overlap areas count as a tie.
pub const TIE_TOLERANCE: f64 = 1e-7;

/// Assign each shape of `fine` to the shape of `coarse` it overlaps the most.
///
/// Candidates are visited in ascending index and replaced only by a strictly
/// larger intersection area (beyond [`TIE_TOLERANCE`]), so ties go to the
/// lowest coarse index. Shapes with no positive-area overlap are left unassigned.
pub fn assign(fine: &Geometries, coarse: &Geometries) -> Result<Assignment, AssignError> {
    check_crs(fine, coarse)?;

    let parents = fine.shapes().iter()
        .map(|shape| {
            let mut best: Option<(u32, f64)> = None;
            for j in coarse.candidates(shape) {
                let area = shape.intersection(&coarse.shapes()[j]).unsigned_area();
                if area > 0.0 && best.is_none_or(|(_, best_area)| area > best_area * (1.0 + TIE_TOLERANCE)) {
                    best = Some((j as u32, area));
                }
            }
            best.map(|(j, _)| j)
        })
        .collect();

    Ok(Assignment { parents })
}
