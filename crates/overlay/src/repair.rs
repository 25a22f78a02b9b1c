use geo::{BooleanOps, MultiPolygon};

use crate::Geometries;

/// Zero-width repair: resolve self-intersections and overlapping parts by
/// folding the parts of the shape into a union one polygon at a time. Valid
/// shapes come back with the same area; invalid ones come back valid.
pub fn repair(shape: &MultiPolygon<f64>) -> MultiPolygon<f64> {
    union_all(std::iter::once(shape))
}

/// Union every shape in `shapes` into a single MultiPolygon.
///
/// Parts are merged one polygon at a time so overlapping parts within a
/// single shape are counted once.
pub fn union_all<'a, I>(shapes: I) -> MultiPolygon<f64>
where
    I: IntoIterator<Item = &'a MultiPolygon<f64>>,
{
    shapes.into_iter()
        .flat_map(|shape| shape.0.iter())
        .fold(MultiPolygon::new(vec![]), |acc, part| acc.union(part))
}

/// Union shapes by group; `groups[k]` lists the indices merged into output `k`.
pub fn union_groups(shapes: &[MultiPolygon<f64>], groups: &[Vec<usize>]) -> Vec<MultiPolygon<f64>> {
    groups.iter()
        .map(|group| union_all(group.iter().map(|&i| &shapes[i])))
        .collect()
}

impl Geometries {
    /// Apply [`repair`] to every shape. Returns the number of shapes whose
    /// area changed by more than `tol` (relative).
    pub fn repair_all(&mut self, tol: f64) -> usize {
        let before = self.areas();
        self.map_shapes(repair);
        before.iter().zip(self.areas())
            .filter(|&(&a, b)| (a - b).abs() > tol * a.abs().max(f64::MIN_POSITIVE))
            .count()
    }
}
