use geo::MultiPolygon;

use super::GeometrySet;

impl GeometrySet {
    /// Apply the zero-width repair to every geometry. Returns the number of
    /// geometries whose area changed by more than `tol` (relative).
    pub fn repair_geometries(&mut self, tol: f64) -> usize {
        self.geoms.repair_all(tol)
    }

    /// Replace all geometries, keeping unit order.
    pub(crate) fn replace_geometries(&mut self, shapes: Vec<MultiPolygon<f64>>, epsg: Option<u32>) {
        debug_assert_eq!(shapes.len(), self.len());
        self.geoms.replace(shapes, epsg);
    }

    /// Planar area of every unit, in CRS units squared.
    pub fn areas(&self) -> Vec<f64> {
        self.geoms.areas()
    }
}
