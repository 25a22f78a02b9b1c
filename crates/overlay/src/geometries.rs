use geo::{Area, BoundingRect, Centroid, Coord, MultiPolygon, Point, Rect};
use rstar::{RTree, AABB};

use crate::bbox::BoundingBox;

/// An indexed collection of MultiPolygons with an optional EPSG code.
///
/// Shapes keep their input order; the R-tree only holds bounding boxes and
/// refers back to shapes by index. Empty shapes have no bounding box and are
/// never returned by spatial queries.
#[derive(Debug, Clone)]
pub struct Geometries {
    shapes: Vec<MultiPolygon<f64>>,
    rtree: RTree<BoundingBox>,
    epsg: Option<u32>,
}

impl Geometries {
    /// Construct a Geometries object from a vector of MultiPolygons.
    pub fn new(shapes: Vec<MultiPolygon<f64>>, epsg: Option<u32>) -> Self {
        Self {
            rtree: Self::build_rtree(&shapes),
            shapes,
            epsg,
        }
    }

    fn build_rtree(shapes: &[MultiPolygon<f64>]) -> RTree<BoundingBox> {
        RTree::bulk_load(
            shapes.iter().enumerate()
                .filter_map(|(i, shape)| shape.bounding_rect().map(|rect| BoundingBox::new(i, rect)))
                .collect()
        )
    }

    /// Get the number of MultiPolygons.
    #[inline] pub fn len(&self) -> usize { self.shapes.len() }

    /// Check if there are no MultiPolygons.
    #[inline] pub fn is_empty(&self) -> bool { self.shapes.is_empty() }

    /// Get a reference to the list of MultiPolygons.
    #[inline] pub fn shapes(&self) -> &[MultiPolygon<f64>] { &self.shapes }

    /// Get the EPSG code, if known.
    #[inline] pub fn epsg(&self) -> Option<u32> { self.epsg }

    /// Consume the collection, returning its shapes.
    #[inline] pub fn into_shapes(self) -> Vec<MultiPolygon<f64>> { self.shapes }

    /// Indices of shapes whose bounding box intersects `envelope`, in ascending order.
    pub fn query(&self, envelope: &AABB<[f64; 2]>) -> Vec<usize> {
        let mut found = self.rtree
            .locate_in_envelope_intersecting(envelope)
            .map(|bb| bb.idx())
            .collect::<Vec<_>>();
        found.sort_unstable();
        found
    }

    /// Indices of shapes whose bounding box intersects the bounding box of `shape`.
    pub fn candidates(&self, shape: &MultiPolygon<f64>) -> Vec<usize> {
        let Some(rect) = shape.bounding_rect() else { return Vec::new() };
        self.query(&AABB::from_corners(rect.min().into(), rect.max().into()))
    }

    /// Replace every shape with `f(shape)` and rebuild the index.
    pub fn map_shapes<F>(&mut self, f: F)
    where
        F: FnMut(&MultiPolygon<f64>) -> MultiPolygon<f64>,
    {
        self.shapes = self.shapes.iter().map(f).collect();
        self.rtree = Self::build_rtree(&self.shapes);
    }

    /// Replace all shapes with `shapes` under a new EPSG code.
    pub fn replace(&mut self, shapes: Vec<MultiPolygon<f64>>, epsg: Option<u32>) {
        self.rtree = Self::build_rtree(&shapes);
        self.shapes = shapes;
        self.epsg = epsg;
    }

    /// Compute the planar (unsigned) area of every shape.
    pub fn areas(&self) -> Vec<f64> {
        self.shapes.iter().map(|shape| shape.unsigned_area()).collect()
    }

    /// Compute the centroids of all MultiPolygons (None for empty shapes).
    pub fn centroids(&self) -> Vec<Option<Point<f64>>> {
        self.shapes.iter().map(|shape| shape.centroid()).collect()
    }

    /// Compute the bounding rectangle of all MultiPolygons.
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.shapes.iter()
            .filter_map(|polygon| polygon.bounding_rect())
            .reduce(|a, b| Rect::new(
                Coord {
                    x: a.min().x.min(b.min().x),
                    y: a.min().y.min(b.min().y),
                },
                Coord {
                    x: a.max().x.max(b.max().x),
                    y: a.max().y.max(b.max().y),
                }
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{polygon, MultiPolygon};

    fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon::new(vec![polygon![
            (x: x, y: y),
            (x: x + size, y: y),
            (x: x + size, y: y + size),
            (x: x, y: y + size),
            (x: x, y: y),
        ]])
    }

    #[test]
    fn query_returns_sorted_indices() {
        let geoms = Geometries::new(vec![square(2.0, 0.0, 1.0), square(0.0, 0.0, 1.0), square(1.0, 0.0, 1.0)], None);
        let found = geoms.candidates(&square(0.5, 0.25, 2.0));
        assert_eq!(found, vec![0, 1, 2]);
    }

    #[test]
    fn empty_shapes_are_not_indexed() {
        let geoms = Geometries::new(vec![MultiPolygon::new(vec![]), square(0.0, 0.0, 1.0)], Some(4269));
        assert_eq!(geoms.len(), 2);
        assert_eq!(geoms.candidates(&square(0.0, 0.0, 1.0)), vec![1]);
        assert!(geoms.centroids()[0].is_none());
    }

    #[test]
    fn bounds_cover_all_shapes() {
        let geoms = Geometries::new(vec![square(0.0, 0.0, 1.0), square(3.0, 4.0, 1.0)], None);
        let bounds = geoms.bounds().unwrap();
        assert_eq!(bounds.min(), Coord { x: 0.0, y: 0.0 });
        assert_eq!(bounds.max(), Coord { x: 4.0, y: 5.0 });
    }

    #[test]
    fn areas_are_unsigned() {
        let geoms = Geometries::new(vec![square(0.0, 0.0, 2.0)], None);
        assert_eq!(geoms.areas(), vec![4.0]);
    }
}
