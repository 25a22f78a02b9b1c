use ahash::AHashMap;
use geo::MultiPolygon;
use overlay::Geometries;
use polars::prelude::{Column, DataFrame};

use crate::{error::{EngineError, Result}, types::{GeoId, GeoType}};

/// One level of a geographic hierarchy: units with unique GEOIDs, their
/// geometries, and an attribute table.
///
/// Units are kept in ascending GEOID order. Row `i` of `data`, shape `i` of
/// `geoms` and `geo_ids[i]` always describe the same unit.
#[derive(Debug, Clone)]
pub struct GeometrySet {
    pub(super) name: String,
    pub(super) ty: GeoType,
    pub(super) geo_ids: Vec<GeoId>,
    pub(super) index: AHashMap<GeoId, u32>,
    pub(super) data: DataFrame, // "geo_id" column followed by attributes
    pub(super) geoms: Geometries,
}

impl GeometrySet {
    /// Name of the GEOID column in the attribute table.
    pub const ID_COLUMN: &'static str = "geo_id";

    /// Build a set from parallel lists of ids and shapes. Units are sorted by
    /// GEOID; duplicate ids are rejected.
    pub fn new(
        name: &str,
        ty: GeoType,
        ids: Vec<String>,
        shapes: Vec<MultiPolygon<f64>>,
        epsg: Option<u32>,
    ) -> Result<Self> {
        if ids.len() != shapes.len() {
            return Err(EngineError::LengthMismatch {
                what: format!("{name} geometries"),
                expected: ids.len(),
                found: shapes.len(),
            });
        }

        let mut units = ids.into_iter().zip(shapes).collect::<Vec<_>>();
        units.sort_by(|a, b| a.0.cmp(&b.0));
        if let Some(pair) = units.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(EngineError::DuplicateGeoId(pair[0].0.clone()));
        }

        let (ids, shapes): (Vec<String>, Vec<MultiPolygon<f64>>) = units.into_iter().unzip();
        let geo_ids = ids.iter().map(|id| GeoId::new(ty, id)).collect::<Vec<_>>();

        Ok(Self {
            name: name.to_string(),
            ty,
            index: geo_ids.iter().enumerate()
                .map(|(i, geo_id)| (geo_id.clone(), i as u32))
                .collect(),
            data: DataFrame::new(vec![Column::new(Self::ID_COLUMN.into(), ids)])?,
            geo_ids,
            geoms: Geometries::new(shapes, epsg),
        })
    }

    /// Label used in messages and reports, e.g. "blocks".
    #[inline] pub fn name(&self) -> &str { &self.name }

    #[inline] pub fn ty(&self) -> GeoType { self.ty }

    /// Get the number of units.
    #[inline] pub fn len(&self) -> usize { self.geo_ids.len() }

    /// Check if the set has no units.
    #[inline] pub fn is_empty(&self) -> bool { self.geo_ids.is_empty() }

    #[inline] pub fn geo_ids(&self) -> &[GeoId] { &self.geo_ids }

    /// Position of a unit by GEOID.
    #[inline] pub fn position(&self, geo_id: &GeoId) -> Option<usize> {
        self.index.get(geo_id).map(|&i| i as usize)
    }

    /// Position of a unit by GEOID text.
    #[inline] pub fn position_of(&self, id: &str) -> Option<usize> {
        self.position(&GeoId::new(self.ty, id))
    }

    #[inline] pub fn data(&self) -> &DataFrame { &self.data }

    #[inline] pub fn geometries(&self) -> &Geometries { &self.geoms }

    #[inline] pub fn shapes(&self) -> &[MultiPolygon<f64>] { self.geoms.shapes() }

    #[inline] pub fn epsg(&self) -> Option<u32> { self.geoms.epsg() }
}
