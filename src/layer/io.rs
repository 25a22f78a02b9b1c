use std::path::Path;

use anyhow::Result;
use serde_json::Value;

use crate::{io::{csv, geojson}, types::GeoType};
use super::GeometrySet;

impl GeometrySet {
    /// Load a set from a GeoJSON `FeatureCollection`, reading GEOIDs from `id_property`.
    pub fn from_geojson_file(path: &Path, name: &str, ty: GeoType, id_property: &str) -> Result<Self> {
        geojson::read_geojson(path, name, ty, id_property)
    }

    /// Parse a set from an in-memory GeoJSON value.
    pub fn from_geojson(value: &Value, name: &str, ty: GeoType, id_property: &str) -> Result<Self> {
        geojson::geometry_set_from_geojson(value, name, ty, id_property)
    }

    /// Export the set as a GeoJSON `FeatureCollection` with every attribute as a property.
    pub fn to_geojson(&self, id_property: &str) -> Result<Value> {
        geojson::geometry_set_to_geojson(self, id_property)
    }

    pub fn to_geojson_file(&self, path: &Path, id_property: &str) -> Result<()> {
        geojson::write_geojson(self, path, id_property)
    }

    /// Write the attribute table (GEOID column named `id_column`) to CSV.
    pub fn to_csv_file(&self, path: &Path, id_column: &str) -> Result<()> {
        let mut df = self.data.clone();
        if id_column != Self::ID_COLUMN {
            df.rename(Self::ID_COLUMN, id_column.into())?;
        }
        csv::write_csv(&mut df, path)
    }

    /// Left-join a CSV table onto the set by `id_column`. Returns the number of
    /// units that found a row.
    pub fn adjoin_csv_file(&mut self, path: &Path, id_column: &str) -> Result<usize> {
        let df = csv::read_csv_with_id(path, id_column)?;
        Ok(self.merge_data(df, id_column)?)
    }
}
