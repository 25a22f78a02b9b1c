//! GeoJSON reading and writing of geometry sets.

use std::{collections::BTreeMap, fs::File, io::{BufReader, BufWriter}, path::Path};

use anyhow::{anyhow, bail, Context, Result};
use geo::{Coord, LineString, MultiPolygon, Polygon};
use polars::prelude::{AnyValue, Column, DataFrame};
use serde_json::{json, Map, Value};

use crate::{layer::GeometrySet, types::GeoType};

/// Parse an EPSG code out of a legacy `crs.properties.name` member.
/// Accepts `urn:ogc:def:crs:EPSG::4269`, `EPSG:4269` and `CRS84`.
fn parse_crs_name(name: &str) -> Option<u32> {
    let code = name.rsplit(':').next()?;
    if code.eq_ignore_ascii_case("CRS84") { return Some(4326) }
    code.parse().ok()
}

fn parse_position(value: &Value) -> Result<Coord<f64>> {
    let pair = value.as_array()
        .filter(|pair| pair.len() >= 2)
        .ok_or_else(|| anyhow!("[io::geojson] Invalid position: {value}"))?;
    let x = pair[0].as_f64().ok_or_else(|| anyhow!("[io::geojson] Invalid coordinate: x must be a number"))?;
    let y = pair[1].as_f64().ok_or_else(|| anyhow!("[io::geojson] Invalid coordinate: y must be a number"))?;
    Ok(Coord { x, y })
}

fn parse_ring(value: &Value) -> Result<LineString<f64>> {
    let mut points = value.as_array()
        .ok_or_else(|| anyhow!("[io::geojson] Invalid ring"))?
        .iter()
        .map(parse_position)
        .collect::<Result<Vec<_>>>()?;

    // Ensure ring is closed
    if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
        if first != last { points.push(first) }
    }
    Ok(LineString(points))
}

/// `[exterior, hole, hole, ...]`
fn parse_polygon(value: &Value) -> Result<Option<Polygon<f64>>> {
    let rings = value.as_array().ok_or_else(|| anyhow!("[io::geojson] Invalid polygon"))?;
    let Some((exterior, interiors)) = rings.split_first() else { return Ok(None) };
    Ok(Some(Polygon::new(
        parse_ring(exterior)?,
        interiors.iter().map(parse_ring).collect::<Result<_>>()?,
    )))
}

/// Parse a `Polygon` or `MultiPolygon` geometry. A null geometry reads as empty.
fn parse_geometry(geometry: &Value) -> Result<MultiPolygon<f64>> {
    if geometry.is_null() { return Ok(MultiPolygon::new(vec![])) }

    let coords = &geometry["coordinates"];
    match geometry["type"].as_str() {
        Some("Polygon") => Ok(MultiPolygon::new(parse_polygon(coords)?.into_iter().collect())),
        Some("MultiPolygon") => Ok(MultiPolygon::new(
            coords.as_array()
                .ok_or_else(|| anyhow!("[io::geojson] Invalid MultiPolygon coordinates"))?
                .iter()
                .filter_map(|polygon| parse_polygon(polygon).transpose())
                .collect::<Result<_>>()?
        )),
        other => bail!("[io::geojson] Unsupported geometry type {other:?}"),
    }
}

/// Read GEOIDs from a property that may be text or a number.
fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Build one column from per-feature property values. Integral numbers
/// become Int64, other numbers Float64, anything else text.
fn property_column(name: &str, values: &[Value]) -> Column {
    let present = || values.iter().filter(|value| !value.is_null());

    if present().all(|value| value.as_i64().is_some()) {
        Column::new(name.into(), values.iter().map(Value::as_i64).collect::<Vec<_>>())
    } else if present().all(Value::is_number) {
        Column::new(name.into(), values.iter().map(Value::as_f64).collect::<Vec<_>>())
    } else {
        let text = values.iter()
            .map(|value| match value {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            })
            .collect::<Vec<_>>();
        Column::new(name.into(), text)
    }
}

/// Parse a GeoJSON `FeatureCollection` into a set. The GEOID of each feature
/// is read from `id_property`; every other property becomes an attribute column.
pub(crate) fn geometry_set_from_geojson(value: &Value, name: &str, ty: GeoType, id_property: &str) -> Result<GeometrySet> {
    let features = value["features"].as_array()
        .ok_or_else(|| anyhow!("[io::geojson] {name}: not a FeatureCollection"))?;
    let epsg = value["crs"]["properties"]["name"].as_str().and_then(parse_crs_name);

    let mut ids = Vec::with_capacity(features.len());
    let mut shapes = Vec::with_capacity(features.len());
    let mut properties: BTreeMap<String, Vec<Value>> = BTreeMap::new();

    for (i, feature) in features.iter().enumerate() {
        let props = feature["properties"].as_object().cloned().unwrap_or_default();
        let id = props.get(id_property).and_then(id_text)
            .ok_or_else(|| anyhow!("[io::geojson] {name}: feature {i} has no {id_property:?} property"))?;

        shapes.push(parse_geometry(&feature["geometry"])
            .with_context(|| format!("[io::geojson] {name}: feature {id}"))?);

        for (key, value) in props {
            if key == id_property { continue }
            properties.entry(key).or_insert_with(|| vec![Value::Null; i]).push(value);
        }
        for values in properties.values_mut() {
            values.resize(i + 1, Value::Null);
        }
        ids.push(id);
    }

    let mut set = GeometrySet::new(name, ty, ids.clone(), shapes, epsg)
        .with_context(|| format!("[io::geojson] {name}: invalid units"))?;

    if !properties.is_empty() {
        let df = DataFrame::new(
            std::iter::once(Column::new(id_property.into(), ids))
                .chain(properties.iter()
                    .filter(|(key, _)| key.as_str() != GeometrySet::ID_COLUMN)
                    .map(|(key, values)| property_column(key, values)))
                .collect()
        )?;
        set.merge_data(df, id_property)?;
    }

    Ok(set)
}

/// Reads a GeoJSON file from `path` into a set.
pub(crate) fn read_geojson(path: &Path, name: &str, ty: GeoType, id_property: &str) -> Result<GeometrySet> {
    let file = File::open(path)
        .with_context(|| format!("[io::geojson] Failed to open GeoJSON file: {}", path.display()))?;
    let value: Value = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("[io::geojson] Failed to parse GeoJSON from {:?}", path))?;
    geometry_set_from_geojson(&value, name, ty, id_property)
}

fn ring_coords(ring: &LineString<f64>) -> Value {
    Value::Array(ring.coords().map(|c| json!([c.x, c.y])).collect())
}

fn any_value_to_json(value: AnyValue) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => json!(b),
        AnyValue::String(s) => json!(s),
        AnyValue::StringOwned(s) => json!(s.as_str()),
        AnyValue::Int8(v) => json!(v),
        AnyValue::Int16(v) => json!(v),
        AnyValue::Int32(v) => json!(v),
        AnyValue::Int64(v) => json!(v),
        AnyValue::UInt8(v) => json!(v),
        AnyValue::UInt16(v) => json!(v),
        AnyValue::UInt32(v) => json!(v),
        AnyValue::UInt64(v) => json!(v),
        AnyValue::Float32(v) => json!(v),
        AnyValue::Float64(v) => json!(v),
        other => json!(other.to_string()),
    }
}

/// Serialize a set as a GeoJSON `FeatureCollection`, its GEOIDs written to
/// `id_property` and every attribute column as a property.
pub(crate) fn geometry_set_to_geojson(set: &GeometrySet, id_property: &str) -> Result<Value> {
    let columns = set.data().get_columns().iter()
        .filter(|column| column.name().as_str() != GeometrySet::ID_COLUMN)
        .collect::<Vec<_>>();

    let features = set.geo_ids().iter().zip(set.shapes()).enumerate()
        .map(|(row, (geo_id, shape))| {
            let mut properties = Map::new();
            properties.insert(id_property.to_string(), json!(geo_id.id()));
            for column in &columns {
                properties.insert(column.name().to_string(), any_value_to_json(column.get(row)?));
            }

            let polygons = shape.0.iter()
                .map(|polygon| Value::Array(
                    std::iter::once(polygon.exterior())
                        .chain(polygon.interiors())
                        .map(ring_coords)
                        .collect()
                ))
                .collect::<Vec<_>>();

            Ok(json!({
                "type": "Feature",
                "geometry": { "type": "MultiPolygon", "coordinates": polygons },
                "properties": properties,
            }))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut collection = json!({
        "type": "FeatureCollection",
        "features": features,
    });
    if let Some(epsg) = set.epsg() {
        collection["crs"] = json!({
            "type": "name",
            "properties": { "name": format!("urn:ogc:def:crs:EPSG::{epsg}") },
        });
    }
    Ok(collection)
}

/// Write a set to a GeoJSON file at `path`.
pub(crate) fn write_geojson(set: &GeometrySet, path: &Path, id_property: &str) -> Result<()> {
    let value = geometry_set_to_geojson(set, id_property)?;
    let file = File::create(path)
        .with_context(|| format!("[io::geojson] Failed to create GeoJSON file: {}", path.display()))?;
    serde_json::to_writer(BufWriter::new(file), &value)
        .with_context(|| format!("[io::geojson] Failed to write GeoJSON to {:?}", path))
}
