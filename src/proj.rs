use std::cell::Cell;

use geo::{Coord, MapCoords, MultiPolygon};
use proj4rs::{proj::Proj as Proj4, transform::transform};

use crate::{error::{EngineError, Result}, layer::GeometrySet};

/// A supported coordinate reference system.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Crs {
    /// Geographic lon/lat in degrees.
    Geographic { nad83: bool },
    /// Universal Transverse Mercator in meters.
    Utm { zone: u32, south: bool, nad83: bool },
}

impl Crs {
    /// Look up an EPSG code.
    /// - 4269 (NAD83) and 4326 (WGS84) lon/lat
    /// - 269zz NAD83 UTM north, 326zz / 327zz WGS84 UTM north / south
    fn from_epsg(epsg: u32) -> Result<Self> {
        let crs = match epsg {
            4269 | 4937 => Crs::Geographic { nad83: true },
            4326 => Crs::Geographic { nad83: false },
            26901..=26923 => Crs::Utm { zone: epsg - 26900, south: false, nad83: true },
            32601..=32660 => Crs::Utm { zone: epsg - 32600, south: false, nad83: false },
            32701..=32760 => Crs::Utm { zone: epsg - 32700, south: true, nad83: false },
            _ => return Err(EngineError::UnsupportedCrs(epsg)),
        };
        Ok(crs)
    }

    /// Build the PROJ.4 string for this CRS.
    fn proj4(&self) -> String {
        let datum = |nad83: bool| if nad83 { "NAD83" } else { "WGS84" };
        match *self {
            Crs::Geographic { nad83 } =>
                format!("+proj=longlat +datum={} +no_defs +type=crs", datum(nad83)),
            Crs::Utm { zone, south, nad83 } => {
                let south = if south { " +south" } else { "" };
                format!("+proj=utm +zone={zone}{south} +datum={} +units=m +no_defs +type=crs", datum(nad83))
            }
        }
    }

    #[inline] fn is_geographic(&self) -> bool { matches!(self, Crs::Geographic { .. }) }
}

/// Reproject shapes between two EPSG codes.
pub(crate) fn reproject(shapes: &[MultiPolygon<f64>], from: u32, to: u32) -> Result<Vec<MultiPolygon<f64>>> {
    let (from_crs, to_crs) = (Crs::from_epsg(from)?, Crs::from_epsg(to)?);

    let build = |crs: Crs| {
        let proj_string = crs.proj4();
        Proj4::from_proj_string(&proj_string)
            .map_err(|e| EngineError::Projection(format!("failed to build PROJ.4 {proj_string}: {e}")))
    };
    let (source, target) = (build(from_crs)?, build(to_crs)?);

    let failed = Cell::new(None);
    let projected = shapes.iter()
        .map(|shape| shape.map_coords(|coord: Coord<f64>| {
            let mut point = if from_crs.is_geographic() {
                (coord.x.to_radians(), coord.y.to_radians(), 0.0)
            } else {
                (coord.x, coord.y, 0.0)
            };
            if let Err(e) = transform(&source, &target, &mut point) {
                failed.set(Some(format!("EPSG:{from} -> EPSG:{to} at ({}, {}): {e}", coord.x, coord.y)));
            }
            if to_crs.is_geographic() {
                Coord { x: point.0.to_degrees(), y: point.1.to_degrees() }
            } else {
                Coord { x: point.0, y: point.1 }
            }
        }))
        .collect::<Vec<_>>();

    match failed.into_inner() {
        Some(msg) => Err(EngineError::Projection(msg)),
        None => Ok(projected),
    }
}

impl GeometrySet {
    /// Reproject all geometries of this set to `epsg`. No-op if already there.
    pub fn to_crs(&mut self, epsg: u32) -> Result<()> {
        let Some(from) = self.epsg() else {
            return Err(EngineError::Projection(format!("{} has no known CRS", self.name())));
        };
        if from == epsg { return Ok(()) }

        let shapes = reproject(self.shapes(), from, epsg)?;
        self.replace_geometries(shapes, Some(epsg));
        Ok(())
    }
}
