mod data;
mod geom;
mod io;
mod layer;

pub use layer::GeometrySet;
