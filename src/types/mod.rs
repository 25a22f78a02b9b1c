mod geo_id;
mod geo_type;

pub use geo_id::GeoId;
pub use geo_type::GeoType;
