use std::fmt;
use std::sync::Arc;

use super::GeoType;

/// Stable key for a geographic unit.
/// Keeps the GEOID text as read (with leading zeros) but avoids repeated owned Strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeoId {
    ty: GeoType,
    id: Arc<str>, // e.g., "27053" for county, "270530001001001" for block
}

impl GeoId {
    pub fn new(ty: GeoType, id: &str) -> Self {
        Self { ty, id: Arc::from(id) }
    }

    #[inline] pub fn ty(&self) -> GeoType { self.ty }

    #[inline] pub fn id(&self) -> &str { &self.id }

    /// Parse an identifier as published by the census API (`GEO_ID`), e.g.
    /// `1500000US270530001001` for a block group. The summary-level prefix up to
    /// and including `US` is dropped; ids without it are kept as-is.
    pub fn from_census_api(ty: GeoType, raw: &str) -> Self {
        let id = raw.split_once("US").map_or(raw, |(_, id)| id).trim();
        Self::new(ty, id)
    }

    /// Returns a new `GeoId` corresponding to the higher-level `GeoType`
    /// by truncating this GeoId's string to the correct prefix length.
    /// Returns None if the parent level has no fixed prefix.
    pub fn to_parent(&self, parent_ty: GeoType) -> Option<GeoId> {
        let len = parent_ty.id_len()?;

        // If the id is shorter than expected, just take the full id.
        Some(GeoId {
            ty: parent_ty,
            id: Arc::from(&self.id[..self.id.len().min(len)]),
        })
    }
}

impl fmt::Display for GeoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
