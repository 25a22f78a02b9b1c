use std::fmt;
use std::str::FromStr;

use anyhow::bail;

/// Level of the geographic hierarchy a set of units belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GeoType {
    State,      // Highest-level entity
    County,     // County -> State
    Tract,      // Tract -> County
    Group,      // Group -> Tract
    Block,      // Block -> Group
    VTD,        // VTD -> County
    Custom,     // Wards, precincts, districts: ids carry no hierarchy
}

impl GeoType {
    /// Census levels nested by GEOID prefix, from coarsest to finest.
    pub const NESTED: [GeoType; 5] = [
        GeoType::State,
        GeoType::County,
        GeoType::Tract,
        GeoType::Group,
        GeoType::Block,
    ];

    pub fn to_str(&self) -> &'static str {
        match self {
            GeoType::State => "state",
            GeoType::County => "county",
            GeoType::Tract => "tract",
            GeoType::Group => "group",
            GeoType::Block => "block",
            GeoType::VTD => "vtd",
            GeoType::Custom => "custom",
        }
    }

    /// Length of a GEOID at this level, if the level has a fixed format.
    pub fn id_len(&self) -> Option<usize> {
        match self {
            GeoType::State => Some(2),
            GeoType::County => Some(5),
            GeoType::Tract => Some(11),
            GeoType::Group => Some(12),
            GeoType::Block => Some(15),
            GeoType::VTD | GeoType::Custom => None,
        }
    }

    /// True if every unit of `self` lies inside exactly one unit of `parent`
    /// identified by a prefix of its GEOID.
    pub fn nests_in(&self, parent: GeoType) -> bool {
        match (self.id_len(), parent.id_len()) {
            (Some(child), Some(parent)) => parent < child,
            _ => false,
        }
    }
}

impl fmt::Display for GeoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_str())
    }
}

impl FromStr for GeoType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Ok(match s.to_ascii_lowercase().as_str() {
            "state" => GeoType::State,
            "county" => GeoType::County,
            "tract" => GeoType::Tract,
            "group" | "bg" | "bgs" | "blockgroup" => GeoType::Group,
            "block" | "blocks" => GeoType::Block,
            "vtd" => GeoType::VTD,
            "custom" | "ward" | "precinct" | "district" => GeoType::Custom,
            other => bail!("unknown geography level: {other:?}"),
        })
    }
}
