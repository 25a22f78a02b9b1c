//! Preparation of block-group ACS tables pulled from the census API.

use polars::prelude::*;

use crate::{
    census::variables,
    error::{EngineError, Result},
    types::{GeoId, GeoType},
};

/// How raw ACS variables map onto the prepared table.
#[derive(Debug, Clone, PartialEq)]
pub struct AcsSchema {
    /// Column holding census API ids (`1500000US...`).
    pub id_column: String,
    /// Raw variable to friendly name, in output order.
    pub renames: Vec<(String, String)>,
    /// Friendly name to the raw variables summed into it.
    pub groups: Vec<(String, Vec<String>)>,
    /// `(output, total, complement)`: `output = total - complement`, on friendly names.
    pub differences: Vec<(String, String, String)>,
}

impl AcsSchema {
    /// Race and ethnicity totals plus voting-age population, suffixed by the
    /// two-digit year (`TOTPOP19`, `VAP19`, ...).
    pub fn standard(year: u16) -> Self {
        let yy = format!("{:02}", year % 100);
        let name = |base: &str| format!("{base}{yy}");

        let renames = [
            ("B01001_001E", "TOTPOP"),
            ("B02001_002E", "WHITE"),
            ("B02001_003E", "BLACK"),
            ("B02001_004E", "AMIN"),
            ("B02001_005E", "ASIAN"),
            ("B02001_006E", "NHPI"),
            ("B02001_007E", "OTH"),
            ("B02001_008E", "2MORE"),
            ("B03002_002E", "NHISP"),
        ].into_iter()
            .map(|(raw, base)| (raw.to_string(), name(base)))
            .collect();

        // Sex by age, 18 and over, male then female.
        let vap = variables("B01001", 7, 25, "E").into_iter()
            .chain(variables("B01001", 31, 49, "E"))
            .collect();

        Self {
            id_column: "GEO_ID".into(),
            renames,
            groups: vec![(name("VAP"), vap)],
            differences: vec![(name("HISP"), name("TOTPOP"), name("NHISP"))],
        }
    }

    /// Every raw variable this schema reads.
    pub fn raw_variables(&self) -> Vec<String> {
        self.renames.iter().map(|(raw, _)| raw.clone())
            .chain(self.groups.iter().flat_map(|(_, raws)| raws.iter().cloned()))
            .collect()
    }

    /// Output columns after the id, in order.
    pub fn output_columns(&self) -> Vec<String> {
        self.renames.iter().map(|(_, name)| name.clone())
            .chain(self.groups.iter().map(|(name, _)| name.clone()))
            .chain(self.differences.iter().map(|(name, _, _)| name.clone()))
            .collect()
    }
}

/// A prepared ACS table.
#[derive(Debug, Clone)]
pub struct AcsTable {
    /// `GEOID` followed by [`AcsSchema::output_columns`].
    pub data: DataFrame,
    /// Raw variables that sum to zero, usually not reported at block-group level.
    pub zero_columns: Vec<String>,
}

fn raw_column(raw: &DataFrame, name: &str) -> Result<Vec<f64>> {
    let column = raw.column(name).map_err(|_| EngineError::MissingColumn {
        set: "ACS table".into(),
        column: name.into(),
    })?;
    Ok(column.cast(&DataType::Float64)?.f64()?.into_iter().map(|v| v.unwrap_or(0.0)).collect())
}

/// Build the prepared table from raw API rows.
pub fn prepare_acs(raw: &DataFrame, schema: &AcsSchema) -> Result<AcsTable> {
    let ids = raw.column(&schema.id_column)
        .map_err(|_| EngineError::MissingColumn { set: "ACS table".into(), column: schema.id_column.clone() })?
        .cast(&DataType::String)?;
    let ids = ids.str()?.into_iter()
        .map(|id| id.map(|id| GeoId::from_census_api(GeoType::Group, id).id().to_string()))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| EngineError::MalformedTable(format!("null {} in ACS table", schema.id_column)))?;

    let mut zero_columns = Vec::new();
    let mut check_zero = |name: &str, values: &[f64]| {
        if values.iter().sum::<f64>() == 0.0 && !zero_columns.iter().any(|c| c == name) {
            zero_columns.push(name.to_string());
        }
    };

    let mut columns: Vec<(String, Vec<f64>)> = Vec::new();
    for (raw_name, name) in &schema.renames {
        let values = raw_column(raw, raw_name)?;
        check_zero(raw_name, &values);
        columns.push((name.clone(), values));
    }

    for (name, members) in &schema.groups {
        let mut sum = vec![0.0; raw.height()];
        for member in members {
            let values = raw_column(raw, member)?;
            check_zero(member, &values);
            sum.iter_mut().zip(values).for_each(|(s, v)| *s += v);
        }
        columns.push((name.clone(), sum));
    }

    for (name, total, complement) in &schema.differences {
        let find = |wanted: &str| columns.iter()
            .find(|(name, _)| name == wanted)
            .map(|(_, values)| values)
            .ok_or_else(|| EngineError::MissingColumn { set: "ACS table".into(), column: wanted.into() });
        let values = find(total)?.iter().zip(find(complement)?)
            .map(|(t, c)| t - c)
            .collect();
        columns.push((name.clone(), values));
    }

    let data = DataFrame::new(
        std::iter::once(Column::new("GEOID".into(), ids))
            .chain(columns.into_iter().map(|(name, values)| Column::new(name.into(), values)))
            .collect()
    )?;

    Ok(AcsTable { data, zero_columns })
}
