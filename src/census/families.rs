use crate::census::is_cvap_code;

/// Columns split by the weight they must be prorated with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeightFamilies {
    /// Total-population style columns, prorated by the population weight.
    pub population: Vec<String>,
    /// Voting-age style columns (VAP, CVAP), prorated by the VAP weight.
    pub voting_age: Vec<String>,
}

impl WeightFamilies {
    /// Split `columns` on whether their name contains `marker` (usually "VAP").
    /// CVAP line codes (`<line>_<year>`) always land in the voting-age family.
    /// Columns listed in `exclude` (ids, weights) are skipped.
    pub fn partition(columns: &[String], marker: &str, exclude: &[&str]) -> Self {
        let (voting_age, population): (Vec<String>, Vec<String>) = columns.iter()
            .filter(|column| !exclude.contains(&column.as_str()))
            .cloned()
            .partition(|column| column.contains(marker) || is_cvap_code(column));
        Self { population, voting_age }
    }

    /// All columns, population family first.
    pub fn all(&self) -> Vec<String> {
        self.population.iter().chain(&self.voting_age).cloned().collect()
    }
}
