use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::census::cvap::{column_code, KEPT_LINES};

/// Column code descriptions, keyed by year then by column code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Codebook(BTreeMap<String, BTreeMap<String, String>>);

impl Codebook {
    pub fn new() -> Self { Self::default() }

    /// Record the CVAP line codes for `year`, replacing any previous entry.
    pub fn insert_cvap_year(&mut self, year: u16) {
        let entry = KEPT_LINES.iter()
            .map(|&(line, description)| (column_code(line, year), description.to_string()))
            .collect();
        self.0.insert(year.to_string(), entry);
    }

    /// Merge `other` into `self`; years in `other` win.
    pub fn merge(&mut self, other: Codebook) {
        self.0.extend(other.0);
    }

    pub fn years(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn describe(&self, year: u16, code: &str) -> Option<&str> {
        self.0.get(&year.to_string())?.get(code).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cvap_years_are_keyed_by_code() {
        let mut book = Codebook::new();
        book.insert_cvap_year(2019);
        assert_eq!(book.describe(2019, "1_2019"), Some("Total CVAP"));
        assert_eq!(book.describe(2019, "13_2019"), Some("Hispanic or Latino"));
        assert_eq!(book.describe(2019, "2_2019"), None);
        assert_eq!(book.describe(2018, "1_2018"), None);
    }

    #[test]
    fn merging_keeps_other_years() {
        let mut old = Codebook::new();
        old.insert_cvap_year(2018);
        let mut new = Codebook::new();
        new.insert_cvap_year(2019);
        old.merge(new);
        assert_eq!(old.years().collect::<Vec<_>>(), vec!["2018", "2019"]);
    }

    #[test]
    fn serializes_as_nested_object() {
        let mut book = Codebook::new();
        book.insert_cvap_year(2019);
        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["2019"]["5_2019"], "Black or African American Alone");

        let back: Codebook = serde_json::from_value(json).unwrap();
        assert_eq!(back, book);
    }
}
