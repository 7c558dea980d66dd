use indexmap::IndexMap;
use itertools::Itertools;
use std::collections::HashMap;

use crate::error::{HarnessError, Result};

/// Validated table from algorithm name to its 1-based row in the report.
///
/// Row 0 is the `Method` header. Iteration follows insertion order, which is
/// also the order algorithms appear in every sweep result.
#[derive(Debug, Clone, PartialEq)]
pub struct RowMapping {
    rows: IndexMap<String, usize>,
}

impl RowMapping {
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        let mut rows: IndexMap<String, usize> = IndexMap::new();
        let mut owners: HashMap<usize, String> = HashMap::new();

        for (name, row) in entries {
            let name: String = name.into();
            if name.trim().is_empty() {
                return Err(HarnessError::InvalidMapping(
                    "algorithm name must not be empty".into(),
                ));
            }
            if row == 0 {
                return Err(HarnessError::InvalidMapping(format!(
                    "{name} is mapped to row 0, which is the report header"
                )));
            }
            if let Some(other) = owners.get(&row) {
                return Err(HarnessError::InvalidMapping(format!(
                    "{name} and {other} both claim row {row}"
                )));
            }
            if rows.contains_key(&name) {
                return Err(HarnessError::InvalidMapping(format!(
                    "{name} is mapped more than once"
                )));
            }
            owners.insert(row, name.clone());
            rows.insert(name, row);
        }

        if rows.is_empty() {
            return Err(HarnessError::InvalidMapping(
                "at least one algorithm must be mapped".into(),
            ));
        }
        Ok(Self { rows })
    }

    /// Parse `NAME=ROW` pairs, e.g. from a command-line flag.
    pub fn from_pairs(pairs: &[String]) -> Result<Self> {
        let entries = pairs
            .iter()
            .map(|pair| {
                let (name, row) = pair.rsplit_once('=').ok_or_else(|| {
                    HarnessError::InvalidMapping(format!("expected NAME=ROW, got {pair:?}"))
                })?;
                let row = row.trim().parse::<usize>().map_err(|_| {
                    HarnessError::InvalidMapping(format!("row in {pair:?} is not an index"))
                })?;
                Ok((name.trim().to_string(), row))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(entries)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.rows.iter().map(|(name, row)| (name.as_str(), *row))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(|n| n.as_str())
    }

    pub fn row(&self, algorithm: &str) -> Option<usize> {
        self.rows.get(algorithm).copied()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn as_map(&self) -> &IndexMap<String, usize> {
        &self.rows
    }
}

impl std::fmt::Display for RowMapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let joined = self.iter().map(|(name, row)| format!("{name}={row}")).join(",");
        f.write_str(&joined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_insertion_order() {
        let m = RowMapping::new([("DIMSUM", 3), ("IMSUM", 1), ("DIMSUM++", 2)]).unwrap();
        let names: Vec<&str> = m.names().collect();
        assert_eq!(names, vec!["DIMSUM", "IMSUM", "DIMSUM++"]);
        assert_eq!(m.to_string(), "DIMSUM=3,IMSUM=1,DIMSUM++=2");
    }

    #[test]
    fn rejects_header_row() {
        let err = RowMapping::new([("ALG1", 0)]).unwrap_err();
        assert!(matches!(err, HarnessError::InvalidMapping(_)));
    }

    #[test]
    fn rejects_shared_row() {
        let err = RowMapping::new([("A", 1), ("B", 1)]).unwrap_err();
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn rejects_repeated_name_and_empty_table() {
        assert!(RowMapping::new([("A", 1), ("A", 2)]).is_err());
        assert!(RowMapping::new(Vec::<(String, usize)>::new()).is_err());
        assert!(RowMapping::new([(" ", 1)]).is_err());
    }

    #[test]
    fn parses_flag_pairs() {
        let pairs = vec!["IMSUM=1".to_string(), "DIMSUM++ = 2".to_string()];
        let m = RowMapping::from_pairs(&pairs).unwrap();
        assert_eq!(m.row("DIMSUM++"), Some(2));
        assert!(RowMapping::from_pairs(&["IMSUM".to_string()]).is_err());
        assert!(RowMapping::from_pairs(&["IMSUM=x".to_string()]).is_err());
    }
}
