use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use crate::error::{RankraceError, RankraceResult};

/// Number of ranked entities kept per year unless a caller overrides it.
pub const DEFAULT_RANK_CAP: usize = 12;

/// One raw CSV row. Header names are matched exactly, including the space in
/// `Country name`.
#[derive(Debug, serde::Deserialize)]
struct RawRecord {
    #[serde(rename = "Year")]
    year: String,
    #[serde(rename = "Country name")]
    country: String,
    #[serde(rename = "Population")]
    population: String,
}

/// One entity's value in one year.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct EntityValue {
    pub name: String,
    pub value: u64,
}

/// The ranked entities of a single year.
///
/// `data` holds at most the rank cap, sorted descending by value (ties keep
/// input order). `total` sums every entity of the year group, not just the
/// ranked ones; that asymmetry is deliberate and must be preserved.
#[derive(Clone, Debug, serde::Serialize)]
pub struct YearSnapshot {
    pub year: i32,
    pub data: Vec<EntityValue>,
    pub total: u64,
}

impl YearSnapshot {
    /// Sum of the ranked (visible) entities only.
    pub fn ranked_sum(&self) -> u64 {
        self.data.iter().map(|e| e.value).sum()
    }
}

/// Ordered sequence of per-year snapshots, immutable once loaded.
#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct Dataset {
    snapshots: Vec<YearSnapshot>,
}

impl Dataset {
    /// Load a dataset from a CSV file path with the default rank cap.
    pub fn from_path(path: impl AsRef<Path>) -> RankraceResult<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            RankraceError::validation(format!("failed to open '{}': {e}", path.display()))
        })?;
        Self::from_reader(file, DEFAULT_RANK_CAP)
    }

    /// Load a dataset from any reader.
    ///
    /// Rows are grouped by distinct `Year` in first-seen order (the input is
    /// assumed chronologically ordered, so years are not re-sorted). Each
    /// group is mapped to entity values, stable-sorted descending, and
    /// truncated to `rank_cap`; the group total is computed before truncation.
    ///
    /// Malformed rows are rejected with [`RankraceError::DataValidation`]
    /// naming the offending record; nothing is silently skipped.
    #[tracing::instrument(skip(reader))]
    pub fn from_reader(reader: impl Read, rank_cap: usize) -> RankraceResult<Self> {
        if rank_cap == 0 {
            return Err(RankraceError::validation("rank_cap must be > 0"));
        }

        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        struct Group {
            year: i32,
            entries: Vec<EntityValue>,
            total: u64,
        }

        let mut groups: Vec<Group> = Vec::new();
        let mut index_by_year: HashMap<i32, usize> = HashMap::new();
        let mut rows: u64 = 0;

        for (i, result) in rdr.deserialize::<RawRecord>().enumerate() {
            // 1-based data record number, header excluded.
            let record = (i + 1) as u64;
            let raw = result?;

            if raw.year.is_empty() && raw.country.is_empty() && raw.population.is_empty() {
                continue;
            }

            let year: i32 = raw.year.parse().map_err(|_| {
                RankraceError::data_validation(record, format!("year '{}' is not an integer", raw.year))
            })?;
            if raw.country.is_empty() {
                return Err(RankraceError::data_validation(record, "country name is empty"));
            }
            let value: u64 = raw.population.parse().map_err(|_| {
                RankraceError::data_validation(
                    record,
                    format!(
                        "population '{}' for '{}' is not a non-negative integer",
                        raw.population, raw.country
                    ),
                )
            })?;

            let gi = match index_by_year.get(&year) {
                Some(&gi) => gi,
                None => {
                    groups.push(Group {
                        year,
                        entries: Vec::new(),
                        total: 0,
                    });
                    index_by_year.insert(year, groups.len() - 1);
                    groups.len() - 1
                }
            };
            groups[gi].total = groups[gi].total.saturating_add(value);
            groups[gi].entries.push(EntityValue {
                name: raw.country,
                value,
            });
            rows += 1;
        }

        let snapshots = groups
            .into_iter()
            .map(|mut g| {
                // Stable sort keeps input order for equal values.
                g.entries.sort_by(|a, b| b.value.cmp(&a.value));
                g.entries.truncate(rank_cap);
                YearSnapshot {
                    year: g.year,
                    data: g.entries,
                    total: g.total,
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!(rows, years = snapshots.len(), "dataset loaded");
        Ok(Self { snapshots })
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&YearSnapshot> {
        self.snapshots.get(index)
    }

    pub fn snapshots(&self) -> &[YearSnapshot] {
        &self.snapshots
    }

    /// `(first, last)` year of the sequence, if non-empty.
    pub fn year_span(&self) -> Option<(i32, i32)> {
        let first = self.snapshots.first()?.year;
        let last = self.snapshots.last()?.year;
        Some((first, last))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn load(csv: &str) -> RankraceResult<Dataset> {
        Dataset::from_reader(csv.as_bytes(), DEFAULT_RANK_CAP)
    }

    const HEADER: &str = "Year,Country name,Population\n";

    fn wide_year(year: i32, countries: usize) -> String {
        let mut s = String::new();
        for i in 0..countries {
            s.push_str(&format!("{year},Country {i},{}\n", 1000 * (countries - i)));
        }
        s
    }

    #[test]
    fn groups_rank_and_truncate() {
        let mut csv = String::from(HEADER);
        csv.push_str(&wide_year(1950, 15));
        csv.push_str(&wide_year(1951, 15));
        let ds = load(&csv).unwrap();

        assert_eq!(ds.len(), 2);
        for snap in ds.snapshots() {
            assert_eq!(snap.data.len(), 12);
            assert!(snap.data.windows(2).all(|w| w[0].value >= w[1].value));
            // Total counts all 15 entities, the ranked slice only 12.
            let all: u64 = (1..=15).map(|i| 1000 * i as u64).sum();
            assert_eq!(snap.total, all);
            assert!(snap.total > snap.ranked_sum());
        }
    }

    #[test]
    fn total_equals_ranked_sum_for_small_years() {
        let csv = format!("{HEADER}2000,A,5\n2000,B,3\n");
        let ds = load(&csv).unwrap();
        let snap = ds.get(0).unwrap();
        assert_eq!(snap.total, snap.ranked_sum());
    }

    #[test]
    fn ties_keep_input_order() {
        let csv = format!("{HEADER}2000,First,10\n2000,Second,10\n2000,Third,10\n");
        let ds = load(&csv).unwrap();
        let names: Vec<_> = ds.get(0).unwrap().data.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["First", "Second", "Third"]);
    }

    #[test]
    fn years_keep_first_seen_order() {
        let csv = format!("{HEADER}1999,A,1\n1998,B,2\n1999,C,3\n");
        let ds = load(&csv).unwrap();
        let years: Vec<_> = ds.snapshots().iter().map(|s| s.year).collect();
        assert_eq!(years, [1999, 1998]);
        assert_eq!(ds.get(0).unwrap().data.len(), 2);
    }

    #[test]
    fn malformed_population_is_rejected_with_record_number() {
        let csv = format!("{HEADER}2000,A,100\n2000,B,not-a-number\n");
        let err = load(&csv).unwrap_err();
        match err {
            RankraceError::DataValidation { row, message } => {
                assert_eq!(row, 2);
                assert!(message.contains("not-a-number"));
                assert!(message.contains('B'));
            }
            other => panic!("expected DataValidation, got {other}"),
        }
    }

    #[test]
    fn malformed_year_is_rejected() {
        let csv = format!("{HEADER}soon,A,100\n");
        assert!(matches!(
            load(&csv),
            Err(RankraceError::DataValidation { row: 1, .. })
        ));
    }

    #[test]
    fn empty_rows_are_ignored() {
        let csv = format!("{HEADER}2000,A,100\n,,\n");
        let ds = load(&csv).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.get(0).unwrap().data.len(), 1);
    }

    #[test]
    fn empty_input_yields_empty_dataset() {
        let ds = load(HEADER).unwrap();
        assert!(ds.is_empty());
        assert_eq!(ds.year_span(), None);
    }

    #[test]
    fn year_span_reports_sequence_ends() {
        let csv = format!("{HEADER}1950,A,1\n1951,A,2\n1952,A,3\n");
        let ds = load(&csv).unwrap();
        assert_eq!(ds.year_span(), Some((1950, 1952)));
    }

    #[test]
    fn zero_rank_cap_is_invalid() {
        let err = Dataset::from_reader(HEADER.as_bytes(), 0).unwrap_err();
        assert!(matches!(err, RankraceError::Validation(_)));
    }
}
