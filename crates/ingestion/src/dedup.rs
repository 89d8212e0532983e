//! Duplicate suppression over record identity.
//!
//! Two records are duplicates when they agree on every field of
//! [`ImportField::IDENTITY`](import_common::ImportField::IDENTITY). Both
//! passes keep the relative order of surviving records.

use import_common::ImportRecord;
use tracing::debug;

/// Drop `records[i]` wherever `marks[i]` is set; returns how many were removed.
fn remove_marked(records: &mut Vec<ImportRecord>, marks: Vec<bool>) -> usize {
    let before = records.len();
    let mut marks = marks.into_iter();
    records.retain(|_| !marks.next().unwrap_or(false));
    before - records.len()
}

/// Remove duplicated records whose value and variant value are both zero.
///
/// A record is only removed when it has at least one duplicate. Running the
/// pass twice removes nothing further.
pub fn remove_zero_duplicates(records: &mut Vec<ImportRecord>) -> usize {
    let mut marks = vec![false; records.len()];

    for i in 0..records.len() {
        for j in (i + 1)..records.len() {
            if !records[i].same_identity(&records[j]) {
                continue;
            }
            if records[i].is_zero_observation() {
                marks[i] = true;
            }
            if records[j].is_zero_observation() {
                marks[j] = true;
            }
        }
    }

    let removed = remove_marked(records, marks);
    debug!(removed = removed, "Removed zero-valued duplicates");
    removed
}

/// Keep only the last record of every identity class.
pub fn remove_duplicates(records: &mut Vec<ImportRecord>) -> usize {
    let marks: Vec<bool> = (0..records.len())
        .map(|i| {
            records[i + 1..]
                .iter()
                .any(|later| records[i].same_identity(later))
        })
        .collect();

    let removed = remove_marked(records, marks);
    debug!(removed = removed, "Removed duplicates");
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use import_common::{ImportField, Value};

    fn rec(site: &str, value: f64, variant_value: f64) -> ImportRecord {
        ImportRecord::new()
            .with(ImportField::SiteCode, site)
            .with(ImportField::Date, "2021-01-01T00:00:00")
            .with(ImportField::Value, value)
            .with(ImportField::VariantValue, variant_value)
    }

    #[test]
    fn test_zero_duplicates_removed_only_when_duplicated() {
        let mut records = vec![
            rec("A", 0.0, 0.0),
            rec("A", 0.0, 0.0),
            rec("B", 0.0, 0.0),
            rec("C", 1.5, 0.0),
        ];
        let removed = remove_zero_duplicates(&mut records);
        assert_eq!(removed, 2);
        let sites: Vec<_> = records
            .iter()
            .map(|r| r.get(ImportField::SiteCode).cloned())
            .collect();
        assert_eq!(sites, vec![Some(Value::from("B")), Some(Value::from("C"))]);
    }

    #[test]
    fn test_zero_duplicates_keeps_nonzero_side() {
        let mut records = vec![rec("A", 0.0, 0.0), rec("A", 3.0, 0.0)];
        assert_eq!(remove_zero_duplicates(&mut records), 1);
        assert_eq!(records[0].get(ImportField::Value), Some(&Value::Float(3.0)));
    }

    #[test]
    fn test_zero_duplicates_idempotent() {
        let mut records = vec![
            rec("A", 0.0, 0.0),
            rec("A", 2.0, 0.0),
            rec("A", 0.0, 0.0),
            rec("B", 1.0, 0.0),
        ];
        remove_zero_duplicates(&mut records);
        let once = records.clone();
        assert_eq!(remove_zero_duplicates(&mut records), 0);
        assert_eq!(records, once);
    }

    #[test]
    fn test_remove_duplicates_keeps_last() {
        let mut records = vec![
            rec("A", 1.0, 0.0),
            rec("B", 1.0, 0.0),
            rec("A", 2.0, 0.0),
            rec("A", 3.0, 0.0),
        ];
        assert_eq!(remove_duplicates(&mut records), 2);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get(ImportField::SiteCode), Some(&Value::from("B")));
        assert_eq!(records[1].get(ImportField::Value), Some(&Value::Float(3.0)));
    }

    #[test]
    fn test_empty_input() {
        let mut records = Vec::new();
        assert_eq!(remove_duplicates(&mut records), 0);
        assert_eq!(remove_zero_duplicates(&mut records), 0);
    }
}
